//! Accept loop: one task per inbound connection.
//!
//! # Responsibilities
//! - Accept connections under the listener's connection limit
//! - Spawn a session task per connection, tracked for draining
//! - Cancel the loop and every session when shutdown fires

use std::time::Duration;

use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError, SessionTracker};
use crate::session::SessionContext;

/// Pause after a failed accept (e.g. EMFILE) before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Accept connections until shutdown is triggered.
///
/// The listener is dropped, and so closed, when this returns.
pub async fn run_accept_loop(
    listener: Listener,
    ctx: SessionContext,
    tracker: SessionTracker,
    shutdown: Shutdown,
) {
    let mut stop = shutdown.subscribe();

    loop {
        // Subscribed before accepting, so a session spawned during shutdown
        // still sees the signal.
        let mut session_stop = shutdown.subscribe();

        let accepted = tokio::select! {
            biased;
            _ = stop.recv() => break,
            accepted = listener.accept() => accepted,
        };

        let (stream, peer, permit) = match accepted {
            Ok(accepted) => accepted,
            Err(ListenerError::Closed) => break,
            Err(e) => {
                ctx.log.diag(format!("[WARN] Accept error: {}", e));
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        let guard = tracker.track();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let id = guard.id();
            tracing::trace!(session_id = %id, peer = %peer, "Session started");

            tokio::select! {
                result = ctx.serve(stream, id) => match result {
                    Ok(report) => tracing::debug!(
                        session_id = %id,
                        destination = %report.destination,
                        attempts = ?report.attempts,
                        "Session finished"
                    ),
                    Err(e) => ctx.log.diag(format!("[{}] {}: {}", e.severity(), id, e)),
                },
                _ = session_stop.recv() => {
                    tracing::debug!(session_id = %id, "Session cancelled by shutdown");
                }
            }
            drop(guard);
        });
    }

    tracing::debug!(active_sessions = tracker.active_count(), "Accept loop stopped");
}
