//! Tunnel-mode session: each backend is a fixed upstream, and a session
//! fails over across backends until one accepts the connection.

use tokio::net::TcpStream;

use crate::load_balancer::{DispatchError, Selection};
use crate::net::{relay, SessionId};
use crate::observability::metrics;
use crate::session::{SessionContext, SessionError, SessionReport};

pub(crate) async fn serve(
    ctx: &SessionContext,
    inbound: TcpStream,
    id: SessionId,
) -> Result<SessionReport, SessionError> {
    let dispatcher = &ctx.dispatcher;
    let mut failed = dispatcher.failure_set();
    let mut attempts = Vec::with_capacity(dispatcher.size());

    loop {
        // Only the first attempt advances the shared rotation.
        let selection = if attempts.is_empty() {
            dispatcher.select()
        } else {
            dispatcher.select_excluding(&failed)
        };
        let Selection { backend, index } = match selection {
            Ok(selection) => selection,
            Err(DispatchError::NoCandidates) => {
                return Err(SessionError::AllBackendsFailed { attempts })
            }
            Err(e) => return Err(e.into()),
        };
        attempts.push(index);
        metrics::record_backend_selected(&backend.address());

        let destination = backend.upstream_target().unwrap_or_else(|| backend.address());
        match ctx.binder.dial(&backend, &destination).await {
            Ok(outbound) => {
                metrics::record_dial(&backend.address(), true);
                ctx.log
                    .diag(format!("[DEBUG] Tunnelled to {} (LB:{})", destination, index));

                let _active = backend.track();
                let summary = relay(inbound, outbound).await;
                tracing::debug!(
                    session_id = %id,
                    backend = %backend,
                    attempts = attempts.len(),
                    finished = summary.finished.as_str(),
                    bytes = ?summary.bytes(),
                    "Tunnel session relayed"
                );

                return Ok(SessionReport {
                    destination,
                    attempts,
                    relay: summary,
                });
            }
            Err(e) => {
                metrics::record_dial(&backend.address(), false);
                ctx.log.diag(format!(
                    "[WARN] Tunnel fail {}: {} (LB:{})",
                    destination, e, index
                ));
                failed.insert(index);
            }
        }
    }
}
