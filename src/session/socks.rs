//! SOCKS-mode session: the client names the destination, the dispatcher
//! picks the egress path.

use tokio::net::TcpStream;

use crate::load_balancer::Selection;
use crate::net::{relay, SessionId};
use crate::observability::metrics;
use crate::session::{SessionContext, SessionError, SessionReport};
use crate::socks::{accept_request, handshake, write_reply, ProtocolError, ReplyStatus};

pub(crate) async fn serve(
    ctx: &SessionContext,
    mut inbound: TcpStream,
    id: SessionId,
) -> Result<SessionReport, SessionError> {
    handshake(&mut inbound)
        .await
        .map_err(|e| protocol_failure(e, SessionError::Handshake))?;
    let target = accept_request(&mut inbound)
        .await
        .map_err(|e| protocol_failure(e, SessionError::Request))?;
    let destination = target.to_string();

    let Selection { backend, index } = match ctx.dispatcher.select() {
        Ok(selection) => selection,
        Err(e) => {
            let _ = write_reply(&mut inbound, ReplyStatus::GeneralFailure).await;
            return Err(e.into());
        }
    };
    metrics::record_backend_selected(&backend.address());

    let outbound = match ctx.binder.dial(&backend, &destination).await {
        Ok(stream) => {
            metrics::record_dial(&backend.address(), true);
            stream
        }
        Err(source) => {
            metrics::record_dial(&backend.address(), false);
            if let Err(e) = write_reply(&mut inbound, ReplyStatus::NetworkUnreachable).await {
                tracing::debug!(session_id = %id, error = %e, "Client gone before error reply");
            }
            return Err(SessionError::Dial {
                destination,
                backend: backend.address(),
                index,
                source,
            });
        }
    };

    write_reply(&mut inbound, ReplyStatus::Succeeded)
        .await
        .map_err(SessionError::Reply)?;

    let peer = inbound
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "?".to_string());
    ctx.log.diag(format!(
        "[DEBUG] {} -> {} (via {} LB:{})",
        peer,
        destination,
        backend.address(),
        index
    ));

    let _active = backend.track();
    let summary = relay(inbound, outbound).await;
    tracing::debug!(
        session_id = %id,
        backend = %backend,
        finished = summary.finished.as_str(),
        bytes = ?summary.bytes(),
        "SOCKS session relayed"
    );

    Ok(SessionReport {
        destination,
        attempts: vec![index],
        relay: summary,
    })
}

fn protocol_failure(
    error: ProtocolError,
    wrap: fn(ProtocolError) -> SessionError,
) -> SessionError {
    metrics::record_protocol_error(error.kind());
    wrap(error)
}
