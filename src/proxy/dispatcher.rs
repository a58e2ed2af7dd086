//! Origin dispatch: resolve the target, connect, send the request head.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ProxyError;
use crate::http::ParsedRequest;
use crate::proxy::ProxySettings;
use crate::resilience::deadline;
use crate::routing::OriginTarget;

/// Open a fresh connection to the request's origin and forward the head.
///
/// On failure the origin connection, if any, is dropped before returning.
pub async fn dispatch(
    request: &ParsedRequest,
    settings: &ProxySettings,
) -> Result<TcpStream, ProxyError> {
    let target = OriginTarget::from_request(request)?;
    let mut origin = connect(&target, settings).await?;

    tracing::debug!(
        origin = %target,
        method = request.method(),
        path = request.path(),
        "Forwarding request"
    );

    send_request(&mut origin, request, settings).await?;
    Ok(origin)
}

async fn connect(target: &OriginTarget, settings: &ProxySettings) -> Result<TcpStream, ProxyError> {
    deadline(
        settings.connect_timeout,
        "origin connect",
        TcpStream::connect((target.host.as_str(), target.port)),
    )
    .await?
    .map_err(|source| ProxyError::OriginUnreachable {
        target: target.to_string(),
        source,
    })
}

/// Write the serialized request head to `origin`.
pub async fn send_request<W>(
    origin: &mut W,
    request: &ParsedRequest,
    settings: &ProxySettings,
) -> Result<(), ProxyError>
where
    W: AsyncWrite + Unpin,
{
    let wire = request.to_wire();
    deadline(settings.write_timeout, "origin write", async {
        origin.write_all(&wire).await?;
        origin.flush().await
    })
    .await?
    .map_err(ProxyError::OriginIo)
}
