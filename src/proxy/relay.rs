//! Origin to client byte relay.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProxyError;
use crate::proxy::ProxySettings;
use crate::resilience::deadline;

/// How a relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Bytes delivered to the client.
    pub bytes: u64,
    /// False when a write to the client failed.
    pub client_open: bool,
}

/// Copy the origin's response to the client until the origin closes.
///
/// Takes ownership of the origin connection and closes it on every path.
/// A failed client write ends the relay normally with `client_open == false`.
pub async fn relay_response<O, C>(
    mut origin: O,
    client: &mut C,
    settings: &ProxySettings,
) -> Result<RelayOutcome, ProxyError>
where
    O: AsyncRead + AsyncWrite + Unpin,
    C: AsyncWrite + Unpin,
{
    let result = copy_until_eof(&mut origin, client, settings).await;
    if let Err(e) = origin.shutdown().await {
        tracing::trace!(error = %e, "Origin shutdown failed");
    }
    result
}

async fn copy_until_eof<O, C>(
    origin: &mut O,
    client: &mut C,
    settings: &ProxySettings,
) -> Result<RelayOutcome, ProxyError>
where
    O: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; settings.buffer_size];
    let mut bytes = 0u64;

    loop {
        let n = deadline(settings.read_timeout, "origin read", origin.read(&mut buf))
            .await?
            .map_err(ProxyError::OriginIo)?;
        if n == 0 {
            break;
        }

        let written = deadline(settings.write_timeout, "client write", client.write_all(&buf[..n])).await?;
        if let Err(e) = written {
            return Ok(client_gone(ProxyError::ClientWriteFailed(e), bytes));
        }
        bytes += n as u64;
    }

    match deadline(settings.write_timeout, "client write", client.flush()).await? {
        Ok(()) => Ok(RelayOutcome {
            bytes,
            client_open: true,
        }),
        Err(e) => Ok(client_gone(ProxyError::ClientWriteFailed(e), bytes)),
    }
}

fn client_gone(err: ProxyError, bytes: u64) -> RelayOutcome {
    tracing::debug!(kind = err.kind(), error = %err, bytes, "Client went away mid-response");
    RelayOutcome {
        bytes,
        client_open: false,
    }
}
