use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, AppResult, RpcError};

use super::types::WireMessage;

/// Largest accepted wire message, newline excluded.
pub const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Reads one newline-terminated JSON message.
///
/// # Errors
///
/// Returns `RpcError::Unavailable` when the peer closed the stream, and a
/// size, UTF-8 or decode error for malformed input.
pub async fn read_message<R>(reader: &mut R) -> AppResult<WireMessage>
where
    R: AsyncBufRead + Unpin,
{
    let limit = u64::try_from(MAX_MESSAGE_BYTES)
        .unwrap_or(u64::MAX)
        .saturating_add(2);
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let bytes = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buffer)
        .await
        .map_err(|err| AppError::rpc(RpcError::from_io("read wire message", err)))?;
    if bytes == 0 {
        return Err(AppError::rpc(RpcError::Unavailable {
            context: "read wire message",
        }));
    }
    if buffer.ends_with(b"\n") {
        buffer.pop();
        if buffer.ends_with(b"\r") {
            buffer.pop();
        }
    }
    if buffer.len() > MAX_MESSAGE_BYTES {
        return Err(AppError::rpc(RpcError::WireMessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        }));
    }
    let line = std::str::from_utf8(&buffer)
        .map_err(|err| AppError::rpc(RpcError::WireMessageInvalidUtf8 { source: err }))?;
    serde_json::from_str::<WireMessage>(line).map_err(|err| {
        AppError::rpc(RpcError::Deserialize {
            context: "wire message",
            source: err,
        })
    })
}

/// Writes one message followed by a newline and flushes.
///
/// # Errors
///
/// Returns an error when encoding fails or the peer is gone.
pub async fn send_message<W>(writer: &mut W, message: &WireMessage) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_string(message).map_err(|err| {
        AppError::rpc(RpcError::Serialize {
            context: "wire message",
            source: err,
        })
    })?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|err| AppError::rpc(RpcError::from_io("send wire message", err)))?;
    writer
        .flush()
        .await
        .map_err(|err| AppError::rpc(RpcError::from_io("flush wire message", err)))
}
