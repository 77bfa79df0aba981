//! Wire framing and message vocabulary for the lottery agency protocol.
//!
//! The protocol is asymmetric. Client-to-server messages are binary frames:
//! a 2-byte big-endian length prefix followed by exactly that many payload
//! bytes. Server-to-client responses are newline-terminated ASCII lines.
//!
//! This crate owns both directions so the client and any test server agree
//! on the exact bytes.

mod message;

pub use message::*;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD_LEN: usize = 8192;

/// Size of the big-endian length prefix in front of every frame.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Longest response line accepted from the server, terminator included.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Error returned by the framing functions.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds [`MAX_PAYLOAD_LEN`]. Raised before any byte is written.
    #[error("payload of {len} bytes exceeds max frame payload of {max} bytes")]
    TooLarge { len: usize, max: usize },
    /// The peer sent more than [`MAX_LINE_LEN`] bytes without a newline.
    #[error("response line exceeds {max} bytes without a terminator")]
    LineTooLong { max: usize },
    /// The underlying stream failed or ended early.
    #[error("frame i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a payload into length-prefixed frame bytes.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] when `payload` is longer than
/// [`MAX_PAYLOAD_LEN`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u16::try_from(payload.len())
        .ok()
        .filter(|len| usize::from(*len) <= MAX_PAYLOAD_LEN)
        .ok_or(FrameError::TooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;

    let mut out = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Write one frame and flush it.
///
/// The payload is validated before the writer is touched, and `write_all`
/// keeps writing through short writes until every byte is accepted.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] for oversized payloads (nothing is
/// written) and [`FrameError::Io`] when the stream fails.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_frame(payload)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame and return its payload.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] when the declared length is above
/// [`MAX_PAYLOAD_LEN`] and [`FrameError::Io`] (`UnexpectedEof` included) when
/// the stream ends mid-frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0_u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut prefix).await?;

    let len = usize::from(u16::from_be_bytes(prefix));
    if len > MAX_PAYLOAD_LEN {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Read one newline-terminated response line, without its terminator.
///
/// A trailing `\r` is stripped as well.
///
/// # Errors
///
/// Returns [`FrameError::Io`] with `UnexpectedEof` when the stream closes
/// before a newline, `InvalidData` for non-UTF-8 input, and
/// [`FrameError::LineTooLong`] when no newline shows up within
/// [`MAX_LINE_LEN`] bytes.
pub async fn read_line<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let limit = u64::try_from(MAX_LINE_LEN).unwrap_or(u64::MAX);
    let read = (&mut *reader).take(limit).read_line(&mut line).await?;

    if !line.ends_with('\n') {
        if read >= MAX_LINE_LEN {
            return Err(FrameError::LineTooLong { max: MAX_LINE_LEN });
        }
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream closed before line terminator",
        )
        .into());
    }

    line.pop();
    if line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

/// Write one response line followed by `\n` and flush it.
///
/// # Errors
///
/// Returns [`FrameError::Io`] when the stream fails.
pub async fn write_line<W>(writer: &mut W, line: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
