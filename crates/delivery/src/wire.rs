//! Framing for the delivery protocol.
//!
//! # Frame Format
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u32 (BE)  | body: bincode, len bytes  |
//! +----------------+---------------------------+
//! ```
//!
//! The sender writes one [`Request`] frame and the recipient answers with one
//! [`Response`] frame. Frames longer than the configured maximum are refused
//! on both sides before any body bytes are read or written.

use crate::outcome::TransportError;
use bytes::{BufMut, Bytes, BytesMut};
use corelib::WireEnvelope;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default upper bound on a frame body (4 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Sender → recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Deliver(WireEnvelope),
}

/// Recipient → sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Ack,
    Rejected { reason: String },
}

/// Encode `message` as a complete length-prefixed frame.
pub fn encode_frame<T: Serialize>(message: &T, max_len: usize) -> Result<Bytes, TransportError> {
    let body = bincode::serialize(message)?;
    check_len(body.len(), max_len)?;

    let mut frame = BytesMut::with_capacity(LEN_PREFIX + body.len());
    frame.put_u32(body.len() as u32);
    frame.extend_from_slice(&body);
    Ok(frame.freeze())
}

/// Decode a frame body produced by [`encode_frame`].
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    Ok(bincode::deserialize(body)?)
}

/// Write a pre-encoded frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame body, refusing bodies above `max_len`.
///
/// A peer closing the stream before a full frame arrives is an
/// [`std::io::ErrorKind::UnexpectedEof`] I/O error.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    check_len(len, max_len)?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

fn check_len(len: usize, max_len: usize) -> Result<(), TransportError> {
    if len > max_len || len > u32::MAX as usize {
        return Err(TransportError::Protocol(format!(
            "frame of {len} bytes exceeds limit of {max_len}"
        )));
    }
    Ok(())
}
