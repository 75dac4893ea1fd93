//! Length-prefixed text frames.
//!
//! Layout on the wire:
//! `[payload length: u16 big-endian] + [payload: UTF-8 bytes]`
//!
//! This matches the classic `writeUTF`/`readUTF` stream encoding for text
//! without NUL or supplementary (non-BMP) characters. Modified UTF-8 encodes
//! those as `C0 80` and surrogate pairs, which are rejected here as
//! `InvalidUtf8`. One logical send is exactly one frame: no batching, no
//! delimiter scanning.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{ProtocolError, Result};

/// One framed UTF-8 string.
///
/// # Invariants
///
/// - Size Limit: `text.len()` MUST NOT exceed [`Frame::MAX_PAYLOAD_SIZE`] to be
///   encodable. Oversized frames can be constructed but are rejected by
///   [`Frame::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Size of the length prefix in bytes.
    pub const PREFIX_SIZE: usize = 2;

    /// Largest payload the prefix can describe.
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

    /// Create a frame carrying `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Frame payload as text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the frame, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Total encoded size (prefix + payload).
    pub fn encoded_len(&self) -> usize {
        Self::PREFIX_SIZE + self.text.len()
    }

    /// Encode into `dst`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds
    ///   [`Frame::MAX_PAYLOAD_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let len = u16::try_from(self.text.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            size: self.text.len(),
            max: Self::MAX_PAYLOAD_SIZE,
        })?;

        dst.put_u16(len);
        dst.put_slice(self.text.as_bytes());

        Ok(())
    }

    /// Decode one frame from the start of `bytes`.
    ///
    /// Trailing bytes after the announced payload are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let prefix: [u8; Self::PREFIX_SIZE] = bytes
            .get(..Self::PREFIX_SIZE)
            .and_then(|p| p.try_into().ok())
            .ok_or(ProtocolError::FrameTooShort {
                expected: Self::PREFIX_SIZE,
                actual: bytes.len(),
            })?;

        let payload_size = u16::from_be_bytes(prefix) as usize;
        let total_size = Self::PREFIX_SIZE + payload_size;

        let payload = bytes.get(Self::PREFIX_SIZE..total_size).ok_or(
            ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len() - Self::PREFIX_SIZE,
            },
        )?;

        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;

        Ok(Self::new(text))
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Read exactly one frame from `reader`.
///
/// A stream that ends cleanly before the first prefix byte yields
/// `ProtocolError::ConnectionClosed`. A stream that ends mid-frame yields
/// `ProtocolError::Io` with `UnexpectedEof`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; Frame::PREFIX_SIZE];

    if reader.read(&mut prefix[..1]).await? == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    reader.read_exact(&mut prefix[1..]).await?;

    let payload_size = u16::from_be_bytes(prefix) as usize;
    let mut payload = vec![0u8; payload_size];
    reader.read_exact(&mut payload).await?;

    let text = String::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;

    Ok(Frame::new(text))
}

/// Write one frame to `writer` and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(frame.encoded_len());
    frame.encode(&mut buf)?;

    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(())
}
