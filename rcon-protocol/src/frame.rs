//! Length-delimited stream framing.
//!
//! Frame layout (integers little-endian):
//!
//! ```text
//! +---------+---------------------------+
//! | length  | payload                   |
//! | 4 bytes | `length` bytes            |
//! +---------+---------------------------+
//! ```

use crate::error::ProtocolError;
use crate::MAX_FRAME_LEN;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the frame length prefix in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Encodes a payload into a complete frame.
pub fn encode(payload: &[u8], max_len: u32) -> Result<BytesMut, ProtocolError> {
    if payload.len() > max_len as usize {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len() as u32,
            max: max_len,
        });
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    Ok(buf)
}

/// Incremental frame decoder over an unbounded byte stream.
///
/// Bytes arrive in arbitrarily fragmented chunks via [`extend`](Self::extend);
/// [`decode`](Self::decode) yields one payload at a time and returns
/// `Ok(None)` while a frame is still incomplete. The length prefix is not
/// consumed until the full declared length is buffered.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    max_len: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_len(MAX_FRAME_LEN)
    }

    /// Creates a decoder with a custom frame length cap.
    pub fn with_max_len(max_len: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            max_len,
        }
    }

    /// Appends raw stream data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to extract the next complete frame payload.
    pub fn decode(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Peek the length without consuming; the prefix stays in place until
        // the whole frame is available.
        let length =
            u32::from_le_bytes([self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]]);

        if length > self.max_len {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: self.max_len,
            });
        }

        let length = length as usize;
        if self.buffer.len() < FRAME_HEADER_SIZE + length {
            return Ok(None);
        }

        self.buffer.advance(FRAME_HEADER_SIZE);
        Ok(Some(self.buffer.split_to(length).freeze()))
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discards all buffered data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
