//! Protocol codec
//!
//! Framing helpers for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! 27,{"method":"lookup","key":"a"}
//! ^^ ^
//! |  └─ body: exactly 27 bytes of UTF-8 JSON
//! └──── decimal length, terminated by a comma
//! ```
//!
//! Two readers are provided: `FrameDecoder` for the non-blocking server,
//! which is fed whatever the socket returned and yields frames once they are
//! complete, and `read_frame` for blocking clients.

use std::io::{BufRead, Read, Write};

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, RingError};
use super::{RequestBody, Response};

/// Longest accepted length prefix, comma excluded (fits any u64)
pub const MAX_HEADER_LEN: usize = 20;

// =============================================================================
// Encoding
// =============================================================================

/// Prefix `body` with its length
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let header = body.len().to_string();
    let mut frame = Vec::with_capacity(header.len() + 1 + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.push(b',');
    frame.extend_from_slice(body);
    frame
}

/// Encode a client request as a complete frame
pub fn encode_request(request: &RequestBody) -> Result<Vec<u8>> {
    Ok(encode_frame(&request.to_json()?))
}

/// Encode a response as a complete frame
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    Ok(encode_frame(&serde_json::to_vec(response)?))
}

/// Parse a length prefix (without its comma)
pub fn parse_length(header: &[u8]) -> Result<usize> {
    if header.is_empty() || header.len() > MAX_HEADER_LEN || !header.iter().all(u8::is_ascii_digit)
    {
        return Err(RingError::InvalidRequest(format!(
            "malformed frame header {:?}",
            String::from_utf8_lossy(header)
        )));
    }

    // All ASCII digits, so from_utf8 cannot fail; only overflow can
    std::str::from_utf8(header)
        .ok()
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| RingError::InvalidRequest("frame length out of range".into()))
}

// =============================================================================
// Incremental Decoding
// =============================================================================

/// Accumulates stream bytes and splits them into frame bodies
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes received but not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete frame body, if one has fully arrived
    ///
    /// A malformed header discards everything buffered so far: there is no
    /// way to find the next frame boundary in a stream that lost its framing.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let comma = match self.buffer.iter().position(|&b| b == b',') {
            Some(comma) => comma,
            None => {
                let plausible = self.buffer.len() <= MAX_HEADER_LEN
                    && self.buffer.iter().all(u8::is_ascii_digit);
                if plausible {
                    return Ok(None);
                }
                let err = parse_length(&self.buffer).err();
                self.buffer.clear();
                return Err(err.unwrap_or_else(|| {
                    RingError::InvalidRequest("malformed frame header".into())
                }));
            }
        };

        let length = match parse_length(&self.buffer[..comma]) {
            Ok(length) => length,
            Err(err) => {
                self.buffer.clear();
                return Err(err);
            }
        };

        if self.buffer.len() - (comma + 1) < length {
            return Ok(None);
        }

        self.buffer.advance(comma + 1);
        Ok(Some(self.buffer.split_to(length).freeze()))
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame body from a blocking stream
///
/// Blocks until the declared number of body bytes has arrived.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = Vec::with_capacity(MAX_HEADER_LEN + 1);
    reader
        .by_ref()
        .take((MAX_HEADER_LEN + 1) as u64)
        .read_until(b',', &mut header)?;

    if header.is_empty() {
        return Err(RingError::Protocol("stream closed before a frame arrived".into()));
    }
    if header.pop() != Some(b',') {
        return Err(RingError::Protocol(format!(
            "truncated frame header {:?}",
            String::from_utf8_lossy(&header)
        )));
    }

    let length = parse_length(&header).map_err(|e| RingError::Protocol(e.to_string()))?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => RingError::Protocol(format!(
            "declared length {length} never satisfied"
        )),
        _ => RingError::Io(e),
    })?;

    Ok(body)
}

/// Write one frame to a stream and flush it
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    writer.write_all(&encode_frame(body))?;
    writer.flush()?;
    Ok(())
}
