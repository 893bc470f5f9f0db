//! Connection Handler
//!
//! Per-client state for the non-blocking server loop.

use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;

use bytes::{Buf, Bytes, BytesMut};
use mio::net::TcpStream;
use mio::Interest;

use crate::error::Result;
use crate::protocol::{encode_response, FrameDecoder, Response};

/// Size of each read from the socket
const READ_CHUNK: usize = 4096;

/// Whether the peer is still there after a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Open,
    Closed,
}

/// A single client connection
pub struct Connection {
    /// Non-blocking TCP stream
    stream: TcpStream,

    /// Peer address for logging
    peer_addr: SocketAddr,

    /// Bytes received but not yet dispatched
    decoder: FrameDecoder,

    /// Encoded responses not yet written
    outbox: BytesMut,

    /// Interest currently registered with the poll
    interest: Interest,

    /// Peer has finished sending
    read_closed: bool,
}

impl Connection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        // Disable Nagle's algorithm for low latency
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", peer_addr, e);
        }

        Self {
            stream,
            peer_addr,
            decoder: FrameDecoder::new(),
            outbox: BytesMut::new(),
            interest: Interest::READABLE,
            read_closed: false,
        }
    }

    /// Drain the socket into the frame buffer
    ///
    /// Stops when the socket would block. End-of-stream and resets report
    /// `Closed`; bytes received before them stay buffered.
    pub fn fill(&mut self) -> io::Result<ReadState> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.read_closed = true;
                    return Ok(ReadState::Closed);
                }
                Ok(n) => self.decoder.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(ReadState::Open),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    self.read_closed = true;
                    return Ok(ReadState::Closed);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Next complete request body, if one has arrived
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        self.decoder.next_frame()
    }

    /// Queue a response for writing
    pub fn queue(&mut self, response: &Response) {
        match encode_response(response) {
            Ok(frame) => self.outbox.extend_from_slice(&frame),
            Err(e) => {
                tracing::error!("Failed to encode response for {}: {}", self.peer_addr, e);
                if let Ok(frame) = encode_response(&Response::failure(e.to_string())) {
                    self.outbox.extend_from_slice(&frame);
                }
            }
        }
    }

    /// Write as much of the outbox as the socket accepts
    ///
    /// Returns true once everything queued has been written.
    pub fn flush(&mut self) -> io::Result<bool> {
        while !self.outbox.is_empty() {
            match self.stream.write(&self.outbox) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => self.outbox.advance(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Whether responses are still waiting to be written
    pub fn has_pending_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Bytes of responses still waiting to be written
    pub fn pending_output(&self) -> usize {
        self.outbox.len()
    }

    /// Whether the peer has stopped sending
    pub fn is_read_closed(&self) -> bool {
        self.read_closed
    }

    pub fn interest(&self) -> Interest {
        self.interest
    }

    pub fn set_interest(&mut self, interest: Interest) {
        self.interest = interest;
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}
