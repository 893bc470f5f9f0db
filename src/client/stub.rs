//! Client stub
//!
//! Connects to one server and exchanges frames with it.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::Value;

use crate::discovery::ServerAddress;
use crate::error::{Result, RingError};
use crate::protocol::{read_frame, write_frame, RequestBody, Response};

/// Connection to a single server
pub struct Client {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl Client {
    /// Connect to `address`, trying each resolved socket address in turn
    pub fn connect(address: &ServerAddress, timeout: Option<Duration>) -> Result<Self> {
        let candidates = (address.host.as_str(), address.port)
            .to_socket_addrs()
            .map_err(|e| RingError::Connection(format!("{address}: {e}")))?;

        let mut last_err = None;
        for candidate in candidates {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, address.to_string()),
                Err(e) => last_err = Some(e),
            }
        }

        Err(RingError::Connection(match last_err {
            Some(e) => format!("{address}: {e}"),
            None => format!("{address}: no addresses resolved"),
        }))
    }

    fn from_stream(stream: TcpStream, peer_addr: String) -> Result<Self> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    /// Set a bound on how long `send` waits for a response
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send one request and block until its response arrives
    pub fn send(&mut self, request: &RequestBody) -> Result<Response> {
        tracing::trace!("Sending {} to {}", request.method, self.peer_addr);

        write_frame(&mut self.writer, &request.to_json()?)?;
        let body = read_frame(&mut self.reader)?;

        serde_json::from_slice(&body).map_err(|e| {
            RingError::Protocol(format!("unparsable response from {}: {}", self.peer_addr, e))
        })
    }

    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Response> {
        self.send(&RequestBody::insert(key, value))
    }

    pub fn lookup(&mut self, key: impl Into<Value>) -> Result<Response> {
        self.send(&RequestBody::lookup(key))
    }

    pub fn remove(&mut self, key: impl Into<Value>) -> Result<Response> {
        self.send(&RequestBody::remove(key))
    }

    pub fn scan(&mut self, regex: impl Into<Value>) -> Result<Response> {
        self.send(&RequestBody::scan(regex))
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
