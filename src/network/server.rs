//! TCP Server
//!
//! Single-threaded readiness loop: accepts connections, reassembles frames,
//! dispatches them to the engine and writes responses back, while
//! re-announcing the server to the catalog on a fixed interval.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};

use crate::config::Config;
use crate::discovery::{Discovery, Registration};
use crate::engine::Engine;
use crate::error::{Result, RingError};
use crate::protocol::Response;
use super::{respond, Connection};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// TCP server for RingKV
pub struct Server {
    config: Config,

    /// Sole owner and mutator of the engine
    engine: Engine,

    poll: Poll,
    listener: TcpListener,

    /// Open connections keyed by their poll token
    connections: HashMap<Token, Connection>,
    next_token: usize,

    /// Catalog to announce to; None runs without registration
    discovery: Option<Arc<dyn Discovery>>,
    next_announce: Instant,

    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

/// Stops a running server from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Ask the loop to exit after its current iteration
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            tracing::warn!("Failed to wake server loop: {}", e);
        }
    }
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: Config, engine: Engine) -> Result<Self> {
        let addr: SocketAddr = config
            .listen_addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                RingError::Config(format!("listen address {} did not resolve", config.listen_addr))
            })?;

        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        tracing::info!("Listening on port {}", listener.local_addr()?.port());

        Ok(Self {
            config,
            engine,
            poll,
            listener,
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            discovery: None,
            next_announce: Instant::now(),
            shutdown: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// Announce this server through `discovery` while running
    pub fn with_discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(1024);
        self.announce();

        while !self.shutdown.load(Ordering::SeqCst) {
            let timeout = self.next_announce.saturating_duration_since(Instant::now());

            if let Err(e) = self.poll.poll(&mut events, Some(timeout)) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept(),
                    WAKER => {}
                    token => self.service(token, event.is_readable(), event.is_writable()),
                }
            }

            if Instant::now() >= self.next_announce {
                self.announce();
            }
        }

        tracing::info!(
            "Server stopping with {} open connections",
            self.connections.len()
        );
        Ok(())
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // =========================================================================
    // Event Handling
    // =========================================================================

    fn accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    if self.connections.len() >= self.config.max_connections {
                        tracing::warn!("Connection limit reached, refusing {}", peer);
                        continue;
                    }

                    let token = Token(self.next_token);
                    self.next_token += 1;
                    let registered =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE);
                    if let Err(e) = registered {
                        tracing::warn!("Registering {} failed, dropping it: {}", peer, e);
                        continue;
                    }

                    tracing::info!("Client connected: {}", peer);
                    self.connections.insert(token, Connection::new(stream, peer));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    return;
                }
            }
        }
    }

    /// Flush, read and dispatch for one connection, then re-arm its interest
    ///
    /// Reading stops while the outbox is above `max_outbox_bytes`, so a peer
    /// that never reads its responses cannot grow it further. Buffered frames
    /// are dispatched again once the outbox drains.
    fn service(&mut self, token: Token, readable: bool, writable: bool) {
        let high_water = self.config.max_outbox_bytes;
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };
        let mut closed = false;

        if writable {
            if let Err(e) = conn.flush() {
                tracing::debug!("Write to {} failed: {}", conn.peer_addr(), e);
                closed = true;
            }
        }

        let paused = conn.pending_output() >= high_water;
        if !closed && readable && !paused && !conn.is_read_closed() {
            if let Err(e) = conn.fill() {
                tracing::debug!("Read from {} failed: {}", conn.peer_addr(), e);
                closed = true;
            }
        }

        // Answer everything that arrived, even if the peer has stopped sending
        while !closed {
            if conn.pending_output() >= high_water {
                if let Err(e) = conn.flush() {
                    tracing::debug!("Write to {} failed: {}", conn.peer_addr(), e);
                    closed = true;
                    break;
                }
                if conn.pending_output() >= high_water {
                    tracing::trace!("Outbox of {} full, pausing reads", conn.peer_addr());
                    break;
                }
            }

            match conn.next_frame() {
                Ok(Some(body)) => {
                    let response = respond(&mut self.engine, &body);
                    conn.queue(&response);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Bad frame from {}: {}", conn.peer_addr(), e);
                    conn.queue(&Response::invalid_request(e.to_string()));
                    break;
                }
            }
        }

        if !closed {
            if let Err(e) = conn.flush() {
                tracing::debug!("Write to {} failed: {}", conn.peer_addr(), e);
                closed = true;
            }
        }

        if !closed && conn.is_read_closed() && !conn.has_pending_output() {
            closed = true;
        }

        if !closed {
            let interest = if conn.pending_output() >= high_water || conn.is_read_closed() {
                Interest::WRITABLE
            } else if conn.has_pending_output() {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };

            if interest != conn.interest() {
                match self
                    .poll
                    .registry()
                    .reregister(conn.stream_mut(), token, interest)
                {
                    Ok(()) => conn.set_interest(interest),
                    Err(e) => {
                        tracing::warn!("Re-registering {} failed: {}", conn.peer_addr(), e);
                        closed = true;
                    }
                }
            }
        }

        if closed {
            self.close(token);
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            if let Err(e) = self.poll.registry().deregister(conn.stream_mut()) {
                tracing::debug!("Deregistering {} failed: {}", conn.peer_addr(), e);
            }
            tracing::info!("Disconnecting {}", conn.peer_addr());
        }
    }

    /// Publish the registration and schedule the next one
    ///
    /// Failures are logged and retried on the next tick.
    fn announce(&mut self) {
        self.next_announce = Instant::now() + self.config.announce_interval;

        let Some(discovery) = &self.discovery else {
            return;
        };

        let port = match self.listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => {
                tracing::warn!("Cannot announce, listener address unavailable: {}", e);
                return;
            }
        };

        let registration = Registration::new(&self.config.project, &self.config.owner, port);
        match discovery.register(&registration) {
            Ok(()) => tracing::debug!("Announced {} on port {}", registration.project, port),
            Err(e) => tracing::warn!(
                "Catalog announcement failed, retrying in {:?}: {}",
                self.config.announce_interval,
                e
            ),
        }
    }
}
