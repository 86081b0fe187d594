//! Listening endpoint that mints streams for inbound connections.
//!
//! # Responsibilities
//! - Bind an IPv4 address (wildcard when none is given)
//! - Listen with a fixed backlog
//! - Accept connections one at a time, blocking the caller

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::AcceptorConfig;
use crate::net::{subsystem, NetError, Stream};

/// Pending connections queued by the kernel before `accept`.
pub const LISTEN_BACKLOG: i32 = 10;

/// A blocking TCP acceptor. Holds at most one listening socket.
#[derive(Debug, Default)]
pub struct Acceptor {
    /// The listening socket, present after a successful `start`.
    inner: Option<TcpListener>,
    /// Read deadline applied to every accepted stream.
    read_deadline: Option<Duration>,
}

impl Acceptor {
    /// Create an acceptor that is not yet listening.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read deadline handed to accepted streams.
    pub fn with_read_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.read_deadline = deadline;
        self
    }

    /// Start listening on `ip:port`, or on every interface when `ip` is `None`.
    pub fn start(&mut self, ip: Option<&str>, port: u16) -> Result<(), NetError> {
        if self.inner.is_some() {
            return Err(NetError::AlreadyListening);
        }

        subsystem::ensure()?;

        let ip = match ip {
            Some(ip) => ip.parse::<Ipv4Addr>().map_err(|_| NetError::Resolve {
                addr: ip.to_string(),
            })?,
            None => Ipv4Addr::UNSPECIFIED,
        };
        let addr = SocketAddrV4::new(ip, port);

        // Dropping `socket` on any early return closes it.
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(NetError::Socket)?;

        socket
            .bind(&SocketAddr::V4(addr).into())
            .map_err(|source| NetError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        socket.listen(LISTEN_BACKLOG).map_err(NetError::Listen)?;

        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr().map_err(NetError::Listen)?;

        tracing::info!(
            address = %local_addr,
            backlog = LISTEN_BACKLOG,
            "Acceptor listening"
        );

        self.inner = Some(listener);
        Ok(())
    }

    /// Start listening on the configured address.
    pub fn start_with(&mut self, config: &AcceptorConfig) -> Result<(), NetError> {
        self.start(config.ip.as_deref(), config.port)
    }

    /// Block until a client connects and return a stream owning the connection.
    pub fn accept(&self) -> Result<Stream, NetError> {
        let listener = self.inner.as_ref().ok_or(NetError::NotListening)?;

        let (socket, peer_addr) = listener.accept().map_err(|e| {
            tracing::warn!(error = %e, "Accept failed");
            NetError::Accept(e)
        })?;

        let mut stream = Stream::from_transport(socket);
        stream.set_read_deadline(self.read_deadline)?;

        tracing::info!(
            connection_id = %stream.id(),
            peer_addr = %peer_addr,
            "Connection accepted"
        );

        Ok(stream)
    }

    /// Release a stream. The listening socket is unaffected.
    pub fn close(&self, stream: Stream) {
        tracing::debug!(connection_id = %stream.id(), "Closing accepted stream");
        drop(stream);
    }

    /// Get the local address this acceptor is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        let listener = self.inner.as_ref().ok_or(NetError::NotListening)?;
        listener.local_addr().map_err(NetError::Listen)
    }

    /// Whether `start` has succeeded.
    pub fn is_listening(&self) -> bool {
        self.inner.is_some()
    }
}
