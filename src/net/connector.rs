//! Outbound connection establishment.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::ConnectorConfig;
use crate::net::{subsystem, NetError, Stream};

/// Opens outbound connections.
///
/// Keeps no socket of its own: every stream it returns owns its connection,
/// so one connector can be reused for any number of connects.
#[derive(Debug, Clone, Default)]
pub struct Connector {
    /// Bound on connection establishment; `None` uses the platform timeout.
    connect_timeout: Option<Duration>,
    /// Read deadline applied to every connected stream.
    read_deadline: Option<Duration>,
}

impl Connector {
    /// Create a connector with platform defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector from configuration.
    pub fn from_config(config: &ConnectorConfig, read_deadline: Option<Duration>) -> Self {
        Self {
            connect_timeout: config.connect_timeout_ms.map(Duration::from_millis),
            read_deadline,
        }
    }

    /// Bound how long `connect` may take.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read deadline handed to connected streams.
    pub fn with_read_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.read_deadline = deadline;
        self
    }

    /// Connect to `ip:port` and return a stream owning the connection.
    ///
    /// `ip` may be a dotted quad or a host name; only IPv4 results are used.
    /// `None` targets the wildcard address.
    pub fn connect(&self, ip: Option<&str>, port: u16) -> Result<Stream, NetError> {
        subsystem::ensure()?;

        let addr = resolve(ip, port)?;

        let socket = match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&SocketAddr::V4(addr), timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|source| {
            tracing::warn!(address = %addr, error = %source, "Connect failed");
            NetError::Connect {
                addr: addr.to_string(),
                source,
            }
        })?;

        let mut stream = Stream::from_transport(socket);
        stream.set_read_deadline(self.read_deadline)?;

        tracing::info!(
            connection_id = %stream.id(),
            address = %addr,
            "Connected"
        );

        Ok(stream)
    }

    /// Connect to the configured address.
    pub fn connect_with(&self, config: &ConnectorConfig) -> Result<Stream, NetError> {
        self.connect(config.ip.as_deref(), config.port)
    }

    /// Release a stream.
    pub fn close(&self, stream: Stream) {
        tracing::debug!(connection_id = %stream.id(), "Closing connected stream");
        drop(stream);
    }
}

/// Resolve a textual host to the first IPv4 socket address.
fn resolve(ip: Option<&str>, port: u16) -> Result<SocketAddrV4, NetError> {
    let Some(host) = ip else {
        return Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    };

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddrV4::new(ip, port));
    }

    let unresolved = || NetError::Resolve {
        addr: format!("{}:{}", host, port),
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|_| unresolved())?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(unresolved)
}
