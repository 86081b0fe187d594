//! Error type shared by the acceptor, connector and stream.

use thiserror::Error;

/// Errors produced by network operations.
///
/// Any error returned from a [`Stream`](crate::net::Stream) operation leaves
/// the connection in an unknown state; the stream should be dropped.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Network subsystem initialization failed: {0}")]
    Init(String),

    #[error("Failed to create socket: {0}")]
    Socket(#[source] std::io::Error),

    #[error("Failed to resolve IPv4 address {addr}")]
    Resolve { addr: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to listen: {0}")]
    Listen(#[source] std::io::Error),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Acceptor is already listening")]
    AlreadyListening,

    #[error("Acceptor is not listening")]
    NotListening,

    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Connection closed by peer after {received} of {expected} bytes")]
    Closed { received: usize, expected: usize },

    #[error("Short write: {written} of {expected} bytes accepted")]
    ShortWrite { written: usize, expected: usize },

    #[error("Read deadline elapsed after {received} of {expected} bytes")]
    Timeout { received: usize, expected: usize },

    #[error("Declared string length {len} is not below the limit {max}")]
    Oversized { len: usize, max: usize },

    #[error("Invalid string payload: {0}")]
    InvalidString(String),
}
