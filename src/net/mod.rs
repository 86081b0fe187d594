//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! subsystem.rs (process-wide init, once)
//!
//! Server side:
//!     acceptor.rs (bind, listen backlog 10, accept)
//!     → Stream owning the accepted socket
//!
//! Client side:
//!     connector.rs (resolve, connect)
//!     → Stream owning the connected socket
//!
//! Stream states:
//!     Connected → Closed (on drop)
//! ```
//!
//! # Design Decisions
//! - Everything blocks the calling thread; callers bring their own threads
//! - Factories hand sockets over; they never keep a stream's socket
//! - Every failure is an explicit `Err`, the stream is then unusable

pub mod acceptor;
pub mod connection;
pub mod connector;
pub mod error;
pub mod stream;
pub mod subsystem;
pub mod wire;

pub use acceptor::Acceptor;
pub use connection::ConnectionId;
pub use connector::Connector;
pub use error::NetError;
pub use stream::{Stream, Transport};
pub use subsystem::NetworkGuard;
pub use wire::WireValue;
