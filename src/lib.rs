//! Blocking TCP networking core.
//!
//! Acceptor, connector and stream primitives for remote links (profiler,
//! remote debugging, remote file access), plus a remote file server built
//! on them.

pub mod config;
pub mod echo;
pub mod file_server;
pub mod net;
pub mod observability;

pub use config::NetConfig;
pub use net::{Acceptor, Connector, NetError, Stream};
