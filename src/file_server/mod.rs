//! Remote file access over a single stream.
//!
//! # Data Flow
//! ```text
//! RemoteFileClient (client.rs)
//!     → Connector → Stream
//!     → requests (protocol.rs)
//!     → FileServer (server.rs) on an accepted Stream
//!     → local files under the base path
//! ```
//!
//! # Design Decisions
//! - One client per session; the server thread ends with the session
//! - Unknown handles answer with failure values instead of ending the session
//! - Oversized or escaping paths fail the open, never the server

pub mod client;
pub mod protocol;
pub mod server;

use thiserror::Error;

use crate::net::NetError;

pub use client::RemoteFileClient;
pub use protocol::{Command, OpenMode, SeekBase};
pub use server::{FileServer, FileServerHandle};

/// Errors from either side of the file protocol.
#[derive(Debug, Error)]
pub enum FileServerError {
    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Unknown command code {0}")]
    UnknownCommand(i32),

    #[error("Server could not open {0}")]
    OpenFailed(String),

    #[error("Server has no free file handles")]
    HandleTableFull,

    #[error("Unknown or unusable file handle {0}")]
    InvalidHandle(u32),

    #[error("Remote {0} failed")]
    RemoteFailure(&'static str),

    #[error("Transfer of {0} bytes exceeds the protocol limit")]
    TooLarge(usize),

    #[error("File server thread error: {0}")]
    Thread(String),
}
