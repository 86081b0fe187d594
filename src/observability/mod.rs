//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net / file_server emit tracing events
//!     → logging.rs (subscriber with env filter)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Structured fields (connection_id, address) on every lifecycle event
//! - Transfers log at trace level so hot paths stay quiet by default

pub mod logging;
