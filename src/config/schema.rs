//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so a partial (or empty) file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetConfig {
    /// Listening endpoint.
    pub acceptor: AcceptorConfig,

    /// Outbound connection target and limits.
    pub connector: ConnectorConfig,

    /// Per-stream settings.
    pub stream: StreamConfig,

    /// Remote file server settings.
    pub file_server: FileServerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Acceptor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcceptorConfig {
    /// IPv4 address to bind; absent binds every interface.
    pub ip: Option<String>,

    /// Port to bind.
    pub port: u16,
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        Self {
            ip: Some("127.0.0.1".to_string()),
            port: 10001,
        }
    }
}

/// Connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Target host (dotted quad or name).
    pub ip: Option<String>,

    /// Target port.
    pub port: u16,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            ip: Some("127.0.0.1".to_string()),
            port: 10001,
            connect_timeout_ms: Some(5_000),
        }
    }
}

/// Stream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StreamConfig {
    /// Read deadline in milliseconds; absent blocks indefinitely.
    pub read_deadline_ms: Option<u64>,
}

impl StreamConfig {
    /// The read deadline as a duration.
    pub fn read_deadline(&self) -> Option<Duration> {
        self.read_deadline_ms.map(Duration::from_millis)
    }
}

/// Remote file server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Directory that relative request paths are resolved against.
    pub base_path: String,

    /// Chunk size for streamed file reads and writes.
    pub buffer_size: usize,

    /// Maximum simultaneously open file handles.
    pub max_open_files: usize,

    /// Longest accepted path (terminator included).
    pub max_path_length: usize,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            base_path: ".".to_string(),
            buffer_size: 64 * 1024,
            max_open_files: 1024,
            max_path_length: 260,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "blocknet=info".to_string(),
        }
    }
}
