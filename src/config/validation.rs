//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, sizes, timeouts)
//! - Check addresses parse as IPv4 where a literal is required
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: &NetConfig → Result<(), Vec<ValidationError>>

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::config::schema::NetConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not an IPv4 address")]
    InvalidIp { field: &'static str, value: String },

    #[error("{field}: must not be zero")]
    Zero { field: &'static str },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &NetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(ip) = &config.acceptor.ip {
        if ip.parse::<Ipv4Addr>().is_err() {
            errors.push(ValidationError::InvalidIp {
                field: "acceptor.ip",
                value: ip.clone(),
            });
        }
    }

    if let Some(ip) = &config.connector.ip {
        if ip.is_empty() {
            errors.push(ValidationError::Empty { field: "connector.ip" });
        }
    }

    if config.connector.port == 0 {
        errors.push(ValidationError::Zero { field: "connector.port" });
    }

    if config.connector.connect_timeout_ms == Some(0) {
        errors.push(ValidationError::Zero {
            field: "connector.connect_timeout_ms",
        });
    }

    // A zero socket read timeout is rejected by the OS.
    if config.stream.read_deadline_ms == Some(0) {
        errors.push(ValidationError::Zero {
            field: "stream.read_deadline_ms",
        });
    }

    if config.file_server.base_path.is_empty() {
        errors.push(ValidationError::Empty {
            field: "file_server.base_path",
        });
    }

    if config.file_server.buffer_size == 0 {
        errors.push(ValidationError::Zero {
            field: "file_server.buffer_size",
        });
    }

    if config.file_server.max_open_files == 0 {
        errors.push(ValidationError::Zero {
            field: "file_server.max_open_files",
        });
    }

    if config.file_server.max_path_length == 0 {
        errors.push(ValidationError::Zero {
            field: "file_server.max_path_length",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&NetConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = NetConfig::default();
        config.acceptor.ip = Some("localhost".into());
        config.connector.port = 0;
        config.stream.read_deadline_ms = Some(0);
        config.file_server.buffer_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero {
            field: "connector.port"
        }));
        assert!(errors.contains(&ValidationError::InvalidIp {
            field: "acceptor.ip",
            value: "localhost".into(),
        }));
    }

    #[test]
    fn wildcard_acceptor_is_valid() {
        let mut config = NetConfig::default();
        config.acceptor.ip = None;
        assert!(validate_config(&config).is_ok());
    }
}
