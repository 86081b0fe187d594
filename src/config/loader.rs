//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::NetConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<NetConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<NetConfig, ConfigError> {
    let config: NetConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Which endpoint command-line overrides target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Acceptor,
    Connector,
}

/// Apply address overrides to one endpoint and validate the result.
pub fn apply_overrides(
    mut config: NetConfig,
    endpoint: Endpoint,
    ip: Option<&str>,
    port: Option<u16>,
) -> Result<NetConfig, ConfigError> {
    let (target_ip, target_port) = match endpoint {
        Endpoint::Acceptor => (&mut config.acceptor.ip, &mut config.acceptor.port),
        Endpoint::Connector => (&mut config.connector.ip, &mut config.connector.port),
    };
    if let Some(ip) = ip {
        *target_ip = Some(ip.to_string());
    }
    if let Some(port) = port {
        *target_port = port;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[file_server]\nbase_path = \"/srv/assets\"\nbuffer_size = 4096"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.file_server.base_path, "/srv/assets");
        assert_eq!(config.file_server.buffer_size, 4096);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            parse_config("[acceptor\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = parse_config("[file_server]\nmax_open_files = 0").unwrap_err();
        assert!(err.to_string().contains("file_server.max_open_files"));
    }

    #[test]
    fn overrides_are_validated() {
        let err = apply_overrides(NetConfig::default(), Endpoint::Connector, None, Some(0))
            .unwrap_err();
        assert!(err.to_string().contains("connector.port"));

        let err = apply_overrides(
            NetConfig::default(),
            Endpoint::Acceptor,
            Some("localhost"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("acceptor.ip"));
    }

    #[test]
    fn overrides_touch_only_the_selected_endpoint() {
        let config = apply_overrides(
            NetConfig::default(),
            Endpoint::Connector,
            Some("build-host"),
            Some(9000),
        )
        .unwrap();
        assert_eq!(config.connector.ip.as_deref(), Some("build-host"));
        assert_eq!(config.connector.port, 9000);
        assert_eq!(config.acceptor.ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.acceptor.port, 10001);
    }
}
