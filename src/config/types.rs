//! Core configuration types.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::limits::LimitsConfig;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
///
/// Every section is optional; a missing file section falls back to its
/// defaults, so `Config::default()` is a standalone root on port 5001.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings.
    pub server: ServerConfig,
    /// Upstream link. Absent on the root.
    pub parent: Option<ParentConfig>,
    /// Protocol and resource limits.
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:5001").
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], ibrc_proto::DEFAULT_SERVER_PORT))
}

/// Upstream server to attach to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParentConfig {
    /// Parent hostname or IP.
    pub host: String,
    /// Parent port.
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 5001);
        assert!(config.parent.is_none());
        assert_eq!(config.limits.max_line_len, 2048);
        assert_eq!(config.limits.max_channel_len, 13);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
listen = "127.0.0.1:6001"

[parent]
host = "hub.example"
port = 5001

[limits]
max_nick_len = 9
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:6001".parse().unwrap());
        assert_eq!(
            config.parent,
            Some(ParentConfig {
                host: "hub.example".into(),
                port: 5001
            })
        );
        assert_eq!(config.limits.max_nick_len, 9);
        assert_eq!(config.limits.max_outbound_queue, 1024);
    }

    #[test]
    fn bad_files_are_reported() {
        assert!(matches!(
            Config::load("/nonexistent/ibrcd.toml"),
            Err(ConfigError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten = 12").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }
}
