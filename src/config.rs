use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Nominal cap on an assembled request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 512 * 1024; // 512 KiB

/// Process-wide, read-only server configuration.
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub buffer_size: usize,

    pub max_header_size: usize,
    pub max_body_size: usize,

    #[serde(deserialize_with = "deserialize_duration")]
    pub read_timeout: Duration,

    pub api_username: String,
    pub api_password: String,
    pub auth_realm: String,

    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            buffer_size: 4096,

            max_header_size: 8192,
            max_body_size: DEFAULT_MAX_BODY_SIZE,

            read_timeout: Duration::from_secs(30),

            api_username: String::new(),
            api_password: String::new(),
            auth_realm: "JSON API".to_string(),

            server_name: "apinet/0.1".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ServerConfig>(content)
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            port = 5171
            api_username = "user"
            api_password = "pa:ss"
            read_timeout = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 5171);
        assert_eq!(config.api_username, "user");
        assert_eq!(config.api_password, "pa:ss");
        assert_eq!(config.read_timeout, Duration::from_millis(2500));
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
        assert_eq!(config.auth_realm, "JSON API");
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(ServerConfig::from_toml("read_timeout = -1.0").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/apinet.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/apinet.toml"));
    }
}
