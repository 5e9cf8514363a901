//! Server configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via RCOND_CONFIG)
//! 3. Environment variables

use crate::server::ServerConfig;
use rcon_protocol::{DEFAULT_PORT, MAX_FRAME_LEN};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("RCOND_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.network.apply_env_overrides();
        self.auth.apply_env_overrides();
    }

    /// Loads the password from an external file if configured.
    pub fn load_secrets(&mut self) -> Result<(), ConfigError> {
        self.auth.load_secrets()
    }

    /// Converts the file/env configuration into a runtime server config.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.network.bind_addr,
            password: self.auth.password.clone(),
            idle_timeout: self.network.idle_timeout(),
            max_connections: self.network.max_connections,
            max_frame_len: self.network.max_frame_len,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind to.
    #[serde(with = "socket_addr_serde")]
    pub bind_addr: SocketAddr,
    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Maximum accepted frame length in bytes.
    pub max_frame_len: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            idle_timeout_secs: 120,
            max_connections: 128,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("RCOND_BIND") {
            if let Ok(parsed) = addr.parse() {
                self.bind_addr = parsed;
            }
        }

        if let Ok(timeout) = std::env::var("RCOND_IDLE_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.idle_timeout_secs = secs;
            }
        }

        if let Ok(max) = std::env::var("RCOND_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse() {
                self.max_connections = n;
            }
        }

        if let Ok(max) = std::env::var("RCOND_MAX_FRAME_LEN") {
            if let Ok(n) = max.parse() {
                self.max_frame_len = n;
            }
        }
    }

    /// Returns idle timeout as Duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// The password clients must present. The compare is exact and
    /// case-sensitive; with no password set, every authentication attempt
    /// is rejected.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional path to a file holding the password (first non-empty,
    /// non-comment line). Takes precedence over `password` when set.
    #[serde(default)]
    pub password_file: Option<PathBuf>,
}

impl AuthConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("RCOND_PASSWORD") {
            if !password.is_empty() {
                self.password = Some(password);
            }
        }

        if let Ok(path) = std::env::var("RCOND_PASSWORD_FILE") {
            self.password_file = Some(PathBuf::from(path));
        }
    }

    /// Loads the password from the password file if configured.
    pub fn load_secrets(&mut self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.password_file {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(path.clone(), e))?;
            for line in content.lines() {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    self.password = Some(line.to_string());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Returns whether a usable password is configured.
    pub fn is_enabled(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Custom serde module for SocketAddr (to handle as string in YAML).
mod socket_addr_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::net::SocketAddr;

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.network.idle_timeout(), Duration::from_secs(120));
        assert!(config.auth.password.is_none());
        assert!(!config.auth.is_enabled());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.network.bind_addr, config.network.bind_addr);
        assert_eq!(
            parsed.network.idle_timeout_secs,
            config.network.idle_timeout_secs
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "network:\n  bind_addr: \"0.0.0.0:27016\"\n  idle_timeout_secs: 30\nauth:\n  password: hunter2"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.network.bind_addr.port(), 27016);
        assert_eq!(config.network.idle_timeout_secs, 30);
        assert_eq!(config.auth.password.as_deref(), Some("hunter2"));
        assert!(config.auth.is_enabled());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_, _))));
    }

    #[test]
    fn test_password_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment\n\nsw0rdfish").unwrap();

        let mut auth = AuthConfig {
            password_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        auth.load_secrets().unwrap();
        assert_eq!(auth.password.as_deref(), Some("sw0rdfish"));
    }

    #[test]
    fn test_to_server_config() {
        let mut config = Config::default();
        config.auth.password = Some("pw".to_string());
        config.network.idle_timeout_secs = 7;

        let server_config = config.to_server_config();
        assert_eq!(server_config.password.as_deref(), Some("pw"));
        assert_eq!(server_config.idle_timeout, Duration::from_secs(7));
    }
}
