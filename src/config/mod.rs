use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timing knobs for a device session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a read waits for its matching response.
    pub response_timeout_ms: u64,
    /// Sleep between drain attempts while waiting for a response.
    pub poll_interval_ms: u64,
    /// Idle interval at which the worker checks for notifications. 0 disables.
    pub notification_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 2000,
            poll_interval_ms: 50,
            notification_poll_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notification_poll(&self) -> Option<Duration> {
        (self.notification_poll_ms > 0).then(|| Duration::from_millis(self.notification_poll_ms))
    }
}

/// Application configuration stored as TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Device Bluetooth address.
    pub device_address: Option<String>,
    /// RFCOMM channel the SPP service listens on.
    #[serde(default = "default_port")]
    pub port: u8,
    /// Per-read wait inside the transport's `receive_all`.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_port() -> u8 {
    1
}

fn default_read_timeout_ms() -> u64 {
    200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_address: None,
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Config file path: ~/.config/freebuds/config.toml
    pub fn path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freebuds");
        config_dir.join("config.toml")
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Load config from the default location, or return defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }
        Self::default()
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::invalid(format!("config: {}", e)))
    }

    /// Save config to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| Error::invalid(format!("config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.response_timeout(), Duration::from_millis(2000));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.notification_poll(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_notification_poll_disabled() {
        let config = SessionConfig {
            notification_poll_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.notification_poll(), None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::parse(
            r#"
            device_address = "AA:BB:CC:DD:EE:FF"

            [session]
            response_timeout_ms = 3000
            "#,
        )
        .unwrap();

        assert_eq!(config.device_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(config.port, 1);
        assert_eq!(config.read_timeout_ms, 200);
        assert_eq!(config.session.response_timeout_ms, 3000);
        assert_eq!(config.session.poll_interval_ms, 50);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(matches!(
            AppConfig::parse("port = \"sixteen\""),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("freebuds-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let config = AppConfig {
            device_address: Some("11:22:33:44:55:66".into()),
            port: 16,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/freebuds/config.toml");
        assert_eq!(AppConfig::load_from(path), AppConfig::default());
    }
}
