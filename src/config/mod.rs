//! Layered configuration for clipshare
//!
//! Settings resolve in priority order: struct defaults, then an optional TOML
//! file (`config/clipshare.toml`, or the path in `CLIPSHARE_CONFIG`), then
//! environment variables shaped as `CLIPSHARE__<section>__<key>`:
//!
//! - `CLIPSHARE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `CLIPSHARE__SERVER__PUBLIC_BASE_URL=https://clips.example.com`
//! - `CLIPSHARE__FETCH__MAX_CLIP_BYTES=500MB`
//!
//! The bot credential is environment-only (`CLIPSHARE_BOT_TOKEN`, falling back
//! to `DISCORD_BOT_TOKEN`), never read from the file.
//!
//! ```no_run
//! use clipshare::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::ByteSize;
pub use models::{Config, FetchConfig, GatewayConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`CLIPSHARE__*`)
    /// 2. TOML file (default: `config/clipshare.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (bad base URL, zero timeouts, empty paths).
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = sources::load()?;
        config.normalize();
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        config.normalize();
        validation::validate(&config)?;
        Ok(config)
    }

    /// Strip the trailing slash so `<base>/<file>` joins cleanly.
    fn normalize(&mut self) {
        while self.server.public_base_url.ends_with('/') {
            self.server.public_base_url.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
public_base_url = "https://clips.example.com"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.server.public_base_url, "https://clips.example.com");
        assert_eq!(config.fetch.connect_timeout_secs, 10);
    }

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            "[server]\npublic_base_url = \"https://clips.example.com/\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.server.public_base_url, "https://clips.example.com");
    }

    #[test]
    fn test_validation_catches_bad_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            "[server]\npublic_base_url = \"clips.example.com\"\n",
        )
        .unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"
public_base_url = "https://clips.example.com"
downloads_dir = "downloads"

[fetch]
connect_timeout_secs = 10
job_timeout_secs = 300
max_clip_bytes = "2GB"
user_agent = "clipshare/0.1.0"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(
            config.fetch.max_clip_bytes.as_u64(),
            2 * 1024 * 1024 * 1024
        );
        assert!(config.gateway.bot_token.is_none());
    }
}
