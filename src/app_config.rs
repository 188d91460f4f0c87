//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with STOA_)
//! 2. Config file (config.toml)
//! 3. Default values

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Stoa".to_string(),
            description: "A discussion forum built in Rust".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Forum display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Posts shown per thread page
    pub posts_per_page: i32,
    /// Threads shown per category page
    pub threads_per_page: i32,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 25,
            threads_per_page: 40,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub forum: ForumConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables,
            // e.g. STOA_SITE__NAME, STOA_SERVER__PORT
            .add_source(
                Environment::with_prefix("STOA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Snapshot of the current configuration.
pub fn get_app_config() -> AppConfig {
    APP_CONFIG
        .read()
        .expect("AppConfig lock poisoned")
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_file_missing() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.site.name, "Stoa");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.forum.posts_per_page, 25);
    }

    #[test]
    fn reads_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[site]
name = "Agora"
base_url = "https://agora.example"

[forum]
threads_per_page = 20
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.site.name, "Agora");
        assert_eq!(config.site.base_url, "https://agora.example");
        assert_eq!(config.forum.threads_per_page, 20);
        // Untouched sections keep their defaults.
        assert_eq!(config.forum.posts_per_page, 25);
    }
}
