//! Client configuration
//!
//! Loaded from `glimps.toml` (every section optional), then overridden by
//! environment variables. A `.env` file in the working directory is read
//! first so overrides can live there.
//!
//! ```toml
//! [api]
//! base_url = "https://glimps.example.org"
//! timeout_secs = 30
//!
//! [auth]
//! token_ttl_secs = 900
//! refresh_margin_secs = 30
//!
//! [jobs]
//! poll_interval_secs = 5
//! max_backoff_secs = 60
//!
//! [viewer]
//! background_color = "white"
//! antialias = true
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use crate::api::ClientOptions;
use crate::jobs::PollerConfig;
use crate::viewer::{EngineOptions, LIBRARY_URL};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_API_URL: &str = "GLIMPS_API_URL";
pub const ENV_SESSION_FILE: &str = "GLIMPS_SESSION_FILE";
pub const ENV_LOG: &str = "GLIMPS_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Root configuration loaded from glimps.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlimpsConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= API Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// How long a fetched access token is reused.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Refetch this long before the reuse window ends.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,

    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_token_ttl_secs() -> u64 {
    900
}

fn default_refresh_margin_secs() -> u64 {
    30
}

fn default_session_file() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".glimps").join("session.json")
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            refresh_margin_secs: default_refresh_margin_secs(),
            session_file: default_session_file(),
        }
    }
}

// ============= Jobs Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_backoff_secs() -> u64 {
    60
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

// ============= Viewer Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_antialias")]
    pub antialias: bool,

    /// Where exported scenes load 3Dmol.js from.
    #[serde(default = "default_library_url")]
    pub library_url: String,
}

fn default_background_color() -> String {
    "white".to_string()
}

fn default_antialias() -> bool {
    true
}

fn default_library_url() -> String {
    LIBRARY_URL.to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            antialias: default_antialias(),
            library_url: default_library_url(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl GlimpsConfig {
    /// Parse a configuration file without applying environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: GlimpsConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists (defaults otherwise), then apply `.env` and
    /// environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let mut config = if path.exists() {
            debug!(path = %path.display(), "Loading configuration");
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            GlimpsConfig::default()
        };

        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(file) = lookup(ENV_SESSION_FILE).filter(|v| !v.is_empty()) {
            self.auth.session_file = PathBuf::from(file);
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "api.base_url '{}' is not a valid URL: {}",
                self.api.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.auth.refresh_margin_secs >= self.auth.token_ttl_secs {
            return Err(ConfigError::ValidationError(format!(
                "auth.refresh_margin_secs ({}) must be smaller than auth.token_ttl_secs ({})",
                self.auth.refresh_margin_secs, self.auth.token_ttl_secs
            )));
        }
        if self.jobs.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "jobs.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.jobs.max_backoff_secs < self.jobs.poll_interval_secs {
            return Err(ConfigError::ValidationError(
                "jobs.max_backoff_secs must not be smaller than jobs.poll_interval_secs".to_string(),
            ));
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.api.timeout_secs),
            token_ttl: Duration::from_secs(self.auth.token_ttl_secs),
            refresh_margin: Duration::from_secs(self.auth.refresh_margin_secs),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new(
            Duration::from_secs(self.jobs.poll_interval_secs),
            Duration::from_secs(self.jobs.max_backoff_secs),
        )
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            background_color: self.viewer.background_color.clone(),
            antialias: self.viewer.antialias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GlimpsConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.auth.token_ttl_secs, 900);
        assert_eq!(config.jobs.poll_interval_secs, 5);
        assert_eq!(config.viewer.background_color, "white");
        assert!(config.viewer.antialias);
        assert!(config.auth.session_file.ends_with(".glimps/session.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glimps.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://glimps.example.org"

[jobs]
poll_interval_secs = 10
"#,
        )
        .unwrap();

        let config = GlimpsConfig::from_file(&path).unwrap();
        assert_eq!(config.api.base_url, "https://glimps.example.org");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.jobs.poll_interval_secs, 10);
        assert_eq!(config.jobs.max_backoff_secs, 60);
        assert_eq!(config.poller_config().interval, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://api.glimps.dev"),
            (ENV_SESSION_FILE, "/tmp/s.json"),
            (ENV_LOG, ""),
        ]
        .into_iter()
        .collect();

        let mut config = GlimpsConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, "https://api.glimps.dev");
        assert_eq!(config.auth.session_file, PathBuf::from("/tmp/s.json"));
        // Empty values are ignored
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = GlimpsConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = GlimpsConfig::default();
        config.auth.refresh_margin_secs = 900;
        assert!(config.validate().is_err());

        let mut config = GlimpsConfig::default();
        config.jobs.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glimps.toml");
        fs::write(&path, "[api\nbase_url = 1").unwrap();
        assert!(matches!(
            GlimpsConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
