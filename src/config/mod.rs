use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Route the hosting application navigates to when the session expires
    pub login_route: String,
    /// Directory holding `session.json`; `None` means the per-user default
    pub storage_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub default_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("API base URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("HOME environment variable not set")]
    MissingHome,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("INSTITUTE_API_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                self.api.base_url = trimmed.to_string();
            }
        }
        if let Ok(v) = env::var("API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_LOGIN_ROUTE") {
            if !v.trim().is_empty() {
                self.session.login_route = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("INSTITUTE_ADMIN_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.session.storage_dir = Some(PathBuf::from(v));
            }
        }

        // Logging overrides
        if let Ok(v) = env::var("LOG_FILTER") {
            if !v.trim().is_empty() {
                self.logging.default_filter = v;
            }
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                enable_request_logging: true,
            },
            session: SessionConfig {
                login_route: DEFAULT_LOGIN_ROUTE.to_string(),
                storage_dir: None,
            },
            logging: LoggingConfig {
                default_filter: "institute_admin=debug".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                enable_request_logging: true,
            },
            session: SessionConfig {
                login_route: DEFAULT_LOGIN_ROUTE.to_string(),
                storage_dir: None,
            },
            logging: LoggingConfig {
                default_filter: "institute_admin=info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                enable_request_logging: false,
            },
            session: SessionConfig {
                login_route: DEFAULT_LOGIN_ROUTE.to_string(),
                storage_dir: None,
            },
            logging: LoggingConfig {
                default_filter: "warn".to_string(),
            },
        }
    }

    /// Config pointing at an explicit backend, used by embedders and tests
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.api.base_url.clone(),
            source,
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Directory holding persisted CLI state, created on demand
    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.session.storage_dir {
            return Ok(dir.clone());
        }

        let home = env::var("HOME").map_err(|_| ConfigError::MissingHome)?;
        Ok(PathBuf::from(home).join(".config").join("institute-admin"))
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.api.enable_request_logging);
        assert_eq!(config.session.login_route, "/login");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.logging.default_filter, "warn");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn validate_rejects_bad_base_urls() {
        assert!(AppConfig::for_base_url("http://localhost:5000/api").validate().is_ok());
        assert!(matches!(
            AppConfig::for_base_url("not a url").validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            AppConfig::for_base_url("ftp://example.com").validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = AppConfig::development();
        config.api.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let mut config = AppConfig::development();
        config.session.storage_dir = Some(PathBuf::from("/tmp/institute-admin-test"));
        assert_eq!(
            config.storage_dir().ok(),
            Some(PathBuf::from("/tmp/institute-admin-test"))
        );
    }
}
