//! Gatekeeper Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub events: EventsConfig,

    /// Enable development mode
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            mongodb: MongoConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            events: EventsConfig::default(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format: text, json
    pub format: String,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type: mongodb, memory
    pub backend: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "mongodb".to_string(),
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "gatekeeper".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub tokens: TokenConfig,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "gatekeeper".to_string(),
            audience: "gatekeeper".to_string(),
            access_token_expiry_secs: 3600, // 1 hour
        }
    }
}

/// Password policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    /// Require upper, lower, digit and special characters
    pub strict: bool,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 12,
            strict: true,
        }
    }
}

/// Longest accepted verification token lifetime (one year)
pub const MAX_VERIFICATION_TTL_HOURS: i64 = 24 * 365;
/// Longest accepted reset token lifetime (one week)
pub const MAX_RESET_TTL_MINUTES: i64 = 60 * 24 * 7;

/// One-time token lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub verification_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            verification_ttl_hours: 24,
            reset_ttl_minutes: 60,
        }
    }
}

/// Outgoing email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub from: String,
    /// Base URL used to build links in emails
    pub app_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: "no-reply@gatekeeper.local".to_string(),
            app_base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Domain event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// How long shutdown waits for in-flight event deliveries
    pub drain_timeout_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check settings that have no safe default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt.secret.is_empty() && !self.dev_mode {
            return Err(ConfigError::ValidationError(
                "auth.jwt.secret must be set outside dev mode".to_string(),
            ));
        }
        match self.storage.backend.as_str() {
            "mongodb" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown storage backend '{}'",
                    other
                )))
            }
        }
        let tokens = &self.auth.tokens;
        if tokens.verification_ttl_hours <= 0 || tokens.reset_ttl_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if tokens.verification_ttl_hours > MAX_VERIFICATION_TTL_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "auth.tokens.verification_ttl_hours must not exceed {}",
                MAX_VERIFICATION_TTL_HOURS
            )));
        }
        if tokens.reset_ttl_minutes > MAX_RESET_TTL_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "auth.tokens.reset_ttl_minutes must not exceed {}",
                MAX_RESET_TTL_MINUTES
            )));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Gatekeeper Configuration
# Environment variables (GATEKEEPER_*) override these settings

[http]
port = 8080
host = "0.0.0.0"

[logging]
format = "text"  # text or json
level = "info"

[storage]
backend = "mongodb"  # mongodb or memory

[mongodb]
uri = "mongodb://localhost:27017"
database = "gatekeeper"

[auth.jwt]
secret = ""
issuer = "gatekeeper"
audience = "gatekeeper"
access_token_expiry_secs = 3600

[auth.password]
min_length = 12
strict = true

[auth.tokens]
verification_ttl_hours = 24
reset_ttl_minutes = 60

[email]
from = "no-reply@gatekeeper.local"
app_base_url = "http://localhost:8080"

[events]
drain_timeout_secs = 10

dev_mode = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.mongodb.database, "gatekeeper");
        assert_eq!(config.auth.tokens.verification_ttl_hours, 24);
        assert_eq!(config.auth.tokens.reset_ttl_minutes, 60);
        assert_eq!(config.events.drain_timeout_secs, 10);
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.storage.backend, "mongodb");
        assert_eq!(config.auth.jwt.access_token_expiry_secs, 3600);
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9090\n\n[auth.jwt]\nsecret = \"s3cret\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.auth.jwt.secret, "s3cret");
        assert_eq!(config.auth.jwt.issuer, "gatekeeper");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validate_requires_secret_outside_dev_mode() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.dev_mode = true;
        assert!(config.validate().is_ok());

        config.dev_mode = false;
        config.auth.jwt.secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.dev_mode = true;
        for backend in ["postgres", "memroy", ""] {
            config.storage.backend = backend.to_string();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_validate_bounds_token_lifetimes() {
        let mut config = AppConfig::default();
        config.dev_mode = true;
        config.auth.tokens.verification_ttl_hours = MAX_VERIFICATION_TTL_HOURS;
        config.auth.tokens.reset_ttl_minutes = MAX_RESET_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.auth.tokens.verification_ttl_hours = i64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.auth.tokens.verification_ttl_hours = 24;
        config.auth.tokens.reset_ttl_minutes = MAX_RESET_TTL_MINUTES + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
