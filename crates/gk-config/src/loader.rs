//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "gatekeeper.toml",
    "./config/config.toml",
    "./config/gatekeeper.toml",
    "/etc/gatekeeper/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, |key| env::var(key).ok());

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("GATEKEEPER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `GATEKEEPER_*` overrides. `lookup` is `std::env::var` outside tests.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("GATEKEEPER_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("GATEKEEPER_HTTP_HOST") {
        config.http.host = val;
    }

    // Logging
    if let Some(val) = lookup("GATEKEEPER_LOG_FORMAT") {
        config.logging.format = val;
    }
    if let Some(val) = lookup("GATEKEEPER_LOG_LEVEL") {
        config.logging.level = val;
    }

    // Storage
    if let Some(val) = lookup("GATEKEEPER_STORAGE_BACKEND") {
        config.storage.backend = val;
    }
    if let Some(val) = lookup("GATEKEEPER_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("GATEKEEPER_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Auth
    if let Some(val) = lookup("GATEKEEPER_JWT_SECRET") {
        config.auth.jwt.secret = val;
    }
    if let Some(val) = lookup("GATEKEEPER_JWT_ISSUER") {
        config.auth.jwt.issuer = val;
    }
    if let Some(val) = lookup("GATEKEEPER_JWT_AUDIENCE") {
        config.auth.jwt.audience = val;
    }
    if let Some(secs) = lookup("GATEKEEPER_JWT_EXPIRY_SECS").and_then(|v| v.parse().ok()) {
        config.auth.jwt.access_token_expiry_secs = secs;
    }
    if let Some(len) = lookup("GATEKEEPER_PASSWORD_MIN_LENGTH").and_then(|v| v.parse().ok()) {
        config.auth.password.min_length = len;
    }
    if let Some(val) = lookup("GATEKEEPER_PASSWORD_STRICT") {
        config.auth.password.strict = val.parse().unwrap_or(true);
    }
    if let Some(hours) = lookup("GATEKEEPER_VERIFICATION_TTL_HOURS").and_then(|v| v.parse().ok()) {
        config.auth.tokens.verification_ttl_hours = hours;
    }
    if let Some(mins) = lookup("GATEKEEPER_RESET_TTL_MINUTES").and_then(|v| v.parse().ok()) {
        config.auth.tokens.reset_ttl_minutes = mins;
    }

    // Email
    if let Some(val) = lookup("GATEKEEPER_EMAIL_FROM") {
        config.email.from = val;
    }
    if let Some(val) = lookup("GATEKEEPER_APP_BASE_URL") {
        config.email.app_base_url = val;
    }

    // Events
    if let Some(secs) = lookup("GATEKEEPER_EVENTS_DRAIN_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.events.drain_timeout_secs = secs;
    }

    // General
    if let Some(val) = lookup("GATEKEEPER_DEV_MODE") {
        config.dev_mode = val.parse().unwrap_or(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            overrides(&[
                ("GATEKEEPER_HTTP_PORT", "9000"),
                ("GATEKEEPER_STORAGE_BACKEND", "memory"),
                ("GATEKEEPER_JWT_SECRET", "from-env"),
                ("GATEKEEPER_RESET_TTL_MINUTES", "15"),
                ("GATEKEEPER_DEV_MODE", "true"),
            ]),
        );

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.auth.jwt.secret, "from-env");
        assert_eq!(config.auth.tokens.reset_ttl_minutes, 15);
        assert!(config.dev_mode);
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, overrides(&[("GATEKEEPER_HTTP_PORT", "eighty")]));
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_loader_with_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mongodb]\ndatabase = \"gk_test\"").unwrap();

        let config = ConfigLoader::with_path(file.path()).load().unwrap();
        assert_eq!(config.mongodb.database, "gk_test");
    }
}
