use serde::Deserialize;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub session: SessionSettings,
    pub bandit: BanditSettings,
    pub logging: LoggingConfig,
}

/// Key/value store connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `redis` or `memory`
    pub backend: String,
    pub url: String,
    /// Optional namespace prepended to every key
    pub key_prefix: Option<String>,
    pub connection_timeout_secs: u64,
}

/// Session layer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Salt mixed into session key hashes
    pub salt: String,
    /// Seconds of inactivity before a session expires
    pub ttl_secs: Option<u64>,
    /// Refresh the session expiry on every read and write
    pub refresh_on_access: bool,
}

/// Bandit engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BanditSettings {
    /// Version suffix of every experiment key
    pub key_version: String,
    /// Probability of assigning the default choice to a new session
    pub exploit_probability: f64,
    /// Persist the top-ranked choice as default when computing results
    pub persist_default_on_results: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout_secs: 5,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            salt: String::new(),
            ttl_secs: None,
            refresh_on_access: true,
        }
    }
}

impl SessionSettings {
    /// Session expiry applied on access, if any
    pub fn ttl(&self) -> Option<Duration> {
        if !self.refresh_on_access {
            return None;
        }

        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for BanditSettings {
    fn default() -> Self {
        Self {
            key_version: "v2".to_string(),
            exploit_probability: 0.9,
            persist_default_on_results: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let p = self.bandit.exploit_probability;

        if !(0.0..=1.0).contains(&p) {
            return Err(config::ConfigError::Message(format!(
                "bandit.exploit_probability must be between 0 and 1, got {}",
                p
            )));
        }

        if self.bandit.key_version.is_empty() {
            return Err(config::ConfigError::Message(
                "bandit.key_version cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, "redis");
        assert_eq!(config.bandit.key_version, "v2");
        assert_eq!(config.bandit.exploit_probability, 0.9);
        assert!(config.bandit.persist_default_on_results);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_ttl() {
        let mut session = SessionSettings {
            ttl_secs: Some(60),
            ..Default::default()
        };
        assert_eq!(session.ttl(), Some(Duration::from_secs(60)));

        session.refresh_on_access = false;
        assert_eq!(session.ttl(), None);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"store": {"backend": "memory"}, "logging": {"format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut config = AppConfig::default();
        config.bandit.exploit_probability = 1.5;
        assert!(config.validate().is_err());
    }
}
