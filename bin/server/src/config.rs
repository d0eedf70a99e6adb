//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, nested keys
//! separated by `__` (for example `PEOPLE__USER_LIMIT=25`).

use cutlist_people::PeopleSettings;
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Person resource configuration.
    #[serde(default)]
    pub people: PeopleConfig,

    /// Event bus configuration.
    #[serde(default)]
    pub nats: NatsConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Lifetime of access tokens for persons without an expiration date.
    #[serde(default = "default_token_duration_days")]
    pub token_duration_days: i64,
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_token_duration_days() -> i64 {
    7
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            token_duration_days: default_token_duration_days(),
        }
    }
}

/// Person resource configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeopleConfig {
    /// Emails of accounts that may never be deactivated.
    ///
    /// Given as a comma-separated list in the environment.
    #[serde(default, deserialize_with = "comma_separated")]
    pub protected_accounts: Vec<String>,

    /// Maximum number of active non-bot persons; unset means unlimited.
    #[serde(default)]
    pub user_limit: Option<u64>,
}

impl From<PeopleConfig> for PeopleSettings {
    fn from(config: PeopleConfig) -> Self {
        Self {
            protected_accounts: config.protected_accounts,
            user_limit: config.user_limit,
        }
    }
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect())
}

/// NATS event bus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL. Without one, events are only logged.
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix of event subjects, e.g. `cutlist` gives `cutlist.person.update`.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_subject_prefix() -> String {
    "cutlist".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, config::ConfigError> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_source(config::Environment::default().source(Some(source)))
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert_eq!(config.token_duration_days, 7);
    }

    #[test]
    fn loads_nested_values() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cutlist"),
            ("PEOPLE__USER_LIMIT", "25"),
            ("PEOPLE__PROTECTED_ACCOUNTS", "admin@example.com, root@example.com"),
            ("NATS__URL", "nats://localhost:4222"),
        ])
        .expect("config");

        assert_eq!(config.database_url, "postgres://localhost/cutlist");
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.people.user_limit, Some(25));
        assert_eq!(
            config.people.protected_accounts,
            vec!["admin@example.com", "root@example.com"]
        );
        assert_eq!(config.nats.url.as_deref(), Some("nats://localhost:4222"));
        assert_eq!(config.nats.subject_prefix, "cutlist");
    }

    #[test]
    fn database_url_is_required() {
        assert!(load(&[]).is_err());
    }
}
