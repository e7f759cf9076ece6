use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

use crate::game::resolver::BattleRules;
use crate::storage::retry::RetryPolicy;

/// Server configuration.
///
/// Read from the built-in defaults, then an optional `Settings.toml` in the
/// working directory, then `BATTLE_*` environment variables
/// (e.g. `BATTLE_QUEUE_TIMEOUT_SECS=30`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_host: String,
    pub server_port: u16,
    pub deck_server: String,
    pub card_server: String,
    pub queue_timeout_secs: u64,
    pub round_cap: u32,
    pub rating_delta: u32,
    pub starting_rating: u32,
    pub storage_retries: u32,
    pub storage_retry_delay_ms: u64,
    pub battle_seed: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            deck_server: "http://127.0.0.1:5000".to_string(),
            card_server: "http://127.0.0.1:5000".to_string(),
            queue_timeout_secs: 60,
            round_cap: 100,
            rating_delta: 3,
            starting_rating: 100,
            storage_retries: 3,
            storage_retry_delay_ms: 100,
            battle_seed: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Settings::build(File::with_name("Settings").required(false))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("BATTLE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }

    pub fn battle_rules(&self) -> BattleRules {
        BattleRules {
            round_cap: self.round_cap,
            seed: self.battle_seed,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.storage_retries.max(1),
            delay: Duration::from_millis(self.storage_retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_match_reference_values() {
        let settings = Settings::default();
        assert_eq!(settings.queue_timeout(), Duration::from_secs(60));
        assert_eq!(settings.battle_rules().round_cap, 100);
        assert_eq!(settings.rating_delta, 3);
        assert!(settings.battle_seed.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let toml = "round_cap = 10\nbattle_seed = 7\nqueue_timeout_secs = 5";
        let settings = Settings::build(File::from_str(toml, FileFormat::Toml)).unwrap();

        assert_eq!(settings.round_cap, 10);
        assert_eq!(settings.battle_seed, Some(7));
        assert_eq!(settings.queue_timeout(), Duration::from_secs(5));
        assert_eq!(settings.server_port, 8000);
    }

    #[test]
    fn retry_policy_always_allows_one_attempt() {
        let settings = Settings {
            storage_retries: 0,
            ..Settings::default()
        };
        assert_eq!(settings.retry_policy().attempts, 1);
    }
}
