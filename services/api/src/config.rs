//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::TimeDelta;
use std::net::SocketAddr;
use tracing::Level;

/// Upper bound for `AUTH_SESSION_DAYS`, ten years.
pub const MAX_AUTH_SESSION_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service in demo mode: in-memory stores, no accounts.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Absence is not fatal; generation requests then fail with a configuration error.
    pub provider_api_key: Option<String>,
    pub provider_api_base: String,
    pub content_model: String,
    pub content_temperature: f32,
    pub speech_model: String,
    pub speech_voice: String,
    pub cors_origin: String,
    pub auth_session_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL");

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Provider Settings ---
        let provider_api_key = var("PROVIDER_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        let provider_api_base = var("PROVIDER_API_BASE")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        let content_model = var("CONTENT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let content_temperature = match var("CONTENT_TEMPERATURE") {
            Some(raw) => {
                let value = raw.parse::<f32>().map_err(|e| {
                    ConfigError::InvalidValue("CONTENT_TEMPERATURE".to_string(), e.to_string())
                })?;
                if !(0.0..=2.0).contains(&value) {
                    return Err(ConfigError::InvalidValue(
                        "CONTENT_TEMPERATURE".to_string(),
                        format!("{} is outside 0.0..=2.0", value),
                    ));
                }
                value
            }
            None => 0.9,
        };

        let speech_model =
            var("SPEECH_MODEL").unwrap_or_else(|| "gpt-4o-audio-preview".to_string());
        let speech_voice = var("SPEECH_VOICE").unwrap_or_else(|| "alloy".to_string());

        // --- Web Settings ---
        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());
        let auth_session_days = match var("AUTH_SESSION_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|d| (1..=MAX_AUTH_SESSION_DAYS).contains(d))
                .filter(|d| TimeDelta::try_days(*d).is_some())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "AUTH_SESSION_DAYS".to_string(),
                        format!(
                            "'{}' is not a number of days between 1 and {}",
                            raw, MAX_AUTH_SESSION_DAYS
                        ),
                    )
                })?,
            None => 30,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            provider_api_key,
            provider_api_base,
            content_model,
            content_temperature,
            speech_model,
            speech_voice,
            cors_origin,
            auth_session_days,
        })
    }

    pub fn demo_mode(&self) -> bool {
        self.database_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.demo_mode());
        assert!(config.provider_api_key.is_none());
        assert_eq!(config.content_model, "gpt-4o-mini");
        assert!((config.content_temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.auth_session_days, 30);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn provider_key_falls_back_to_openai_key() {
        let config = config_from(&[("OPENAI_API_KEY", "sk-fallback")]).unwrap();
        assert_eq!(config.provider_api_key.as_deref(), Some("sk-fallback"));

        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-fallback"),
            ("PROVIDER_API_KEY", "sk-primary"),
        ])
        .unwrap();
        assert_eq!(config.provider_api_key.as_deref(), Some("sk-primary"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = config_from(&[("PROVIDER_API_KEY", "  ")]).unwrap();
        assert!(config.provider_api_key.is_none());
    }

    #[test]
    fn api_base_loses_trailing_slash() {
        let config = config_from(&[(
            "PROVIDER_API_BASE",
            "https://generativelanguage.googleapis.com/v1beta/openai/",
        )])
        .unwrap();
        assert_eq!(
            config.provider_api_base,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"
        ));
        assert!(matches!(
            config_from(&[("CONTENT_TEMPERATURE", "3.5")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "CONTENT_TEMPERATURE"
        ));
        assert!(matches!(
            config_from(&[("AUTH_SESSION_DAYS", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "AUTH_SESSION_DAYS"
        ));
        assert!(matches!(
            config_from(&[("AUTH_SESSION_DAYS", "999999999999")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "AUTH_SESSION_DAYS"
        ));
        assert!(matches!(
            config_from(&[("AUTH_SESSION_DAYS", "3651")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "AUTH_SESSION_DAYS"
        ));
        let config = config_from(&[("AUTH_SESSION_DAYS", "3650")]).unwrap();
        assert_eq!(config.auth_session_days, MAX_AUTH_SESSION_DAYS);
        assert!(config_from(&[("RUST_LOG", "loud")]).is_err());
    }

    #[test]
    fn database_url_disables_demo_mode() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/qalbu")]).unwrap();
        assert!(!config.demo_mode());
    }
}
