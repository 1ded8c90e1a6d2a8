use axum::http::HeaderValue;
use immersion_core::BodyPolicy;
use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_UPSTREAM_SESSIONS_URL: &str = "https://api.openai.com/v1/realtime/sessions";
pub const DEFAULT_VERSION_TAG: &str = "v2025-11-01";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Absent is not fatal: the service starts and answers every session
    /// request with a configuration error instead.
    pub openai_api_key: Option<SecretString>,
    pub upstream_sessions_url: String,
    pub body_policy: BodyPolicy,
    pub upstream_timeout: Option<Duration>,
    pub version_tag: HeaderValue,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let upstream_sessions_url = std::env::var("UPSTREAM_SESSIONS_URL")
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_SESSIONS_URL.to_string());
        if !upstream_sessions_url.starts_with("http://")
            && !upstream_sessions_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "UPSTREAM_SESSIONS_URL".to_string(),
                format!("'{}' is not an http(s) URL", upstream_sessions_url),
            ));
        }

        let body_policy = match std::env::var("MALFORMED_BODY_POLICY") {
            Ok(value) => value.parse::<BodyPolicy>().map_err(|e| {
                ConfigError::InvalidValue("MALFORMED_BODY_POLICY".to_string(), e)
            })?,
            Err(_) => BodyPolicy::default(),
        };

        let upstream_timeout = match std::env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "UPSTREAM_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", value),
                    ));
                }
            },
            Err(_) => None,
        };

        let version_tag_str =
            std::env::var("RELAY_VERSION_TAG").unwrap_or_else(|_| DEFAULT_VERSION_TAG.to_string());
        let version_tag = HeaderValue::from_str(&version_tag_str).map_err(|e| {
            ConfigError::InvalidValue("RELAY_VERSION_TAG".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            openai_api_key,
            upstream_sessions_url,
            body_policy,
            upstream_timeout,
            version_tag,
            log_level,
        })
    }
}
