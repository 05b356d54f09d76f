//! Compile-time embedded service configuration.
//!
//! The Nominatim endpoint, identifying user agent, and retry tunables
//! live in `services/nominatim.toml`, embedded via `include_str!` and
//! exposed through [`service_config`]. Tests build their own
//! [`ServiceConfig`] pointing at a mock server with zeroed delays.

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Reverse-geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Human-readable name.
    pub name: String,
    /// Reverse endpoint URL.
    pub base_url: String,
    /// Identifying client tag sent as `User-Agent` (required by the
    /// public Nominatim instance's usage policy).
    pub user_agent: String,
    /// Language preference for results.
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Total attempts for the retry loop.
    pub max_attempts: u32,
    /// Exponential backoff base in milliseconds.
    pub backoff_base_ms: u64,
    /// Escalating 429 penalty unit in milliseconds.
    pub rate_limit_penalty_ms: u64,
}

fn default_language() -> String {
    "en".to_string()
}

impl ServiceConfig {
    /// Derives the retry delay schedule from the configured tunables.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            rate_limit_penalty_unit: Duration::from_millis(self.rate_limit_penalty_ms),
        }
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

/// Returns the embedded Nominatim service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a compile-time artifact,
/// not runtime input).
#[must_use]
pub fn service_config() -> ServiceConfig {
    toml::de::from_str(NOMINATIM_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded service config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_config() {
        let config = service_config();
        assert!(config.base_url.starts_with("https://"));
        assert!(!config.user_agent.is_empty());
        assert_eq!(config.language, "en");
    }

    #[test]
    fn embedded_config_matches_usage_policy() {
        let config = service_config();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_timeout_ms, 15_000);
        assert_eq!(config.backoff_base_ms, 2_000);
        assert_eq!(config.rate_limit_penalty_ms, 10_000);
    }

    #[test]
    fn retry_policy_reflects_config() {
        let policy = service_config().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.rate_limit_penalty(1), Duration::from_secs(20));
    }
}
