//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Loaded from the global config file (~/.config/tripweaver/config.toml)
//! and TRIPWEAVER_* environment variables.

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderConfig;
use crate::ai::retry::RetryPolicy;
use crate::constants::{planner, retry};
use crate::geo::GeocoderConfig;
use crate::types::PlannerError;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Completion provider settings
    pub llm: ProviderConfig,

    /// Geocoding service settings
    pub geocoder: GeocoderConfig,

    /// Planning pipeline settings
    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: ProviderConfig::default(),
            geocoder: GeocoderConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PlannerError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(PlannerError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(PlannerError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.geocoder.timeout_secs == 0 {
            return Err(PlannerError::Config(
                "Geocoder timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.planner.places_per_day == 0 {
            return Err(PlannerError::Config(
                "planner places_per_day must be greater than 0".to_string(),
            ));
        }

        if self.planner.geocode_parallelism == 0 {
            return Err(PlannerError::Config(
                "planner geocode_parallelism must be greater than 0".to_string(),
            ));
        }

        if self.planner.max_days == 0 {
            return Err(PlannerError::Config(
                "planner max_days must be greater than 0".to_string(),
            ));
        }

        if self.planner.retry.max_attempts == 0 {
            return Err(PlannerError::Config(
                "retry max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.planner.retry.backoff_factor < 1.0 {
            return Err(PlannerError::Config(format!(
                "retry backoff_factor must be at least 1.0, got {}",
                self.planner.retry.backoff_factor
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Planner Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Itinerary candidates requested per trip day
    pub places_per_day: usize,

    /// Concurrent geocoding requests within one turn
    pub geocode_parallelism: usize,

    /// Upper bound on trip length in days
    pub max_days: u32,

    /// Retry behavior for upstream calls
    pub retry: RetryConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            places_per_day: planner::PLACES_PER_DAY,
            geocode_parallelism: planner::GEOCODE_PARALLELISM,
            max_days: planner::DEFAULT_MAX_DAYS,
            retry: RetryConfig::default(),
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per upstream call, initial attempt included
    pub max_attempts: u8,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Backoff cap in seconds
    pub max_delay_secs: u64,

    /// Backoff multiplier
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_delay_secs: retry::MAX_DELAY_SECS,
            backoff_factor: retry::BACKOFF_FACTOR,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: std::time::Duration::from_millis(self.base_delay_ms),
            max_delay: std::time::Duration::from_secs(self.max_delay_secs),
            backoff_factor: self.backoff_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let mut config = Config::default();
        config.planner.geocode_parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.planner.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_to_policy() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy.max_attempts, retry::MAX_ATTEMPTS);
        assert_eq!(
            policy.base_delay,
            std::time::Duration::from_millis(retry::BASE_DELAY_MS)
        );
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".into());
        config.geocoder.access_token = Some("pk.secret".into());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(!toml.contains("pk.secret"));
    }
}
