//! Engine configuration.
//!
//! All fields have defaults, so `{}` is a valid configuration document:
//!
//! ```json
//! {
//!   "cache": { "ttl_min_secs": 60, "ttl_max_secs": 120 },
//!   "matching": { "case_insensitive": false }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PolicyError;
use crate::pattern::MatchOptions;

pub const DEFAULT_TTL_MIN_SECS: u64 = 60;
pub const DEFAULT_TTL_MAX_SECS: u64 = 120;

/// Statement cache settings.
///
/// Each cache entry lives for a TTL drawn uniformly from
/// `[ttl_min_secs, ttl_max_secs)`, so roles loaded together do not all
/// expire together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_min_secs: u64,
    pub ttl_max_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_min_secs: DEFAULT_TTL_MIN_SECS,
            ttl_max_secs: DEFAULT_TTL_MAX_SECS,
        }
    }
}

impl CacheConfig {
    pub fn ttl_min(&self) -> Duration {
        Duration::from_secs(self.ttl_min_secs)
    }

    pub fn ttl_max(&self) -> Duration {
        Duration::from_secs(self.ttl_max_secs)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.ttl_min_secs == 0 {
            return Err(PolicyError::ConfigError(
                "cache.ttl_min_secs must be greater than zero".to_string(),
            ));
        }
        if self.ttl_min_secs >= self.ttl_max_secs {
            return Err(PolicyError::ConfigError(format!(
                "cache.ttl_min_secs ({}) must be less than cache.ttl_max_secs ({})",
                self.ttl_min_secs, self.ttl_max_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub matching: MatchOptions,
}

impl EngineConfig {
    /// Load and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, PolicyError> {
        let config: EngineConfig =
            serde_json::from_str(text).map_err(|e| PolicyError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        self.cache.validate()
    }
}
