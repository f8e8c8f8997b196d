use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Market-data engine configuration, supplied by the caller alongside the
/// holdings it persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataSettings {
    /// Cached prices older than this many days are refetched.
    pub price_update_threshold_days: i64,

    /// Upper bound on concurrent quote fetches during a refresh scan.
    pub max_concurrent_updates: usize,

    /// Attempts per quote fetch before giving up on a symbol.
    pub max_retries: u32,

    /// Base of the exponential backoff between retry attempts.
    pub retry_base_delay_seconds: f64,

    /// How long a fetched USD/TWD rate is served from cache.
    pub exchange_rate_cache_ttl_seconds: u64,

    /// USD→TWD rate used when every fetch attempt fails.
    pub default_exchange_rate: f64,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            price_update_threshold_days: 1,
            max_concurrent_updates: 10,
            max_retries: 3,
            retry_base_delay_seconds: 1.0,
            exchange_rate_cache_ttl_seconds: 3600,
            default_exchange_rate: 32.5,
        }
    }
}

impl MarketDataSettings {
    /// Reject configurations that would stall or misprice the engine.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.price_update_threshold_days < 0 {
            return Err(CoreError::InvalidSettings(
                "price_update_threshold_days must not be negative".into(),
            ));
        }
        if self.max_concurrent_updates < 1 {
            return Err(CoreError::InvalidSettings(
                "max_concurrent_updates must be at least 1".into(),
            ));
        }
        if self.max_retries < 1 {
            return Err(CoreError::InvalidSettings(
                "max_retries must be at least 1".into(),
            ));
        }
        if !self.retry_base_delay_seconds.is_finite() || self.retry_base_delay_seconds < 0.0 {
            return Err(CoreError::InvalidSettings(
                "retry_base_delay_seconds must be a non-negative number".into(),
            ));
        }
        if !self.default_exchange_rate.is_finite() || self.default_exchange_rate <= 0.0 {
            return Err(CoreError::InvalidSettings(
                "default_exchange_rate must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn staleness_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(self.price_update_threshold_days)
    }

    pub fn retry_base_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.retry_base_delay_seconds)
    }

    pub fn exchange_rate_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.exchange_rate_cache_ttl_seconds as i64)
    }
}
