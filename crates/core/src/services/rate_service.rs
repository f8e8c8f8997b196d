use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::errors::CoreError;
use crate::providers::retry::RetryPolicy;
use crate::providers::traits::QuoteProvider;

/// Yahoo symbol for the USD→TWD exchange rate.
pub const USD_TWD_PAIR_SYMBOL: &str = "TWD=X";

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    fetched_at: DateTime<Utc>,
}

/// USD→TWD exchange rate with TTL'd caching and a configured fallback.
///
/// `usd_rate` never errors: fetch failures degrade to the default rate.
/// The cache entry is guarded by an async mutex held across the fetch,
/// so concurrent callers inside one TTL window observe a single value
/// and issue at most one network call.
pub struct ExchangeRateService {
    provider: Arc<dyn QuoteProvider>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    default_rate: f64,
    cached: Mutex<Option<CachedRate>>,
}

impl ExchangeRateService {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        default_rate: f64,
    ) -> Self {
        Self {
            provider,
            retry,
            clock,
            ttl,
            default_rate,
            cached: Mutex::new(None),
        }
    }

    /// Current USD→TWD rate: cached within the TTL window, refetched
    /// after expiry, the configured default when the source is down.
    pub async fn usd_rate(&self) -> f64 {
        let mut cached = self.cached.lock().await;
        let now = self.clock.now();

        if let Some(entry) = cached.as_ref() {
            if now - entry.fetched_at <= self.ttl {
                debug!(rate = entry.rate, "serving cached exchange rate");
                return entry.rate;
            }
        }

        let rate = match self.fetch_rate().await {
            Ok(rate) => {
                debug!("fetched exchange rate: 1 USD = {rate:.2} TWD");
                rate
            }
            Err(err) => {
                warn!(
                    error = %err,
                    default = self.default_rate,
                    "exchange rate fetch failed, using default"
                );
                self.default_rate
            }
        };

        // The default is cached too: a dead quote source shouldn't be
        // re-probed on every valuation inside the TTL window.
        *cached = Some(CachedRate {
            rate,
            fetched_at: now,
        });
        rate
    }

    async fn fetch_rate(&self) -> Result<f64, CoreError> {
        let points = self
            .retry
            .run(|| self.provider.closing_history(USD_TWD_PAIR_SYMBOL, 1))
            .await?;

        match points.last() {
            Some(point) if point.price.is_finite() && point.price > 0.0 => Ok(point.price),
            _ => Err(CoreError::PriceNotAvailable {
                symbol: USD_TWD_PAIR_SYMBOL.to_string(),
            }),
        }
    }
}
