use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::price::{PricePoint, PriceUpdate};
use crate::providers::retry::RetryPolicy;
use crate::providers::traits::QuoteProvider;

/// Fetches quotes from the external source, with retry-with-backoff
/// around every call.
///
/// `fetch_price` never fails from the caller's perspective: transient
/// errors are retried, and exhausted retries come back as a failed
/// `PriceUpdate` rather than an `Err`.
///
/// **Note on precision**: prices are `f64` (~15-17 significant decimal
/// digits), sufficient for valuation display but not for accounting.
pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>, retry: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            retry,
            clock,
        }
    }

    /// Latest daily close for `symbol`, falling back to the last-trade
    /// endpoint when the history comes back empty.
    pub async fn fetch_price(&self, symbol: &str) -> PriceUpdate {
        let result = self.retry.run(|| self.resolve_latest(symbol)).await;
        let now = self.clock.now();

        match result {
            Ok(price) => {
                debug!(symbol, price, "fetched price");
                PriceUpdate::succeeded(symbol, price, now)
            }
            Err(err) => {
                warn!(symbol, error = %err, "price fetch failed");
                PriceUpdate::failed(symbol, err.to_string(), now)
            }
        }
    }

    /// Daily closes for roughly the last `days` days, retried on failure.
    pub async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>, CoreError> {
        self.retry
            .run(|| self.provider.closing_history(symbol, days))
            .await
    }

    /// Free-text symbol search, formatted as "SYMBOL | Name (Exchange)".
    /// Failures and empty queries yield an empty list; search is a UI
    /// convenience, never an error path.
    pub async fn search_symbols(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.provider.search_symbols(query).await {
            Ok(matches) => {
                debug!(query, results = matches.len(), "symbol search");
                matches.iter().map(ToString::to_string).collect()
            }
            Err(err) => {
                warn!(query, error = %err, "symbol search failed");
                Vec::new()
            }
        }
    }

    async fn resolve_latest(&self, symbol: &str) -> Result<f64, CoreError> {
        let history = self.provider.closing_history(symbol, 1).await?;
        if let Some(point) = history.last() {
            if point.price.is_finite() && point.price > 0.0 {
                return Ok(point.price);
            }
        }

        // Daily history can be empty for thinly traded symbols; the
        // last-trade endpoint still knows a price.
        let price = self.provider.last_trade_price(symbol).await?;
        if price.is_finite() && price > 0.0 {
            Ok(price)
        } else {
            Err(CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
            })
        }
    }
}
