use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Duration;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::models::holding::Holding;
use crate::models::price::PriceUpdate;
use crate::services::quote_service::QuoteService;
use crate::staleness::is_outdated;

/// Counts from one refresh scan. Partial success is the steady state;
/// `failed == candidates` just means the quote source was down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub updated: usize,
    pub failed: usize,
}

/// Scans a holdings list and refreshes stale quoted prices in parallel.
///
/// Only investments are candidates; cash and liabilities carry face
/// values. Each candidate gets one fetch task in a bounded pool; a
/// task's failure (or panic) is recorded against that symbol and never
/// cancels its siblings or the scan.
pub struct RefreshService {
    quotes: Arc<QuoteService>,
    clock: Arc<dyn Clock>,
    staleness_threshold: Duration,
    max_concurrent: usize,
}

impl RefreshService {
    pub fn new(
        quotes: Arc<QuoteService>,
        clock: Arc<dyn Clock>,
        staleness_threshold: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            quotes,
            clock,
            staleness_threshold,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Refresh every stale, price-bearing holding in place.
    ///
    /// Successful fetches update the holding's cached price and
    /// `last_update` stamp; failed ones leave the holding untouched.
    /// Issues zero fetches when nothing is stale.
    pub async fn auto_update(&self, holdings: &mut [Holding]) -> RefreshOutcome {
        let now = self.clock.now();

        let candidates: Vec<(usize, String)> = holdings
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                h.tracks_market_price()
                    && is_outdated(&h.last_update, self.staleness_threshold, now)
            })
            .map(|(index, h)| (index, h.symbol.clone()))
            .collect();

        if candidates.is_empty() {
            debug!("no stale holdings to refresh");
            return RefreshOutcome::default();
        }

        info!(count = candidates.len(), "refreshing stale holdings");

        // One task per candidate; each writes to its own index, so the
        // merge below needs no locking.
        let results: Vec<(usize, PriceUpdate)> = stream::iter(candidates)
            .map(|(index, symbol)| {
                let quotes = Arc::clone(&self.quotes);
                async move {
                    let fetched = AssertUnwindSafe(quotes.fetch_price(&symbol))
                        .catch_unwind()
                        .await;
                    let update = match fetched {
                        Ok(update) => update,
                        Err(_) => PriceUpdate::failed(symbol, "fetch task panicked", now),
                    };
                    (index, update)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut outcome = RefreshOutcome::default();
        for (index, update) in results {
            if update.success {
                holdings[index].mark_price_updated(update.price, update.timestamp);
                outcome.updated += 1;
                debug!(symbol = %update.symbol, price = update.price, "holding updated");
            } else {
                outcome.failed += 1;
                warn!(
                    symbol = %update.symbol,
                    error = update.error.as_deref().unwrap_or("unknown"),
                    "holding left unchanged after failed refresh"
                );
            }
        }

        info!(
            updated = outcome.updated,
            failed = outcome.failed,
            "refresh complete"
        );
        outcome
    }
}
