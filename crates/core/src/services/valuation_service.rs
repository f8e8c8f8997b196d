use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::models::holding::Holding;
use crate::models::price::PricePoint;
use crate::models::valuation::{DisplayMode, PriceStatus, ValuationRow, ValuationTable};
use crate::services::currency_service::rate_multiplier;
use crate::services::quote_service::QuoteService;
use crate::staleness::is_outdated;

/// Days of close history fetched for live rows (daily change + sparkline).
const LIVE_HISTORY_DAYS: u32 = 31;

/// Points in the synthetic flat history used when no live series exists.
const FLAT_HISTORY_POINTS: i64 = 30;

/// Resolved price inputs for one row, before currency conversion.
struct ResolvedPrice {
    /// In the holding's native currency
    price: f64,
    status: PriceStatus,
    daily_change_pct: f64,
    history: Vec<PricePoint>,
}

/// Builds the valuation table: resolves a current price for every
/// holding (live, cached, or fallback tier), converts into the base
/// currency, and derives market value, net value, cost, P/L and ROI.
///
/// Never fails: a holding with no reachable price degrades to its cached
/// price or cost basis, tagged with the matching status.
pub struct ValuationService {
    quotes: Arc<QuoteService>,
    clock: Arc<dyn Clock>,
    staleness_threshold: Duration,
}

impl ValuationService {
    pub fn new(
        quotes: Arc<QuoteService>,
        clock: Arc<dyn Clock>,
        staleness_threshold: Duration,
    ) -> Self {
        Self {
            quotes,
            clock,
            staleness_threshold,
        }
    }

    /// Value every holding, in list order, against the given USD→TWD rate.
    pub async fn build_valuation(
        &self,
        holdings: &[Holding],
        display: &DisplayMode,
        usd_rate: f64,
    ) -> ValuationTable {
        if holdings.is_empty() {
            debug!("empty holdings list, returning empty valuation");
            return ValuationTable::default();
        }

        let base = display.base_currency();
        let mut rows = Vec::with_capacity(holdings.len());

        for holding in holdings {
            let resolved = self.resolve_price(holding).await;
            rows.push(build_row(holding, resolved, display, usd_rate));
        }

        info!(rows = rows.len(), base = %base, "valuation built");
        ValuationTable { rows }
    }

    /// Price resolution tiers, best to worst:
    /// live quote → fresh cached price → stale cached price → cost basis.
    /// Cash and liabilities always carry manual/face value.
    async fn resolve_price(&self, holding: &Holding) -> ResolvedPrice {
        let now = self.clock.now();
        let today = now.date_naive();

        if !holding.tracks_market_price() {
            let price = if holding.manual_price > 0.0 {
                holding.manual_price
            } else {
                // Face value for cash and liability balances
                1.0
            };
            return ResolvedPrice {
                price,
                status: PriceStatus::Manual,
                daily_change_pct: 0.0,
                history: flat_history(price, today),
            };
        }

        let stale = is_outdated(&holding.last_update, self.staleness_threshold, now);
        if !stale && holding.manual_price > 0.0 {
            debug!(symbol = %holding.symbol, price = holding.manual_price, "using cached price");
            return ResolvedPrice {
                price: holding.manual_price,
                status: PriceStatus::Cached,
                daily_change_pct: 0.0,
                history: flat_history(holding.manual_price, today),
            };
        }

        match self
            .quotes
            .fetch_history(&holding.symbol, LIVE_HISTORY_DAYS)
            .await
        {
            Ok(history) => {
                if let Some(last) = history.last() {
                    let price = last.price;
                    let prev = if history.len() > 1 {
                        history[history.len() - 2].price
                    } else {
                        price
                    };
                    let daily_change_pct = if prev > 0.0 {
                        (price - prev) / prev * 100.0
                    } else {
                        0.0
                    };
                    return ResolvedPrice {
                        price,
                        status: PriceStatus::Live,
                        daily_change_pct,
                        history,
                    };
                }
                debug!(symbol = %holding.symbol, "live history empty, falling back");
            }
            Err(err) => {
                debug!(symbol = %holding.symbol, error = %err, "live data unavailable, falling back");
            }
        }

        if holding.manual_price > 0.0 {
            ResolvedPrice {
                price: holding.manual_price,
                status: PriceStatus::ManualStale,
                daily_change_pct: 0.0,
                history: flat_history(holding.manual_price, today),
            }
        } else {
            ResolvedPrice {
                price: holding.avg_cost,
                status: PriceStatus::CostOnly,
                daily_change_pct: 0.0,
                history: flat_history(holding.avg_cost, today),
            }
        }
    }
}

fn build_row(
    holding: &Holding,
    resolved: ResolvedPrice,
    display: &DisplayMode,
    usd_rate: f64,
) -> ValuationRow {
    let base = display.base_currency();
    let multiplier = rate_multiplier(holding.currency, base, usd_rate);

    let base_price = resolved.price * multiplier;
    let base_avg_cost = holding.avg_cost * multiplier;
    let market_value = base_price * holding.quantity;
    let total_cost = base_avg_cost * holding.quantity;

    // The ONLY place liability values flip sign; holdings themselves
    // never store negatives.
    let net_value = if holding.is_liability() {
        -market_value
    } else {
        market_value
    };

    // Liability P/L: a grown owed balance is a loss, so cost − value.
    let unrealized_pl = if holding.is_liability() {
        total_cost - market_value
    } else {
        market_value - total_cost
    };

    let roi_pct = if total_cost > 0.0 {
        unrealized_pl / total_cost * 100.0
    } else {
        0.0
    };

    let (display_price, display_cost_basis, display_currency) = match display {
        DisplayMode::Auto => (resolved.price, holding.avg_cost, holding.currency),
        DisplayMode::Fixed(_) => (base_price, base_avg_cost, base),
    };
    let display_market_value = display_price * holding.quantity;
    let display_total_cost = display_cost_basis * holding.quantity;
    let display_pl = if holding.is_liability() {
        display_total_cost - display_market_value
    } else {
        display_market_value - display_total_cost
    };

    ValuationRow {
        symbol: holding.symbol.clone(),
        category: holding.category,
        asset_type: holding.asset_type.clone(),
        quantity: holding.quantity,
        currency: holding.currency,
        account_id: holding.account_id.clone(),
        last_update: holding.last_update.clone(),
        current_price: base_price,
        avg_cost: base_avg_cost,
        market_value,
        net_value,
        total_cost,
        unrealized_pl,
        roi_pct,
        daily_change_pct: resolved.daily_change_pct,
        display_price,
        display_cost_basis,
        display_market_value,
        display_total_cost,
        display_pl,
        display_currency,
        status: resolved.status,
        history: resolved.history,
    }
}

/// Flat series at `price`, ending today: a placeholder sparkline for
/// rows without live history.
fn flat_history(price: f64, today: NaiveDate) -> Vec<PricePoint> {
    (0..FLAT_HISTORY_POINTS)
        .rev()
        .map(|back| PricePoint {
            date: today - Duration::days(back),
            price,
        })
        .collect()
}
