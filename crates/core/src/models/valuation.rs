use serde::{Deserialize, Serialize};

use super::holding::{Currency, HoldingCategory};
use super::price::PricePoint;

/// Which price tier a valuation row was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceStatus {
    /// Fresh quote fetched during this valuation pass.
    Live,
    /// Cached price still within the staleness window.
    Cached,
    /// Manually entered price / face value (cash and liabilities).
    Manual,
    /// Live fetch failed; fell back to a stale cached price.
    ManualStale,
    /// No price available at all; showing cost basis only.
    CostOnly,
}

impl std::fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceStatus::Live => write!(f, "live"),
            PriceStatus::Cached => write!(f, "cached"),
            PriceStatus::Manual => write!(f, "manual"),
            PriceStatus::ManualStale => write!(f, "manual/stale"),
            PriceStatus::CostOnly => write!(f, "cost-only"),
        }
    }
}

/// How per-holding display figures are denominated.
///
/// Aggregates are always computed in the base currency regardless of
/// mode; summing native-currency values across currencies is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Each holding shown in its own native currency.
    Auto,
    /// Everything shown converted into one currency.
    Fixed(Currency),
}

impl DisplayMode {
    /// The currency all base-field math and aggregation runs in.
    /// `Auto` aggregates in TWD.
    pub fn base_currency(&self) -> Currency {
        match self {
            DisplayMode::Auto => Currency::Twd,
            DisplayMode::Fixed(c) => *c,
        }
    }
}

/// One fully valued holding. Derived, immutable per valuation pass.
///
/// The `display_*` fields are what a UI should render per row; every
/// other monetary field is in the base currency and safe to sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub symbol: String,
    pub category: HoldingCategory,
    pub asset_type: String,
    pub quantity: f64,
    pub currency: Currency,
    pub account_id: String,
    pub last_update: String,

    // ── Base-currency metrics (used for totals and sorting) ─────────
    pub current_price: f64,
    pub avg_cost: f64,
    pub market_value: f64,
    /// Negated market value for liabilities, market value otherwise.
    pub net_value: f64,
    pub total_cost: f64,
    /// For liabilities: cost − market value (a grown balance is a loss).
    /// Assumes `avg_cost` holds the original principal per unit.
    pub unrealized_pl: f64,
    pub roi_pct: f64,
    pub daily_change_pct: f64,

    // ── Display metrics (native or base, depending on mode) ─────────
    pub display_price: f64,
    pub display_cost_basis: f64,
    pub display_market_value: f64,
    pub display_total_cost: f64,
    pub display_pl: f64,
    pub display_currency: Currency,

    pub status: PriceStatus,
    /// Recent close series for sparkline charting. Synthetic (flat at the
    /// resolved price) when no live history was fetched.
    pub history: Vec<PricePoint>,
}

/// Row-oriented valuation output, in holding-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationTable {
    pub rows: Vec<ValuationRow>,
}

impl ValuationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Net worth: liability rows contribute negatively. Base currency.
    pub fn net_worth(&self) -> f64 {
        self.rows.iter().map(|r| r.net_value).sum()
    }

    /// Gross market value of every row (liabilities included as-is).
    pub fn total_market_value(&self) -> f64 {
        self.rows.iter().map(|r| r.market_value).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.total_cost).sum()
    }

    pub fn total_unrealized_pl(&self) -> f64 {
        self.rows.iter().map(|r| r.unrealized_pl).sum()
    }
}
