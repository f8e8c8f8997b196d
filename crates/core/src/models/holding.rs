use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel stored in `Holding::last_update` when a price has never
/// been fetched. Inherited from the spreadsheet format the caller persists.
pub const LAST_UPDATE_UNSET: &str = "N/A";

/// Timestamp format for `Holding::last_update`, e.g. "2026-08-05 14:30".
pub const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Default account a holding belongs to when none was assigned.
pub const DEFAULT_ACCOUNT_ID: &str = "default_main";

/// The two currencies the engine models. General N-currency conversion
/// is deliberately out of scope; every holding is denominated in one of
/// these, and one USD↔TWD reference rate covers all conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Twd,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Twd => write!(f, "TWD"),
        }
    }
}

/// Broad classification of a holding. Determines refresh eligibility
/// (only investments track a market price) and valuation sign rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingCategory {
    /// Stocks, ETFs, crypto and anything else with a quoted price.
    Investment,
    /// Cash, deposits; valued at face value or a manual price.
    Cash,
    /// Loans, mortgages, credit balances; negative net-worth contribution.
    Liability,
}

impl Default for HoldingCategory {
    fn default() -> Self {
        HoldingCategory::Investment
    }
}

impl std::fmt::Display for HoldingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldingCategory::Investment => write!(f, "investment"),
            HoldingCategory::Cash => write!(f, "cash"),
            HoldingCategory::Liability => write!(f, "liability"),
        }
    }
}

/// A single portfolio position as supplied (and persisted) by the caller.
///
/// `quantity` and `avg_cost` are always non-negative; liability sign
/// semantics are applied at valuation time only, never stored here.
/// `manual_price == 0.0` means "no cached price".
///
/// The serde aliases carry the legacy spreadsheet column names so schema
/// migration happens once at the persistence boundary instead of inside
/// valuation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, uppercased (e.g., "AAPL", "2330.TW", "BTC-USD")
    #[serde(alias = "Ticker")]
    pub symbol: String,

    #[serde(default)]
    pub category: HoldingCategory,

    /// Free-form label within the category (e.g., "股票", "ETF", "房貸")
    #[serde(alias = "Type")]
    pub asset_type: String,

    #[serde(alias = "Quantity")]
    pub quantity: f64,

    /// Average cost per unit, in the holding's native currency
    #[serde(alias = "Avg_Cost")]
    pub avg_cost: f64,

    #[serde(default, alias = "Currency")]
    pub currency: Currency,

    /// Last fetched (or manually entered) price; 0.0 = unset
    #[serde(default, alias = "Manual_Price")]
    pub manual_price: f64,

    /// "%Y-%m-%d %H:%M" timestamp of the last price refresh, or "N/A"
    #[serde(default = "default_last_update", alias = "Last_Update")]
    pub last_update: String,

    #[serde(default = "default_account_id", alias = "Account_ID")]
    pub account_id: String,
}

fn default_last_update() -> String {
    LAST_UPDATE_UNSET.to_string()
}

fn default_account_id() -> String {
    DEFAULT_ACCOUNT_ID.to_string()
}

impl Holding {
    pub fn new(
        symbol: impl Into<String>,
        category: HoldingCategory,
        asset_type: impl Into<String>,
        quantity: f64,
        avg_cost: f64,
        currency: Currency,
    ) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            category,
            asset_type: asset_type.into(),
            quantity,
            avg_cost,
            currency,
            manual_price: 0.0,
            last_update: default_last_update(),
            account_id: default_account_id(),
        }
    }

    /// Convenience constructors for the three categories
    pub fn investment(
        symbol: impl Into<String>,
        asset_type: impl Into<String>,
        quantity: f64,
        avg_cost: f64,
        currency: Currency,
    ) -> Self {
        Self::new(symbol, HoldingCategory::Investment, asset_type, quantity, avg_cost, currency)
    }

    pub fn cash(
        symbol: impl Into<String>,
        quantity: f64,
        currency: Currency,
    ) -> Self {
        Self::new(symbol, HoldingCategory::Cash, "cash", quantity, 1.0, currency)
    }

    pub fn liability(
        symbol: impl Into<String>,
        asset_type: impl Into<String>,
        quantity: f64,
        avg_cost: f64,
        currency: Currency,
    ) -> Self {
        Self::new(symbol, HoldingCategory::Liability, asset_type, quantity, avg_cost, currency)
    }

    /// Whether this holding has a quoted market price worth refreshing.
    /// Cash and liabilities are carried at face value / manual balance.
    pub fn tracks_market_price(&self) -> bool {
        self.category == HoldingCategory::Investment
    }

    pub fn is_liability(&self) -> bool {
        self.category == HoldingCategory::Liability
    }

    /// Record a successful price refresh: cache the price and stamp
    /// `last_update` in the persisted timestamp format.
    pub fn mark_price_updated(&mut self, price: f64, at: DateTime<Utc>) {
        self.manual_price = price;
        self.last_update = at.format(LAST_UPDATE_FORMAT).to_string();
    }
}
