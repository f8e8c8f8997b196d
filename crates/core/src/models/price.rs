use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price data point (date → close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: chrono::NaiveDate,
    pub price: f64,
}

/// Outcome of one price-refresh attempt for one symbol.
///
/// Ephemeral: consumed immediately by the refresher to update the
/// holding's cached price, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub symbol: String,
    pub success: bool,
    /// Fetched price; 0.0 when the attempt failed
    pub price: f64,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PriceUpdate {
    pub fn succeeded(symbol: impl Into<String>, price: f64, at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            success: true,
            price,
            error: None,
            timestamp: at,
        }
    }

    pub fn failed(symbol: impl Into<String>, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            success: false,
            price: 0.0,
            error: Some(error.into()),
            timestamp: at,
        }
    }
}
