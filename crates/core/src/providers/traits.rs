use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::price::PricePoint;

/// A symbol hit from the quote source's search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

impl std::fmt::Display for SymbolMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} ({})", self.symbol, self.name, self.exchange)
    }
}

/// Seam to the external quote source.
///
/// One implementation backs production (Yahoo Finance); tests substitute
/// their own. The source is assumed occasionally unavailable or
/// rate-limited, so every call site must tolerate errors.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Daily closes for roughly the last `days` days, ascending by date.
    /// An empty Vec is a valid answer (unknown symbol, market holiday run).
    async fn closing_history(&self, symbol: &str, days: u32)
        -> Result<Vec<PricePoint>, CoreError>;

    /// Last traded price, for symbols whose daily history comes back empty.
    async fn last_trade_price(&self, symbol: &str) -> Result<f64, CoreError>;

    /// Free-text symbol search.
    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, CoreError>;
}
