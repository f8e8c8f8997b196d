use thiserror::Error;

/// Unified error type for the entire networth-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// Note: the refresh and valuation surfaces deliberately do NOT return
/// this type; fetch failures there degrade into fallback price tiers
/// and per-symbol failure records instead of propagating.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Quote source / Network ──────────────────────────────────────
    #[error("Quote source error ({provider}): {message}")]
    QuoteSource {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No price data available for {symbol}")]
    PriceNotAvailable {
        symbol: String,
    },

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs.
        // reqwest errors often contain full request URLs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
