use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;

use super::traits::{QuoteProvider, SymbolMatch};
use crate::errors::CoreError;
use crate::models::price::PricePoint;

const PROVIDER_NAME: &str = "Yahoo Finance";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// Yahoo Finance quote source.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, crypto pairs, FX pairs
///   (e.g. "TWD=X" for USD→TWD).
/// - **Data**: Daily close history plus a last-trade quote endpoint.
///
/// Historical closes go through the `yahoo_finance_api` connector; symbol
/// search hits Yahoo's public search endpoint directly with `reqwest`.
/// Prices come back in the instrument's native currency.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
    client: Client,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| {
            CoreError::QuoteSource {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to create connector: {e}"),
            }
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self { connector, client })
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<chrono::NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

// ── Yahoo search API response types ─────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    #[serde(rename = "exchDisp")]
    exch_disp: Option<String>,
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn closing_history(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(days as i64);

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::QuoteSource {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to fetch history for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::QuoteSource {
            provider: PROVIDER_NAME.into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        let mut points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                Some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    async fn last_trade_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let resp = self
            .connector
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| CoreError::QuoteSource {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to fetch latest quote for {symbol}: {e}"),
            })?;

        let quote = resp.last_quote().map_err(|e| CoreError::QuoteSource {
            provider: PROVIDER_NAME.into(),
            message: format!("No quote data for {symbol}: {e}"),
        })?;

        Ok(quote.close)
    }

    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, CoreError> {
        let resp: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("lang", "en-US"),
                ("region", "US"),
                ("quotesCount", "10"),
                ("newsCount", "0"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::QuoteSource {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse search response for '{query}': {e}"),
            })?;

        let matches = resp
            .quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol?;
                let name = q
                    .shortname
                    .or(q.longname)
                    .unwrap_or_else(|| "Unknown".to_string());
                let exchange = q.exch_disp.unwrap_or_else(|| "Unknown".to_string());
                Some(SymbolMatch {
                    symbol,
                    name,
                    exchange,
                })
            })
            .collect();

        Ok(matches)
    }
}
