// ═══════════════════════════════════════════════════════════════════
// Integration Tests — NetworthTracker facade end-to-end
// ═══════════════════════════════════════════════════════════════════

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use networth_tracker_core::clock::{Clock, FixedClock};
use networth_tracker_core::errors::CoreError;
use networth_tracker_core::models::holding::{Currency, Holding};
use networth_tracker_core::models::price::PricePoint;
use networth_tracker_core::models::settings::MarketDataSettings;
use networth_tracker_core::models::valuation::{DisplayMode, PriceStatus};
use networth_tracker_core::providers::traits::{QuoteProvider, SymbolMatch};
use networth_tracker_core::services::rate_service::USD_TWD_PAIR_SYMBOL;
use networth_tracker_core::NetworthTracker;

fn test_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// One quote source covering stock symbols, the FX pair, and search.
#[derive(Default)]
struct FakeMarket {
    prices: HashMap<String, f64>,
    fx_rate: Option<f64>,
    matches: Vec<SymbolMatch>,
    fetch_calls: AtomicUsize,
}

impl FakeMarket {
    fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    fn with_fx_rate(mut self, rate: f64) -> Self {
        self.fx_rate = Some(rate);
        self
    }
}

#[async_trait]
impl QuoteProvider for FakeMarket {
    fn name(&self) -> &str {
        "FakeMarket"
    }

    async fn closing_history(
        &self,
        symbol: &str,
        _days: u32,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let today = test_now().date_naive();

        if symbol == USD_TWD_PAIR_SYMBOL {
            return match self.fx_rate {
                Some(rate) => Ok(vec![PricePoint {
                    date: today,
                    price: rate,
                }]),
                None => Err(CoreError::Network("fx source down".into())),
            };
        }

        match self.prices.get(symbol) {
            Some(price) => Ok(vec![
                PricePoint {
                    date: today - chrono::Duration::days(1),
                    price: price * 0.98,
                },
                PricePoint {
                    date: today,
                    price: *price,
                },
            ]),
            None => Err(CoreError::QuoteSource {
                provider: "FakeMarket".into(),
                message: format!("no data for {symbol}"),
            }),
        }
    }

    async fn last_trade_price(&self, symbol: &str) -> Result<f64, CoreError> {
        Err(CoreError::PriceNotAvailable {
            symbol: symbol.to_string(),
        })
    }

    async fn search_symbols(&self, _query: &str) -> Result<Vec<SymbolMatch>, CoreError> {
        Ok(self.matches.clone())
    }
}

fn fast_settings() -> MarketDataSettings {
    MarketDataSettings {
        max_retries: 1,
        retry_base_delay_seconds: 0.001,
        ..Default::default()
    }
}

fn tracker(market: Arc<FakeMarket>) -> NetworthTracker {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(test_now()));
    NetworthTracker::with_provider(fast_settings(), market, clock).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn construction_rejects_invalid_settings() {
    let settings = MarketDataSettings {
        max_concurrent_updates: 0,
        ..Default::default()
    };
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(test_now()));
    let result =
        NetworthTracker::with_provider(settings, Arc::new(FakeMarket::default()), clock);
    assert!(matches!(result, Err(CoreError::InvalidSettings(_))));
}

// ═══════════════════════════════════════════════════════════════════
// Refresh + valuation pipeline
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn refresh_and_value_pipeline() {
    let market = Arc::new(
        FakeMarket::default()
            .with_price("AAPL", 180.0)
            .with_fx_rate(32.0),
    );
    let tracker = tracker(Arc::clone(&market));

    let mut mortgage = Holding::liability("MORTGAGE", "房貸", 1.0, 900_000.0, Currency::Twd);
    mortgage.manual_price = 1_000_000.0;
    let mut holdings = vec![
        Holding::investment("AAPL", "股票", 10.0, 150.0, Currency::Usd),
        Holding::cash("CASH-TWD", 65_000.0, Currency::Twd),
        mortgage,
    ];

    let (outcome, table) = tracker
        .refresh_and_value(&mut holdings, &DisplayMode::Fixed(Currency::Twd))
        .await;

    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.failed, 0);

    // The refresh stamped AAPL, so valuation serves it from cache.
    assert_eq!(holdings[0].manual_price, 180.0);
    assert_eq!(holdings[0].last_update, "2026-08-05 12:00");
    assert_eq!(table.rows[0].status, PriceStatus::Cached);

    assert_close(table.rows[0].market_value, 180.0 * 32.0 * 10.0);
    let expected_net = 180.0 * 32.0 * 10.0 + 65_000.0 - 1_000_000.0;
    assert_close(table.net_worth(), expected_net);
}

#[tokio::test]
async fn quote_outage_degrades_to_cost_only_rows() {
    // No stock data, no FX: everything falls back, nothing errors.
    let market = Arc::new(FakeMarket::default());
    let tracker = tracker(Arc::clone(&market));

    let mut holdings = vec![
        Holding::investment("AAPL", "股票", 10.0, 150.0, Currency::Usd),
        Holding::investment("MSFT", "股票", 5.0, 300.0, Currency::Usd),
    ];

    let (outcome, table) = tracker
        .refresh_and_value(&mut holdings, &DisplayMode::Fixed(Currency::Usd))
        .await;

    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.failed, 2);
    assert!(table
        .rows
        .iter()
        .all(|r| r.status == PriceStatus::CostOnly));
    assert_close(table.rows[0].current_price, 150.0);
    assert_close(table.rows[1].current_price, 300.0);
}

#[tokio::test]
async fn valuation_uses_fetched_exchange_rate() {
    let market = Arc::new(FakeMarket::default().with_fx_rate(30.0));
    let tracker = tracker(market);

    let mut holding = Holding::investment("AAPL", "股票", 10.0, 150.0, Currency::Usd);
    holding.mark_price_updated(180.0, test_now() - chrono::Duration::hours(1));

    let table = tracker
        .build_valuation(&[holding], &DisplayMode::Fixed(Currency::Twd))
        .await;

    assert_close(table.rows[0].current_price, 180.0 * 30.0);
}

#[tokio::test]
async fn valuation_with_explicit_rate_skips_rate_fetch() {
    let market = Arc::new(FakeMarket::default());
    let tracker = tracker(Arc::clone(&market));

    let mut holding = Holding::investment("AAPL", "股票", 10.0, 150.0, Currency::Usd);
    holding.mark_price_updated(180.0, test_now() - chrono::Duration::hours(1));

    let table = tracker
        .build_valuation_with_rate(&[holding], &DisplayMode::Fixed(Currency::Twd), 33.0)
        .await;

    assert_close(table.rows[0].current_price, 180.0 * 33.0);
    assert_eq!(market.fetch_calls.load(Ordering::SeqCst), 0);
}

// ═══════════════════════════════════════════════════════════════════
// Exchange rate and search passthroughs
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn exchange_rate_comes_from_the_market() {
    let market = Arc::new(FakeMarket::default().with_fx_rate(31.4));
    let tracker = tracker(market);
    assert_close(tracker.exchange_rate().await, 31.4);
}

#[tokio::test]
async fn exchange_rate_defaults_when_market_is_down() {
    let market = Arc::new(FakeMarket::default());
    let tracker = tracker(market);
    assert_close(tracker.exchange_rate().await, 32.5);
}

#[tokio::test]
async fn exchange_rate_is_cached_across_calls() {
    let market = Arc::new(FakeMarket::default().with_fx_rate(31.4));
    let tracker = tracker(Arc::clone(&market));

    tracker.exchange_rate().await;
    tracker.exchange_rate().await;
    assert_eq!(market.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_symbols_formats_results() {
    let market = Arc::new(FakeMarket {
        matches: vec![SymbolMatch {
            symbol: "AAPL".into(),
            name: "Apple Inc.".into(),
            exchange: "NASDAQ".into(),
        }],
        ..Default::default()
    });
    let tracker = tracker(market);

    let results = tracker.search_symbols("apple").await;
    assert_eq!(results, vec!["AAPL | Apple Inc. (NASDAQ)".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════
// Staleness passthrough
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn is_outdated_uses_configured_threshold() {
    let tracker = tracker(Arc::new(FakeMarket::default()));

    assert!(tracker.is_outdated("N/A"));
    assert!(tracker.is_outdated("2026-08-03 12:00")); // two days old
    assert!(!tracker.is_outdated("2026-08-05 11:00")); // one hour old
}

#[tokio::test]
async fn empty_holdings_round_trip() {
    let tracker = tracker(Arc::new(FakeMarket::default()));
    let mut holdings: Vec<Holding> = Vec::new();

    let (outcome, table) = tracker
        .refresh_and_value(&mut holdings, &DisplayMode::Auto)
        .await;

    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.failed, 0);
    assert!(table.is_empty());
}
