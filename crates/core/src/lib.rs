pub mod clock;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod staleness;

use std::sync::Arc;

use clock::{Clock, SystemClock};
use errors::CoreError;
use models::holding::Holding;
use models::settings::MarketDataSettings;
use models::valuation::{DisplayMode, ValuationTable};
use providers::retry::RetryPolicy;
use providers::traits::QuoteProvider;
use providers::yahoo_finance::YahooFinanceProvider;
use services::quote_service::QuoteService;
use services::rate_service::ExchangeRateService;
use services::refresh_service::{RefreshOutcome, RefreshService};
use services::valuation_service::ValuationService;

/// Main entry point for the Networth Tracker core library.
///
/// Owns the market-data services and exposes the two operations the
/// caller's UI layer consumes: "given holdings, refresh stale prices in
/// place" and "given holdings, build a valuation table". Persistence of
/// the (mutated) holdings stays with the caller.
#[must_use]
pub struct NetworthTracker {
    settings: MarketDataSettings,
    clock: Arc<dyn Clock>,
    quote_service: Arc<QuoteService>,
    rate_service: ExchangeRateService,
    refresh_service: RefreshService,
    valuation_service: ValuationService,
}

impl std::fmt::Debug for NetworthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworthTracker")
            .field("settings", &self.settings)
            .finish()
    }
}

impl NetworthTracker {
    /// Build a tracker backed by Yahoo Finance and the system clock.
    pub fn new(settings: MarketDataSettings) -> Result<Self, CoreError> {
        let provider = Arc::new(YahooFinanceProvider::new()?);
        Self::with_provider(settings, provider, Arc::new(SystemClock))
    }

    /// Build a tracker with an injected quote source and clock.
    /// This is the seam tests (and alternative data sources) use.
    pub fn with_provider(
        settings: MarketDataSettings,
        provider: Arc<dyn QuoteProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;

        let retry = RetryPolicy::new(settings.max_retries, settings.retry_base_delay());
        let quote_service = Arc::new(QuoteService::new(
            Arc::clone(&provider),
            retry.clone(),
            Arc::clone(&clock),
        ));
        let rate_service = ExchangeRateService::new(
            provider,
            retry,
            Arc::clone(&clock),
            settings.exchange_rate_cache_ttl(),
            settings.default_exchange_rate,
        );
        let refresh_service = RefreshService::new(
            Arc::clone(&quote_service),
            Arc::clone(&clock),
            settings.staleness_threshold(),
            settings.max_concurrent_updates,
        );
        let valuation_service = ValuationService::new(
            Arc::clone(&quote_service),
            Arc::clone(&clock),
            settings.staleness_threshold(),
        );

        Ok(Self {
            settings,
            clock,
            quote_service,
            rate_service,
            refresh_service,
            valuation_service,
        })
    }

    // ── Price Refresh ───────────────────────────────────────────────

    /// Refresh every stale, price-bearing holding in place and report
    /// how many fetches succeeded and failed. The caller is responsible
    /// for persisting the mutated list, and for surfacing a warning
    /// when `failed` equals the candidate count.
    pub async fn auto_update(&self, holdings: &mut [Holding]) -> RefreshOutcome {
        self.refresh_service.auto_update(holdings).await
    }

    /// Whether a `last_update` stamp is stale under the configured
    /// threshold.
    pub fn is_outdated(&self, last_update: &str) -> bool {
        staleness::is_outdated(
            last_update,
            self.settings.staleness_threshold(),
            self.clock.now(),
        )
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Value all holdings using the current (cached) USD→TWD rate.
    pub async fn build_valuation(
        &self,
        holdings: &[Holding],
        display: &DisplayMode,
    ) -> ValuationTable {
        let usd_rate = self.rate_service.usd_rate().await;
        self.valuation_service
            .build_valuation(holdings, display, usd_rate)
            .await
    }

    /// Value all holdings against an explicit USD→TWD rate.
    pub async fn build_valuation_with_rate(
        &self,
        holdings: &[Holding],
        display: &DisplayMode,
        usd_rate: f64,
    ) -> ValuationTable {
        self.valuation_service
            .build_valuation(holdings, display, usd_rate)
            .await
    }

    /// Refresh stale prices, then value the refreshed list. The startup
    /// path a dashboard calls once per session.
    pub async fn refresh_and_value(
        &self,
        holdings: &mut [Holding],
        display: &DisplayMode,
    ) -> (RefreshOutcome, ValuationTable) {
        let outcome = self.auto_update(holdings).await;
        let table = self.build_valuation(holdings, display).await;
        (outcome, table)
    }

    // ── Exchange Rate ───────────────────────────────────────────────

    /// Current USD→TWD rate (cached per TTL, default on fetch failure).
    pub async fn exchange_rate(&self) -> f64 {
        self.rate_service.usd_rate().await
    }

    // ── Symbol Search ───────────────────────────────────────────────

    /// Search the quote source for ticker symbols, formatted for display.
    pub async fn search_symbols(&self, query: &str) -> Vec<String> {
        self.quote_service.search_symbols(query).await
    }

    // ── Settings ────────────────────────────────────────────────────

    pub fn settings(&self) -> &MarketDataSettings {
        &self.settings
    }
}
