use risk_core::{FinancialStatementSet, MarketSnapshot, Overview, RiskError};
use std::sync::Arc;

use crate::cache::MarketCache;
use crate::provider::MarketDataProvider;

/// Cached, failover-aware access to every registered provider.
///
/// Fetch methods consult the shared cache first, then walk the provider
/// list in priority order until one answers. A provider failure is logged
/// and the next adapter is tried; the error only surfaces when the whole
/// chain is exhausted.
pub struct MarketDataGateway {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    cache: Arc<MarketCache>,
}

impl MarketDataGateway {
    pub fn new(mut providers: Vec<Arc<dyn MarketDataProvider>>, cache: Arc<MarketCache>) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self { providers, cache }
    }

    /// Providers in priority order.
    pub fn providers(&self) -> &[Arc<dyn MarketDataProvider>] {
        &self.providers
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    fn all_failed(&self, what: &str, ticker: &str, reasons: Vec<String>) -> RiskError {
        if reasons.is_empty() {
            RiskError::QuotaExhausted(format!(
                "no provider has quota remaining for {what} {ticker}"
            ))
        } else {
            RiskError::Provider(format!(
                "all providers failed fetching {what} for {ticker}: {}",
                reasons.join("; ")
            ))
        }
    }

    pub async fn fetch_overview(&self, ticker: &str) -> Result<Overview, RiskError> {
        let key = MarketCache::overview_key(ticker);
        if let Some(cached) = self.cache.overviews.get(&key) {
            return Ok(cached);
        }

        let mut reasons = Vec::new();
        for provider in self.providers.iter().filter(|p| p.available()) {
            match provider.get_overview(ticker).await {
                Ok(overview) => {
                    self.cache.overviews.set(key, overview.clone());
                    return Ok(overview);
                }
                Err(e) => {
                    tracing::warn!("{} overview fetch for {} failed: {}", provider.name(), ticker, e);
                    reasons.push(format!("{}: {e}", provider.name()));
                }
            }
        }
        Err(self.all_failed("overview", ticker, reasons))
    }

    pub async fn fetch_statements(&self, ticker: &str) -> Result<FinancialStatementSet, RiskError> {
        let key = MarketCache::financials_key(ticker);
        if let Some(cached) = self.cache.financials.get(&key) {
            return Ok(cached);
        }

        let mut reasons = Vec::new();
        for provider in self.providers.iter().filter(|p| p.available()) {
            match provider.get_statements(ticker).await {
                Ok(statements) => {
                    self.cache.financials.set(key, statements.clone());
                    return Ok(statements);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} statement fetch for {} failed: {}",
                        provider.name(),
                        ticker,
                        e
                    );
                    reasons.push(format!("{}: {e}", provider.name()));
                }
            }
        }
        Err(self.all_failed("statements", ticker, reasons))
    }

    pub async fn fetch_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError> {
        let key = MarketCache::price_key(ticker);
        if let Some(cached) = self.cache.prices.get(&key) {
            return Ok(cached);
        }

        let mut reasons = Vec::new();
        for provider in self.providers.iter().filter(|p| p.available()) {
            match provider.get_price(ticker).await {
                Ok(snapshot) => {
                    self.cache.prices.set(key, snapshot.clone());
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!("{} price fetch for {} failed: {}", provider.name(), ticker, e);
                    reasons.push(format!("{}: {e}", provider.name()));
                }
            }
        }
        Err(self.all_failed("price", ticker, reasons))
    }
}
