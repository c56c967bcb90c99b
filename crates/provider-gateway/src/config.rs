use chrono::Duration;
use std::sync::Arc;

use crate::alpha_vantage::{self, AlphaVantageClient};
use crate::cache::{MarketCache, CACHE_TTL_SECS};
use crate::fmp::{self, FmpClient};
use crate::gateway::MarketDataGateway;
use crate::provider::MarketDataProvider;
use crate::yahoo_finance::{self, YahooFinanceClient};

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Environment-driven provider configuration.
///
/// Keyed providers are only registered when their key is present; the
/// keyless Yahoo adapter is always available as the last-resort fallback.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub alpha_vantage_key: Option<String>,
    pub fmp_key: Option<String>,
    pub alpha_vantage_daily_limit: u32,
    pub fmp_daily_limit: u32,
    pub yahoo_daily_limit: u32,
    pub cache_ttl_secs: i64,
}

impl GatewaySettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            alpha_vantage_key: std::env::var("ALPHA_VANTAGE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            fmp_key: std::env::var("FMP_API_KEY").ok().filter(|k| !k.is_empty()),
            alpha_vantage_daily_limit: env_u32(
                "ALPHA_VANTAGE_DAILY_LIMIT",
                alpha_vantage::DEFAULT_DAILY_LIMIT,
            ),
            fmp_daily_limit: env_u32("FMP_DAILY_LIMIT", fmp::DEFAULT_DAILY_LIMIT),
            yahoo_daily_limit: env_u32("YAHOO_DAILY_LIMIT", yahoo_finance::DEFAULT_DAILY_LIMIT),
            cache_ttl_secs: env_i64("MARKET_CACHE_TTL_SECS", CACHE_TTL_SECS),
        }
    }

    pub fn build_providers(&self) -> Vec<Arc<dyn MarketDataProvider>> {
        let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();

        if let Some(key) = &self.alpha_vantage_key {
            providers.push(Arc::new(AlphaVantageClient::new(
                key.clone(),
                self.alpha_vantage_daily_limit,
            )));
        } else {
            tracing::info!("ALPHA_VANTAGE_API_KEY not set, skipping Alpha Vantage provider");
        }

        if let Some(key) = &self.fmp_key {
            providers.push(Arc::new(FmpClient::new(key.clone(), self.fmp_daily_limit)));
        } else {
            tracing::info!("FMP_API_KEY not set, skipping Financial Modeling Prep provider");
        }

        providers.push(Arc::new(YahooFinanceClient::new(self.yahoo_daily_limit)));
        providers
    }

    pub fn build_gateway(&self) -> Arc<MarketDataGateway> {
        let cache = Arc::new(MarketCache::with_ttl(Duration::seconds(self.cache_ttl_secs)));
        Arc::new(MarketDataGateway::new(self.build_providers(), cache))
    }
}
