use async_trait::async_trait;
use risk_core::{
    FinancialStatementSet, MarketSnapshot, Overview, RiskError, SearchCandidate,
};
use std::time::Duration;

use crate::quota::DailyQuota;

/// Request timeouts by endpoint weight. Price quotes are light and frequent;
/// statement pulls are the heaviest responses the vendors serve.
pub const PRICE_TIMEOUT: Duration = Duration::from_secs(5);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const OVERVIEW_TIMEOUT: Duration = Duration::from_secs(10);
pub const STATEMENTS_TIMEOUT: Duration = Duration::from_secs(15);

/// Uniform contract implemented once per external data source.
///
/// A timeout, a non-2xx status, or a vendor-side throttle message is a
/// recoverable `RiskError::Provider` — callers fall through to the next
/// adapter in priority order. Each adapter owns its `DailyQuota`; once that
/// is spent the adapter reports itself unavailable without touching the
/// network.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower value = tried earlier during resolution and fallback.
    fn priority(&self) -> u8;

    fn quota(&self) -> &DailyQuota;

    fn available(&self) -> bool {
        !self.quota().exhausted()
    }

    /// Fuzzy name/ticker search. An empty vec means "no match", not an error.
    async fn search_by_name(&self, query: &str) -> Result<Vec<SearchCandidate>, RiskError>;

    async fn get_overview(&self, ticker: &str) -> Result<Overview, RiskError>;

    async fn get_statements(&self, ticker: &str) -> Result<FinancialStatementSet, RiskError>;

    async fn get_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError>;
}

/// Reserve a quota slot or fail without a network call.
pub(crate) fn spend_quota(quota: &DailyQuota, provider: &str) -> Result<(), RiskError> {
    if quota.try_acquire() {
        Ok(())
    } else {
        Err(RiskError::QuotaExhausted(format!(
            "{provider} daily quota of {} spent",
            quota.limit()
        )))
    }
}

/// Map a transport-level failure into the recoverable provider error.
pub(crate) fn transport_err(provider: &str, err: reqwest::Error) -> RiskError {
    if err.is_timeout() {
        RiskError::Provider(format!("{provider} request timed out"))
    } else {
        RiskError::Provider(format!("{provider}: {err}"))
    }
}

/// Reject non-2xx responses before attempting to parse a body.
pub(crate) fn check_status(provider: &str, response: &reqwest::Response) -> Result<(), RiskError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(RiskError::Provider(format!("{provider} HTTP {status}")))
    }
}
