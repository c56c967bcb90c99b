use risk_core::{classify_company_type, CompanyIdentity, Overview, RiskError, SearchCandidate};
use std::sync::Arc;

use crate::cache::MarketCache;
use crate::gateway::MarketDataGateway;
use crate::provider::MarketDataProvider;

/// Listing venues preferred when a name search returns several candidates.
const MAJOR_EXCHANGES: &[&str] = &[
    "NYSE",
    "NASDAQ",
    "New York Stock Exchange",
    "NasdaqGS",
    "NasdaqGM",
];

/// Collapse whitespace and case so "  Apple  inc " and "apple inc" share a
/// cache entry.
pub fn normalize_input(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Heuristic for step 3 of resolution: 1-4 uppercase ASCII letters is worth
/// trying as a literal ticker before falling back to other providers.
fn looks_like_ticker(input: &str) -> bool {
    let len = input.chars().count();
    (1..=4).contains(&len) && input.chars().all(|c| c.is_ascii_uppercase())
}

fn is_major_exchange(exchange: Option<&str>) -> bool {
    exchange.map_or(false, |ex| {
        MAJOR_EXCHANGES
            .iter()
            .any(|major| ex.eq_ignore_ascii_case(major) || ex.contains(major))
    })
}

/// Prefer major-exchange listings, else take the first result.
fn pick_candidate(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    candidates
        .iter()
        .find(|c| is_major_exchange(c.exchange.as_deref()))
        .or_else(|| candidates.first())
}

/// Turns free-text input into a canonical `CompanyIdentity` by walking an
/// ordered list of strategies, stopping at the first success:
///
/// 1. cached resolution for the normalized input
/// 2. name search on the highest-priority adapter with quota remaining
/// 3. literal overview lookup when the input looks like a bare ticker
/// 4. name search on each remaining adapter in priority order
///
/// If every step fails the input is unresolvable; no placeholder identity
/// is ever synthesized.
pub struct Resolver {
    gateway: Arc<MarketDataGateway>,
}

impl Resolver {
    pub fn new(gateway: Arc<MarketDataGateway>) -> Self {
        Self { gateway }
    }

    pub async fn resolve(&self, input: &str) -> Result<CompanyIdentity, RiskError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RiskError::InvalidInput(
                "empty company identifier".to_string(),
            ));
        }

        let normalized = normalize_input(trimmed);
        let cache_key = MarketCache::identity_key(&normalized);
        if let Some(cached) = self.gateway.cache().identities.get(&cache_key) {
            tracing::debug!("resolved '{}' from cache as {}", trimmed, cached.ticker);
            return Ok(cached);
        }

        let available: Vec<&Arc<dyn MarketDataProvider>> = self
            .gateway
            .providers()
            .iter()
            .filter(|p| p.available())
            .collect();
        if available.is_empty() {
            return Err(RiskError::QuotaExhausted(
                "no provider has quota remaining for resolution".to_string(),
            ));
        }

        // Step 2: name search against the highest-priority adapter.
        if let Some(first) = available.first() {
            if let Some(identity) = self.try_search(first, trimmed, &cache_key).await {
                return Ok(identity);
            }
        }

        // Step 3: the input itself may be a ticker.
        if looks_like_ticker(trimmed) {
            match self.gateway.fetch_overview(trimmed).await {
                Ok(overview) => {
                    return Ok(self.finish(trimmed, &cache_key, overview));
                }
                Err(e) => {
                    tracing::debug!("literal ticker lookup for '{}' failed: {}", trimmed, e);
                }
            }
        }

        // Step 4: fall back to the remaining adapters.
        for provider in available.iter().skip(1) {
            if let Some(identity) = self.try_search(provider, trimmed, &cache_key).await {
                return Ok(identity);
            }
        }

        Err(RiskError::Resolution(format!(
            "could not match '{trimmed}' to any security"
        )))
    }

    async fn try_search(
        &self,
        provider: &Arc<dyn MarketDataProvider>,
        query: &str,
        cache_key: &str,
    ) -> Option<CompanyIdentity> {
        match provider.search_by_name(query).await {
            Ok(candidates) => {
                let candidate = pick_candidate(&candidates)?.clone();
                tracing::info!(
                    "'{}' matched {} ({}) via {}",
                    query,
                    candidate.ticker,
                    candidate.name,
                    provider.name()
                );
                Some(self.identity_from_candidate(query, cache_key, candidate).await)
            }
            Err(e) => {
                tracing::warn!("{} name search for '{}' failed: {}", provider.name(), query, e);
                None
            }
        }
    }

    /// Enrich a search candidate with sector/industry from an overview
    /// lookup. When no provider can serve the overview the candidate alone
    /// still resolves; classification then defaults to non-manufacturing.
    async fn identity_from_candidate(
        &self,
        input: &str,
        cache_key: &str,
        candidate: SearchCandidate,
    ) -> CompanyIdentity {
        match self.gateway.fetch_overview(&candidate.ticker).await {
            Ok(overview) => self.finish(input, cache_key, overview),
            Err(e) => {
                tracing::warn!(
                    "overview enrichment for {} failed, resolving from search data: {}",
                    candidate.ticker,
                    e
                );
                let identity = CompanyIdentity {
                    input: input.to_string(),
                    ticker: candidate.ticker.to_uppercase(),
                    name: candidate.name,
                    sector: None,
                    industry: None,
                    market_cap: None,
                    company_type: classify_company_type(None, None),
                };
                self.gateway
                    .cache()
                    .identities
                    .set(cache_key, identity.clone());
                identity
            }
        }
    }

    fn finish(&self, input: &str, cache_key: &str, overview: Overview) -> CompanyIdentity {
        let company_type =
            classify_company_type(overview.sector.as_deref(), overview.industry.as_deref());
        let identity = CompanyIdentity {
            input: input.to_string(),
            ticker: overview.ticker.to_uppercase(),
            name: overview.name,
            sector: overview.sector,
            industry: overview.industry,
            market_cap: overview.market_cap,
            company_type,
        };
        self.gateway
            .cache()
            .identities
            .set(cache_key, identity.clone());
        identity
    }
}
