//! Batch analysis orchestrator: resolution, fetching, scoring, and
//! portfolio aggregation for lists of free-text company identifiers.

pub mod portfolio;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;

use provider_gateway::{MarketDataGateway, Resolver};
use ratio_engine::RatioEngine;
use risk_core::{
    BatchFailure, BatchReport, CompanyAssessment, CompanyIdentity, CompanyResult, MarketSnapshot,
    RatioBundle, RiskError,
};

/// Pacing and size limits for a batch run. The defaults keep a batch of 50
/// under typical free-tier provider rate limits.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Companies analyzed concurrently per group.
    pub group_size: usize,
    /// Pause inserted between consecutive groups.
    pub group_pause: Duration,
    /// Hard cap on batch size; larger requests are rejected up front.
    pub max_batch: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            group_size: 5,
            group_pause: Duration::from_secs(1),
            max_batch: 50,
        }
    }
}

/// Drives the full pipeline for one or many companies. Cheap to clone, so
/// it can be handed to spawned tasks.
#[derive(Clone)]
pub struct RiskOrchestrator {
    gateway: Arc<MarketDataGateway>,
    resolver: Arc<Resolver>,
    engine: Arc<RatioEngine>,
    options: BatchOptions,
}

impl RiskOrchestrator {
    pub fn new(gateway: Arc<MarketDataGateway>) -> Self {
        Self::with_options(gateway, BatchOptions::default())
    }

    pub fn with_options(gateway: Arc<MarketDataGateway>, options: BatchOptions) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(gateway.clone())),
            engine: Arc::new(RatioEngine::new()),
            gateway,
            options,
        }
    }

    /// Resolve one free-text identifier and produce its full assessment.
    ///
    /// Statements are mandatory: if no provider can serve them the company
    /// fails. A price failure only degrades the result; the assessment is
    /// computed against an empty snapshot carrying the market cap learned
    /// during resolution.
    pub async fn analyze_company(
        &self,
        input: &str,
    ) -> Result<(CompanyIdentity, CompanyAssessment), RiskError> {
        let identity = self.resolver.resolve(input).await?;
        tracing::info!("analyzing {} ({})", identity.ticker, identity.name);

        let (statements, price) = tokio::join!(
            self.gateway.fetch_statements(&identity.ticker),
            self.gateway.fetch_price(&identity.ticker),
        );
        let statements = statements?;
        let mut snapshot = match price {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    "price fetch for {} failed, assessing without market data: {}",
                    identity.ticker,
                    e
                );
                MarketSnapshot {
                    ticker: identity.ticker.clone(),
                    ..Default::default()
                }
            }
        };
        if snapshot.market_cap == 0.0 {
            snapshot.market_cap = identity.market_cap.unwrap_or(0.0);
        }

        let assessment = self
            .engine
            .assess(&statements, &snapshot, identity.company_type);
        Ok((identity, assessment))
    }

    /// Ratio bundle only, for callers that do not need the distress score.
    pub async fn company_ratios(&self, input: &str) -> Result<RatioBundle, RiskError> {
        let (_, assessment) = self.analyze_company(input).await?;
        Ok(assessment.ratios)
    }

    /// Analyze a batch of identifiers in paced concurrent groups.
    ///
    /// Results come back in input order. Individual failures are recorded
    /// per item; the whole call only errors when the batch is invalid or
    /// when not a single company could be analyzed.
    pub async fn analyze_batch(&self, inputs: &[String]) -> Result<BatchReport, RiskError> {
        if inputs.is_empty() {
            return Err(RiskError::InvalidInput("empty batch".to_string()));
        }
        if inputs.len() > self.options.max_batch {
            return Err(RiskError::InvalidInput(format!(
                "batch of {} exceeds the maximum of {}",
                inputs.len(),
                self.options.max_batch
            )));
        }

        let mut slots: Vec<Option<CompanyResult>> = vec![None; inputs.len()];
        for (group_index, group) in inputs.chunks(self.options.group_size).enumerate() {
            if group_index > 0 {
                tokio::time::sleep(self.options.group_pause).await;
            }

            let mut tasks = JoinSet::new();
            for (offset, input) in group.iter().enumerate() {
                let index = group_index * self.options.group_size + offset;
                let orchestrator = self.clone();
                let input = input.clone();
                tasks.spawn(async move {
                    let result = match orchestrator.analyze_company(&input).await {
                        Ok((identity, assessment)) => {
                            CompanyResult::ok(input, identity, assessment)
                        }
                        Err(e) => {
                            tracing::warn!("analysis of '{}' failed: {}", input, e);
                            CompanyResult::failed(input, e.to_string())
                        }
                    };
                    (index, result)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(e) => tracing::error!("analysis task aborted: {}", e),
                }
            }
        }

        let per_company: Vec<CompanyResult> = slots
            .into_iter()
            .zip(inputs)
            .map(|(slot, input)| {
                slot.unwrap_or_else(|| {
                    CompanyResult::failed(input.clone(), "analysis task aborted".to_string())
                })
            })
            .collect();

        let failures: Vec<BatchFailure> = per_company
            .iter()
            .filter(|r| !r.success)
            .map(|r| BatchFailure {
                input: r.input.clone(),
                reason: r.error.clone().unwrap_or_default(),
            })
            .collect();

        if per_company.iter().all(|r| !r.success) {
            return Err(RiskError::BatchFailed(format!(
                "all {} companies failed analysis",
                per_company.len()
            )));
        }

        let portfolio_summary = portfolio::summarize(&per_company);
        Ok(BatchReport {
            per_company,
            portfolio_summary,
            failures,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provider_gateway::{DailyQuota, MarketCache, MarketDataProvider};
    use risk_core::{FinancialStatementSet, Overview, RiskZone, SearchCandidate};

    /// Serves a fixed universe of tickers; anything else is unresolvable.
    struct MockProvider {
        quota: DailyQuota,
        fail_price: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                quota: DailyQuota::new(1000),
                fail_price: false,
            }
        }

        fn without_prices() -> Self {
            Self {
                quota: DailyQuota::new(1000),
                fail_price: true,
            }
        }

        fn ticker_for(query: &str) -> Option<&'static str> {
            let q = query.to_lowercase();
            if q.contains("acme") {
                Some("ACME")
            } else if q.contains("globex") {
                Some("GBX")
            } else if q.contains("initech") {
                Some("INTC")
            } else {
                None
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn priority(&self) -> u8 {
            1
        }

        fn quota(&self) -> &DailyQuota {
            &self.quota
        }

        async fn search_by_name(&self, query: &str) -> Result<Vec<SearchCandidate>, RiskError> {
            Ok(Self::ticker_for(query)
                .map(|ticker| SearchCandidate {
                    ticker: ticker.to_string(),
                    name: format!("{ticker} Corp"),
                    exchange: Some("NYSE".to_string()),
                    region: None,
                })
                .into_iter()
                .collect())
        }

        async fn get_overview(&self, ticker: &str) -> Result<Overview, RiskError> {
            Ok(Overview {
                ticker: ticker.to_string(),
                name: format!("{ticker} Corp"),
                exchange: Some("NYSE".to_string()),
                sector: Some("Technology".to_string()),
                industry: Some("Software".to_string()),
                market_cap: Some(900.0),
            })
        }

        async fn get_statements(
            &self,
            ticker: &str,
        ) -> Result<FinancialStatementSet, RiskError> {
            Ok(FinancialStatementSet {
                ticker: ticker.to_string(),
                revenue: 800.0,
                gross_profit: 300.0,
                net_income: 90.0,
                ebit: 100.0,
                total_assets: 1000.0,
                current_assets: 400.0,
                current_liabilities: 200.0,
                total_liabilities: 600.0,
                shareholder_equity: 400.0,
                retained_earnings: 150.0,
                working_capital: 200.0,
                ..Default::default()
            })
        }

        async fn get_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError> {
            if self.fail_price {
                return Err(RiskError::Provider("price feed down".to_string()));
            }
            Ok(MarketSnapshot {
                ticker: ticker.to_string(),
                price: 90.0,
                market_cap: 900.0,
                ..Default::default()
            })
        }
    }

    fn orchestrator(provider: MockProvider) -> RiskOrchestrator {
        let gateway = Arc::new(MarketDataGateway::new(
            vec![Arc::new(provider)],
            Arc::new(MarketCache::new()),
        ));
        RiskOrchestrator::with_options(
            gateway,
            BatchOptions {
                group_pause: Duration::from_millis(1),
                ..Default::default()
            },
        )
    }

    fn inputs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_analyze_company_end_to_end() {
        let orch = orchestrator(MockProvider::new());
        let (identity, assessment) = orch.analyze_company("Acme Industries").await.unwrap();
        assert_eq!(identity.ticker, "ACME");
        assert_eq!(assessment.distress_score.risk_zone, RiskZone::Safe);
        assert!(assessment.ratios.liquidity.current_ratio > 0.0);
    }

    #[tokio::test]
    async fn test_price_failure_degrades_instead_of_failing() {
        let orch = orchestrator(MockProvider::without_prices());
        let (identity, assessment) = orch.analyze_company("Acme Industries").await.unwrap();
        // No price: per-share figures collapse to zero...
        assert_eq!(assessment.ratios.market.shares_outstanding, 0.0);
        assert_eq!(assessment.ratios.market.price_to_earnings, 0.0);
        // ...but the Z-score still uses the market cap learned at resolution.
        let components = assessment.distress_score.components.unwrap();
        assert!(components.market_cap_to_liabilities.ratio > 0.0);
        assert_eq!(identity.market_cap, Some(900.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_records_failures() {
        let orch = orchestrator(MockProvider::new());
        let batch = inputs(&[
            "Acme Industries",
            "No Such Company",
            "Globex",
            "Another Ghost",
            "Initech",
        ]);
        let report = orch.analyze_batch(&batch).await.unwrap();

        assert_eq!(report.per_company.len(), 5);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.portfolio_summary.analyzed_count, 3);

        // Input order survives the concurrent fan-out.
        for (result, input) in report.per_company.iter().zip(&batch) {
            assert_eq!(&result.input, input);
        }
        assert!(report.per_company[0].success);
        assert!(!report.per_company[1].success);
        assert!(report.per_company[1].error.is_some());
        assert!(report.per_company[4].success);
    }

    #[tokio::test]
    async fn test_batch_spanning_multiple_groups() {
        let orch = orchestrator(MockProvider::new());
        let batch: Vec<String> = (0..7)
            .map(|i| {
                if i % 2 == 0 {
                    "Acme Industries".to_string()
                } else {
                    "Globex".to_string()
                }
            })
            .collect();
        let report = orch.analyze_batch(&batch).await.unwrap();
        assert_eq!(report.per_company.len(), 7);
        assert!(report.per_company.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn test_batch_with_zero_successes_is_an_error() {
        let orch = orchestrator(MockProvider::new());
        let batch = inputs(&["Nobody", "Nothing"]);
        let err = orch.analyze_batch(&batch).await.unwrap_err();
        assert!(matches!(err, RiskError::BatchFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let orch = orchestrator(MockProvider::new());
        let err = orch.analyze_batch(&[]).await.unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let orch = orchestrator(MockProvider::new());
        let batch = inputs(&["Acme"; 51]);
        let err = orch.analyze_batch(&batch).await.unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_company_ratios_shortcut() {
        let orch = orchestrator(MockProvider::new());
        let ratios = orch.company_ratios("Globex").await.unwrap();
        assert!((ratios.liquidity.current_ratio - 2.0).abs() < 1e-9);
    }
}
