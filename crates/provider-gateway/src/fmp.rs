use async_trait::async_trait;
use chrono::NaiveDate;
use risk_core::{
    FinancialStatementSet, MarketSnapshot, Overview, RiskError, SearchCandidate,
};
use serde::Deserialize;
use std::time::Duration;

use crate::provider::{
    check_status, spend_quota, transport_err, MarketDataProvider, OVERVIEW_TIMEOUT,
    PRICE_TIMEOUT, SEARCH_TIMEOUT, STATEMENTS_TIMEOUT,
};
use crate::quota::DailyQuota;

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Free-tier default. Overridable via FMP_DAILY_LIMIT.
pub const DEFAULT_DAILY_LIMIT: u32 = 250;

/// Financial Modeling Prep adapter. Unlike Alpha Vantage, FMP serves
/// properly typed JSON, so responses deserialize into structs directly.
pub struct FmpClient {
    api_key: String,
    client: reqwest::Client,
    quota: DailyQuota,
}

impl FmpClient {
    pub fn new(api_key: String, daily_limit: u32) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            quota: DailyQuota::new(daily_limit),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, RiskError> {
        spend_quota(&self.quota, self.name())?;

        let url = format!("{BASE_URL}/{path}");
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_err(self.name(), e))?;
        check_status(self.name(), &response)?;

        response
            .json::<T>()
            .await
            .map_err(|e| transport_err(self.name(), e))
    }
}

#[derive(Debug, Deserialize)]
struct FmpSearchResult {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "exchangeShortName")]
    exchange_short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FmpProfile {
    symbol: String,
    #[serde(default, rename = "companyName")]
    company_name: Option<String>,
    #[serde(default, rename = "exchangeShortName")]
    exchange_short_name: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default, rename = "mktCap")]
    mkt_cap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpIncomeStatement {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    revenue: f64,
    #[serde(default)]
    gross_profit: f64,
    #[serde(default)]
    operating_income: f64,
    #[serde(default)]
    net_income: f64,
    #[serde(default)]
    ebitda: f64,
    #[serde(default)]
    depreciation_and_amortization: f64,
    #[serde(default)]
    interest_expense: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpBalanceSheet {
    #[serde(default)]
    total_assets: f64,
    #[serde(default)]
    total_current_assets: f64,
    #[serde(default)]
    total_current_liabilities: f64,
    #[serde(default)]
    total_liabilities: f64,
    #[serde(default)]
    total_stockholders_equity: f64,
    #[serde(default)]
    retained_earnings: f64,
    #[serde(default)]
    long_term_debt: f64,
    #[serde(default)]
    short_term_debt: f64,
    #[serde(default)]
    cash_and_cash_equivalents: f64,
    #[serde(default)]
    inventory: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpCashFlow {
    #[serde(default)]
    operating_cash_flow: f64,
    #[serde(default)]
    capital_expenditure: f64,
    #[serde(default)]
    free_cash_flow: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpQuote {
    #[serde(default)]
    price: f64,
    #[serde(default)]
    previous_close: f64,
    #[serde(default)]
    change: f64,
    /// Already in percent units (-3.2 = down 3.2%), the canonical form.
    #[serde(default)]
    changes_percentage: f64,
    #[serde(default)]
    market_cap: f64,
    #[serde(default)]
    volume: f64,
    #[serde(default)]
    year_high: f64,
    #[serde(default)]
    year_low: f64,
}

#[async_trait]
impl MarketDataProvider for FmpClient {
    fn name(&self) -> &'static str {
        "fmp"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn quota(&self) -> &DailyQuota {
        &self.quota
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<SearchCandidate>, RiskError> {
        let results: Vec<FmpSearchResult> = self
            .fetch(
                "search",
                &[("query", query), ("limit", "10")],
                SEARCH_TIMEOUT,
            )
            .await?;

        Ok(results
            .into_iter()
            .map(|r| SearchCandidate {
                name: r.name.unwrap_or_else(|| r.symbol.clone()),
                ticker: r.symbol,
                exchange: r.exchange_short_name,
                region: None,
            })
            .collect())
    }

    async fn get_overview(&self, ticker: &str) -> Result<Overview, RiskError> {
        let profiles: Vec<FmpProfile> = self
            .fetch(&format!("profile/{ticker}"), &[], OVERVIEW_TIMEOUT)
            .await?;
        let profile = profiles.into_iter().next().ok_or_else(|| {
            RiskError::Provider(format!("FMP has no profile for {ticker}"))
        })?;

        Ok(Overview {
            name: profile.company_name.unwrap_or_else(|| profile.symbol.clone()),
            ticker: profile.symbol,
            exchange: profile.exchange_short_name,
            sector: profile.sector.filter(|s| !s.is_empty()),
            industry: profile.industry.filter(|s| !s.is_empty()),
            market_cap: profile.mkt_cap.filter(|&m| m > 0.0),
        })
    }

    async fn get_statements(&self, ticker: &str) -> Result<FinancialStatementSet, RiskError> {
        let limit = [("limit", "1")];
        let income: Vec<FmpIncomeStatement> = self
            .fetch(&format!("income-statement/{ticker}"), &limit, STATEMENTS_TIMEOUT)
            .await?;
        let balance: Vec<FmpBalanceSheet> = self
            .fetch(
                &format!("balance-sheet-statement/{ticker}"),
                &limit,
                STATEMENTS_TIMEOUT,
            )
            .await?;
        let cash_flow: Vec<FmpCashFlow> = self
            .fetch(
                &format!("cash-flow-statement/{ticker}"),
                &limit,
                STATEMENTS_TIMEOUT,
            )
            .await?;

        let income = income.into_iter().next().ok_or_else(|| {
            RiskError::Provider(format!("FMP has no income statement for {ticker}"))
        })?;
        let balance = balance.into_iter().next().ok_or_else(|| {
            RiskError::Provider(format!("FMP has no balance sheet for {ticker}"))
        })?;
        let cash_flow = cash_flow.into_iter().next().unwrap_or_default();

        let free_cash_flow = if cash_flow.free_cash_flow != 0.0 {
            cash_flow.free_cash_flow
        } else {
            // FMP reports capex as a negative outflow
            cash_flow.operating_cash_flow + cash_flow.capital_expenditure
        };

        Ok(FinancialStatementSet {
            ticker: ticker.to_uppercase(),
            fiscal_period_end: income
                .date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            revenue: income.revenue,
            gross_profit: income.gross_profit,
            operating_income: income.operating_income,
            net_income: income.net_income,
            ebit: income.ebitda - income.depreciation_and_amortization,
            ebitda: income.ebitda,
            interest_expense: income.interest_expense,
            total_assets: balance.total_assets,
            current_assets: balance.total_current_assets,
            current_liabilities: balance.total_current_liabilities,
            total_liabilities: balance.total_liabilities,
            shareholder_equity: balance.total_stockholders_equity,
            retained_earnings: balance.retained_earnings,
            working_capital: balance.total_current_assets - balance.total_current_liabilities,
            long_term_debt: balance.long_term_debt,
            short_term_debt: balance.short_term_debt,
            cash: balance.cash_and_cash_equivalents,
            inventory: balance.inventory,
            operating_cash_flow: cash_flow.operating_cash_flow,
            capex: cash_flow.capital_expenditure.abs(),
            free_cash_flow,
        })
    }

    async fn get_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError> {
        let quotes: Vec<FmpQuote> = self
            .fetch(&format!("quote/{ticker}"), &[], PRICE_TIMEOUT)
            .await?;
        let quote = quotes.into_iter().next().ok_or_else(|| {
            RiskError::Provider(format!("FMP has no quote for {ticker}"))
        })?;

        Ok(MarketSnapshot {
            ticker: ticker.to_uppercase(),
            price: quote.price,
            previous_close: quote.previous_close,
            change: quote.change,
            change_percent: quote.changes_percentage,
            market_cap: quote.market_cap,
            volume: quote.volume,
            week52_high: quote.year_high,
            week52_low: quote.year_low,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_deserializes_with_defaults() {
        let json = r#"{"price": 191.5, "changesPercentage": -1.25, "marketCap": 2.9e12}"#;
        let q: FmpQuote = serde_json::from_str(json).unwrap();
        assert_eq!(q.price, 191.5);
        assert_eq!(q.changes_percentage, -1.25);
        assert_eq!(q.previous_close, 0.0);
    }

    #[test]
    fn test_income_statement_field_mapping() {
        let json = r#"{"date": "2024-09-28", "revenue": 1000.0, "ebitda": 300.0,
                       "depreciationAndAmortization": 50.0, "interestExpense": 10.0}"#;
        let i: FmpIncomeStatement = serde_json::from_str(json).unwrap();
        assert_eq!(i.revenue, 1000.0);
        // EBIT is derived as EBITDA - D&A during mapping
        assert_eq!(i.ebitda - i.depreciation_and_amortization, 250.0);
    }
}
