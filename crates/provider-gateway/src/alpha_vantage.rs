use chrono::NaiveDate;
use risk_core::{
    FinancialStatementSet, MarketSnapshot, Overview, RiskError, SearchCandidate,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::provider::{
    check_status, spend_quota, transport_err, MarketDataProvider, OVERVIEW_TIMEOUT,
    PRICE_TIMEOUT, SEARCH_TIMEOUT, STATEMENTS_TIMEOUT,
};
use crate::quota::DailyQuota;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Free-tier default. Overridable via ALPHA_VANTAGE_DAILY_LIMIT.
pub const DEFAULT_DAILY_LIMIT: u32 = 25;

/// Alpha Vantage adapter. Every numeric field arrives as a string
/// ("123456789" or "-1.23%"), so mapping is all parse-with-default.
pub struct AlphaVantageClient {
    api_key: String,
    client: reqwest::Client,
    quota: DailyQuota,
}

impl AlphaVantageClient {
    pub fn new(api_key: String, daily_limit: u32) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            quota: DailyQuota::new(daily_limit),
        }
    }

    /// One metered GET against the query endpoint. Vendor throttle notes
    /// ("Note"/"Information") and error payloads come back as HTTP 200, so
    /// they are detected in the body.
    async fn fetch(
        &self,
        function: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Value, RiskError> {
        spend_quota(&self.quota, self.name())?;

        let mut query: Vec<(&str, &str)> = vec![("function", function)];
        query.extend_from_slice(params);
        query.push(("apikey", self.api_key.as_str()));

        let response = self
            .client
            .get(BASE_URL)
            .query(&query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_err(self.name(), e))?;
        check_status(self.name(), &response)?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| transport_err(self.name(), e))?;

        if let Some(error) = json.get("Error Message") {
            return Err(RiskError::Provider(format!("Alpha Vantage error: {error}")));
        }
        if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
            return Err(RiskError::Provider(format!(
                "Alpha Vantage rate limit: {note}"
            )));
        }

        Ok(json)
    }
}

/// Parse a string-typed numeric field; "None" and absent both map to 0.0.
fn num(value: &Value, key: &str) -> f64 {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(|s| s.to_string())
}

/// Most recent annual report from an INCOME_STATEMENT / BALANCE_SHEET /
/// CASH_FLOW response.
fn latest_report(json: &Value) -> Option<Value> {
    json.get("annualReports")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .cloned()
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn quota(&self) -> &DailyQuota {
        &self.quota
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<SearchCandidate>, RiskError> {
        let json = self
            .fetch("SYMBOL_SEARCH", &[("keywords", query)], SEARCH_TIMEOUT)
            .await?;

        let matches = json
            .get("bestMatches")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(matches
            .iter()
            .filter_map(|m| {
                let ticker = text(m, "1. symbol")?;
                let name = text(m, "2. name")?;
                Some(SearchCandidate {
                    ticker,
                    name,
                    exchange: None, // SYMBOL_SEARCH does not report the listing venue
                    region: text(m, "4. region"),
                })
            })
            .collect())
    }

    async fn get_overview(&self, ticker: &str) -> Result<Overview, RiskError> {
        let json = self
            .fetch("OVERVIEW", &[("symbol", ticker)], OVERVIEW_TIMEOUT)
            .await?;

        // Unknown tickers return an empty object with HTTP 200.
        let name = text(&json, "Name").ok_or_else(|| {
            RiskError::Provider(format!("Alpha Vantage has no overview for {ticker}"))
        })?;

        Ok(Overview {
            ticker: text(&json, "Symbol").unwrap_or_else(|| ticker.to_uppercase()),
            name,
            exchange: text(&json, "Exchange"),
            sector: text(&json, "Sector"),
            industry: text(&json, "Industry"),
            market_cap: match num(&json, "MarketCapitalization") {
                v if v > 0.0 => Some(v),
                _ => None,
            },
        })
    }

    async fn get_statements(&self, ticker: &str) -> Result<FinancialStatementSet, RiskError> {
        // Three separate endpoints; each call is metered against the quota.
        let income_json = self
            .fetch("INCOME_STATEMENT", &[("symbol", ticker)], STATEMENTS_TIMEOUT)
            .await?;
        let balance_json = self
            .fetch("BALANCE_SHEET", &[("symbol", ticker)], STATEMENTS_TIMEOUT)
            .await?;
        let cash_flow_json = self
            .fetch("CASH_FLOW", &[("symbol", ticker)], STATEMENTS_TIMEOUT)
            .await?;

        let income = latest_report(&income_json).ok_or_else(|| {
            RiskError::Provider(format!("Alpha Vantage has no income statement for {ticker}"))
        })?;
        let balance = latest_report(&balance_json).ok_or_else(|| {
            RiskError::Provider(format!("Alpha Vantage has no balance sheet for {ticker}"))
        })?;
        let cash_flow = latest_report(&cash_flow_json).unwrap_or_default();

        let current_assets = num(&balance, "totalCurrentAssets");
        let current_liabilities = num(&balance, "totalCurrentLiabilities");
        let operating_cash_flow = num(&cash_flow, "operatingCashflow");
        let capex = num(&cash_flow, "capitalExpenditures");

        Ok(FinancialStatementSet {
            ticker: ticker.to_uppercase(),
            fiscal_period_end: income
                .get("fiscalDateEnding")
                .and_then(|v| v.as_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            revenue: num(&income, "totalRevenue"),
            gross_profit: num(&income, "grossProfit"),
            operating_income: num(&income, "operatingIncome"),
            net_income: num(&income, "netIncome"),
            ebit: num(&income, "ebit"),
            ebitda: num(&income, "ebitda"),
            interest_expense: num(&income, "interestExpense"),
            total_assets: num(&balance, "totalAssets"),
            current_assets,
            current_liabilities,
            total_liabilities: num(&balance, "totalLiabilities"),
            shareholder_equity: num(&balance, "totalShareholderEquity"),
            retained_earnings: num(&balance, "retainedEarnings"),
            working_capital: current_assets - current_liabilities,
            long_term_debt: num(&balance, "longTermDebt"),
            short_term_debt: num(&balance, "shortTermDebt"),
            cash: num(&balance, "cashAndCashEquivalentsAtCarryingValue"),
            inventory: num(&balance, "inventory"),
            operating_cash_flow,
            capex,
            free_cash_flow: operating_cash_flow - capex,
        })
    }

    async fn get_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError> {
        let json = self
            .fetch("GLOBAL_QUOTE", &[("symbol", ticker)], PRICE_TIMEOUT)
            .await?;

        let quote = json
            .get("Global Quote")
            .filter(|q| q.as_object().map_or(false, |o| !o.is_empty()))
            .ok_or_else(|| {
                RiskError::Provider(format!("Alpha Vantage has no quote for {ticker}"))
            })?;

        // "10. change percent" arrives as "-1.2345%"; canonical form is
        // signed percent units.
        let change_percent = quote
            .get("10. change percent")
            .and_then(|v| v.as_str())
            .map(|s| s.trim_end_matches('%'))
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(MarketSnapshot {
            ticker: ticker.to_uppercase(),
            price: num(quote, "05. price"),
            previous_close: num(quote, "08. previous close"),
            change: num(quote, "09. change"),
            change_percent,
            market_cap: 0.0, // not part of GLOBAL_QUOTE; overview supplies it
            volume: num(quote, "06. volume"),
            week52_high: 0.0,
            week52_low: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_num_parses_string_fields() {
        let v = json!({"totalAssets": "1000", "netIncome": "-50", "empty": "None"});
        assert_eq!(num(&v, "totalAssets"), 1000.0);
        assert_eq!(num(&v, "netIncome"), -50.0);
        assert_eq!(num(&v, "empty"), 0.0);
        assert_eq!(num(&v, "missing"), 0.0);
    }

    #[test]
    fn test_text_filters_placeholders() {
        let v = json!({"Sector": "Technology", "Industry": "None", "Exchange": ""});
        assert_eq!(text(&v, "Sector").as_deref(), Some("Technology"));
        assert_eq!(text(&v, "Industry"), None);
        assert_eq!(text(&v, "Exchange"), None);
    }

    #[test]
    fn test_latest_report_takes_first_annual() {
        let v = json!({"annualReports": [
            {"fiscalDateEnding": "2024-12-31"},
            {"fiscalDateEnding": "2023-12-31"}
        ]});
        let latest = latest_report(&v).unwrap();
        assert_eq!(latest.get("fiscalDateEnding").unwrap(), "2024-12-31");
        assert!(latest_report(&json!({})).is_none());
    }
}
