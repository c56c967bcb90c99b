use async_trait::async_trait;
use chrono::DateTime;
use risk_core::{
    FinancialStatementSet, MarketSnapshot, Overview, RiskError, SearchCandidate,
};
use serde_json::Value;
use std::time::Duration;

use crate::provider::{
    check_status, spend_quota, transport_err, MarketDataProvider, OVERVIEW_TIMEOUT,
    PRICE_TIMEOUT, SEARCH_TIMEOUT, STATEMENTS_TIMEOUT,
};
use crate::quota::DailyQuota;

const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Keyless source, so the budget is a self-imposed politeness cap rather
/// than a vendor-enforced one. Overridable via YAHOO_DAILY_LIMIT.
pub const DEFAULT_DAILY_LIMIT: u32 = 2000;

/// Yahoo Finance adapter: no API key, but the quote endpoints reject
/// requests without a browser-like user agent.
pub struct YahooFinanceClient {
    client: reqwest::Client,
    quota: DailyQuota,
}

impl YahooFinanceClient {
    pub fn new(daily_limit: u32) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            quota: DailyQuota::new(daily_limit),
        }
    }

    async fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Value, RiskError> {
        spend_quota(&self.quota, self.name())?;

        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_err(self.name(), e))?;
        check_status(self.name(), &response)?;

        response
            .json()
            .await
            .map_err(|e| transport_err(self.name(), e))
    }

    /// quoteSummary wraps every result in `{ result: [...], error }`.
    async fn quote_summary(
        &self,
        ticker: &str,
        modules: &str,
        timeout: Duration,
    ) -> Result<Value, RiskError> {
        let url = format!("{SUMMARY_URL}/{ticker}");
        let json = self
            .fetch(&url, &[("modules", modules)], timeout)
            .await?;

        json.pointer("/quoteSummary/result/0").cloned().ok_or_else(|| {
            RiskError::Provider(format!("Yahoo has no data for {ticker}"))
        })
    }
}

/// Extract a `{ raw: ..., fmt: "..." }` numeric field.
fn raw(value: &Value, pointer: &str) -> f64 {
    value
        .pointer(pointer)
        .and_then(|v| v.get("raw"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo_finance"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn quota(&self) -> &DailyQuota {
        &self.quota
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<SearchCandidate>, RiskError> {
        let json = self
            .fetch(
                SEARCH_URL,
                &[("q", query), ("quotesCount", "10"), ("newsCount", "0")],
                SEARCH_TIMEOUT,
            )
            .await?;

        let quotes = json
            .get("quotes")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(quotes
            .iter()
            .filter(|q| {
                q.get("quoteType").and_then(|v| v.as_str()) == Some("EQUITY")
            })
            .filter_map(|q| {
                let ticker = string_at(q, "/symbol")?;
                let name = string_at(q, "/longname")
                    .or_else(|| string_at(q, "/shortname"))?;
                Some(SearchCandidate {
                    ticker,
                    name,
                    exchange: string_at(q, "/exchDisp").or_else(|| string_at(q, "/exchange")),
                    region: None,
                })
            })
            .collect())
    }

    async fn get_overview(&self, ticker: &str) -> Result<Overview, RiskError> {
        let result = self
            .quote_summary(ticker, "assetProfile,price", OVERVIEW_TIMEOUT)
            .await?;

        let name = string_at(&result, "/price/longName")
            .or_else(|| string_at(&result, "/price/shortName"))
            .ok_or_else(|| {
                RiskError::Provider(format!("Yahoo has no profile for {ticker}"))
            })?;

        let market_cap = raw(&result, "/price/marketCap");
        Ok(Overview {
            ticker: string_at(&result, "/price/symbol").unwrap_or_else(|| ticker.to_uppercase()),
            name,
            exchange: string_at(&result, "/price/exchangeName"),
            sector: string_at(&result, "/assetProfile/sector"),
            industry: string_at(&result, "/assetProfile/industry"),
            market_cap: (market_cap > 0.0).then_some(market_cap),
        })
    }

    async fn get_statements(&self, ticker: &str) -> Result<FinancialStatementSet, RiskError> {
        let result = self
            .quote_summary(
                ticker,
                "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory",
                STATEMENTS_TIMEOUT,
            )
            .await?;

        let income = result
            .pointer("/incomeStatementHistory/incomeStatementHistory/0")
            .cloned()
            .ok_or_else(|| {
                RiskError::Provider(format!("Yahoo has no income statement for {ticker}"))
            })?;
        let balance = result
            .pointer("/balanceSheetHistory/balanceSheetStatements/0")
            .cloned()
            .ok_or_else(|| {
                RiskError::Provider(format!("Yahoo has no balance sheet for {ticker}"))
            })?;
        let cash_flow = result
            .pointer("/cashflowStatementHistory/cashflowStatements/0")
            .cloned()
            .unwrap_or(Value::Null);

        let current_assets = raw(&balance, "/totalCurrentAssets");
        let current_liabilities = raw(&balance, "/totalCurrentLiabilities");
        let operating_cash_flow = raw(&cash_flow, "/totalCashFromOperatingActivities");
        let capex = raw(&cash_flow, "/capitalExpenditures").abs();
        let operating_income = raw(&income, "/operatingIncome");
        let ebit = match raw(&income, "/ebit") {
            v if v != 0.0 => v,
            _ => operating_income,
        };

        Ok(FinancialStatementSet {
            ticker: ticker.to_uppercase(),
            fiscal_period_end: income
                .pointer("/endDate/raw")
                .and_then(|v| v.as_i64())
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.date_naive()),
            revenue: raw(&income, "/totalRevenue"),
            gross_profit: raw(&income, "/grossProfit"),
            operating_income,
            net_income: raw(&income, "/netIncome"),
            ebit,
            ebitda: raw(&income, "/ebitda"),
            interest_expense: raw(&income, "/interestExpense").abs(),
            total_assets: raw(&balance, "/totalAssets"),
            current_assets,
            current_liabilities,
            total_liabilities: raw(&balance, "/totalLiab"),
            shareholder_equity: raw(&balance, "/totalStockholderEquity"),
            retained_earnings: raw(&balance, "/retainedEarnings"),
            working_capital: current_assets - current_liabilities,
            long_term_debt: raw(&balance, "/longTermDebt"),
            short_term_debt: raw(&balance, "/shortLongTermDebt"),
            cash: raw(&balance, "/cash"),
            inventory: raw(&balance, "/inventory"),
            operating_cash_flow,
            capex,
            free_cash_flow: operating_cash_flow - capex,
        })
    }

    async fn get_price(&self, ticker: &str) -> Result<MarketSnapshot, RiskError> {
        let result = self
            .quote_summary(ticker, "price,summaryDetail", PRICE_TIMEOUT)
            .await?;

        let price = raw(&result, "/price/regularMarketPrice");
        if price <= 0.0 {
            return Err(RiskError::Provider(format!(
                "Yahoo has no market price for {ticker}"
            )));
        }

        // Yahoo reports change percent as a fraction (0.0123 = +1.23%);
        // normalize to the canonical signed percent units.
        let change_percent = raw(&result, "/price/regularMarketChangePercent") * 100.0;

        Ok(MarketSnapshot {
            ticker: ticker.to_uppercase(),
            price,
            previous_close: raw(&result, "/price/regularMarketPreviousClose"),
            change: raw(&result, "/price/regularMarketChange"),
            change_percent,
            market_cap: raw(&result, "/price/marketCap"),
            volume: raw(&result, "/price/regularMarketVolume"),
            week52_high: raw(&result, "/summaryDetail/fiftyTwoWeekHigh"),
            week52_low: raw(&result, "/summaryDetail/fiftyTwoWeekLow"),
        })
    }
}
