use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which Altman Z-Score formula and thresholds apply to a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyType {
    Manufacturing,
    NonManufacturing,
}

impl CompanyType {
    pub fn to_label(&self) -> &'static str {
        match self {
            CompanyType::Manufacturing => "manufacturing",
            CompanyType::NonManufacturing => "non-manufacturing",
        }
    }
}

/// A resolved security: the canonical answer to "which company did you mean?"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// The free-text input this identity was resolved from.
    pub input: String,
    pub ticker: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub company_type: CompanyType,
}

/// One candidate from a provider's name search. Sector/industry come later
/// from the overview lookup; search endpoints only return listing info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub ticker: String,
    pub name: String,
    pub exchange: Option<String>,
    pub region: Option<String>,
}

/// Canonical company profile, normalized from whichever provider answered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overview {
    pub ticker: String,
    pub name: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
}

/// One fiscal period of income statement, balance sheet, and cash flow data.
/// Fields a provider did not report are left at 0.0; the data-quality
/// assessment downgrades results accordingly. Read-only once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatementSet {
    pub ticker: String,
    pub fiscal_period_end: Option<NaiveDate>,
    // Income statement
    pub revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub net_income: f64,
    pub ebit: f64,
    pub ebitda: f64,
    pub interest_expense: f64,
    // Balance sheet
    pub total_assets: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub total_liabilities: f64,
    pub shareholder_equity: f64,
    pub retained_earnings: f64,
    pub working_capital: f64,
    pub long_term_debt: f64,
    pub short_term_debt: f64,
    pub cash: f64,
    pub inventory: f64,
    // Cash flow
    pub operating_cash_flow: f64,
    pub capex: f64,
    pub free_cash_flow: f64,
}

/// Point-in-time market data for a ticker. Cached independently of
/// statements under its own key.
///
/// `change_percent` is always in signed percent units: -3.2 means the price
/// is down 3.2% on the day. Adapters normalize their source's convention
/// (fractions, suffixed strings) into this before the value leaves the
/// provider layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: f64,
    pub volume: f64,
    pub week52_high: f64,
    pub week52_low: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRatios {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub cash_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    pub debt_to_equity: f64,
    pub debt_to_assets: f64,
    pub interest_coverage: f64,
}

/// Margins and returns are expressed as percentages (e.g. 12.5 = 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRatios {
    pub asset_turnover: f64,
    pub inventory_turnover: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRatios {
    pub ocf_to_revenue: f64,
    pub fcf_to_revenue: f64,
    pub ocf_to_current_liabilities: f64,
}

/// Shares outstanding and EPS are derived from market cap and price, so
/// these are approximations when the provider omits share counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRatios {
    pub shares_outstanding: f64,
    pub earnings_per_share: f64,
    pub price_to_earnings: f64,
    pub price_to_book: f64,
    pub price_to_sales: f64,
}

/// The full deterministic ratio set for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioBundle {
    pub liquidity: LiquidityRatios,
    pub leverage: LeverageRatios,
    pub profitability: ProfitabilityRatios,
    pub efficiency: EfficiencyRatios,
    pub cash_flow: CashFlowRatios,
    pub market: MarketRatios,
}

/// Categorical bucket derived from the Z-score relative to variant-specific
/// thresholds. `Unknown` means the score could not be computed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskZone {
    Safe,
    Grey,
    Distress,
    Unknown,
}

impl RiskZone {
    pub fn to_label(&self) -> &'static str {
        match self {
            RiskZone::Safe => "Safe",
            RiskZone::Grey => "Grey",
            RiskZone::Distress => "Distress",
            RiskZone::Unknown => "Unknown",
        }
    }
}

/// One weighted sub-factor of the Z-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZComponent {
    pub ratio: f64,
    pub weight: f64,
    pub weighted: f64,
}

impl ZComponent {
    pub fn new(ratio: f64, weight: f64) -> Self {
        Self {
            ratio,
            weight,
            weighted: ratio * weight,
        }
    }
}

/// Component breakdown of an Altman Z-score. `sales_to_assets` (the E term)
/// is absent under the non-manufacturing formula variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreComponents {
    pub working_capital_to_assets: ZComponent,
    pub retained_earnings_to_assets: ZComponent,
    pub ebit_to_assets: ZComponent,
    pub market_cap_to_liabilities: ZComponent,
    pub sales_to_assets: Option<ZComponent>,
}

/// Altman Z-Score bankruptcy indicator with its zone classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistressScore {
    pub z_score: Option<f64>,
    pub risk_zone: RiskZone,
    pub formula_variant: CompanyType,
    pub components: Option<ZScoreComponents>,
    pub interpretation: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

/// Completeness/consistency score for the financial inputs, independent of
/// the risk zone itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityAssessment {
    pub score: f64,
    pub tier: QualityTier,
    pub issues: Vec<String>,
    pub unreliable: bool,
}

/// The complete, self-sufficient contract consumed by downstream report and
/// narrative components. Nothing downstream needs raw provider responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAssessment {
    pub ratios: RatioBundle,
    pub distress_score: DistressScore,
    pub data_quality: DataQualityAssessment,
}

/// Per-item outcome inside a batch. Failures carry a reason instead of data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResult {
    pub input: String,
    pub success: bool,
    pub company: Option<CompanyIdentity>,
    pub assessment: Option<CompanyAssessment>,
    pub error: Option<String>,
}

impl CompanyResult {
    pub fn ok(input: String, company: CompanyIdentity, assessment: CompanyAssessment) -> Self {
        Self {
            input,
            success: true,
            company: Some(company),
            assessment: Some(assessment),
            error: None,
        }
    }

    pub fn failed(input: String, reason: String) -> Self {
        Self {
            input,
            success: false,
            company: None,
            assessment: None,
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub safe: usize,
    pub grey: usize,
    pub distress: usize,
    pub unknown: usize,
}

/// Percentage shares over successfully analyzed companies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskDistributionPct {
    pub safe: f64,
    pub grey: f64,
    pub distress: f64,
    pub unknown: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioRisk {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_count: usize,
    pub analyzed_count: usize,
    pub average_z_score: Option<f64>,
    pub risk_distribution: RiskDistribution,
    pub risk_distribution_pct: RiskDistributionPct,
    pub portfolio_risk: PortfolioRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub input: String,
    pub reason: String,
}

/// Result of a whole batch run. Present even when some items failed; a batch
/// only errors out when zero items succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub per_company: Vec<CompanyResult>,
    pub portfolio_summary: PortfolioSummary,
    pub failures: Vec<BatchFailure>,
    pub timestamp: DateTime<Utc>,
}
