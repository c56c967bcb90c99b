//! Deterministic financial-ratio and distress-score engine.
//!
//! Everything here is a pure function of its inputs: no I/O, no clocks, no
//! randomness. The same statements and snapshot always produce the same
//! ratio bundle, Z-score, and data-quality assessment.

use risk_core::{
    CashFlowRatios, CompanyAssessment, CompanyType, DataQualityAssessment, DistressScore,
    EfficiencyRatios, FinancialStatementSet, LeverageRatios, LiquidityRatios, MarketRatios,
    MarketSnapshot, ProfitabilityRatios, QualityTier, RatioBundle, RiskZone, ZComponent,
    ZScoreComponents,
};

/// Cap applied when a ratio is effectively unbounded: a zero denominator
/// with a positive numerator (e.g. interest coverage with no interest
/// expense and positive EBIT). A finite sentinel keeps downstream math and
/// serialization NaN/infinity-free.
pub const RATIO_UNBOUNDED: f64 = 999.0;

// Z-score weights, Altman (1968) and the non-manufacturing revision.
const MFG_WEIGHTS: [f64; 5] = [1.2, 1.4, 3.3, 0.6, 1.0];
const NON_MFG_WEIGHTS: [f64; 4] = [6.56, 3.26, 6.72, 1.05];

// Zone thresholds per formula variant. Boundary values classify upward:
// exactly 2.99 is Safe, exactly 1.8 is Grey.
const MFG_SAFE: f64 = 2.99;
const MFG_DISTRESS: f64 = 1.8;
const NON_MFG_SAFE: f64 = 2.6;
const NON_MFG_DISTRESS: f64 = 1.1;

/// Division that defines 0/0 and x/0 as 0.0 instead of NaN/infinity.
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn pct(numerator: f64, denominator: f64) -> f64 {
    safe_div(numerator, denominator) * 100.0
}

pub struct RatioEngine;

impl RatioEngine {
    pub fn new() -> Self {
        Self
    }

    /// Full assessment: ratio bundle + Z-score + data quality.
    pub fn assess(
        &self,
        statements: &FinancialStatementSet,
        snapshot: &MarketSnapshot,
        company_type: CompanyType,
    ) -> CompanyAssessment {
        CompanyAssessment {
            ratios: self.compute_ratios(statements, snapshot),
            distress_score: self.compute_distress_score(
                statements,
                snapshot.market_cap,
                company_type,
            ),
            data_quality: self.assess_data_quality(statements, snapshot),
        }
    }

    pub fn compute_ratios(
        &self,
        fs: &FinancialStatementSet,
        snap: &MarketSnapshot,
    ) -> RatioBundle {
        let liquidity = LiquidityRatios {
            current_ratio: safe_div(fs.current_assets, fs.current_liabilities),
            quick_ratio: safe_div(fs.current_assets - fs.inventory, fs.current_liabilities),
            cash_ratio: safe_div(fs.cash, fs.current_liabilities),
        };

        let total_debt = fs.long_term_debt + fs.short_term_debt;
        let interest_coverage = if fs.interest_expense == 0.0 {
            if fs.ebit > 0.0 {
                RATIO_UNBOUNDED
            } else {
                0.0
            }
        } else {
            fs.ebit / fs.interest_expense
        };
        let leverage = LeverageRatios {
            debt_to_equity: safe_div(total_debt, fs.shareholder_equity),
            debt_to_assets: safe_div(total_debt, fs.total_assets),
            interest_coverage,
        };

        let profitability = ProfitabilityRatios {
            gross_margin: pct(fs.gross_profit, fs.revenue),
            operating_margin: pct(fs.operating_income, fs.revenue),
            net_margin: pct(fs.net_income, fs.revenue),
            return_on_assets: pct(fs.net_income, fs.total_assets),
            return_on_equity: pct(fs.net_income, fs.shareholder_equity),
        };

        let cogs = fs.revenue - fs.gross_profit;
        let efficiency = EfficiencyRatios {
            asset_turnover: safe_div(fs.revenue, fs.total_assets),
            inventory_turnover: safe_div(cogs, fs.inventory),
        };

        let cash_flow = CashFlowRatios {
            ocf_to_revenue: safe_div(fs.operating_cash_flow, fs.revenue),
            fcf_to_revenue: safe_div(fs.free_cash_flow, fs.revenue),
            ocf_to_current_liabilities: safe_div(fs.operating_cash_flow, fs.current_liabilities),
        };

        // Shares outstanding derived from market cap; per-share figures are
        // zero when either market cap or price is unavailable.
        let shares_outstanding = safe_div(snap.market_cap, snap.price);
        let earnings_per_share = safe_div(fs.net_income, shares_outstanding);
        let book_value_per_share = safe_div(fs.shareholder_equity, shares_outstanding);
        let revenue_per_share = safe_div(fs.revenue, shares_outstanding);
        let market = MarketRatios {
            shares_outstanding,
            earnings_per_share,
            price_to_earnings: if earnings_per_share > 0.0 {
                snap.price / earnings_per_share
            } else {
                0.0
            },
            price_to_book: if book_value_per_share > 0.0 {
                snap.price / book_value_per_share
            } else {
                0.0
            },
            price_to_sales: if revenue_per_share > 0.0 {
                snap.price / revenue_per_share
            } else {
                0.0
            },
        };

        RatioBundle {
            liquidity,
            leverage,
            profitability,
            efficiency,
            cash_flow,
            market,
        }
    }

    /// Altman Z-Score with the weight set and zone thresholds selected by
    /// the formula variant. Zero total assets makes the score undefined:
    /// the result is `RiskZone::Unknown` with an explanation, never a panic
    /// or a fabricated number.
    pub fn compute_distress_score(
        &self,
        fs: &FinancialStatementSet,
        market_cap: f64,
        company_type: CompanyType,
    ) -> DistressScore {
        if fs.total_assets == 0.0 {
            return DistressScore {
                z_score: None,
                risk_zone: RiskZone::Unknown,
                formula_variant: company_type,
                components: None,
                interpretation: "Z-score could not be computed: total assets are zero or \
                                 missing, so every asset-based factor is undefined."
                    .to_string(),
                confidence: "none".to_string(),
            };
        }

        let a = fs.working_capital / fs.total_assets;
        let b = fs.retained_earnings / fs.total_assets;
        let c = fs.ebit / fs.total_assets;
        let d = safe_div(market_cap, fs.total_liabilities);
        let e = fs.revenue / fs.total_assets;

        let (components, z) = match company_type {
            CompanyType::Manufacturing => {
                let [wa, wb, wc, wd, we] = MFG_WEIGHTS;
                let comps = ZScoreComponents {
                    working_capital_to_assets: ZComponent::new(a, wa),
                    retained_earnings_to_assets: ZComponent::new(b, wb),
                    ebit_to_assets: ZComponent::new(c, wc),
                    market_cap_to_liabilities: ZComponent::new(d, wd),
                    sales_to_assets: Some(ZComponent::new(e, we)),
                };
                let z = wa * a + wb * b + wc * c + wd * d + we * e;
                (comps, z)
            }
            CompanyType::NonManufacturing => {
                let [wa, wb, wc, wd] = NON_MFG_WEIGHTS;
                let comps = ZScoreComponents {
                    working_capital_to_assets: ZComponent::new(a, wa),
                    retained_earnings_to_assets: ZComponent::new(b, wb),
                    ebit_to_assets: ZComponent::new(c, wc),
                    market_cap_to_liabilities: ZComponent::new(d, wd),
                    sales_to_assets: None,
                };
                let z = wa * a + wb * b + wc * c + wd * d;
                (comps, z)
            }
        };

        let risk_zone = zone_for(z, company_type);
        let confidence = score_confidence(fs, market_cap);
        let interpretation = interpret(z, risk_zone, company_type);

        DistressScore {
            z_score: Some(z),
            risk_zone,
            formula_variant: company_type,
            components: Some(components),
            interpretation,
            confidence,
        }
    }

    /// Completeness/consistency score over the engine inputs: one point per
    /// present input field plus two internal-consistency checks, scaled to
    /// 0-100.
    pub fn assess_data_quality(
        &self,
        fs: &FinancialStatementSet,
        snap: &MarketSnapshot,
    ) -> DataQualityAssessment {
        let mut points = 0u32;
        let mut issues = Vec::new();

        let presence: [(&str, bool); 8] = [
            ("revenue missing or zero", fs.revenue != 0.0),
            ("net income missing or zero", fs.net_income != 0.0),
            ("EBIT missing or zero", fs.ebit != 0.0),
            ("total assets missing or zero", fs.total_assets > 0.0),
            ("shareholder equity missing or zero", fs.shareholder_equity != 0.0),
            ("current assets missing or zero", fs.current_assets > 0.0),
            ("market price unavailable", snap.price > 0.0),
            ("market capitalization unavailable", snap.market_cap > 0.0),
        ];
        for (issue, present) in presence {
            if present {
                points += 1;
            } else {
                issues.push(issue.to_string());
            }
        }

        // Consistency: current assets cannot exceed total assets.
        if fs.total_assets > 0.0 && fs.current_assets > fs.total_assets {
            issues.push("current assets exceed total assets".to_string());
        } else {
            points += 1;
        }

        // Consistency: assets ≈ liabilities + equity within 1% tolerance.
        let balance_gap = (fs.total_assets - (fs.total_liabilities + fs.shareholder_equity)).abs();
        if fs.total_assets > 0.0 && balance_gap > fs.total_assets * 0.01 {
            issues.push("balance sheet does not balance".to_string());
        } else {
            points += 1;
        }

        let score = points as f64 / 10.0 * 100.0;
        let tier = if score >= 80.0 {
            QualityTier::High
        } else if score >= 60.0 {
            QualityTier::Medium
        } else {
            QualityTier::Low
        };
        let unreliable = tier == QualityTier::Low;
        if unreliable {
            issues.push("results may be unreliable".to_string());
        }

        DataQualityAssessment {
            score,
            tier,
            issues,
            unreliable,
        }
    }
}

impl Default for RatioEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn zone_for(z: f64, variant: CompanyType) -> RiskZone {
    let (safe, distress) = match variant {
        CompanyType::Manufacturing => (MFG_SAFE, MFG_DISTRESS),
        CompanyType::NonManufacturing => (NON_MFG_SAFE, NON_MFG_DISTRESS),
    };
    if z >= safe {
        RiskZone::Safe
    } else if z >= distress {
        RiskZone::Grey
    } else {
        RiskZone::Distress
    }
}

/// Confidence tier from how many of the five score inputs are actually
/// populated (total assets is already known to be non-zero here).
fn score_confidence(fs: &FinancialStatementSet, market_cap: f64) -> String {
    let populated = [
        fs.working_capital != 0.0,
        fs.retained_earnings != 0.0,
        fs.ebit != 0.0,
        market_cap > 0.0 && fs.total_liabilities > 0.0,
        fs.revenue != 0.0,
    ]
    .iter()
    .filter(|&&p| p)
    .count();

    match populated {
        5 => "high",
        3 | 4 => "moderate",
        _ => "low",
    }
    .to_string()
}

fn interpret(z: f64, zone: RiskZone, variant: CompanyType) -> String {
    let zone_text = match zone {
        RiskZone::Safe => "well clear of the distress threshold; bankruptcy risk is low",
        RiskZone::Grey => "in the grey zone; the company warrants monitoring",
        RiskZone::Distress => "in the distress zone; elevated bankruptcy risk within two years",
        RiskZone::Unknown => "not classifiable",
    };
    format!(
        "Z-score of {z:.2} under the {} formula is {zone_text}.",
        variant.to_label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements() -> FinancialStatementSet {
        FinancialStatementSet {
            ticker: "TEST".to_string(),
            revenue: 800.0,
            gross_profit: 300.0,
            operating_income: 120.0,
            net_income: 90.0,
            ebit: 100.0,
            ebitda: 140.0,
            interest_expense: 20.0,
            total_assets: 1000.0,
            current_assets: 400.0,
            current_liabilities: 200.0,
            total_liabilities: 600.0,
            shareholder_equity: 400.0,
            retained_earnings: 150.0,
            working_capital: 200.0,
            long_term_debt: 250.0,
            short_term_debt: 50.0,
            cash: 100.0,
            inventory: 80.0,
            operating_cash_flow: 110.0,
            capex: 40.0,
            free_cash_flow: 70.0,
            ..Default::default()
        }
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            ticker: "TEST".to_string(),
            price: 90.0,
            previous_close: 89.0,
            change: 1.0,
            change_percent: 1.12,
            market_cap: 900.0,
            volume: 1_000_000.0,
            week52_high: 120.0,
            week52_low: 60.0,
        }
    }

    #[test]
    fn test_liquidity_ratios() {
        let engine = RatioEngine::new();
        let ratios = engine.compute_ratios(&statements(), &snapshot());
        assert!((ratios.liquidity.current_ratio - 2.0).abs() < 1e-9);
        assert!((ratios.liquidity.quick_ratio - 1.6).abs() < 1e-9);
        assert!((ratios.liquidity.cash_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_current_liabilities_yield_zero_not_nan() {
        let engine = RatioEngine::new();
        let mut fs = statements();
        fs.current_liabilities = 0.0;
        let ratios = engine.compute_ratios(&fs, &snapshot());
        assert_eq!(ratios.liquidity.current_ratio, 0.0);
        assert_eq!(ratios.liquidity.quick_ratio, 0.0);
        assert_eq!(ratios.liquidity.cash_ratio, 0.0);
        assert_eq!(ratios.cash_flow.ocf_to_current_liabilities, 0.0);
    }

    #[test]
    fn test_interest_coverage_uses_unbounded_sentinel() {
        let engine = RatioEngine::new();
        let mut fs = statements();
        fs.interest_expense = 0.0;
        let ratios = engine.compute_ratios(&fs, &snapshot());
        assert_eq!(ratios.leverage.interest_coverage, RATIO_UNBOUNDED);

        fs.ebit = -10.0;
        let ratios = engine.compute_ratios(&fs, &snapshot());
        assert_eq!(ratios.leverage.interest_coverage, 0.0);
    }

    #[test]
    fn test_profitability_margins_are_percentages() {
        let engine = RatioEngine::new();
        let ratios = engine.compute_ratios(&statements(), &snapshot());
        assert!((ratios.profitability.gross_margin - 37.5).abs() < 1e-9);
        assert!((ratios.profitability.net_margin - 11.25).abs() < 1e-9);
        assert!((ratios.profitability.return_on_assets - 9.0).abs() < 1e-9);
        assert!((ratios.profitability.return_on_equity - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_market_ratios_derived_from_market_cap() {
        let engine = RatioEngine::new();
        let ratios = engine.compute_ratios(&statements(), &snapshot());
        // shares = 900 / 90 = 10; eps = 9; pe = 10
        assert!((ratios.market.shares_outstanding - 10.0).abs() < 1e-9);
        assert!((ratios.market.earnings_per_share - 9.0).abs() < 1e-9);
        assert!((ratios.market.price_to_earnings - 10.0).abs() < 1e-9);
        // bvps = 40; pb = 2.25
        assert!((ratios.market.price_to_book - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_market_ratios_zero_when_price_missing() {
        let engine = RatioEngine::new();
        let mut snap = snapshot();
        snap.price = 0.0;
        let ratios = engine.compute_ratios(&statements(), &snap);
        assert_eq!(ratios.market.shares_outstanding, 0.0);
        assert_eq!(ratios.market.price_to_earnings, 0.0);
    }

    #[test]
    fn test_non_manufacturing_worked_example() {
        // A=0.2, B=0.15, C=0.1, D=1.5 => Z = 1.312+0.489+0.672+1.575 = 4.048
        let engine = RatioEngine::new();
        let score = engine.compute_distress_score(
            &statements(),
            900.0,
            CompanyType::NonManufacturing,
        );
        let z = score.z_score.unwrap();
        assert!((z - 4.048).abs() < 1e-9);
        assert_eq!(score.risk_zone, RiskZone::Safe);
        let comps = score.components.unwrap();
        assert!(comps.sales_to_assets.is_none());
        assert!((comps.market_cap_to_liabilities.weighted - 1.575).abs() < 1e-9);
    }

    #[test]
    fn test_manufacturing_includes_sales_term() {
        let engine = RatioEngine::new();
        let score =
            engine.compute_distress_score(&statements(), 900.0, CompanyType::Manufacturing);
        // Z = 1.2*0.2 + 1.4*0.15 + 3.3*0.1 + 0.6*1.5 + 1.0*0.8 = 2.48
        assert!((score.z_score.unwrap() - 2.48).abs() < 1e-9);
        assert_eq!(score.risk_zone, RiskZone::Grey);
        assert!(score.components.unwrap().sales_to_assets.is_some());
    }

    #[test]
    fn test_manufacturing_zone_boundaries_exact() {
        assert_eq!(zone_for(2.99, CompanyType::Manufacturing), RiskZone::Safe);
        assert_eq!(zone_for(2.989, CompanyType::Manufacturing), RiskZone::Grey);
        assert_eq!(zone_for(1.8, CompanyType::Manufacturing), RiskZone::Grey);
        assert_eq!(zone_for(1.799, CompanyType::Manufacturing), RiskZone::Distress);
    }

    #[test]
    fn test_non_manufacturing_zone_boundaries_exact() {
        assert_eq!(zone_for(2.6, CompanyType::NonManufacturing), RiskZone::Safe);
        assert_eq!(zone_for(2.599, CompanyType::NonManufacturing), RiskZone::Grey);
        assert_eq!(zone_for(1.1, CompanyType::NonManufacturing), RiskZone::Grey);
        assert_eq!(zone_for(1.099, CompanyType::NonManufacturing), RiskZone::Distress);
    }

    #[test]
    fn test_zero_total_assets_yields_unknown_not_panic() {
        let engine = RatioEngine::new();
        let mut fs = statements();
        fs.total_assets = 0.0;
        let score = engine.compute_distress_score(&fs, 900.0, CompanyType::NonManufacturing);
        assert_eq!(score.risk_zone, RiskZone::Unknown);
        assert!(score.z_score.is_none());
        assert!(score.components.is_none());
        assert!(!score.interpretation.is_empty());
    }

    #[test]
    fn test_distress_score_is_deterministic() {
        let engine = RatioEngine::new();
        let a = engine.compute_distress_score(&statements(), 900.0, CompanyType::Manufacturing);
        let b = engine.compute_distress_score(&statements(), 900.0, CompanyType::Manufacturing);
        assert_eq!(a.z_score, b.z_score);
        assert_eq!(a.risk_zone, b.risk_zone);
        assert_eq!(a.interpretation, b.interpretation);
    }

    #[test]
    fn test_data_quality_full_marks() {
        let engine = RatioEngine::new();
        let quality = engine.assess_data_quality(&statements(), &snapshot());
        assert_eq!(quality.score, 100.0);
        assert_eq!(quality.tier, QualityTier::High);
        assert!(quality.issues.is_empty());
        assert!(!quality.unreliable);
    }

    #[test]
    fn test_data_quality_flags_unbalanced_balance_sheet() {
        let engine = RatioEngine::new();
        let mut fs = statements();
        fs.shareholder_equity = 100.0; // liab + equity = 700 vs assets 1000
        let quality = engine.assess_data_quality(&fs, &snapshot());
        assert!(quality
            .issues
            .iter()
            .any(|i| i == "balance sheet does not balance"));
        assert!(quality.score < 100.0);
    }

    #[test]
    fn test_data_quality_low_tier_sets_unreliable_flag() {
        let engine = RatioEngine::new();
        let fs = FinancialStatementSet::default();
        let snap = MarketSnapshot::default();
        let quality = engine.assess_data_quality(&fs, &snap);
        assert_eq!(quality.tier, QualityTier::Low);
        assert!(quality.unreliable);
        assert!(quality.issues.iter().any(|i| i == "results may be unreliable"));
    }

    #[test]
    fn test_assess_bundles_all_three_outputs() {
        let engine = RatioEngine::new();
        let assessment = engine.assess(&statements(), &snapshot(), CompanyType::NonManufacturing);
        assert_eq!(assessment.distress_score.risk_zone, RiskZone::Safe);
        assert_eq!(assessment.data_quality.tier, QualityTier::High);
        assert!(assessment.ratios.liquidity.current_ratio > 0.0);
    }
}
