//! Portfolio-level aggregation over a batch of company results.

use risk_core::{
    CompanyResult, PortfolioRisk, PortfolioSummary, RiskDistribution, RiskDistributionPct,
    RiskZone,
};

// Portfolio tier thresholds, in percent of analyzed companies.
const HIGH_DISTRESS_PCT: f64 = 25.0;
const MEDIUM_DISTRESS_PCT: f64 = 10.0;
const MEDIUM_GREY_PCT: f64 = 50.0;

/// Aggregate per-company results into a portfolio summary. Failed items
/// count toward `total_count` only; distribution percentages and the
/// average Z-score are taken over successful analyses.
pub fn summarize(results: &[CompanyResult]) -> PortfolioSummary {
    let mut distribution = RiskDistribution::default();
    let mut z_sum = 0.0;
    let mut z_count = 0usize;
    let mut analyzed = 0usize;

    for result in results.iter().filter(|r| r.success) {
        analyzed += 1;
        let Some(assessment) = &result.assessment else {
            continue;
        };
        match assessment.distress_score.risk_zone {
            RiskZone::Safe => distribution.safe += 1,
            RiskZone::Grey => distribution.grey += 1,
            RiskZone::Distress => distribution.distress += 1,
            RiskZone::Unknown => distribution.unknown += 1,
        }
        if let Some(z) = assessment.distress_score.z_score {
            z_sum += z;
            z_count += 1;
        }
    }

    let pct = |count: usize| {
        if analyzed == 0 {
            0.0
        } else {
            count as f64 / analyzed as f64 * 100.0
        }
    };
    let distribution_pct = RiskDistributionPct {
        safe: pct(distribution.safe),
        grey: pct(distribution.grey),
        distress: pct(distribution.distress),
        unknown: pct(distribution.unknown),
    };

    PortfolioSummary {
        total_count: results.len(),
        analyzed_count: analyzed,
        average_z_score: if z_count > 0 {
            Some(z_sum / z_count as f64)
        } else {
            None
        },
        portfolio_risk: classify_portfolio(&distribution_pct),
        risk_distribution: distribution,
        risk_distribution_pct: distribution_pct,
    }
}

fn classify_portfolio(pct: &RiskDistributionPct) -> PortfolioRisk {
    if pct.distress > HIGH_DISTRESS_PCT {
        PortfolioRisk::High
    } else if pct.distress > MEDIUM_DISTRESS_PCT || pct.grey > MEDIUM_GREY_PCT {
        PortfolioRisk::Medium
    } else {
        PortfolioRisk::Low
    }
}
