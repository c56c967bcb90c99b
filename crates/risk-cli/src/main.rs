use anyhow::{bail, Result};

use provider_gateway::GatewaySettings;
use risk_orchestrator::RiskOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let inputs: Vec<String> = std::env::args().skip(1).collect();
    if inputs.is_empty() {
        bail!("usage: risk-cli <company or ticker> [<company or ticker> ...]");
    }

    let settings = GatewaySettings::from_env();
    let gateway = settings.build_gateway();
    tracing::info!(
        "gateway ready with {} provider(s)",
        gateway.providers().len()
    );

    let orchestrator = RiskOrchestrator::new(gateway);
    let report = orchestrator.analyze_batch(&inputs).await?;

    for result in &report.per_company {
        match (&result.company, &result.assessment) {
            (Some(company), Some(assessment)) => {
                let z = assessment
                    .distress_score
                    .z_score
                    .map(|z| format!("{z:.2}"))
                    .unwrap_or_else(|| "n/a".to_string());
                tracing::info!(
                    "{} ({}): Z={} zone={} quality={:.0}",
                    company.ticker,
                    company.name,
                    z,
                    assessment.distress_score.risk_zone.to_label(),
                    assessment.data_quality.score
                );
            }
            _ => {
                tracing::warn!(
                    "'{}' failed: {}",
                    result.input,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
