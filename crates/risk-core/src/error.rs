use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Resolution failed: {0}")]
    Resolution(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Batch failed: {0}")]
    BatchFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
