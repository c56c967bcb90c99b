pub mod alpha_vantage;
pub mod cache;
pub mod config;
pub mod fmp;
pub mod gateway;
pub mod provider;
pub mod quota;
pub mod resolver;
pub mod yahoo_finance;

pub use alpha_vantage::AlphaVantageClient;
pub use cache::{MarketCache, TtlCache};
pub use config::GatewaySettings;
pub use fmp::FmpClient;
pub use gateway::MarketDataGateway;
pub use provider::MarketDataProvider;
pub use quota::DailyQuota;
pub use resolver::{normalize_input, Resolver};
pub use yahoo_finance::YahooFinanceClient;
