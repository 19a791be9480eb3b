pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use core::{aggregator::LaunchAggregator, gateway::HttpGateway};
pub use domain::model::{AgencyFilter, HomeStats, Launch, UnifiedRocket};
pub use utils::error::{AppError, Result, UpstreamError};
