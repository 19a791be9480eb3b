pub mod aggregator;
pub mod analytics;
pub mod cache;
pub mod export;
pub mod freshness;
pub mod gateway;

pub use crate::domain::model::{HomeStats, Launch, UnifiedRocket};
pub use crate::domain::ports::LaunchSource;
pub use crate::utils::error::Result;
