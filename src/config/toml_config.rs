use crate::core::aggregator::DEFAULT_FLEET_IDS;
use crate::core::cache::CacheHorizons;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Production Launch Library endpoint. `lldev.thespacedevs.com` serves the
/// same API with looser rate limits for development.
pub const DEFAULT_BASE_URL: &str = "https://ll.thespacedevs.com/2.2.0";
pub const DEFAULT_USER_AGENT: &str = "T-Zero/1.0";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub fleet: FleetConfig,
    pub cache: CacheHorizons,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub rocket_ids: Vec<u32>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            rocket_ids: DEFAULT_FLEET_IDS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Seconds between sweeps of expired cache entries.
    pub cache_sweep_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cache_sweep_seconds: 300,
        }
    }
}

impl AppConfig {
    /// Loads a TOML file, or defaults when no path is given, then applies
    /// `T_ZERO_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left
    /// as written so validation reports them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var("T_ZERO_UPSTREAM_URL") {
            tracing::debug!("Upstream base URL overridden from environment");
            self.upstream.base_url = base_url;
        }
        if let Ok(user_agent) = env::var("T_ZERO_USER_AGENT") {
            self.upstream.user_agent = user_agent;
        }
        if let Ok(bind) = env::var("T_ZERO_BIND") {
            self.server.bind = bind;
        }
    }
}

// Upper staleness bounds per query class. Zero disables caching.
const MAX_NEXT_LAUNCH_SECONDS: u64 = 600;
const MAX_UPCOMING_SECONDS: u64 = 3600;
const MAX_RECENT_SECONDS: u64 = 3600;
const MAX_FLEET_SECONDS: u64 = 86400;
const MAX_STATS_SECONDS: u64 = 3600;

fn validate_horizon(field: &str, seconds: u64, max: u64) -> Result<()> {
    validation::validate_range(field, seconds, 0, max)
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("upstream.base_url", &self.upstream.base_url)?;
        validation::validate_non_empty_string("upstream.user_agent", &self.upstream.user_agent)?;
        validation::validate_positive_number(
            "upstream.timeout_seconds",
            self.upstream.timeout_seconds,
            1,
        )?;
        validation::validate_range("upstream.timeout_seconds", self.upstream.timeout_seconds, 1, 120)?;
        validation::validate_non_empty_list("fleet.rocket_ids", &self.fleet.rocket_ids)?;
        validate_horizon(
            "cache.next_launch_seconds",
            self.cache.next_launch_seconds,
            MAX_NEXT_LAUNCH_SECONDS,
        )?;
        validate_horizon(
            "cache.upcoming_seconds",
            self.cache.upcoming_seconds,
            MAX_UPCOMING_SECONDS,
        )?;
        validate_horizon(
            "cache.recent_seconds",
            self.cache.recent_seconds,
            MAX_RECENT_SECONDS,
        )?;
        validate_horizon(
            "cache.fleet_seconds",
            self.cache.fleet_seconds,
            MAX_FLEET_SECONDS,
        )?;
        validate_horizon(
            "cache.stats_seconds",
            self.cache.stats_seconds,
            MAX_STATS_SECONDS,
        )?;
        validation::validate_non_empty_string("server.bind", &self.server.bind)?;
        validation::validate_positive_number(
            "server.cache_sweep_seconds",
            self.server.cache_sweep_seconds,
            1,
        )?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
