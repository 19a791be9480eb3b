use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "t-zero")]
#[command(about = "Space launch aggregator: upcoming launches, fleet, stats and analytics")]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the upstream Launch Library base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8080
        #[arg(long)]
        bind: Option<String>,
    },
    /// Upcoming launches that have not flown yet
    Upcoming {
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Comma separated launch service provider IDs, e.g. 121,44
        #[arg(long)]
        agency_ids: Option<String>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// The next launch and its countdown
    Next,
    /// Most recent past launches
    Recent {
        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Launch vehicle catalog
    Fleet {
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Headline counts
    Stats,
    /// Success rate, market share and most-flown rocket over the last 100 launches
    Analytics,
    /// Recent launches grouped by year
    Timeline {
        #[arg(long, default_value = "30")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl CliConfig {
    /// Resolves the effective configuration: file (or defaults), environment
    /// overrides, then command-line flags, validated.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;

        if let Some(base_url) = &self.base_url {
            config.upstream.base_url = base_url.clone();
        }
        if let Command::Serve { bind: Some(bind) } = &self.command {
            config.server.bind = bind.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
