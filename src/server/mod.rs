pub mod routes;

use crate::config::toml_config::AppConfig;
use crate::core::aggregator::LaunchAggregator;
use crate::core::cache::CacheHorizons;
use crate::core::gateway::HttpGateway;
use crate::utils::error::Result;
use actix_web::{web, App, HttpServer};
use std::time::Duration;

pub use routes::configure;

/// Shared by every worker. The gateway's response cache is the only
/// mutable piece.
#[derive(Debug)]
pub struct AppState {
    pub aggregator: LaunchAggregator<HttpGateway>,
    pub horizons: CacheHorizons,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let gateway = HttpGateway::new(&config.upstream, config.cache.clone())?;
        Ok(Self {
            aggregator: LaunchAggregator::with_fleet(gateway, config.fleet.rocket_ids.clone()),
            horizons: config.cache.clone(),
        })
    }
}

/// Periodically drops expired upstream bodies so rarely repeated URLs do not
/// pile up.
fn spawn_cache_sweeper(state: web::Data<AppState>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let remaining = state.aggregator.source().cache().purge_expired();
            tracing::debug!("Cache sweep done, {} entries live", remaining);
        }
    });
}

pub async fn run(config: AppConfig) -> Result<()> {
    let state = web::Data::new(AppState::from_config(&config)?);
    spawn_cache_sweeper(
        state.clone(),
        Duration::from_secs(config.server.cache_sweep_seconds),
    );

    tracing::info!(
        "Serving launch API on http://{} (upstream {})",
        config.server.bind,
        state.aggregator.source().base_url()
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(config.server.bind.as_str())?
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
