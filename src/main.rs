use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use t_zero::config::{Command, OutputFormat};
use t_zero::core::analytics::Countdown;
use t_zero::core::export;
use t_zero::utils::logger;
use t_zero::{AgencyFilter, AppConfig, AppError, CliConfig, HttpGateway, LaunchAggregator};

#[actix_web::main]
async fn main() {
    let cli = CliConfig::parse();

    if matches!(cli.command, Command::Serve { .. }) {
        logger::init_server_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let result = match cli.resolve() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(e.exit_code());
    }
}

fn build_aggregator(config: &AppConfig) -> Result<LaunchAggregator<HttpGateway>, AppError> {
    let gateway = HttpGateway::new(&config.upstream, config.cache.clone())?;
    Ok(LaunchAggregator::with_fleet(
        gateway,
        config.fleet.rocket_ids.clone(),
    ))
}

async fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    let mut out = std::io::stdout();

    match command {
        Command::Serve { .. } => t_zero::server::run(config).await?,
        Command::Upcoming {
            limit,
            agency_ids,
            format,
        } => {
            let agencies = agency_ids
                .as_deref()
                .map(AgencyFilter::parse)
                .unwrap_or_default();
            let launches = build_aggregator(&config)?
                .upcoming_launches(limit, &agencies)
                .await;
            match format {
                OutputFormat::Json => print_json(&mut out, &launches)?,
                OutputFormat::Csv => export::write_launches_csv(&launches, &mut out)?,
            }
        }
        Command::Next => match build_aggregator(&config)?.next_launch().await {
            Some(launch) => {
                print_json(&mut out, &launch)?;
                if let Some(net) = launch.net {
                    writeln!(out, "{}", Countdown::render(net, Utc::now()))?;
                }
            }
            None => {
                tracing::warn!("No upcoming launch available");
                print_json(&mut out, &Option::<()>::None)?;
            }
        },
        Command::Recent { limit, format } => {
            let launches = build_aggregator(&config)?.recent_launches(limit).await;
            match format {
                OutputFormat::Json => print_json(&mut out, &launches)?,
                OutputFormat::Csv => export::write_launches_csv(&launches, &mut out)?,
            }
        }
        Command::Fleet { format } => {
            let fleet = build_aggregator(&config)?.unified_fleet().await;
            match format {
                OutputFormat::Json => print_json(&mut out, &fleet)?,
                OutputFormat::Csv => export::write_fleet_csv(&fleet, &mut out)?,
            }
        }
        Command::Stats => print_json(&mut out, &build_aggregator(&config)?.home_stats().await)?,
        Command::Analytics => {
            print_json(&mut out, &build_aggregator(&config)?.analytics().await)?
        }
        Command::Timeline { limit } => {
            print_json(&mut out, &build_aggregator(&config)?.timeline(limit).await)?
        }
    }

    Ok(())
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
