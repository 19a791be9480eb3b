use crate::domain::model::{Launch, UnifiedRocket};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct LaunchRow<'a> {
    id: &'a str,
    name: &'a str,
    status: &'a str,
    net: String,
    provider: &'a str,
    rocket: &'a str,
    mission: &'a str,
    pad: &'a str,
    location: &'a str,
}

impl<'a> From<&'a Launch> for LaunchRow<'a> {
    fn from(launch: &'a Launch) -> Self {
        let pad = launch.pad.as_ref();
        Self {
            id: &launch.id,
            name: &launch.name,
            status: &launch.status.abbrev,
            net: launch.net.map(|net| net.to_rfc3339()).unwrap_or_default(),
            provider: &launch.launch_service_provider.name,
            rocket: &launch.rocket.configuration.name,
            mission: launch.mission_name().unwrap_or(""),
            pad: pad.map(|p| p.name.as_str()).unwrap_or(""),
            location: pad
                .and_then(|p| p.location.as_ref())
                .map(|l| l.name.as_str())
                .unwrap_or(""),
        }
    }
}

#[derive(Debug, Serialize)]
struct RocketRow<'a> {
    id: u32,
    name: &'a str,
    family: &'a str,
    variant: &'a str,
    manufacturer: &'a str,
    country_code: &'a str,
    leo_capacity_kg: Option<f64>,
    total_launches: u32,
    successful_launches: u32,
    failed_launches: u32,
    maiden_flight: String,
}

impl<'a> From<&'a UnifiedRocket> for RocketRow<'a> {
    fn from(rocket: &'a UnifiedRocket) -> Self {
        let manufacturer = rocket.manufacturer.as_ref();
        Self {
            id: rocket.id,
            name: &rocket.name,
            family: &rocket.family,
            variant: &rocket.variant,
            manufacturer: manufacturer.map(|m| m.name.as_str()).unwrap_or(""),
            country_code: manufacturer.map(|m| m.country_code.as_str()).unwrap_or(""),
            leo_capacity_kg: rocket.leo_capacity,
            total_launches: rocket.total_launch_count,
            successful_launches: rocket.successful_launches,
            failed_launches: rocket.failed_launches,
            maiden_flight: rocket
                .maiden_flight
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Writes one CSV row per launch, header first.
pub fn write_launches_csv<W: Write>(launches: &[Launch], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if launches.is_empty() {
        csv_writer.write_record([
            "id", "name", "status", "net", "provider", "rocket", "mission", "pad", "location",
        ])?;
    }
    for launch in launches {
        csv_writer.serialize(LaunchRow::from(launch))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_fleet_csv<W: Write>(fleet: &[UnifiedRocket], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for rocket in fleet {
        csv_writer.serialize(RocketRow::from(rocket))?;
    }
    csv_writer.flush()?;
    Ok(())
}
