use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single launch as served by the launch-tracking API.
///
/// Field names follow the upstream JSON so dashboards written against the
/// upstream keep working against this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub id: String,
    pub name: String,
    pub status: LaunchStatus,
    /// No Earlier Than.
    #[serde(default)]
    pub net: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_end: Option<DateTime<Utc>>,
    pub launch_service_provider: LaunchServiceProvider,
    pub rocket: LaunchRocket,
    #[serde(default)]
    pub mission: Option<Mission>,
    #[serde(default)]
    pub pad: Option<Pad>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchStatus {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub abbrev: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchServiceProvider {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRocket {
    pub configuration: RocketConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketConfiguration {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub variant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub location: Option<PadLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadLocation {
    pub id: u32,
    pub name: String,
}

impl Launch {
    pub fn is_success(&self) -> bool {
        self.status.abbrev == "Success"
    }

    pub fn mission_name(&self) -> Option<&str> {
        self.mission.as_ref().map(|m| m.name.as_str())
    }
}

/// Launch vehicle configuration merged into one record: identity,
/// manufacturer, physical specs and flight history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRocket {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub manufacturer: Option<Manufacturer>,
    #[serde(default)]
    pub program: Vec<Program>,
    /// Meters.
    #[serde(default)]
    pub length: Option<f64>,
    /// Meters.
    #[serde(default)]
    pub diameter: Option<f64>,
    /// Tonnes.
    #[serde(default)]
    pub launch_mass: Option<f64>,
    /// Kilograms to low earth orbit.
    #[serde(default)]
    pub leo_capacity: Option<f64>,
    /// Kilonewtons at liftoff.
    #[serde(default)]
    pub to_thrust: Option<f64>,
    /// Kilometers.
    #[serde(default)]
    pub apogee: Option<f64>,
    /// Kilometers.
    #[serde(default)]
    pub vehicle_range: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default)]
    pub wiki_url: Option<String>,
    #[serde(default)]
    pub total_launch_count: u32,
    #[serde(default)]
    pub consecutive_successful_launches: u32,
    #[serde(default)]
    pub successful_launches: u32,
    #[serde(default)]
    pub failed_launches: u32,
    #[serde(default)]
    pub pending_launches: u32,
    #[serde(default)]
    pub maiden_flight: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub name: String,
    #[serde(default)]
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
}

/// Headline counts for the landing page. Each field comes from its own
/// upstream count query; a failed query reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub upcoming_count: u64,
    pub ytd_count: u64,
    pub active_rockets_count: u64,
    pub agencies_count: u64,
}

/// Launch service provider IDs used to narrow the upcoming feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgencyFilter(Vec<u32>);

impl AgencyFilter {
    pub fn new(ids: Vec<u32>) -> Self {
        Self(ids)
    }

    /// Parses a comma separated ID list. Tokens that are not numeric are
    /// skipped with a warning; duplicates are kept out.
    pub fn parse(raw: &str) -> Self {
        let mut ids = Vec::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<u32>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => tracing::warn!("Ignoring non-numeric agency id: {:?}", token),
            }
        }
        Self(ids)
    }

    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the upstream `lsp__id` parameter.
    pub fn to_query_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Upstream aggregate count queries backing [`HomeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountQuery {
    Upcoming,
    /// Launches whose window opens on or after Jan 1 of the given UTC year.
    LaunchesSince(i32),
    ActiveRockets,
    ActiveAgencies,
}

impl CountQuery {
    /// Path and query relative to the upstream base URL. `limit=1` keeps the
    /// payload small; only `count` is read.
    pub fn path(&self) -> String {
        match self {
            CountQuery::Upcoming => "/launch/upcoming/?limit=1".to_string(),
            CountQuery::LaunchesSince(year) => format!(
                "/launch/?window_start__gte={}-01-01T00:00:00Z&limit=1",
                year
            ),
            CountQuery::ActiveRockets => "/config/launcher/?active=true&limit=1".to_string(),
            CountQuery::ActiveAgencies => "/agencies/?type=Government,Commercial&limit=1".to_string(),
        }
    }
}

/// Derived figures over a sample of past launches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAnalytics {
    pub sample_size: usize,
    /// Percent, one decimal place.
    pub success_rate: f64,
    pub most_active_agency: Option<String>,
    pub most_active_rocket: Option<RocketTally>,
    pub market_share: Vec<AgencyShare>,
    pub status_breakdown: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocketTally {
    pub name: String,
    pub launches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyShare {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub name: String,
    pub value: usize,
}

/// Past launches sharing a NET year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineYear {
    pub year: i32,
    pub launches: Vec<Launch>,
}
