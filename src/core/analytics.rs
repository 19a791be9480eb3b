use crate::domain::model::{
    AgencyShare, Launch, LaunchAnalytics, RocketTally, StatusCount, TimelineYear,
};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Agencies shown in the market-share chart; everything else folds into
/// "Other".
const MARKET_SHARE_SLOTS: usize = 6;

/// Collapses provider names to the short labels used in charts.
pub fn simplify_agency(name: &str) -> &'static str {
    const LABELS: [(&str, &str); 6] = [
        ("SpaceX", "SpaceX"),
        ("NASA", "NASA"),
        ("Indian", "ISRO"),
        ("China", "CASC"),
        ("Rocket Lab", "Rocket Lab"),
        ("Roscosmos", "Roscosmos"),
    ];
    LABELS
        .iter()
        .find(|(needle, _)| name.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or("Other")
}

/// Counts occurrences keeping first-seen order, so ties sort stably.
fn tally<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key.to_string(), 1)),
        }
    }
    counts
}

fn sorted_desc(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn summarize(launches: &[Launch]) -> LaunchAnalytics {
    if launches.is_empty() {
        return LaunchAnalytics::default();
    }

    let agencies = sorted_desc(tally(
        launches
            .iter()
            .map(|l| simplify_agency(&l.launch_service_provider.name)),
    ));
    let rockets = sorted_desc(tally(
        launches.iter().map(|l| l.rocket.configuration.name.as_str()),
    ));
    let statuses = tally(launches.iter().map(|l| l.status.name.as_str()));

    let successes = launches.iter().filter(|l| l.is_success()).count();
    let success_rate = round_one_decimal(successes as f64 / launches.len() as f64 * 100.0);

    let market_share: Vec<AgencyShare> = agencies
        .into_iter()
        .take(MARKET_SHARE_SLOTS)
        .map(|(name, count)| AgencyShare { name, count })
        .collect();

    LaunchAnalytics {
        sample_size: launches.len(),
        success_rate,
        most_active_agency: market_share.first().map(|share| share.name.clone()),
        most_active_rocket: rockets
            .into_iter()
            .next()
            .map(|(name, launches)| RocketTally { name, launches }),
        market_share,
        status_breakdown: statuses
            .into_iter()
            .map(|(name, value)| StatusCount { name, value })
            .collect(),
    }
}

/// Groups launches by the UTC year of their NET, newest year first. Order
/// inside a year is the input order. Launches without a NET are skipped.
pub fn group_by_year(launches: Vec<Launch>) -> Vec<TimelineYear> {
    let mut years: BTreeMap<i32, Vec<Launch>> = BTreeMap::new();
    for launch in launches {
        if let Some(net) = launch.net {
            years.entry(net.year()).or_default().push(launch);
        }
    }

    years
        .into_iter()
        .rev()
        .map(|(year, launches)| TimelineYear { year, launches })
        .collect()
}

/// Time left until a NET, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// `None` once the target has been reached.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<Self> {
        let remaining = (target - now).num_seconds();
        if remaining <= 0 {
            return None;
        }
        Some(Self {
            days: remaining / 86_400,
            hours: (remaining % 86_400) / 3_600,
            minutes: (remaining % 3_600) / 60,
            seconds: remaining % 60,
        })
    }

    /// Renders the countdown line, `T- 00:00:00` when already reached.
    pub fn render(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
        match Self::until(target, now) {
            Some(countdown) => countdown.to_string(),
            None => "T- 00:00:00".to_string(),
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T- {}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
