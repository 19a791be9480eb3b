use crate::core::analytics;
use crate::core::freshness;
use crate::domain::model::{
    AgencyFilter, CountQuery, HomeStats, Launch, LaunchAnalytics, TimelineYear, UnifiedRocket,
};
use crate::domain::ports::LaunchSource;
use crate::utils::error::UpstreamResult;
use chrono::{DateTime, Datelike, Utc};
use futures::future::join_all;

pub const DEFAULT_UPCOMING_LIMIT: usize = 10;
/// Extra records requested on top of the caller's limit so that launches
/// which already flew but linger in the feed can be discarded.
pub const UPCOMING_FETCH_BUFFER: usize = 5;
pub const NEXT_LAUNCH_CANDIDATES: usize = 10;
pub const DEFAULT_RECENT_LIMIT: usize = 20;
pub const ANALYTICS_SAMPLE_SIZE: usize = 100;
pub const DEFAULT_TIMELINE_LIMIT: usize = 30;

/// Launch vehicle configurations shown in the fleet view.
pub const DEFAULT_FLEET_IDS: [u32; 8] = [
    164, // Falcon 9 Block 5
    464, // Starship
    143, // SLS Block 1
    38,  // PSLV-XL
    172, // LVM3
    116, // Ariane 64
    200, // Vulcan
    138, // New Glenn
];

/// A query result and whether any upstream call behind it failed.
///
/// A degraded value is still well formed (empty, zeroed or partial) but must
/// not be cached downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Aggregate<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    pub fn degraded(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Aggregate<U> {
        Aggregate {
            value: f(self.value),
            degraded: self.degraded,
        }
    }
}

/// Composes upstream calls into the logical queries the dashboard needs.
///
/// None of these methods fail. An unavailable upstream reads as an empty
/// list, `None`, or zero counts; the cause is logged here and goes no
/// further. The `*_with_status` variants also report whether that happened.
#[derive(Debug)]
pub struct LaunchAggregator<S: LaunchSource> {
    source: S,
    fleet_ids: Vec<u32>,
}

impl<S: LaunchSource> LaunchAggregator<S> {
    pub fn new(source: S) -> Self {
        Self::with_fleet(source, DEFAULT_FLEET_IDS.to_vec())
    }

    pub fn with_fleet(source: S, fleet_ids: Vec<u32>) -> Self {
        Self { source, fleet_ids }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn unified_fleet(&self) -> Vec<UnifiedRocket> {
        self.unified_fleet_with_status().await.value
    }

    /// Fetches every fleet configuration concurrently and keeps the ones
    /// that arrived, in allow-list order. Any missing rocket marks the
    /// result degraded.
    pub async fn unified_fleet_with_status(&self) -> Aggregate<Vec<UnifiedRocket>> {
        let fetches = self.fleet_ids.iter().map(|&id| async move {
            (id, self.source.launcher_config(id).await)
        });

        let fleet: Vec<UnifiedRocket> = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(rocket) => Some(rocket),
                Err(e) => {
                    tracing::warn!("Failed to fetch rocket {}: {}", id, e);
                    None
                }
            })
            .collect();

        tracing::info!(
            "Fleet aggregation returned {} of {} rockets",
            fleet.len(),
            self.fleet_ids.len()
        );
        if fleet.len() < self.fleet_ids.len() {
            Aggregate::degraded(fleet)
        } else {
            Aggregate::complete(fleet)
        }
    }

    pub async fn home_stats(&self) -> HomeStats {
        self.home_stats_at(Utc::now()).await
    }

    pub async fn home_stats_at(&self, now: DateTime<Utc>) -> HomeStats {
        self.home_stats_with_status_at(now).await.value
    }

    pub async fn home_stats_with_status(&self) -> Aggregate<HomeStats> {
        self.home_stats_with_status_at(Utc::now()).await
    }

    /// Runs the four count queries concurrently; the year-to-date window
    /// starts Jan 1 of `now`'s UTC year.
    pub async fn home_stats_with_status_at(&self, now: DateTime<Utc>) -> Aggregate<HomeStats> {
        let (upcoming, ytd, rockets, agencies) = tokio::join!(
            self.source.count(CountQuery::Upcoming),
            self.source.count(CountQuery::LaunchesSince(now.year())),
            self.source.count(CountQuery::ActiveRockets),
            self.source.count(CountQuery::ActiveAgencies),
        );

        let degraded = [&upcoming, &ytd, &rockets, &agencies]
            .iter()
            .any(|result| result.is_err());
        let stats = HomeStats {
            upcoming_count: count_or_zero("upcoming", upcoming),
            ytd_count: count_or_zero("year-to-date", ytd),
            active_rockets_count: count_or_zero("active rockets", rockets),
            agencies_count: count_or_zero("agencies", agencies),
        };

        Aggregate { value: stats, degraded }
    }

    pub async fn upcoming_launches(&self, limit: usize, agencies: &AgencyFilter) -> Vec<Launch> {
        self.upcoming_launches_at(limit, agencies, Utc::now()).await
    }

    pub async fn upcoming_launches_at(
        &self,
        limit: usize,
        agencies: &AgencyFilter,
        now: DateTime<Utc>,
    ) -> Vec<Launch> {
        self.upcoming_launches_with_status_at(limit, agencies, now)
            .await
            .value
    }

    pub async fn upcoming_launches_with_status(
        &self,
        limit: usize,
        agencies: &AgencyFilter,
    ) -> Aggregate<Vec<Launch>> {
        self.upcoming_launches_with_status_at(limit, agencies, Utc::now())
            .await
    }

    /// First `limit` launches still in the future at `now`, fetched with a
    /// small buffer on top of `limit`.
    pub async fn upcoming_launches_with_status_at(
        &self,
        limit: usize,
        agencies: &AgencyFilter,
        now: DateTime<Utc>,
    ) -> Aggregate<Vec<Launch>> {
        let fetch_limit = limit.saturating_add(UPCOMING_FETCH_BUFFER);
        match self.source.upcoming_launches(fetch_limit, agencies).await {
            Ok(launches) => {
                let fetched = launches.len();
                let upcoming: Vec<Launch> = freshness::retain_future(launches, now)
                    .into_iter()
                    .take(limit)
                    .collect();
                tracing::debug!(
                    "Upcoming launches: {} fetched, {} returned (limit {})",
                    fetched,
                    upcoming.len(),
                    limit
                );
                Aggregate::complete(upcoming)
            }
            Err(e) => {
                tracing::warn!("Upcoming launches unavailable: {}", e);
                Aggregate::degraded(Vec::new())
            }
        }
    }

    pub async fn next_launch(&self) -> Option<Launch> {
        self.next_launch_at(Utc::now()).await
    }

    pub async fn next_launch_at(&self, now: DateTime<Utc>) -> Option<Launch> {
        self.next_launch_with_status_at(now).await.value
    }

    pub async fn next_launch_with_status(&self) -> Aggregate<Option<Launch>> {
        self.next_launch_with_status_at(Utc::now()).await
    }

    /// Strict-future selection over the soonest candidates, falling back to
    /// the first candidate when every one of them has already passed.
    pub async fn next_launch_with_status_at(&self, now: DateTime<Utc>) -> Aggregate<Option<Launch>> {
        match self.source.next_launch_candidates(NEXT_LAUNCH_CANDIDATES).await {
            Ok(candidates) => Aggregate::complete(freshness::select_next(candidates, now)),
            Err(e) => {
                tracing::warn!("Next launch unavailable: {}", e);
                Aggregate::degraded(None)
            }
        }
    }

    pub async fn recent_launches(&self, limit: usize) -> Vec<Launch> {
        self.recent_launches_with_status(limit).await.value
    }

    pub async fn recent_launches_with_status(&self, limit: usize) -> Aggregate<Vec<Launch>> {
        match self.source.previous_launches(limit).await {
            Ok(launches) => Aggregate::complete(launches),
            Err(e) => {
                tracing::warn!("Recent launches unavailable: {}", e);
                Aggregate::degraded(Vec::new())
            }
        }
    }

    pub async fn analytics(&self) -> LaunchAnalytics {
        self.analytics_with_status().await.value
    }

    pub async fn analytics_with_status(&self) -> Aggregate<LaunchAnalytics> {
        self.recent_launches_with_status(ANALYTICS_SAMPLE_SIZE)
            .await
            .map(|sample| analytics::summarize(&sample))
    }

    pub async fn timeline(&self, limit: usize) -> Vec<TimelineYear> {
        self.timeline_with_status(limit).await.value
    }

    pub async fn timeline_with_status(&self, limit: usize) -> Aggregate<Vec<TimelineYear>> {
        self.recent_launches_with_status(limit)
            .await
            .map(analytics::group_by_year)
    }
}

fn count_or_zero(label: &str, result: UpstreamResult<u64>) -> u64 {
    result.unwrap_or_else(|e| {
        tracing::warn!(url = e.url(), "Count query '{}' failed, using 0: {}", label, e);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::freshness::tests::launch_at;
    use crate::utils::error::UpstreamError;
    use chrono::{Duration, TimeZone};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn unavailable(what: &str) -> UpstreamError {
        UpstreamError::Status {
            url: format!("mock://{}", what),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[derive(Default)]
    struct MockSource {
        upcoming: Option<Vec<Launch>>,
        previous: Option<Vec<Launch>>,
        rockets: HashMap<u32, UnifiedRocket>,
        counts: HashMap<&'static str, u64>,
        requested_limits: Mutex<Vec<usize>>,
        requested_years: Mutex<Vec<i32>>,
    }

    fn count_key(query: CountQuery) -> &'static str {
        match query {
            CountQuery::Upcoming => "upcoming",
            CountQuery::LaunchesSince(_) => "ytd",
            CountQuery::ActiveRockets => "rockets",
            CountQuery::ActiveAgencies => "agencies",
        }
    }

    fn rocket(id: u32) -> UnifiedRocket {
        serde_json::from_value(serde_json::json!({"id": id, "name": format!("Rocket {}", id)})).unwrap()
    }

    #[async_trait::async_trait]
    impl LaunchSource for MockSource {
        async fn upcoming_launches(
            &self,
            limit: usize,
            _agencies: &AgencyFilter,
        ) -> UpstreamResult<Vec<Launch>> {
            self.requested_limits.lock().unwrap().push(limit);
            self.upcoming.clone().ok_or_else(|| unavailable("upcoming"))
        }

        async fn next_launch_candidates(&self, limit: usize) -> UpstreamResult<Vec<Launch>> {
            self.requested_limits.lock().unwrap().push(limit);
            self.upcoming.clone().ok_or_else(|| unavailable("upcoming"))
        }

        async fn previous_launches(&self, limit: usize) -> UpstreamResult<Vec<Launch>> {
            self.requested_limits.lock().unwrap().push(limit);
            self.previous.clone().ok_or_else(|| unavailable("previous"))
        }

        async fn launcher_config(&self, id: u32) -> UpstreamResult<UnifiedRocket> {
            self.rockets
                .get(&id)
                .cloned()
                .ok_or_else(|| unavailable("config"))
        }

        async fn count(&self, query: CountQuery) -> UpstreamResult<u64> {
            if let CountQuery::LaunchesSince(year) = query {
                self.requested_years.lock().unwrap().push(year);
            }
            self.counts
                .get(count_key(query))
                .copied()
                .ok_or_else(|| unavailable("count"))
        }
    }

    #[tokio::test]
    async fn test_fleet_keeps_survivors_in_order() {
        let mut source = MockSource::default();
        for id in [464, 38, 200, 164] {
            source.rockets.insert(id, rocket(id));
        }
        let aggregator = LaunchAggregator::new(source);

        let fleet = aggregator.unified_fleet().await;
        let ids: Vec<u32> = fleet.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![164, 464, 38, 200]);
    }

    #[tokio::test]
    async fn test_fleet_total_failure_is_empty() {
        let aggregator = LaunchAggregator::new(MockSource::default());
        assert!(aggregator.unified_fleet().await.is_empty());
    }

    #[tokio::test]
    async fn test_home_stats_zero_fills_failures() {
        let mut source = MockSource::default();
        source.counts.insert("upcoming", 312);
        source.counts.insert("agencies", 57);
        let aggregator = LaunchAggregator::new(source);

        let now = Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap();
        let stats = aggregator.home_stats_at(now).await;
        assert_eq!(
            stats,
            HomeStats {
                upcoming_count: 312,
                ytd_count: 0,
                active_rockets_count: 0,
                agencies_count: 57,
            }
        );
        assert_eq!(
            *aggregator.source().requested_years.lock().unwrap(),
            vec![2026]
        );
    }

    #[tokio::test]
    async fn test_upcoming_requests_buffer_and_filters() {
        let now = Utc::now();
        let mut launches = Vec::new();
        for i in 0..3 {
            launches.push(launch_at(&format!("past-{}", i), Some(now - Duration::hours(i + 1))));
        }
        for i in 0..9 {
            launches.push(launch_at(&format!("future-{}", i), Some(now + Duration::hours(i + 1))));
        }
        let source = MockSource {
            upcoming: Some(launches),
            ..MockSource::default()
        };
        let aggregator = LaunchAggregator::new(source);

        let upcoming = aggregator
            .upcoming_launches_at(10, &AgencyFilter::default(), now)
            .await;
        assert_eq!(upcoming.len(), 9);
        assert!(upcoming.iter().all(|l| l.net.unwrap() > now));
        assert_eq!(*aggregator.source().requested_limits.lock().unwrap(), vec![15]);

        let capped = aggregator
            .upcoming_launches_at(5, &AgencyFilter::default(), now)
            .await;
        assert_eq!(capped.len(), 5);
        assert_eq!(capped[0].id, "future-0");
    }

    #[tokio::test]
    async fn test_upcoming_unavailable_is_empty() {
        let aggregator = LaunchAggregator::new(MockSource::default());
        assert!(aggregator
            .upcoming_launches(10, &AgencyFilter::default())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_next_launch_policy() {
        let now = Utc::now();
        let source = MockSource {
            upcoming: Some(vec![
                launch_at("just-flew", Some(now - Duration::minutes(3))),
                launch_at("next", Some(now + Duration::hours(6))),
            ]),
            ..MockSource::default()
        };
        let aggregator = LaunchAggregator::new(source);

        assert_eq!(aggregator.next_launch_at(now).await.unwrap().id, "next");
        assert_eq!(
            *aggregator.source().requested_limits.lock().unwrap(),
            vec![NEXT_LAUNCH_CANDIDATES]
        );

        let empty = LaunchAggregator::new(MockSource {
            upcoming: Some(Vec::new()),
            ..MockSource::default()
        });
        assert!(empty.next_launch_at(now).await.is_none());
        assert!(LaunchAggregator::new(MockSource::default())
            .next_launch()
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_recent_passes_limit_through() {
        let source = MockSource {
            previous: Some(vec![launch_at("a", None)]),
            ..MockSource::default()
        };
        let aggregator = LaunchAggregator::new(source);

        assert_eq!(aggregator.recent_launches(DEFAULT_RECENT_LIMIT).await.len(), 1);
        let analytics = aggregator.analytics().await;
        assert_eq!(analytics.sample_size, 1);
        assert_eq!(
            *aggregator.source().requested_limits.lock().unwrap(),
            vec![DEFAULT_RECENT_LIMIT, ANALYTICS_SAMPLE_SIZE]
        );
    }

    #[tokio::test]
    async fn test_analytics_and_timeline_degrade_to_empty() {
        let aggregator = LaunchAggregator::new(MockSource::default());
        assert_eq!(aggregator.analytics().await, LaunchAnalytics::default());
        assert!(aggregator.timeline(DEFAULT_TIMELINE_LIMIT).await.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_flag_tracks_upstream_failures() {
        let now = Utc::now();
        let mut source = MockSource {
            upcoming: Some(vec![launch_at("soon", Some(now + Duration::hours(1)))]),
            ..MockSource::default()
        };
        source.rockets.insert(164, rocket(164));
        for key in ["upcoming", "ytd", "rockets", "agencies"] {
            source.counts.insert(key, 1);
        }
        let aggregator = LaunchAggregator::with_fleet(source, vec![164]);

        assert!(!aggregator.unified_fleet_with_status().await.degraded);
        assert!(!aggregator.home_stats_with_status_at(now).await.degraded);
        assert!(!aggregator.next_launch_with_status_at(now).await.degraded);
        let upcoming = aggregator
            .upcoming_launches_with_status_at(10, &AgencyFilter::default(), now)
            .await;
        assert!(!upcoming.degraded);
        assert_eq!(upcoming.value.len(), 1);
        assert!(aggregator.recent_launches_with_status(20).await.degraded);
        assert!(aggregator.analytics_with_status().await.degraded);
        assert!(aggregator.timeline_with_status(30).await.degraded);
    }

    #[tokio::test]
    async fn test_partial_fleet_and_stats_are_degraded() {
        let mut source = MockSource::default();
        source.rockets.insert(164, rocket(164));
        source.counts.insert("upcoming", 300);
        let aggregator = LaunchAggregator::with_fleet(source, vec![164, 464]);

        let fleet = aggregator.unified_fleet_with_status().await;
        assert!(fleet.degraded);
        assert_eq!(fleet.value.len(), 1);

        let stats = aggregator.home_stats_with_status().await;
        assert!(stats.degraded);
        assert_eq!(stats.value.upcoming_count, 300);
    }

    #[tokio::test]
    async fn test_empty_upstream_list_is_not_degraded() {
        let source = MockSource {
            upcoming: Some(Vec::new()),
            previous: Some(Vec::new()),
            ..MockSource::default()
        };
        let aggregator = LaunchAggregator::new(source);

        let next = aggregator.next_launch_with_status().await;
        assert_eq!(next, Aggregate::complete(None));
        assert!(!aggregator.recent_launches_with_status(20).await.degraded);
    }
}
