use crate::domain::model::{AgencyFilter, CountQuery, Launch, UnifiedRocket};
use crate::utils::error::UpstreamResult;
use async_trait::async_trait;

/// Read access to the launch-tracking upstream.
///
/// Every call either yields decoded records or an [`UpstreamError`]
/// describing why it could not; implementations never panic on bad input
/// from the network.
///
/// [`UpstreamError`]: crate::utils::error::UpstreamError
#[async_trait]
pub trait LaunchSource: Send + Sync {
    /// Detailed upcoming launches, optionally narrowed to providers.
    async fn upcoming_launches(
        &self,
        limit: usize,
        agencies: &AgencyFilter,
    ) -> UpstreamResult<Vec<Launch>>;

    /// Soonest upcoming launches used as next-launch candidates.
    async fn next_launch_candidates(&self, limit: usize) -> UpstreamResult<Vec<Launch>>;

    async fn previous_launches(&self, limit: usize) -> UpstreamResult<Vec<Launch>>;

    async fn launcher_config(&self, id: u32) -> UpstreamResult<UnifiedRocket>;

    async fn count(&self, query: CountQuery) -> UpstreamResult<u64>;
}
