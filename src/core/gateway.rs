use crate::config::toml_config::UpstreamConfig;
use crate::core::cache::{CacheHorizons, QueryClass, ResponseCache};
use crate::domain::model::{AgencyFilter, CountQuery, Launch, UnifiedRocket};
use crate::domain::ports::LaunchSource;
use crate::utils::error::{AppError, Result, UpstreamError, UpstreamResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ListPage {
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CountPage {
    count: u64,
}

/// Launch Library client with a per-URL response cache.
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    horizons: CacheHorizons,
    cache: ResponseCache,
}

impl HttpGateway {
    pub fn new(upstream: &UpstreamConfig, horizons: CacheHorizons) -> Result<Self> {
        let client = Client::builder()
            .user_agent(upstream.user_agent.clone())
            .timeout(Duration::from_secs(upstream.timeout_seconds))
            .build()
            .map_err(AppError::ClientError)?;

        Ok(Self {
            client,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            horizons,
            cache: ResponseCache::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn fetch_json(&self, url: &str) -> UpstreamResult<serde_json::Value> {
        tracing::debug!("Making upstream request to: {}", url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(UpstreamError::Unreachable {
                    url: url.to_string(),
                    source,
                })
            }
        };

        let status = response.status();
        tracing::debug!("Upstream response status: {}", status);
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json().await.map_err(|e| UpstreamError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetches `path` and decodes it as `T`. A body is cached only once it
    /// has decoded, so a wrong-shaped 200 is retried on the next call.
    async fn get_as<T: DeserializeOwned>(&self, path: &str, class: QueryClass) -> UpstreamResult<T> {
        let url = format!("{}{}", self.base_url, path);

        if let Some(body) = self.cache.get(&url) {
            tracing::debug!("Cache hit for {}", url);
            return decode_body(&url, &body);
        }

        let body = self.fetch_json(&url).await?;
        let decoded = decode_body(&url, &body)?;
        self.cache.insert(url, body, self.horizons.horizon(class));
        Ok(decoded)
    }

    async fn get_launches(&self, path: &str, class: QueryClass) -> UpstreamResult<Vec<Launch>> {
        let page: ListPage = self.get_as(path, class).await?;
        Ok(decode_records(page.results))
    }
}

fn decode_body<T: DeserializeOwned>(url: &str, body: &serde_json::Value) -> UpstreamResult<T> {
    T::deserialize(body).map_err(|e| UpstreamError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Decodes list entries one by one. A record that does not fit the schema is
/// dropped whole; its neighbours survive.
pub fn decode_records<T: DeserializeOwned>(raw: Vec<serde_json::Value>) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Dropping malformed upstream record: {}", e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::debug!("Decoded {} of {} upstream records", records.len(), total);
    }
    records
}

#[async_trait::async_trait]
impl LaunchSource for HttpGateway {
    async fn upcoming_launches(
        &self,
        limit: usize,
        agencies: &AgencyFilter,
    ) -> UpstreamResult<Vec<Launch>> {
        let mut path = format!("/launch/upcoming/?limit={}&mode=detailed", limit);
        if let Some(ids) = agencies.to_query_value() {
            path.push_str(&format!("&lsp__id={}", ids));
        }
        self.get_launches(&path, QueryClass::UpcomingLaunches).await
    }

    async fn next_launch_candidates(&self, limit: usize) -> UpstreamResult<Vec<Launch>> {
        let path = format!("/launch/upcoming/?limit={}", limit);
        self.get_launches(&path, QueryClass::NextLaunch).await
    }

    async fn previous_launches(&self, limit: usize) -> UpstreamResult<Vec<Launch>> {
        let path = format!("/launch/previous/?limit={}&mode=detailed", limit);
        self.get_launches(&path, QueryClass::RecentLaunches).await
    }

    async fn launcher_config(&self, id: u32) -> UpstreamResult<UnifiedRocket> {
        let path = format!("/config/launcher/{}/", id);
        self.get_as(&path, QueryClass::Fleet).await
    }

    async fn count(&self, query: CountQuery) -> UpstreamResult<u64> {
        let page: CountPage = self.get_as(&query.path(), QueryClass::HomeStats).await?;
        Ok(page.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn gateway_for(server: &MockServer, horizons: CacheHorizons) -> HttpGateway {
        let upstream = UpstreamConfig {
            base_url: server.base_url(),
            ..UpstreamConfig::default()
        };
        HttpGateway::new(&upstream, horizons).unwrap()
    }

    fn launch_record(id: &str, net: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": format!("Mission {}", id),
            "status": {"id": 1, "name": "Go for Launch", "abbrev": "Go"},
            "net": net,
            "launch_service_provider": {"id": 121, "name": "SpaceX", "type": "Commercial"},
            "rocket": {"configuration": {"id": 164, "name": "Falcon 9", "family": "Falcon", "variant": "Block 5"}}
        })
    }

    #[tokio::test]
    async fn test_upcoming_sends_user_agent_and_filter() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/launch/upcoming/")
                .query_param("limit", "15")
                .query_param("mode", "detailed")
                .query_param("lsp__id", "121,44")
                .header("User-Agent", "T-Zero/1.0");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "count": 1,
                    "results": [launch_record("a", "2030-01-01T00:00:00Z")]
                }));
        });

        let gateway = gateway_for(&server, CacheHorizons::none());
        let launches = gateway
            .upcoming_launches(15, &AgencyFilter::new(vec![121, 44]))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].id, "a");
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/config/launcher/164/");
            then.status(503);
        });

        let gateway = gateway_for(&server, CacheHorizons::none());
        let err = gateway.launcher_config(164).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/launch/previous/");
            then.status(200)
                .header("Content-Type", "application/json")
                .body("{not json");
        });

        let gateway = gateway_for(&server, CacheHorizons::none());
        let err = gateway.previous_launches(20).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_count_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/agencies/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"results": []}));
        });

        let gateway = gateway_for(&server, CacheHorizons::none());
        let err = gateway.count(CountQuery::ActiveAgencies).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let upstream = UpstreamConfig {
            // Reserved port with nothing listening.
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..UpstreamConfig::default()
        };
        let gateway = HttpGateway::new(&upstream, CacheHorizons::none()).unwrap();
        let err = gateway.count(CountQuery::Upcoming).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_records_are_dropped_individually() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/launch/previous/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "results": [
                        launch_record("ok", "2024-05-01T10:00:00Z"),
                        {"id": "broken", "name": "No status"},
                        launch_record("bad-net", "yesterday-ish")
                    ]
                }));
        });

        let gateway = gateway_for(&server, CacheHorizons::none());
        let launches = gateway.previous_launches(3).await.unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].id, "ok");
    }

    #[tokio::test]
    async fn test_successful_bodies_are_cached_per_url() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/launch/previous/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"results": []}));
        });

        let gateway = gateway_for(&server, CacheHorizons::default());
        gateway.previous_launches(20).await.unwrap();
        gateway.previous_launches(20).await.unwrap();
        api_mock.assert_hits(1);

        gateway.previous_launches(100).await.unwrap();
        api_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/config/launcher/464/");
            then.status(500);
        });

        let gateway = gateway_for(&server, CacheHorizons::default());
        assert!(gateway.launcher_config(464).await.is_err());
        assert!(gateway.launcher_config(464).await.is_err());
        api_mock.assert_hits(2);
        assert!(gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shaped_body_is_not_cached() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/launch/previous/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"detail": "maintenance"}));
        });

        let gateway = gateway_for(&server, CacheHorizons::default());
        let err = gateway.previous_launches(20).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
        assert!(gateway.cache().is_empty());

        assert!(gateway.previous_launches(20).await.is_err());
        api_mock.assert_hits(2);
    }
}
