use crate::core::aggregator::{
    Aggregate, DEFAULT_RECENT_LIMIT, DEFAULT_TIMELINE_LIMIT, DEFAULT_UPCOMING_LIMIT,
};
use crate::core::cache::QueryClass;
use crate::domain::model::AgencyFilter;
use crate::server::AppState;
use actix_web::http::header::{self, ContentType};
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

const EMPTY_LIST: &str = "[]";
const NULL: &str = "null";
const ZERO_STATS: &str =
    r#"{"upcomingCount":0,"ytdCount":0,"activeRocketsCount":0,"agenciesCount":0}"#;
const EMPTY_ANALYTICS: &str = r#"{"sampleSize":0,"successRate":0.0,"mostActiveAgency":null,"mostActiveRocket":null,"marketShare":[],"statusBreakdown":[]}"#;

/// Query string for list routes. Values stay strings so a malformed number
/// never turns into a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    #[serde(rename = "agencyIds")]
    pub agency_ids: Option<String>,
}

/// Parses a string-encoded limit, falling back to `default` when absent or
/// not a non-negative integer.
pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid limit {:?}, using {}", value, default);
            default
        }),
    }
}

/// Serializes a query result with the query class's `Cache-Control`. A
/// degraded result is sent with `no-store` so an outage is not replayed by
/// downstream caches. On serialization failure the route still answers with
/// the empty shape, as a 500.
fn json_response<T: Serialize>(
    state: &AppState,
    class: QueryClass,
    result: &Aggregate<T>,
    fallback: &'static str,
) -> HttpResponse {
    let cache_control = if result.degraded {
        tracing::debug!("Serving degraded {:?} response uncached", class);
        "no-store".to_string()
    } else {
        state.horizons.cache_control(class)
    };

    match serde_json::to_string(&result.value) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::json())
            .insert_header((header::CACHE_CONTROL, cache_control))
            .body(body),
        Err(e) => {
            tracing::error!("Failed to serialize {:?} response: {}", class, e);
            HttpResponse::InternalServerError()
                .content_type(ContentType::json())
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .body(fallback)
        }
    }
}

pub async fn upcoming_launches(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_UPCOMING_LIMIT);
    let agencies = query
        .agency_ids
        .as_deref()
        .map(AgencyFilter::parse)
        .unwrap_or_default();
    tracing::info!(
        "Request for upcoming launches (limit {}, agencies {:?})",
        limit,
        agencies.ids()
    );

    let launches = state
        .aggregator
        .upcoming_launches_with_status(limit, &agencies)
        .await;
    json_response(&state, QueryClass::UpcomingLaunches, &launches, EMPTY_LIST)
}

pub async fn next_launch(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Request for next launch");
    let launch = state.aggregator.next_launch_with_status().await;
    json_response(&state, QueryClass::NextLaunch, &launch, NULL)
}

pub async fn recent_launches(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_RECENT_LIMIT);
    tracing::info!("Request for recent launches (limit {})", limit);

    let launches = state.aggregator.recent_launches_with_status(limit).await;
    json_response(&state, QueryClass::RecentLaunches, &launches, EMPTY_LIST)
}

pub async fn fleet(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Request for fleet");
    let fleet = state.aggregator.unified_fleet_with_status().await;
    json_response(&state, QueryClass::Fleet, &fleet, EMPTY_LIST)
}

pub async fn stats(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Request for home stats");
    let stats = state.aggregator.home_stats_with_status().await;
    json_response(&state, QueryClass::HomeStats, &stats, ZERO_STATS)
}

pub async fn analytics(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Request for launch analytics");
    let analytics = state.aggregator.analytics_with_status().await;
    json_response(&state, QueryClass::RecentLaunches, &analytics, EMPTY_ANALYTICS)
}

pub async fn timeline(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_TIMELINE_LIMIT);
    tracing::info!("Request for mission timeline (limit {})", limit);

    let timeline = state.aggregator.timeline_with_status(limit).await;
    json_response(&state, QueryClass::RecentLaunches, &timeline, EMPTY_LIST)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

pub async fn health_check() -> impl Responder {
    web::Json(HealthResponse {
        status: "OK".into(),
    })
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Headers letting browsers and packaged mobile builds call the API from
/// any origin.
fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Credentials", "true"))
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET,OPTIONS"))
        .add((
            "Access-Control-Allow-Headers",
            "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version",
        ))
}

fn api_resource(path: &str) -> actix_web::Resource {
    web::resource(path).route(web::method(Method::OPTIONS).to(preflight))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .wrap(cors_headers())
            .service(api_resource("/launches/upcoming").route(web::get().to(upcoming_launches)))
            .service(api_resource("/launches/next").route(web::get().to(next_launch)))
            .service(api_resource("/launches/recent").route(web::get().to(recent_launches)))
            .service(api_resource("/fleet").route(web::get().to(fleet)))
            .service(api_resource("/stats").route(web::get().to(stats)))
            .service(api_resource("/analytics").route(web::get().to(analytics)))
            .service(api_resource("/timeline").route(web::get().to(timeline))),
    );
}
