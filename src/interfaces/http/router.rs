//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{MetricsSnapshot, SharedMetrics};
use crate::config::CorsConfig;
use crate::domain::{
    GameMode, MapCompletionSummary, MapTierInfo, PlayerCompletion, PlayerInfo, RecentTime,
    TierCompletion, UserProfile,
};
use crate::interfaces::http::common::{FieldError, ProblemDetails};
use crate::interfaces::http::middleware::{
    cache_versioning_middleware, observability_middleware, pagination_headers_middleware,
    problem_instance_middleware, request_id_middleware, response_time_middleware,
    wrap_response_middleware, CacheState,
};
use crate::shared::{PageLinks, PageMeta, PageResult};

use super::modules::health::{self, HealthState};
use super::modules::maps::{self, MapTiersState};
use super::modules::metrics::{self, MetricsState};
use super::modules::players::{self, PlayersState};
use super::modules::recent_times::{self, RecentTimesState};

/// Unified router state; each handler extracts its own slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub recent_times: RecentTimesState,
    pub map_tiers: MapTiersState,
    pub players: PlayersState,
    pub health: HealthState,
    pub metrics: MetricsState,
    pub cache: CacheState,
}

impl FromRef<AppState> for RecentTimesState {
    fn from_ref(s: &AppState) -> Self {
        Arc::clone(&s.recent_times)
    }
}

impl FromRef<AppState> for MapTiersState {
    fn from_ref(s: &AppState) -> Self {
        Arc::clone(&s.map_tiers)
    }
}

impl FromRef<AppState> for PlayersState {
    fn from_ref(s: &AppState) -> Self {
        Arc::clone(&s.players)
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        s.health.clone()
    }
}

impl FromRef<AppState> for MetricsState {
    fn from_ref(s: &AppState) -> Self {
        s.metrics.clone()
    }
}

impl AppState {
    pub fn aggregator(&self) -> &SharedMetrics {
        &self.metrics.aggregator
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        metrics::metrics_snapshot,
        recent_times::list_recent_times,
        recent_times::list_recent_records,
        maps::list_map_tiers,
        maps::get_map_tier,
        players::list_users,
        players::get_user,
        players::get_user_profile,
        players::list_user_completions,
    ),
    components(
        schemas(
            GameMode,
            RecentTime,
            PageMeta,
            PageLinks,
            PageResult<RecentTime>,
            MapTierInfo,
            PageResult<MapTierInfo>,
            PlayerInfo,
            PageResult<PlayerInfo>,
            UserProfile,
            MapCompletionSummary,
            TierCompletion,
            PlayerCompletion,
            PageResult<PlayerCompletion>,
            MetricsSnapshot,
            ProblemDetails,
            FieldError,
            health::HealthResponse,
            health::DatabaseHealth,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Metrics", description = "In-process request, cache and upstream metrics"),
        (name = "Recent Times", description = "Newest runs and records per game mode"),
        (name = "Maps", description = "Map tiers and settings per game mode"),
        (name = "Players", description = "Users, profiles and completions per game mode"),
    ),
    info(
        title = "Surf API",
        version = "1.0.0",
        description = "Leaderboard REST API for surf and bhop servers",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn not_found() -> ProblemDetails {
    ProblemDetails::new(StatusCode::NOT_FOUND)
}

/// Create the API router with all routes
pub fn create_api_router(state: AppState, cors: &CorsConfig) -> Router {
    let metrics = state.aggregator().clone();

    // Leaderboard routes are the only cached ones
    let leaderboard_routes = Router::new()
        .route(
            "/api/v1/{mode}/recent-times",
            get(recent_times::list_recent_times),
        )
        .route(
            "/api/v1/{mode}/recent-records",
            get(recent_times::list_recent_records),
        )
        .route("/api/v1/{mode}/maptiers", get(maps::list_map_tiers))
        .route("/api/v1/{mode}/maptiers/{map}", get(maps::get_map_tier))
        .route("/api/v1/{mode}/users", get(players::list_users))
        .route("/api/v1/{mode}/users/{auth}", get(players::get_user))
        .route(
            "/api/v1/{mode}/user-profile/{user_id}",
            get(players::get_user_profile),
        )
        .route(
            "/api/v1/{mode}/user-profile/{user_id}/completions",
            get(players::list_user_completions),
        )
        .layer(middleware::from_fn_with_state(
            state.cache.clone(),
            cache_versioning_middleware,
        ));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api/v1/metrics/snapshot", get(metrics::metrics_snapshot))
        .merge(leaderboard_routes)
        .fallback(not_found)
        .with_state(state)
        // Innermost first
        .layer(middleware::from_fn(pagination_headers_middleware))
        .layer(middleware::from_fn(response_time_middleware))
        .layer(middleware::from_fn(wrap_response_middleware))
        .layer(middleware::from_fn(problem_instance_middleware))
        .layer(middleware::from_fn_with_state(
            metrics,
            observability_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(api)
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    use axum::body::Body;
    use axum::http::{header, Request, Response};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::application::leaderboard::service::test_support::seeded_db;
    use crate::application::{
        MapTiersService, MetricsAggregator, PlayersService, RecentTimesService,
    };
    use crate::domain::NoPlayerLookup;
    use crate::interfaces::http::middleware::{ResponseCache, REQUEST_ID_HEADER};
    use crate::shared::{Paginator, SqlDataSource};

    async fn app() -> (Router, SharedMetrics) {
        let db = seeded_db().await;
        let aggregator: SharedMetrics = Arc::new(MetricsAggregator::default());

        let mut sources: HashMap<GameMode, Arc<dyn SqlDataSource>> = HashMap::new();
        sources.insert(GameMode::Surf, Arc::new(db.clone()));
        let service = RecentTimesService::new(
            sources.clone(),
            Arc::new(NoPlayerLookup),
            Paginator::new(),
        );
        let map_tiers = MapTiersService::new(sources.clone(), Paginator::new());
        let players = PlayersService::new(sources, Arc::new(NoPlayerLookup), Paginator::new());

        let state = AppState {
            recent_times: Arc::new(service),
            map_tiers: Arc::new(map_tiers),
            players: Arc::new(players),
            health: HealthState {
                databases: vec![(GameMode::Surf, db)],
                started_at: Arc::new(Instant::now()),
            },
            metrics: MetricsState {
                handle: PrometheusBuilder::new().build_recorder().handle(),
                aggregator: aggregator.clone(),
            },
            cache: CacheState {
                cache: Arc::new(ResponseCache::new(Duration::from_secs(60), 100)),
                metrics: aggregator.clone(),
            },
        };
        (create_api_router(state, &CorsConfig::default()), aggregator)
    }

    async fn get(app: &Router, uri: &str) -> Response<Body> {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(resp: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn recent_times_page_with_headers() {
        let (app, _) = app().await;
        let resp = get(&app, "/api/v1/surf/recent-times?pageSize=2").await;

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers().clone();
        assert_eq!(headers["x-total-count"], "5");
        assert_eq!(headers["x-cache"], "MISS");
        assert!(headers[header::ETAG].to_str().unwrap().starts_with("W/\""));
        assert!(headers.contains_key(REQUEST_ID_HEADER));
        let link = headers[header::LINK].to_str().unwrap();
        assert!(link.contains("</api/v1/surf/recent-times?page=2&pageSize=2>; rel=\"next\""));
        assert!(!link.contains("rel=\"prev\""));

        let body = json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["date"], 500);
        assert_eq!(body["meta"]["totalPages"], 3);
        assert!(body["meta"]["durationMs"].is_u64());
        assert!(body.get("durationMs").is_none());
        assert_eq!(body["links"]["self"], "/api/v1/surf/recent-times?page=1&pageSize=2");
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let (app, metrics) = app().await;
        get(&app, "/api/v1/surf/recent-records").await;
        let resp = get(&app, "/api/v1/surf/recent-records").await;

        assert_eq!(resp.headers()["x-cache"], "HIT");
        assert!((metrics.cache_hit_ratio() - 0.5).abs() < 1e-9);
        let body = json(resp).await;
        assert!(body["meta"]["durationMs"].is_u64());
    }

    #[tokio::test]
    async fn unknown_mode_is_a_404_problem() {
        let (app, _) = app().await;
        for uri in ["/api/v1/kz/recent-times", "/api/v1/bhop/recent-times"] {
            let resp = get(&app, uri).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/problem+json");
            let body = json(resp).await;
            assert_eq!(body["title"], "NotFound");
            assert_eq!(body["instance"], uri);
        }
    }

    #[tokio::test]
    async fn out_of_range_paging_is_clamped() {
        let (app, _) = app().await;

        let resp = get(&app, "/api/v1/surf/recent-times?pageSize=500").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["meta"]["pageSize"], 100);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        let resp = get(&app, "/api/v1/surf/recent-times?page=0&pageSize=0").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["meta"]["page"], 1);
        assert_eq!(body["meta"]["pageSize"], 1);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let resp = get(&app, "/api/v1/surf/recent-records?page=-3&pageSize=abc").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["meta"]["page"], 1);
        assert_eq!(body["meta"]["pageSize"], 10);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let (app, _) = app().await;
        let resp = get(&app, "/api/v1/surf/recent-times?page=9223372036854775807&pageSize=100").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["meta"]["total"], 5);
        assert_eq!(body["meta"]["hasNextPage"], false);
    }

    #[tokio::test]
    async fn invalid_filter_is_a_400_problem() {
        let (app, _) = app().await;
        let resp = get(&app, "/api/v1/surf/recent-times?style=-1").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json(resp).await;
        assert_eq!(body["errors"][0]["field"], "style");
        assert_eq!(body["instance"], "/api/v1/surf/recent-times?style=-1");
    }

    #[tokio::test]
    async fn unmatched_route_is_a_404_problem() {
        let (app, metrics) = app().await;
        let resp = get(&app, "/nope").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(resp).await["instance"], "/nope");
        assert_eq!(metrics.snapshot().error_count, 1);
    }

    #[tokio::test]
    async fn health_reports_each_database() {
        let (app, _) = app().await;
        let resp = get(&app, "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("x-cache").is_none());
        let body = json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["databases"][0]["mode"], "surf");
    }

    #[tokio::test]
    async fn snapshot_counts_previous_requests() {
        let (app, _) = app().await;
        get(&app, "/api/v1/surf/recent-times").await;
        let body = json(get(&app, "/api/v1/metrics/snapshot").await).await;
        assert_eq!(body["totalRequests"], 1);
        assert_eq!(body["errorCount"], 0);
    }

    #[tokio::test]
    async fn prometheus_endpoint_renders_text() {
        let (app, _) = app().await;
        let resp = get(&app, "/metrics").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn map_tiers_are_paged_and_looked_up() {
        let (app, _) = app().await;
        let resp = get(&app, "/api/v1/surf/maptiers?pageSize=2").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-total-count"], "3");
        assert_eq!(resp.headers()["x-cache"], "MISS");
        let body = json(resp).await;
        assert_eq!(body["data"][0]["map"], "surf_mesa");
        assert_eq!(body["data"][1]["mapType"], "linear");
        assert_eq!(body["links"]["next"], "/api/v1/surf/maptiers?page=2&pageSize=2");

        let body = json(get(&app, "/api/v1/surf/maptiers/surf_forsaken").await).await;
        assert_eq!(body["tier"], 3);

        let resp = get(&app, "/api/v1/surf/maptiers/surf_kitsune").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn users_and_single_user() {
        let (app, _) = app().await;
        let body = json(get(&app, "/api/v1/surf/users").await).await;
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["data"][0]["auth"], 2);
        assert!(body["data"][0].get("ip").is_none());

        let body = json(get(&app, "/api/v1/surf/users/1").await).await;
        assert_eq!(body["name"], "alpha");

        let resp = get(&app, "/api/v1/surf/users/99").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = get(&app, "/api/v1/surf/users/abc").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/problem+json");
        let resp = get(&app, "/api/v1/kz/users/abc").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn user_profile_and_completions() {
        let (app, _) = app().await;
        let resp = get(&app, "/api/v1/surf/user-profile/1").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["serverRank"], 2);
        assert_eq!(body["worldRecordsMap"], 1);
        assert_eq!(body["mapCompletion"]["mostPlayedMap"], "surf_utopia");
        assert_eq!(body["mapCompletion"]["completedMapsTier"][0]["totalMaps"], 2);

        let resp = get(&app, "/api/v1/surf/user-profile/1/completions?pageSize=500").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["meta"]["pageSize"], 100);
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["data"][0]["bestTime"], 27.0);
        assert_eq!(body["data"][1]["track"], "Bonus 1");

        let resp = get(&app, "/api/v1/surf/user-profile/99").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(resp).await["instance"], "/api/v1/surf/user-profile/99");
    }

    #[test]
    fn openapi_lists_leaderboard_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/{mode}/recent-times",
            "/api/v1/{mode}/recent-records",
            "/api/v1/{mode}/maptiers",
            "/api/v1/{mode}/maptiers/{map}",
            "/api/v1/{mode}/users",
            "/api/v1/{mode}/users/{auth}",
            "/api/v1/{mode}/user-profile/{user_id}",
            "/api/v1/{mode}/user-profile/{user_id}/completions",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{}", path);
        }
    }
}
