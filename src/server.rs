//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init and migrations per game mode, player lookups, the REST API,
//! the metrics dashboard publisher and graceful shutdown.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::leaderboard::ModeSources;
use crate::application::metrics::{DashboardPublisher, MetricsLogLayer};
use crate::application::{
    MapTiersService, MetricsAggregator, PlayersService, RecentTimesService, SharedMetrics,
};
use crate::config::AppConfig;
use crate::domain::{GameMode, NoPlayerLookup, PlayerLookup};
use crate::infrastructure::database::redact_url;
use crate::infrastructure::{
    init_database, run_migrations, DatabaseConfig, InstrumentedDataSource, InstrumentedHttpClient,
    SteamPlayerLookup, SysinfoSampler,
};
use crate::interfaces::http::middleware::{CacheState, ResponseCache};
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::modules::metrics::MetricsState;
use crate::interfaces::http::{create_api_router, AppState};
use crate::shared::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Aggregator shared with the tracing layer; created from the config
    /// when absent.
    pub metrics: Option<SharedMetrics>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            metrics: None,
        }
    }
}

/// Aggregator configured from `config.metrics`, sampling this process.
pub fn create_metrics(config: &AppConfig) -> SharedMetrics {
    MetricsAggregator::shared(config.metrics.aggregator(), Box::new(SysinfoSampler::new()))
}

/// The global metrics recorder can only be installed once per process; a
/// restart within the same process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("📊 Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

async fn connect(
    mode: GameMode,
    config: &DatabaseConfig,
    auto_migrate: bool,
) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    info!("Database ({}): {}", mode, redact_url(&config.url));
    let db = init_database(config).await?;

    if auto_migrate {
        info!("Running {} database migrations...", mode);
        run_migrations(&db).await?;
        info!("Migrations completed");
    }
    Ok(db)
}

fn player_lookup(
    config: &AppConfig,
    metrics: &SharedMetrics,
) -> Result<Arc<dyn PlayerLookup>, Box<dyn std::error::Error>> {
    let external = &config.external;
    if !external.enabled {
        info!("Player enrichment disabled");
        return Ok(Arc::new(NoPlayerLookup));
    }
    if external.steam_api_key.is_none() {
        warn!("No Steam API key configured; player profiles will not be enriched");
    }

    let http = InstrumentedHttpClient::new(
        metrics.clone(),
        Duration::from_secs(external.timeout_secs),
    )?;
    Ok(Arc::new(
        SteamPlayerLookup::new(http, external.steam_api_key.clone())
            .with_steam_api_base(external.steam_api_base.clone())
            .with_country_api_base(external.country_api_base.clone()),
    ))
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// # Examples
///
/// ```rust,no_run
/// use surf_api::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// In-process metrics aggregator.
    pub metrics: SharedMetrics,
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,

    databases: Vec<(GameMode, DatabaseConnection)>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
    dashboard_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Connect to every configured game mode database and run migrations
    /// 3. Start the REST API server (with Swagger UI)
    /// 4. Start the metrics dashboard publisher
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;
        info!("Starting surf-api...");

        let prometheus = prometheus_handle()?;
        let metrics = opts.metrics.unwrap_or_else(|| create_metrics(&app_cfg));

        // ── Databases ──────────────────────────────────────────
        let mut databases = Vec::new();
        let mut sources: ModeSources = HashMap::new();
        for mode in GameMode::ALL.iter().copied() {
            let db_config = match mode {
                GameMode::Surf => app_cfg.database.surf(),
                GameMode::Bhop => app_cfg.database.bhop(),
            };
            if db_config.url.trim().is_empty() {
                warn!("No database configured for {}; its routes will answer 404", mode);
                continue;
            }

            let db = connect(mode, &db_config, opts.auto_migrate).await?;
            sources.insert(
                mode,
                Arc::new(InstrumentedDataSource::new(db.clone(), metrics.clone())),
            );
            databases.push((mode, db));
        }

        // ── Services ───────────────────────────────────────────
        let lookup = player_lookup(&app_cfg, &metrics)?;
        let paginator = app_cfg.pagination.paginator();
        let map_tiers = MapTiersService::new(sources.clone(), paginator.clone());
        let players = PlayersService::new(sources.clone(), lookup.clone(), paginator.clone());
        let service = RecentTimesService::new(sources, lookup, paginator);

        let cache = Arc::new(ResponseCache::new(
            Duration::from_secs(app_cfg.cache.ttl_secs),
            app_cfg.cache.max_entries,
        ));

        let state = AppState {
            recent_times: Arc::new(service),
            map_tiers: Arc::new(map_tiers),
            players: Arc::new(players),
            health: HealthState {
                databases: databases.clone(),
                started_at: Arc::new(Instant::now()),
            },
            metrics: MetricsState {
                handle: prometheus,
                aggregator: metrics.clone(),
            },
            cache: CacheState {
                cache,
                metrics: metrics.clone(),
            },
        };

        // ── Background tasks ───────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let dashboard_task = DashboardPublisher::new(metrics.clone(), app_cfg.metrics.dashboard())
            .start(shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(state, &app_cfg.cors);

        let api_addr = app_cfg.listen_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            config: app_cfg,
            metrics,
            local_addr,
            databases,
            shutdown,
            api_task,
            dashboard_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        let Self {
            databases,
            shutdown,
            api_task,
            dashboard_task,
            ..
        } = self;

        shutdown
            .run_cleanup(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
                if let Err(e) = dashboard_task.await {
                    error!("Metrics dashboard task panicked: {}", e);
                }

                for (mode, db) in databases {
                    if let Err(e) = db.close().await {
                        warn!("Error closing {} database connection: {}", mode, e);
                    } else {
                        info!("✅ {} database connection closed", mode);
                    }
                }
            })
            .await;

        info!("👋 surf-api shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down surf-api...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// WARN and ERROR events are also counted into `metrics`. Call this once at
/// process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig, metrics: SharedMetrics) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .with(MetricsLogLayer::new(metrics))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(MetricsLogLayer::new(metrics))
                .init();
        }
    }
}
