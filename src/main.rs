//! surf-api: leaderboard REST API server
//!
//! ```sh
//! # Run with default config (~/.config/surf-api/config.toml)
//! surf-api
//!
//! # Custom config path
//! surf-api --config /etc/surf-api/config.toml
//!
//! # Override the port
//! surf-api --port 8080
//!
//! # Validate config without starting
//! surf-api --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use surf_api::config::{AppConfig, CONFIG_PATH_ENV};
use surf_api::infrastructure::database::redact_url;
use surf_api::server::{create_metrics, init_tracing, ServerHandle, ServerOptions};

/// surf-api: leaderboard API for surf and bhop servers.
#[derive(Parser, Debug)]
#[command(
    name = "surf-api",
    version,
    about = "Leaderboard API for surf and bhop game servers",
    long_about = "surf-api serves recent times and records for surf and bhop \
                  servers, with in-process request metrics.\n\n\
                  Default config: ~/.config/surf-api/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(surf_api::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // Init tracing first so subsequent logs are formatted properly
    let metrics = create_metrics(&config);
    init_tracing(&config, metrics.clone());

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
        }
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.listen_address());
        println!("   Surf DB     : {}", redact_url(&config.database.surf_url));
        println!("   Bhop DB     : {}", redact_url(&config.database.bhop_url));
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        metrics: Some(metrics),
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
