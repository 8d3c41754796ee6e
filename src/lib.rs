//! # surf-api
//!
//! Leaderboard REST API for surf and bhop game servers.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Leaderboard entities and the player lookup port
//! - **application**: Recent times listings and the in-process metrics aggregator
//! - **infrastructure**: Databases, outbound HTTP, process resource sampling
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Pagination, SQL helpers, errors, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::create_api_router;
