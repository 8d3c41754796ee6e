//! Infrastructure layer - external concerns

pub mod database;
pub mod http;
pub mod resources;

pub use database::{init_database, run_migrations, DatabaseConfig, InstrumentedDataSource};
pub use http::{InstrumentedHttpClient, SteamPlayerLookup};
pub use resources::SysinfoSampler;
