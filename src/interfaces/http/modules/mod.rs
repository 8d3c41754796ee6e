//! Feature modules of the REST API

pub mod health;
pub mod maps;
pub mod metrics;
pub mod players;
pub mod recent_times;
