//! Prometheus scrape endpoint and aggregator snapshot

pub mod handlers;

pub use handlers::*;
