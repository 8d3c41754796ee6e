//! Request, database and external-call metrics

pub mod aggregator;
pub mod dashboard;
pub mod histogram;
pub mod log_layer;
pub mod resources;

pub use aggregator::{
    AggregatorConfig, LogLevel, MetricsAggregator, MetricsSnapshot, SharedMetrics, SlowRequest,
};
pub use dashboard::{DashboardConfig, DashboardPublisher};
pub use histogram::LatencyHistogram;
pub use log_layer::MetricsLogLayer;
pub use resources::{NullSampler, ResourceSampler};
