pub mod leaderboard;
pub mod metrics;

pub use leaderboard::{MapTiersService, PlayersService, RecentTimesService};
pub use metrics::{MetricsAggregator, MetricsSnapshot, SharedMetrics};
