//! Periodic KPI dashboard publisher
//!
//! Emits one structured "API KPI summary" event every publish interval and,
//! every rotate interval, publishes a final summary for the window and
//! starts a new one via `snapshot_and_reset()`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use super::aggregator::{MetricsSnapshot, SharedMetrics};
use crate::shared::ShutdownSignal;

/// Publisher schedule
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub publish_interval_secs: u64,
    pub rotate_interval_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            publish_interval_secs: 60,
            rotate_interval_secs: 3600,
        }
    }
}

/// One rendered dashboard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiField {
    pub name: String,
    pub value: String,
}

impl KpiField {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Human-readable KPI fields for a snapshot.
pub fn kpi_fields(snap: &MetricsSnapshot) -> Vec<KpiField> {
    let mut fields = vec![
        KpiField::new("RPM", snap.throughput_rpm.to_string()),
        KpiField::new("Errors (%)", format!("{:.2}%", snap.error_rate * 100.0)),
        KpiField::new("P95 Latency", format!("{:.1}ms", snap.p95)),
        KpiField::new("P99 Latency", format!("{:.1}ms", snap.p99)),
        KpiField::new("Apdex", format!("{:.2}", snap.apdex)),
        KpiField::new("CPU %", format!("{:.1}%", snap.cpu_percent)),
        KpiField::new("Memory MB", snap.mem_mb.to_string()),
        KpiField::new("Cache Hit %", format!("{:.1}%", snap.cache_hit_ratio * 100.0)),
        KpiField::new("DB P95", format!("{:.1}ms", snap.db_p95)),
        KpiField::new("Ext P95", format!("{:.1}ms", snap.ext_p95)),
        KpiField::new("Warn Logs", snap.warn_count.to_string()),
        KpiField::new("Error Logs", snap.error_log_count.to_string()),
    ];
    fields.extend(snap.slowest.iter().enumerate().map(|(i, s)| {
        KpiField::new(format!("Slow{}", i + 1), format!("`{}`: {:.1}ms", s.path, s.time))
    }));
    fields
}

fn publish(snap: &MetricsSnapshot, rotated: bool) {
    let summary = kpi_fields(snap)
        .iter()
        .map(|f| format!("{}: {}", f.name, f.value))
        .collect::<Vec<_>>()
        .join(" | ");

    info!(
        target: "surf_api::dashboard",
        rotated,
        rpm = snap.throughput_rpm,
        error_rate = snap.error_rate,
        p95_ms = snap.p95,
        apdex = snap.apdex,
        taken_at = %snap.taken_at.to_rfc3339(),
        "🚀 API KPI summary: {}",
        summary
    );
}

pub struct DashboardPublisher {
    metrics: SharedMetrics,
    config: DashboardConfig,
}

impl DashboardPublisher {
    pub fn new(metrics: SharedMetrics, config: DashboardConfig) -> Self {
        Self { metrics, config }
    }

    /// Publish the current window without resetting it.
    pub fn publish_summary(&self) -> MetricsSnapshot {
        let snap = self.metrics.snapshot();
        publish(&snap, false);
        snap
    }

    /// Publish the closing summary of the window and start a new one.
    pub fn rotate(&self) -> MetricsSnapshot {
        let snap = self.metrics.snapshot_and_reset();
        publish(&snap, true);
        snap
    }

    /// Spawn the publisher loop; it ends when `shutdown` fires.
    pub fn start(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            let publish_every = Duration::from_secs(self.config.publish_interval_secs.max(1));
            let rotate_every = Duration::from_secs(self.config.rotate_interval_secs.max(1));

            info!(
                "📊 Metrics dashboard started (publish every {}s, rotate every {}s)",
                publish_every.as_secs(),
                rotate_every.as_secs()
            );

            let now = Instant::now();
            let mut publish_tick = interval_at(now + publish_every, publish_every);
            let mut rotate_tick = interval_at(now + rotate_every, rotate_every);
            publish_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            rotate_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.wait() => {
                        info!("📊 Metrics dashboard shutting down");
                        break;
                    }
                    _ = rotate_tick.tick() => {
                        self.rotate();
                    }
                    _ = publish_tick.tick() => {
                        self.publish_summary();
                    }
                }
            }
        })
    }
}
