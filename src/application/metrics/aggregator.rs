//! In-process metrics aggregator
//!
//! Counters and latency histograms fed by the HTTP middleware, the
//! instrumented data source and the instrumented HTTP client, read by the
//! snapshot endpoint and the dashboard publisher.
//!
//! All mutable state sits behind one mutex, so every `record_*` call is
//! atomic with respect to `snapshot()` and `reset()`. Database, external and
//! cache observations are also forwarded to the `metrics` facade for the
//! Prometheus endpoint.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::histogram::{LatencyHistogram, DEFAULT_HISTOGRAM_CAPACITY};
use super::resources::{NullSampler, ResourceSampler};

pub type SharedMetrics = Arc<MetricsAggregator>;

/// Log levels counted as a health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Error,
}

/// Tuning knobs for the aggregator
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Requests slower than this (strictly) enter the slowest list
    pub slow_request_threshold_ms: f64,
    /// Length of the slowest list
    pub slowest_capacity: usize,
    /// Reservoir size of each latency histogram
    pub histogram_capacity: usize,
    /// Apdex target used by `snapshot()`
    pub apdex_threshold_ms: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold_ms: 100.0,
            slowest_capacity: 5,
            histogram_capacity: DEFAULT_HISTOGRAM_CAPACITY,
            apdex_threshold_ms: 200.0,
        }
    }
}

/// A slow request kept in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlowRequest {
    #[schema(example = "GET /api/v1/surf/recent-times?page=3")]
    pub path: String,
    /// Duration in milliseconds
    #[schema(example = 412.7)]
    pub time: f64,
}

/// Point-in-time view of every counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub error_count: u64,
    pub warn_count: u64,
    pub error_log_count: u64,
    /// hits / (hits + misses), 0 without observations
    pub cache_hit_ratio: f64,
    pub db_p95: f64,
    pub ext_p95: f64,
    /// Normalised by core count, within [0, 100]
    pub cpu_percent: f64,
    pub mem_mb: u64,
    /// At most `slowest_capacity` entries, slowest first
    pub slowest: Vec<SlowRequest>,
    pub p95: f64,
    pub p99: f64,
    pub apdex: f64,
    pub throughput_rpm: u64,
    pub error_rate: f64,
    pub taken_at: DateTime<Utc>,
}

struct State {
    total_requests: u64,
    error_count: u64,
    warn_count: u64,
    error_log_count: u64,
    cache_hits: u64,
    cache_misses: u64,
    requests: LatencyHistogram,
    db: LatencyHistogram,
    ext: LatencyHistogram,
    slowest: Vec<SlowRequest>,
    window_start: Instant,
}

impl State {
    fn new(histogram_capacity: usize) -> Self {
        Self {
            total_requests: 0,
            error_count: 0,
            warn_count: 0,
            error_log_count: 0,
            cache_hits: 0,
            cache_misses: 0,
            requests: LatencyHistogram::new(histogram_capacity),
            db: LatencyHistogram::new(histogram_capacity),
            ext: LatencyHistogram::new(histogram_capacity),
            slowest: Vec::new(),
            window_start: Instant::now(),
        }
    }

    fn clear(&mut self) {
        self.total_requests = 0;
        self.error_count = 0;
        self.warn_count = 0;
        self.error_log_count = 0;
        self.cache_hits = 0;
        self.cache_misses = 0;
        self.requests.clear();
        self.db.clear();
        self.ext.clear();
        self.slowest.clear();
        self.window_start = Instant::now();
    }

    fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    fn throughput(&self) -> u64 {
        let minutes = self.window_start.elapsed().as_secs_f64() / 60.0;
        (self.total_requests as f64 / minutes.max(1.0)).round() as u64
    }

    fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_requests as f64
        }
    }
}

/// Thread-safe counter and histogram store
pub struct MetricsAggregator {
    config: AggregatorConfig,
    state: Mutex<State>,
    sampler: Mutex<Box<dyn ResourceSampler>>,
}

impl MetricsAggregator {
    pub fn new(config: AggregatorConfig, sampler: Box<dyn ResourceSampler>) -> Self {
        Self {
            state: Mutex::new(State::new(config.histogram_capacity)),
            config,
            sampler: Mutex::new(sampler),
        }
    }

    pub fn shared(config: AggregatorConfig, sampler: Box<dyn ResourceSampler>) -> SharedMetrics {
        Arc::new(Self::new(config, sampler))
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    // ── Recording ──────────────────────────────────────────────

    pub fn record_request(&self, path: &str, duration_ms: f64, is_error: bool) {
        let mut state = self.state.lock();
        state.total_requests += 1;
        if is_error {
            state.error_count += 1;
        }
        state.requests.record(duration_ms);

        if duration_ms > self.config.slow_request_threshold_ms {
            state.slowest.push(SlowRequest {
                path: path.to_string(),
                time: duration_ms,
            });
            state.slowest.sort_by(|a, b| b.time.total_cmp(&a.time));
            state.slowest.truncate(self.config.slowest_capacity);
        }
    }

    pub fn record_log(&self, level: LogLevel) {
        let mut state = self.state.lock();
        match level {
            LogLevel::Warn => state.warn_count += 1,
            LogLevel::Error => state.error_log_count += 1,
        }
    }

    pub fn record_cache_hit(&self) {
        self.state.lock().cache_hits += 1;
        metrics::counter!("response_cache_total", "result" => "hit").increment(1);
    }

    pub fn record_cache_miss(&self) {
        self.state.lock().cache_misses += 1;
        metrics::counter!("response_cache_total", "result" => "miss").increment(1);
    }

    pub fn record_db_latency(&self, ms: f64) {
        self.state.lock().db.record(ms);
        metrics::histogram!("db_query_duration_seconds").record(ms / 1000.0);
    }

    pub fn record_ext_latency(&self, ms: f64) {
        self.state.lock().ext.record(ms);
        metrics::histogram!("external_request_duration_seconds").record(ms / 1000.0);
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn cache_hit_ratio(&self) -> f64 {
        self.state.lock().cache_hit_ratio()
    }

    /// Request latency percentile in milliseconds.
    pub fn percentile(&self, p: f64) -> f64 {
        self.state.lock().requests.percentile(p)
    }

    pub fn db_p95(&self) -> f64 {
        self.state.lock().db.percentile(95.0)
    }

    pub fn ext_p95(&self) -> f64 {
        self.state.lock().ext.percentile(95.0)
    }

    /// Database observations in the current window.
    pub fn db_observations(&self) -> u64 {
        self.state.lock().db.count()
    }

    /// External-call observations in the current window.
    pub fn ext_observations(&self) -> u64 {
        self.state.lock().ext.count()
    }

    /// Requests per minute since start or the last reset.
    pub fn throughput(&self) -> u64 {
        self.state.lock().throughput()
    }

    pub fn apdex(&self, threshold_ms: f64) -> f64 {
        self.state.lock().requests.apdex(threshold_ms)
    }

    pub fn error_rate(&self) -> f64 {
        self.state.lock().error_rate()
    }

    pub fn cpu_usage_percent(&self) -> f64 {
        let mut sampler = self.sampler.lock();
        let cores = sampler.core_count().max(1) as f64;
        let pct = sampler.cpu_percent() / cores;
        if pct.is_nan() {
            return 0.0;
        }
        pct.clamp(0.0, 100.0)
    }

    pub fn memory_usage_mb(&self) -> u64 {
        let bytes = self.sampler.lock().memory_bytes();
        (bytes as f64 / 1024.0 / 1024.0).round() as u64
    }

    // ── Snapshot / reset ───────────────────────────────────────

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (cpu_percent, mem_mb) = self.sample_resources();
        let state = self.state.lock();
        self.build_snapshot(&state, cpu_percent, mem_mb)
    }

    /// Zero every counter and histogram and restart the throughput window.
    pub fn reset(&self) {
        self.state.lock().clear();
    }

    /// Snapshot and reset under the same lock; no recording is lost between them.
    pub fn snapshot_and_reset(&self) -> MetricsSnapshot {
        let (cpu_percent, mem_mb) = self.sample_resources();
        let mut state = self.state.lock();
        let snapshot = self.build_snapshot(&state, cpu_percent, mem_mb);
        state.clear();
        snapshot
    }

    fn sample_resources(&self) -> (f64, u64) {
        (self.cpu_usage_percent(), self.memory_usage_mb())
    }

    fn build_snapshot(&self, state: &State, cpu_percent: f64, mem_mb: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: state.total_requests,
            error_count: state.error_count,
            warn_count: state.warn_count,
            error_log_count: state.error_log_count,
            cache_hit_ratio: state.cache_hit_ratio(),
            db_p95: state.db.percentile(95.0),
            ext_p95: state.ext.percentile(95.0),
            cpu_percent,
            mem_mb,
            slowest: state.slowest.clone(),
            p95: state.requests.percentile(95.0),
            p99: state.requests.percentile(99.0),
            apdex: state.requests.apdex(self.config.apdex_threshold_ms),
            throughput_rpm: state.throughput(),
            error_rate: state.error_rate(),
            taken_at: Utc::now(),
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default(), Box::new(NullSampler))
    }
}

impl std::fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsAggregator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::resources::FixedSampler;
    use proptest::prelude::*;

    fn aggregator() -> MetricsAggregator {
        MetricsAggregator::default()
    }

    #[test]
    fn percentile_of_recorded_requests() {
        let m = aggregator();
        for d in [100.0, 200.0, 300.0, 400.0, 500.0] {
            m.record_request("GET /x", d, false);
        }
        assert_eq!(m.percentile(95.0), 500.0);
    }

    #[test]
    fn cache_hit_ratio_three_to_one() {
        let m = aggregator();
        assert_eq!(m.cache_hit_ratio(), 0.0);
        m.record_cache_hit();
        m.record_cache_hit();
        m.record_cache_hit();
        m.record_cache_miss();
        assert_eq!(m.cache_hit_ratio(), 0.75);
    }

    #[test]
    fn apdex_all_satisfied() {
        let m = aggregator();
        for i in 0..10 {
            m.record_request("GET /fast", 20.0 * i as f64, false);
        }
        assert_eq!(m.apdex(200.0), 1.0);
    }

    #[test]
    fn slowest_list_is_capped_and_sorted() {
        let m = aggregator();
        for (i, d) in [150.0, 90.0, 700.0, 101.0, 300.0, 250.0, 100.0, 999.0]
            .into_iter()
            .enumerate()
        {
            m.record_request(&format!("GET /r{}", i), d, false);
        }
        let slowest = m.snapshot().slowest;
        let times: Vec<f64> = slowest.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![999.0, 700.0, 300.0, 250.0, 150.0]);
        assert_eq!(slowest[0].path, "GET /r7");
    }

    #[test]
    fn threshold_is_strict() {
        let m = aggregator();
        m.record_request("GET /edge", 100.0, false);
        assert!(m.snapshot().slowest.is_empty());
    }

    #[test]
    fn counters_and_error_rate() {
        let m = aggregator();
        m.record_request("GET /a", 10.0, false);
        m.record_request("GET /b", 10.0, true);
        m.record_log(LogLevel::Warn);
        m.record_log(LogLevel::Error);
        m.record_log(LogLevel::Error);

        let s = m.snapshot();
        assert_eq!(s.total_requests, 2);
        assert_eq!(s.error_count, 1);
        assert_eq!(s.warn_count, 1);
        assert_eq!(s.error_log_count, 2);
        assert_eq!(s.error_rate, 0.5);
        // Window is under a minute, so the divisor is one minute.
        assert_eq!(s.throughput_rpm, 2);
    }

    #[test]
    fn negative_durations_are_recorded_as_is() {
        let m = aggregator();
        m.record_db_latency(-5.0);
        m.record_request("GET /neg", -1.0, false);
        assert_eq!(m.db_p95(), -5.0);
        assert_eq!(m.percentile(50.0), -1.0);
    }

    #[test]
    fn reset_clears_everything() {
        let m = aggregator();
        m.record_request("GET /slow", 900.0, true);
        m.record_db_latency(12.0);
        m.record_ext_latency(80.0);
        m.record_cache_hit();
        m.record_log(LogLevel::Warn);

        m.reset();

        let s = m.snapshot();
        assert_eq!(s.total_requests, 0);
        assert_eq!(s.error_count, 0);
        assert_eq!(s.warn_count, 0);
        assert_eq!(s.cache_hit_ratio, 0.0);
        assert_eq!(s.db_p95, 0.0);
        assert_eq!(s.ext_p95, 0.0);
        assert_eq!(s.p95, 0.0);
        assert!(s.slowest.is_empty());
        assert_eq!(m.throughput(), 0);
    }

    #[test]
    fn snapshot_and_reset_returns_previous_state() {
        let m = aggregator();
        m.record_request("GET /a", 250.0, false);
        let before = m.snapshot_and_reset();
        assert_eq!(before.total_requests, 1);
        assert_eq!(before.slowest.len(), 1);
        assert_eq!(m.snapshot().total_requests, 0);
    }

    #[test]
    fn snapshot_and_reset_loses_nothing_under_contention() {
        let m = Arc::new(aggregator());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        m.record_request("GET /c", 1.0, false);
                    }
                })
            })
            .collect();

        let mut seen = 0;
        for _ in 0..50 {
            seen += m.snapshot_and_reset().total_requests;
        }
        for w in writers {
            w.join().unwrap();
        }
        seen += m.snapshot_and_reset().total_requests;
        assert_eq!(seen, 4_000);
    }

    #[test]
    fn resources_are_normalised_and_clamped() {
        let m = MetricsAggregator::new(
            AggregatorConfig::default(),
            Box::new(FixedSampler {
                cpu: 150.0,
                memory: 256 * 1024 * 1024,
                cores: 4,
            }),
        );
        assert_eq!(m.cpu_usage_percent(), 37.5);
        assert_eq!(m.memory_usage_mb(), 256);

        let hot = MetricsAggregator::new(
            AggregatorConfig::default(),
            Box::new(FixedSampler {
                cpu: 900.0,
                memory: 0,
                cores: 2,
            }),
        );
        assert_eq!(hot.cpu_usage_percent(), 100.0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(aggregator().snapshot()).unwrap();
        for key in [
            "totalRequests",
            "errorCount",
            "warnCount",
            "errorLogCount",
            "cacheHitRatio",
            "dbP95",
            "extP95",
            "cpuPercent",
            "memMb",
            "slowest",
            "throughputRpm",
            "takenAt",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    proptest! {
        #[test]
        fn cache_ratio_is_bounded(hits in 0u32..200, misses in 0u32..200) {
            let m = aggregator();
            (0..hits).for_each(|_| m.record_cache_hit());
            (0..misses).for_each(|_| m.record_cache_miss());
            let ratio = m.cache_hit_ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
            if hits + misses == 0 {
                prop_assert_eq!(ratio, 0.0);
            }
        }

        #[test]
        fn slowest_never_exceeds_capacity(durations in prop::collection::vec(0.0f64..5_000.0, 0..100)) {
            let m = aggregator();
            durations.iter().for_each(|&d| m.record_request("GET /p", d, false));
            let slowest = m.snapshot().slowest;
            prop_assert!(slowest.len() <= 5);
            prop_assert!(slowest.windows(2).all(|w| w[0].time >= w[1].time));
        }
    }
}
