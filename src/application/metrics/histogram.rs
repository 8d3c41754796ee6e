//! Bounded latency histogram
//!
//! Keeps a uniform reservoir sample (algorithm R) of at most `capacity`
//! observations. Below capacity the sample is every observation, so
//! percentiles are exact.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_HISTOGRAM_CAPACITY: usize = 10_000;

#[derive(Debug)]
pub struct LatencyHistogram {
    samples: Vec<f64>,
    seen: u64,
    capacity: usize,
    rng: StdRng,
}

impl LatencyHistogram {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::new(),
            seen: 0,
            capacity: capacity.max(1),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn record(&mut self, value_ms: f64) {
        self.seen += 1;
        if self.samples.len() < self.capacity {
            self.samples.push(value_ms);
            return;
        }
        let slot = self.rng.gen_range(0..self.seen);
        if (slot as usize) < self.capacity {
            self.samples[slot as usize] = value_ms;
        }
    }

    /// Observations recorded since creation or the last `clear`.
    pub fn count(&self) -> u64 {
        self.seen
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.seen = 0;
    }

    /// Value at index `ceil(p/100 * n) - 1` of the ascending sample, 0 when empty.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let rank = ((p / 100.0) * n as f64).ceil() as i64 - 1;
        let idx = rank.clamp(0, n as i64 - 1) as usize;
        sorted[idx]
    }

    /// Apdex score for `threshold_ms`: satisfied `<= t`, tolerated `(t, 4t]`,
    /// frustrated otherwise. A negative threshold is read as 0.
    pub fn apdex(&self, threshold_ms: f64) -> f64 {
        let t = threshold_ms.max(0.0);
        let (satisfied, tolerated) = self.samples.iter().fold((0usize, 0usize), |(s, tol), &d| {
            if d <= t {
                (s + 1, tol)
            } else if d <= t * 4.0 {
                (s, tol + 1)
            } else {
                (s, tol)
            }
        });
        (satisfied as f64 + tolerated as f64 / 2.0) / self.samples.len().max(1) as f64
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_HISTOGRAM_CAPACITY)
    }
}
