//! `tracing` layer that counts WARN and ERROR events into the aggregator

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::aggregator::{LogLevel, SharedMetrics};

pub struct MetricsLogLayer {
    metrics: SharedMetrics,
}

impl MetricsLogLayer {
    pub fn new(metrics: SharedMetrics) -> Self {
        Self { metrics }
    }
}

impl<S: Subscriber> Layer<S> for MetricsLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::WARN => self.metrics.record_log(LogLevel::Warn),
            Level::ERROR => self.metrics.record_log(LogLevel::Error),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::MetricsAggregator;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn counts_warn_and_error_events() {
        let metrics = Arc::new(MetricsAggregator::default());
        let subscriber =
            tracing_subscriber::registry().with(MetricsLogLayer::new(metrics.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("ignored");
            tracing::warn!("slow upstream");
            tracing::error!(path = "/x", "query failed");
            tracing::error!("again");
        });

        let s = metrics.snapshot();
        assert_eq!(s.warn_count, 1);
        assert_eq!(s.error_log_count, 2);
    }
}
