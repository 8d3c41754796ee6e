//! Latency-recording wrapper around any [`SqlDataSource`]

use std::time::Instant;

use async_trait::async_trait;
use sea_orm::{DbBackend, DbErr, QueryResult};
use tracing::{debug, warn};

use crate::application::metrics::SharedMetrics;
use crate::shared::{SqlDataSource, SqlQuery};

/// Records the wall-clock latency of every query, failed ones included.
pub struct InstrumentedDataSource<D> {
    inner: D,
    metrics: SharedMetrics,
}

impl<D: SqlDataSource> InstrumentedDataSource<D> {
    pub fn new(inner: D, metrics: SharedMetrics) -> Self {
        Self { inner, metrics }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: SqlDataSource> SqlDataSource for InstrumentedDataSource<D> {
    fn backend(&self) -> DbBackend {
        self.inner.backend()
    }

    async fn fetch_rows(&self, query: SqlQuery) -> Result<Vec<QueryResult>, DbErr> {
        let start = Instant::now();
        let result = self.inner.fetch_rows(query).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_db_latency(ms);

        match &result {
            Ok(rows) => debug!(rows = rows.len(), duration_ms = ms, "SQL query"),
            Err(e) => warn!(duration_ms = ms, error = %e, "SQL query failed"),
        }
        result
    }
}
