//! Outbound HTTP client that feeds external-call latency into the metrics

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::metrics::SharedMetrics;
use crate::shared::InfraError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Clone)]
pub struct InstrumentedHttpClient {
    client: Client,
    metrics: SharedMetrics,
}

impl InstrumentedHttpClient {
    pub fn new(metrics: SharedMetrics, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("surf-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, metrics })
    }

    /// GET `url` with query parameters and decode a JSON body.
    ///
    /// Latency is recorded for every attempt, including transport errors and
    /// non-2xx responses.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, InfraError> {
        let start = Instant::now();
        let result = self.send_get(url, query).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_ext_latency(ms);

        match &result {
            Ok(_) => debug!(url, duration_ms = ms, "External request"),
            Err(e) => warn!(url, duration_ms = ms, error = %e, "External request failed"),
        }
        result
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, InfraError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
