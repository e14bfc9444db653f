//! Concurrent metric collection from remote endpoints
//!
//! A [`Collector`] fans one fetch per endpoint out over a shared HTTP
//! client and gathers the results in input order. All failure modes of a
//! single fetch - timeout, transport error, bad status, malformed body -
//! are captured as [`FetchResult::Failure`] data so that one misbehaving
//! endpoint can never abort the batch.

use std::time::Duration;

use futures::future::join_all;
use tracing::{instrument, trace};

use crate::MetricSample;

/// Outcome of fetching one endpoint during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success {
        endpoint: String,
        sample: MetricSample,
    },
    Failure {
        endpoint: String,
        reason: String,
    },
}

impl FetchResult {
    pub fn endpoint(&self) -> &str {
        match self {
            FetchResult::Success { endpoint, .. } => endpoint,
            FetchResult::Failure { endpoint, .. } => endpoint,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn sample(&self) -> Option<&MetricSample> {
        match self {
            FetchResult::Success { sample, .. } => Some(sample),
            FetchResult::Failure { .. } => None,
        }
    }
}

/// Fetches metrics from a single endpoint with a bounded request time.
#[derive(Debug, Clone)]
pub struct MetricFetcher {
    timeout: Duration,
}

impl MetricFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch one endpoint, returning the outcome as data.
    ///
    /// A 2xx response with a JSON object of numeric values yields
    /// `Success`. A timeout yields `Failure` with the reason `"timeout"`;
    /// every other transport, status or parse problem yields `Failure`
    /// with the error text. This function never returns `Err`.
    pub async fn fetch(&self, client: &reqwest::Client, endpoint: &str) -> FetchResult {
        trace!("{endpoint}: requesting metrics");

        let request = client.get(endpoint).timeout(self.timeout);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Self::failure_from(endpoint, &e),
        };

        if !response.status().is_success() {
            return FetchResult::Failure {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP error: {}", response.status()),
            };
        }

        // The per-request timeout also covers reading the body.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Self::failure_from(endpoint, &e),
        };

        match serde_json::from_str::<MetricSample>(&body) {
            Ok(sample) => {
                trace!("{endpoint}: received {} metrics", sample.len());
                FetchResult::Success {
                    endpoint: endpoint.to_string(),
                    sample,
                }
            }
            Err(e) => FetchResult::Failure {
                endpoint: endpoint.to_string(),
                reason: format!("failed to parse metrics JSON: {e}"),
            },
        }
    }

    fn failure_from(endpoint: &str, error: &reqwest::Error) -> FetchResult {
        let reason = if error.is_timeout() {
            String::from("timeout")
        } else {
            error.to_string()
        };

        FetchResult::Failure {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}

/// Fans fetches out across all configured endpoints concurrently.
pub struct Collector {
    fetcher: MetricFetcher,
}

impl Collector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            fetcher: MetricFetcher::new(timeout),
        }
    }

    /// Collect metrics from every endpoint in parallel.
    ///
    /// Returns exactly one [`FetchResult`] per endpoint, with `result[i]`
    /// corresponding to `endpoints[i]` regardless of completion order.
    /// The HTTP client (and its connection pool) is scoped to this call:
    /// it is dropped when the returned future completes or is cancelled.
    #[instrument(skip_all, fields(endpoints = endpoints.len()))]
    pub async fn collect(&self, endpoints: &[String]) -> Vec<FetchResult> {
        let client = match reqwest::Client::builder().build() {
            Ok(client) => client,
            Err(e) => {
                // No client means no fetch can run; report the same
                // failure for every endpoint instead of aborting.
                return endpoints
                    .iter()
                    .map(|endpoint| FetchResult::Failure {
                        endpoint: endpoint.clone(),
                        reason: e.to_string(),
                    })
                    .collect();
            }
        };

        let fetches = endpoints
            .iter()
            .map(|endpoint| self.fetcher.fetch(&client, endpoint));

        join_all(fetches).await
    }
}
