pub mod alerts;
pub mod collector;
pub mod config;
pub mod monitor;
pub mod runner;
pub mod storage;

use indexmap::IndexMap;

/// One batch of metrics fetched from a single endpoint.
///
/// Metric names are unique within a sample. Iteration order matches the
/// order of the JSON object in the response body, which is why this is an
/// `IndexMap` rather than a `HashMap`.
pub type MetricSample = IndexMap<String, f64>;
