//! Cloud storage backend
//!
//! Uploads the alert message to a remote store with one HTTP PUT per
//! alert. The metric name is appended to the base URL as one
//! percent-encoded path segment; any transport error or non-success
//! status surfaces as a [`StorageError`].
//!
//! [`StorageError`]: super::error::StorageError

use async_trait::async_trait;
use tracing::trace;
use url::Url;

use crate::alerts::AlertRecord;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};

pub struct CloudBackend {
    client: reqwest::Client,
    base_url: String,
}

impl CloudBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl StorageBackend for CloudBackend {
    async fn store(&self, record: &AlertRecord) -> StorageResult<()> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StorageError::UploadFailed(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::UploadFailed("base URL cannot carry path segments".into()))?
            .push(&record.metric);

        let response = self
            .client
            .put(url.clone())
            .body(record.message.clone())
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        trace!("uploaded alert for {} to {url}", record.metric);

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "cloud"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(metric: &str, value: f64) -> AlertRecord {
        AlertRecord {
            metric: metric.to_string(),
            value,
            message: format!("ALERT: {metric} crossed threshold with value {value}"),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_uploads_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/alerts/cpu"))
            .and(body_string("ALERT: cpu crossed threshold with value 95"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = CloudBackend::new(format!("{}/alerts", mock_server.uri()));
        backend.store(&record("cpu", 95.0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_metric_name_is_encoded_as_one_path_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/alerts/disk%20%2Fvar"))
            .and(body_string("ALERT: disk /var crossed threshold with value 97"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = CloudBackend::new(format!("{}/alerts", mock_server.uri()));
        backend.store(&record("disk /var", 97.0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_upload_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let backend = CloudBackend::new(mock_server.uri());
        let result = backend.store(&record("cpu", 95.0)).await;

        assert_matches!(
            result,
            Err(StorageError::UploadFailed(reason)) if reason.contains("500")
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_is_upload_failure() {
        let backend = CloudBackend::new("http://127.0.0.1:9/alerts");
        let result = backend.store(&record("cpu", 95.0)).await;

        assert_matches!(result, Err(StorageError::UploadFailed(_)));
    }
}
