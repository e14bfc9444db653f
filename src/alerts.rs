//! Alert formatting and persistence
//!
//! [`AlertHandler`] is the subscriber that turns a threshold breach into a
//! stored alert: it validates the event, renders it with
//! [`AlertFormatter`], writes an [`AlertRecord`] through the currently
//! selected storage backend and remembers the event as "last alert" for
//! inspection.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::config::StorageConfig;
use crate::monitor::{AlertEvent, Subscriber};
use crate::storage::{self, ConfigError, StorageBackend, StorageError};

/// Errors that can occur while handling a notification
#[derive(Debug)]
pub enum AlertError {
    /// The event was malformed and nothing was stored
    Validation(String),

    /// The event was valid but the backend could not persist it
    Storage(StorageError),
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertError::Validation(msg) => write!(f, "invalid alert event: {}", msg),
            AlertError::Storage(err) => write!(f, "failed to store alert: {}", err),
        }
    }
}

impl std::error::Error for AlertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AlertError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for AlertError {
    fn from(err: StorageError) -> Self {
        AlertError::Storage(err)
    }
}

/// Alert data as it reaches a storage backend.
///
/// Carries the formatted message together with the originating metric and
/// value so the database backend can bind typed columns without parsing
/// the message back apart.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub metric: String,
    pub value: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Validates breach events and renders them as human-readable messages.
pub struct AlertFormatter;

impl AlertFormatter {
    /// Check that the event has a usable metric name and value.
    pub fn validate(event: &AlertEvent) -> Result<(), AlertError> {
        if event.metric.trim().is_empty() {
            return Err(AlertError::Validation(String::from("metric name is empty")));
        }

        if !event.value.is_finite() {
            return Err(AlertError::Validation(format!(
                "metric value is not a finite number: {}",
                event.value
            )));
        }

        Ok(())
    }

    /// Validate and format the event. The returned message is never
    /// mutated afterwards.
    pub fn format(event: &AlertEvent) -> Result<String, AlertError> {
        Self::validate(event)?;

        Ok(format!(
            "ALERT: {} crossed threshold with value {}",
            event.metric, event.value
        ))
    }
}

/// Subscriber that persists alerts through a swappable storage backend.
pub struct AlertHandler {
    /// Settings the handler was constructed with; runtime re-selection
    /// reuses them with a different backend identifier.
    storage_config: StorageConfig,

    /// Currently selected backend. Swapped only via [`set_backend`].
    ///
    /// [`set_backend`]: AlertHandler::set_backend
    backend: RwLock<Box<dyn StorageBackend>>,

    /// Most recent valid event, overwritten on every notification.
    last_alert: Mutex<Option<AlertEvent>>,
}

impl AlertHandler {
    /// Build a handler with the backend named by the configuration.
    pub async fn new(config: &StorageConfig) -> Result<Self, ConfigError> {
        let backend = storage::select_backend(config).await?;

        Ok(Self {
            storage_config: config.clone(),
            backend: RwLock::new(backend),
            last_alert: Mutex::new(None),
        })
    }

    /// Identifier of the currently selected backend.
    pub async fn backend_kind(&self) -> &'static str {
        self.backend.read().await.kind()
    }

    /// Re-select the storage backend at runtime.
    ///
    /// Fails with [`ConfigError`] for an unrecognized identifier (or a
    /// backend that fails to initialize); the previously active backend
    /// stays in effect in that case.
    pub async fn set_backend(&self, identifier: &str) -> Result<(), ConfigError> {
        let mut config = self.storage_config.clone();
        config.backend = identifier.to_string();

        let backend = storage::select_backend(&config).await?;

        debug!("switching storage backend to {}", backend.kind());
        *self.backend.write().await = backend;

        Ok(())
    }

    /// Most recently handled valid event, if any.
    pub async fn last_alert(&self) -> Option<AlertEvent> {
        self.last_alert.lock().await.clone()
    }
}

#[async_trait]
impl Subscriber for AlertHandler {
    async fn on_notify(&self, event: &AlertEvent) -> Result<(), AlertError> {
        // Invalid events store nothing and leave the last alert untouched.
        let message = AlertFormatter::format(event)?;

        *self.last_alert.lock().await = Some(event.clone());

        let record = AlertRecord {
            metric: event.metric.clone(),
            value: event.value,
            message,
            timestamp: Utc::now(),
        };

        let backend = self.backend.read().await;
        backend.store(&record).await?;

        Ok(())
    }
}
