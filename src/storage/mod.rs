//! Storage backends for alert persistence
//!
//! This module provides a trait-based abstraction for persisting alert
//! records to interchangeable backends, selected by an identifier from
//! the configuration.
//!
//! ## Design
//!
//! - **Trait-based**: the [`StorageBackend`] trait allows swapping
//!   implementations without touching the alert path
//! - **Async**: all operations are async for compatibility with the
//!   tokio-driven monitor loop
//! - **Selected, not inherited**: [`select_backend`] maps the configured
//!   identifier to a concrete variant and is also used for runtime
//!   re-selection
//!
//! ## Backends
//!
//! - **file**: appends one UTF-8 line per alert to a local path
//! - **db**: parameterized inserts into an embedded SQLite database
//! - **cloud**: HTTP PUT of the alert message to a remote store

pub mod backend;
pub mod cloud;
pub mod database;
pub mod error;
pub mod file;

pub use backend::StorageBackend;
pub use cloud::CloudBackend;
pub use database::DatabaseBackend;
pub use error::{ConfigError, StorageError, StorageResult};
pub use file::FileBackend;

use tracing::debug;

use crate::config::StorageConfig;

/// Select and initialize the backend named by `config.backend`.
///
/// Fails with [`ConfigError::UnsupportedBackend`] for an unrecognized
/// identifier and with [`ConfigError::Storage`] when the recognized
/// backend cannot be initialized (for example an unreachable database
/// file). Callers doing runtime reconfiguration keep their previous
/// backend on any error.
pub async fn select_backend(config: &StorageConfig) -> Result<Box<dyn StorageBackend>, ConfigError> {
    let backend: Box<dyn StorageBackend> = match config.backend.as_str() {
        "file" => Box::new(FileBackend::new(config.file_path.clone())),
        "db" => Box::new(DatabaseBackend::new(&config.db_path).await?),
        "cloud" => {
            let url = config
                .cloud_url
                .as_ref()
                .ok_or(ConfigError::MissingValue("storage.cloud_url"))?;
            Box::new(CloudBackend::new(url.clone()))
        }
        other => return Err(ConfigError::UnsupportedBackend(other.to_string())),
    };

    debug!("selected storage backend: {}", backend.kind());

    Ok(backend)
}
