//! File storage backend
//!
//! Appends each alert message as one UTF-8 line to a configured path,
//! creating missing parent directories on first use.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::trace;

use crate::alerts::AlertRecord;

use super::backend::StorageBackend;
use super::error::StorageResult;

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn store(&self, record: &AlertRecord) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            // create_dir_all is idempotent; an empty parent means the
            // path is relative to the working directory.
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(record.message.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        trace!("appended alert for {} to {:?}", record.metric, self.path);

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
