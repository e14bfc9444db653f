//! Storage backend trait definition

use async_trait::async_trait;

use crate::alerts::AlertRecord;

use super::error::StorageResult;

/// Trait for alert persistence backends
///
/// All backends (file, database, cloud) implement this trait and are used
/// as `Box<dyn StorageBackend>` behind an [`AlertHandler`]. Implementations
/// must be `Send + Sync` as they are shared across async tasks.
///
/// A failing medium surfaces as [`StorageError`]; callers treat that as a
/// recoverable condition, so `store` must not panic.
///
/// [`AlertHandler`]: crate::alerts::AlertHandler
/// [`StorageError`]: super::error::StorageError
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a single alert record.
    async fn store(&self, record: &AlertRecord) -> StorageResult<()>;

    /// Identifier of this backend variant (`file`, `db` or `cloud`).
    fn kind(&self) -> &'static str;
}
