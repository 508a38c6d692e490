//! Record store port: one durable, domain-scoped store file.

use std::path::Path;

use async_trait::async_trait;

use servicedb_domain::domain_id::StoreKind;
use servicedb_domain::error::ServiceDbError;

/// A store opened by the engine. Owned exclusively by the service; record
/// interfaces only hold handles into it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Path of the backing file.
    fn file_path(&self) -> &Path;

    /// Write a consistent snapshot of the store to `target`.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the snapshot cannot be written.
    async fn store_into_file(&self, target: &Path) -> Result<(), ServiceDbError>;

    /// Release the store. Handles held elsewhere stop working afterwards.
    async fn close(&self);
}
