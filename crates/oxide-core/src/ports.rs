//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the restore logic and the
//! object store adapters.

use crate::Result;
use crate::cache::{Presence, TransferOptions};
use crate::error::StoreError;
use async_trait::async_trait;
use tokio::fs::File;

/// Remote store holding cache archives.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists. A definitive "not found" is
    /// `Presence::Missing`, never an error.
    async fn head(&self, key: &str) -> std::result::Result<Presence, StoreError>;

    /// Return the names on the first page of objects starting with `prefix`,
    /// at most `max_keys` of them. Later pages are never fetched.
    async fn list_by_prefix(
        &self,
        prefix: &str,
        max_keys: i32,
    ) -> std::result::Result<Vec<String>, StoreError>;

    /// Download an object into `file` in ranged parts, returning the number
    /// of bytes written.
    async fn get_object_chunked(
        &self,
        key: &str,
        file: &mut File,
        options: &TransferOptions,
    ) -> std::result::Result<u64, StoreError>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn head(&self, key: &str) -> std::result::Result<Presence, StoreError> {
        (**self).head(key).await
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        max_keys: i32,
    ) -> std::result::Result<Vec<String>, StoreError> {
        (**self).list_by_prefix(prefix, max_keys).await
    }

    async fn get_object_chunked(
        &self,
        key: &str,
        file: &mut File,
        options: &TransferOptions,
    ) -> std::result::Result<u64, StoreError> {
        (**self).get_object_chunked(key, file, options).await
    }
}

/// Builds an authenticated store client from configuration.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    type Store: ObjectStore;

    /// Resolve credentials and construct the client.
    async fn connect(&self) -> Result<Self::Store>;
}
