//! Resolve candidate keys to a stored archive.
//!
//! Lookup runs in two tiers. Every key is first probed by its exact archive
//! name; only when all of them miss does a prefix scan run, again in key
//! order. A prefix match for a high-priority key therefore never beats an
//! exact match for a lower-priority one.

use crate::cancel::cancellable;
use oxide_core::cache::{CacheKey, ObjectReference, PREFIX_LIST_TIMEOUT, Presence};
use oxide_core::ports::ObjectStore;
use oxide_core::{Error, Result, StoreError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Finds the first key, in priority order, with an archive in the store.
pub struct KeyResolver<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    list_timeout: Duration,
}

impl<'a, S: ObjectStore + ?Sized> KeyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            list_timeout: PREFIX_LIST_TIMEOUT,
        }
    }

    /// Override the per-listing timeout.
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    /// Resolve `keys` to an object reference.
    ///
    /// Returns [`Error::CacheNotFound`] when neither tier matches and
    /// [`Error::StoreTransport`] when a lookup fails for any other reason.
    pub async fn resolve(
        &self,
        keys: &[CacheKey],
        cancel: &CancellationToken,
    ) -> Result<ObjectReference> {
        if let Some(found) = self.first_exact_match(keys, cancel).await? {
            info!(object = %found, "Matched cache archive by exact key");
            return Ok(found);
        }

        debug!("Could not match provided cache keys, falling back to find archive by prefix");
        match self.first_prefix_match(keys, cancel).await? {
            Some(found) => {
                info!(object = %found, "Matched cache archive by key prefix");
                Ok(found)
            }
            None => Err(Error::CacheNotFound),
        }
    }

    async fn first_exact_match(
        &self,
        keys: &[CacheKey],
        cancel: &CancellationToken,
    ) -> Result<Option<ObjectReference>> {
        for key in keys {
            let candidate = key.archive_name();
            let presence = cancellable(cancel, async {
                self.store
                    .head(&candidate)
                    .await
                    .map_err(|e| Error::transport("head object", e))
            })
            .await?;

            match presence {
                Presence::Exists => return Ok(Some(ObjectReference::exact(candidate))),
                Presence::Missing => {
                    debug!(key = %key, "Archive with key not found in bucket");
                }
            }
        }
        Ok(None)
    }

    async fn first_prefix_match(
        &self,
        keys: &[CacheKey],
        cancel: &CancellationToken,
    ) -> Result<Option<ObjectReference>> {
        for key in keys {
            let listing = cancellable(cancel, async {
                match tokio::time::timeout(
                    self.list_timeout,
                    self.store.list_by_prefix(key.as_str(), 1),
                )
                .await
                {
                    Ok(result) => result.map_err(|e| Error::transport("list objects", e)),
                    Err(_) => Err(Error::transport(
                        "list objects",
                        StoreError::Timeout(self.list_timeout),
                    )),
                }
            })
            .await?;

            // The first entry of the first page is enough.
            if let Some(name) = listing.into_iter().next() {
                return Ok(Some(ObjectReference::prefixed(name)));
            }
            debug!(prefix = %key, "No archive found for key prefix");
        }
        Ok(None)
    }
}

/// Resolve `keys` against `store` with the default listing timeout.
pub async fn resolve<S: ObjectStore + ?Sized>(
    keys: &[CacheKey],
    store: &S,
    cancel: &CancellationToken,
) -> Result<ObjectReference> {
    KeyResolver::new(store).resolve(keys, cancel).await
}
