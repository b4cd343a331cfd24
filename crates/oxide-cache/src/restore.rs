//! Cache restore: validate, connect, resolve, download.

use crate::downloader::{RetryingDownloader, default_transfer_options};
use crate::keys::validate_keys;
use crate::resolver::KeyResolver;
use oxide_core::Result;
use oxide_core::cache::{
    CacheKey, DEFAULT_RETRY_DELAY, DownloadRequest, RestoreOutcome, RetryPolicy, TransferOptions,
};
use oxide_core::ports::{ObjectStore, StoreFactory};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Restores cache archives from stores produced by a [`StoreFactory`].
pub struct CacheRestorer<F> {
    factory: F,
    transfer: TransferOptions,
    retry_delay: Duration,
}

impl<F: StoreFactory> CacheRestorer<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            transfer: default_transfer_options(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_transfer_options(mut self, transfer: TransferOptions) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Restore the archive for the first matching key in `request`.
    ///
    /// Keys are validated before the store client is built, so invalid
    /// input never reaches the network.
    pub async fn restore(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<RestoreOutcome> {
        let start = Instant::now();
        let keys = validate_keys(&request.cache_keys)?;
        let store = self.factory.connect().await?;

        let policy = RetryPolicy::new(request.max_retries).with_delay(self.retry_delay);
        restore_from_store(
            &store,
            &keys,
            &request.destination,
            policy,
            self.transfer,
            cancel,
            start,
        )
        .await
    }
}

/// Resolve `keys` against `store` and download the match to `destination`.
pub async fn restore_from_store<S: ObjectStore + ?Sized>(
    store: &S,
    keys: &[CacheKey],
    destination: &Path,
    policy: RetryPolicy,
    transfer: TransferOptions,
    cancel: &CancellationToken,
    start: Instant,
) -> Result<RestoreOutcome> {
    let object = KeyResolver::new(store).resolve(keys, cancel).await?;

    let report = RetryingDownloader::new(store, policy)
        .with_transfer_options(transfer)
        .download(&object, destination, cancel)
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        object = %object,
        bytes = report.bytes_written,
        attempts = report.attempts,
        duration_ms,
        "Cache archive restored"
    );

    Ok(RestoreOutcome {
        matched_key: object.name,
        exact_match: object.exact_match,
        bytes_written: report.bytes_written,
        attempts: report.attempts,
        duration_ms,
    })
}
