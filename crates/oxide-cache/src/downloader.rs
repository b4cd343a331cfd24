//! Retrying archive download.

use crate::cancel::{cancellable, wait};
use oxide_core::cache::{DEFAULT_PART_SIZE, ObjectReference, RetryPolicy, TransferOptions};
use oxide_core::ports::ObjectStore;
use oxide_core::{Error, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub bytes_written: u64,
    pub attempts: u32,
}

/// Default transfer options: 50 MiB parts, one in flight per CPU.
pub fn default_transfer_options() -> TransferOptions {
    TransferOptions::new(DEFAULT_PART_SIZE, num_cpus::get())
}

/// Downloads a resolved object, restarting the whole transfer on failure.
pub struct RetryingDownloader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    policy: RetryPolicy,
    transfer: TransferOptions,
}

impl<'a, S: ObjectStore + ?Sized> RetryingDownloader<'a, S> {
    pub fn new(store: &'a S, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            transfer: default_transfer_options(),
        }
    }

    pub fn with_transfer_options(mut self, transfer: TransferOptions) -> Self {
        self.transfer = transfer;
        self
    }

    /// Download `object` to `destination`.
    ///
    /// Makes up to `max_retries + 1` attempts, waiting the policy delay
    /// between them. Each attempt truncates the destination and starts over.
    pub async fn download(
        &self,
        object: &ObjectReference,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        let attempts = self.policy.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                info!(attempt, delay_ms = self.policy.delay.as_millis() as u64, "Retrying download");
                wait(cancel, self.policy.delay).await?;
            }

            match cancellable(cancel, self.attempt(object, destination)).await {
                Ok(bytes_written) => {
                    debug!(object = %object, bytes_written, attempt, "Download completed");
                    return Ok(DownloadReport {
                        bytes_written,
                        attempts: attempt,
                    });
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(error = %e, attempt, "Download attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let source = last_error.unwrap_or(Error::Cancelled);
        Err(Error::AllRetriesFailed {
            attempts,
            source: Box::new(source),
        })
    }

    async fn attempt(&self, object: &ObjectReference, destination: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(destination).await?;
        self.store
            .get_object_chunked(&object.name, &mut file, &self.transfer)
            .await
            .map_err(Error::Download)
    }
}

/// Download `object` to `destination` with default transfer options.
pub async fn download<S: ObjectStore + ?Sized>(
    object: &ObjectReference,
    destination: &Path,
    policy: RetryPolicy,
    store: &S,
    cancel: &CancellationToken,
) -> Result<DownloadReport> {
    RetryingDownloader::new(store, policy)
        .download(object, destination, cancel)
        .await
}
