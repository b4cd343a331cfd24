//! S3 (and S3-compatible) object store adapter.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use futures::{StreamExt, TryStreamExt};
use oxide_core::cache::{Presence, TransferOptions};
use oxide_core::ports::{ObjectStore, StoreFactory};
use oxide_core::{Error, Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

/// Connection settings for an S3 bucket.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct S3Settings {
    /// Bucket holding cache archives.
    #[serde(default)]
    pub bucket: String,
    /// AWS region.
    pub region: Option<String>,
    /// Static access key id; used only together with the secret.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint: Option<String>,
    /// Use path-style addressing.
    #[serde(default)]
    pub force_path_style: bool,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<redacted>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl S3Settings {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: Some(region.into()),
            ..Default::default()
        }
    }

    /// Static credentials, when both halves are present and non-empty.
    fn static_credentials(&self) -> Option<Credentials> {
        match (self.access_key_id.as_deref(), self.secret_access_key.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some(
                Credentials::new(id, secret, None, None, "oxide-cache-static"),
            ),
            _ => None,
        }
    }

    /// Check required fields before any network access.
    pub fn validate(&self) -> Result<&str> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("bucket must not be empty".to_string()));
        }
        match self.region.as_deref().map(str::trim) {
            Some(region) if !region.is_empty() => Ok(region),
            _ => Err(Error::Config("region must not be empty".to_string())),
        }
    }
}

#[async_trait]
impl StoreFactory for S3Settings {
    type Store = S3Store;

    async fn connect(&self) -> Result<S3Store> {
        let region = self.validate()?.to_string();

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        if let Some(credentials) = self.static_credentials() {
            debug!("AWS credentials provided, using them");
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if self.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        let client = Client::from_conf(s3_builder.build());

        Ok(S3Store::new(client, self.bucket.clone()))
    }
}

/// Object store backed by an S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// HeadObject; `None` when the key does not exist.
    async fn head_object(
        &self,
        key: &str,
    ) -> std::result::Result<Option<HeadObjectOutput>, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output)),
            Err(err) if err.as_service_error().is_some_and(HeadObjectError::is_not_found) => {
                Ok(None)
            }
            Err(err) => Err(StoreError::service(
                "head object",
                DisplayErrorContext(&err).to_string(),
            )),
        }
    }

    /// Stream one inclusive byte range into `file` at its offset.
    ///
    /// Body chunks are written as they arrive; the file lock is held only
    /// for a single seek and write.
    async fn copy_range(
        &self,
        key: &str,
        start: u64,
        end: u64,
        file: &Mutex<&mut File>,
    ) -> std::result::Result<u64, StoreError> {
        let mut output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={start}-{end}"))
            .send()
            .await
            .map_err(|err| StoreError::service("get object", DisplayErrorContext(&err).to_string()))?;

        let expected = end - start + 1;
        let mut copied = 0u64;
        while let Some(chunk) = output
            .body
            .try_next()
            .await
            .map_err(|err| StoreError::service("read object body", err.to_string()))?
        {
            if copied + chunk.len() as u64 > expected {
                return Err(StoreError::service(
                    "get object",
                    format!("part at offset {start} exceeded {expected} bytes"),
                ));
            }
            let mut file = file.lock().await;
            file.seek(SeekFrom::Start(start + copied)).await?;
            file.write_all(&chunk).await?;
            copied += chunk.len() as u64;
        }

        if copied != expected {
            return Err(StoreError::service(
                "get object",
                format!("part at offset {start} returned {copied} of {expected} bytes"),
            ));
        }
        Ok(copied)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head(&self, key: &str) -> std::result::Result<Presence, StoreError> {
        Ok(match self.head_object(key).await? {
            Some(_) => Presence::Exists,
            None => Presence::Missing,
        })
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        max_keys: i32,
    ) -> std::result::Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|err| {
                StoreError::service("list objects", DisplayErrorContext(&err).to_string())
            })?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }

    async fn get_object_chunked(
        &self,
        key: &str,
        file: &mut File,
        options: &TransferOptions,
    ) -> std::result::Result<u64, StoreError> {
        let output = self
            .head_object(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let size = object_size(&output)?;
        file.set_len(size).await?;
        if size == 0 {
            return Ok(0);
        }

        let ranges = part_ranges(size, options.part_size);
        debug!(
            key,
            size,
            parts = ranges.len(),
            concurrency = options.concurrency,
            "Downloading object in parts"
        );

        let file = Mutex::new(file);
        let written = futures::stream::iter(ranges)
            .map(|(start, end)| self.copy_range(key, start, end, &file))
            .buffer_unordered(options.concurrency)
            .try_fold(0u64, |total, copied| async move { Ok(total + copied) })
            .await?;
        file.into_inner().flush().await?;

        Ok(written)
    }
}

/// Object size from a HeadObject response.
fn object_size(output: &HeadObjectOutput) -> std::result::Result<u64, StoreError> {
    let length = output
        .content_length()
        .ok_or_else(|| StoreError::service("head object", "missing content length"))?;
    u64::try_from(length)
        .map_err(|_| StoreError::service("head object", format!("invalid content length {length}")))
}

/// Split `size` bytes into inclusive byte ranges of at most `part_size`.
pub(crate) fn part_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    let part_size = part_size.max(1);
    let mut ranges = Vec::with_capacity(size.div_ceil(part_size) as usize);
    let mut start = 0;
    while start < size {
        let end = (start + part_size).min(size) - 1;
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}
