//! Scripted in-memory object store for restore tests.

#![allow(dead_code)]

use async_trait::async_trait;
use oxide_core::StoreError;
use oxide_core::cache::{Presence, TransferOptions};
use oxide_core::ports::{ObjectStore, StoreFactory};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// A store call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Head(String),
    List(String),
    Get(String),
}

#[derive(Debug, Clone, Copy)]
enum HeadScript {
    Exists,
    Fail,
}

#[derive(Default)]
pub struct ScriptedStore {
    heads: HashMap<String, HeadScript>,
    listings: HashMap<String, Vec<String>>,
    failing_listings: Vec<String>,
    list_delay: Option<Duration>,
    content: Vec<u8>,
    failing_downloads: Mutex<u32>,
    cancel_on_download: Option<CancellationToken>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` answer the existence probe.
    pub fn with_object(mut self, name: &str) -> Self {
        self.heads.insert(name.to_string(), HeadScript::Exists);
        self
    }

    /// Make the probe for `name` fail with a non-"not found" error.
    pub fn with_failing_head(mut self, name: &str) -> Self {
        self.heads.insert(name.to_string(), HeadScript::Fail);
        self
    }

    pub fn with_listing(mut self, prefix: &str, names: &[&str]) -> Self {
        self.listings.insert(
            prefix.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn with_failing_listing(mut self, prefix: &str) -> Self {
        self.failing_listings.push(prefix.to_string());
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.content = content.to_vec();
        self
    }

    /// Fail the first `count` downloads.
    pub fn with_failing_downloads(self, count: u32) -> Self {
        *self.failing_downloads.lock().unwrap() = count;
        self
    }

    /// Cancel `token` from inside the first download call.
    pub fn cancel_on_download(mut self, token: CancellationToken) -> Self {
        self.cancel_on_download = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List(_)))
            .count()
    }

    pub fn get_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn head(&self, key: &str) -> Result<Presence, StoreError> {
        self.record(Call::Head(key.to_string()));
        match self.heads.get(key) {
            Some(HeadScript::Exists) => Ok(Presence::Exists),
            Some(HeadScript::Fail) => Err(StoreError::service("head object", "403 Forbidden")),
            None => Ok(Presence::Missing),
        }
    }

    async fn list_by_prefix(&self, prefix: &str, max_keys: i32) -> Result<Vec<String>, StoreError> {
        self.record(Call::List(prefix.to_string()));
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_listings.iter().any(|p| p == prefix) {
            return Err(StoreError::service("list objects", "500 Internal Error"));
        }
        Ok(self
            .listings
            .get(prefix)
            .map(|names| names.iter().take(max_keys.max(0) as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_object_chunked(
        &self,
        key: &str,
        file: &mut File,
        options: &TransferOptions,
    ) -> Result<u64, StoreError> {
        self.record(Call::Get(key.to_string()));
        if let Some(token) = &self.cancel_on_download {
            token.cancel();
        }

        let should_fail = {
            let mut remaining = self.failing_downloads.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                true
            } else {
                false
            }
        };
        if should_fail {
            file.write_all(b"partial garbage from a broken transfer").await?;
            return Err(StoreError::service("get object", "connection reset by peer"));
        }

        for chunk in self.content.chunks(options.part_size as usize) {
            file.write_all(chunk).await?;
        }
        file.flush().await?;
        Ok(self.content.len() as u64)
    }
}

/// Store that fails every download.
pub fn always_failing_store(content: &[u8]) -> ScriptedStore {
    ScriptedStore::new()
        .with_object("cargo.tzst")
        .with_content(content)
        .with_failing_downloads(u32::MAX)
}

/// Factory handing out a shared scripted store.
pub struct SharedStoreFactory {
    pub store: Arc<ScriptedStore>,
    pub connects: Arc<AtomicUsize>,
}

impl SharedStoreFactory {
    pub fn new(store: ScriptedStore) -> Self {
        Self {
            store: Arc::new(store),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Read a shared connect counter.
pub fn connects(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[async_trait]
impl StoreFactory for SharedStoreFactory {
    type Store = Arc<ScriptedStore>;

    async fn connect(&self) -> oxide_core::Result<Arc<ScriptedStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.clone())
    }
}

/// Factory whose configuration is always rejected.
pub struct MisconfiguredFactory;

#[async_trait]
impl StoreFactory for MisconfiguredFactory {
    type Store = ScriptedStore;

    async fn connect(&self) -> oxide_core::Result<ScriptedStore> {
        Err(oxide_core::Error::Config("region must not be empty".to_string()))
    }
}
