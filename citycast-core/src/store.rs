//! Durable key-value storage for the last chosen city.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::config::project_dirs;

/// Key under which the last successfully loaded user selection is stored.
pub const LAST_CITY_KEY: &str = "city";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Stores all keys in a single JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: tokio::sync::Mutex::new(()) }
    }

    /// Store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(project_dirs()?.data_dir().join("store.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, or `None` if the store was never written.
    async fn read_raw(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read store file: {}", self.path.display())),
        }
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse store file: {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = match self.read_raw().await? {
            None => BTreeMap::new(),
            Some(contents) => self.parse(&contents).unwrap_or_else(|err| {
                tracing::warn!("starting from an empty store: {err:#}");
                BTreeMap::new()
            }),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        // Readers only ever see a complete file.
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize store")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write store file: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace store file: {}", self.path.display()))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        match self.read_raw().await? {
            Some(contents) => Ok(self.parse(&contents)?.remove(key)),
            None => Ok(None),
        }
    }
}

/// In-process store that also keeps every write in order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set` call seen so far, oldest first.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.lock().map(|inner| inner.writes.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner =
            self.inner.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(inner.entries.get(key).cloned())
    }
}
