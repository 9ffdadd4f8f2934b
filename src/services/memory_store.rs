use crate::services::blob_store::{BlobStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

/// In-process [`BlobStore`]. Backs tests and `--backend memory` local runs.
///
/// Objects keep their first-insertion order so listings are deterministic.
/// Every `put` is counted, and individual keys can be made to fail.
#[derive(Clone)]
pub struct MemoryStore {
    container: String,
    objects: Arc<Mutex<Vec<(String, Bytes)>>>,
    fail_paths: Arc<Mutex<HashSet<String>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            objects: Arc::new(Mutex::new(Vec::new())),
            fail_paths: Arc::new(Mutex::new(HashSet::new())),
            writes: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of `put` calls that reached the store.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn write_count(&self) -> usize {
        *self.writes.lock().await
    }

    /// Make every later call touching `path` fail.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn fake_fail_path(&self, path: &str) {
        self.fail_paths.lock().await.insert(path.to_string());
    }

    async fn check_failure(&self, path: &str) -> StorageResult<()> {
        if self.fail_paths.lock().await.contains(path) {
            return Err(StorageError::Simulated(path.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        self.check_failure(path).await?;
        *self.writes.lock().await += 1;

        let mut objects = self.objects.lock().await;
        match objects.iter_mut().find(|(name, _)| name == path) {
            Some((_, existing)) => *existing = data,
            None => objects.push((path.to_string(), data)),
        }
        debug!("[memory] stored {} in {}", path, self.container);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.check_failure(prefix).await?;
        let objects = self.objects.lock().await;
        Ok(objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        self.check_failure(path).await?;
        let objects = self.objects.lock().await;
        objects
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.check_failure(path).await?;
        let objects = self.objects.lock().await;
        Ok(objects.iter().any(|(name, _)| name == path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.container, path)
    }
}
