//! Backend capability set used by the storage layer.
//!
//! Every object store the service can talk to implements [`BlobStore`]. The
//! storage layer never sees a concrete SDK type, so tests and local runs can
//! swap in the in-memory backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::{io, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not configured: {0}")]
    Configuration(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid object path `{0}`")]
    InvalidPath(String),
    #[error("simulated backend failure for `{0}`")]
    Simulated(String),
    #[error(transparent)]
    Backend(#[from] object_store::Error),
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("background task failed: {0}")]
    Task(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Flat object namespace inside one container.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `data` at `path`, replacing any existing object.
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()>;

    /// Names of all objects whose path starts with `prefix`, in backend order.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Full contents of the object at `path`.
    async fn get(&self, path: &str) -> StorageResult<Bytes>;

    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// URL under which the backend publishes the object.
    fn public_url(&self, path: &str) -> String;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        (**self).put(path, data).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix).await
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        (**self).get(path).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        (**self).exists(path).await
    }

    fn public_url(&self, path: &str) -> String {
        (**self).public_url(path)
    }
}

/// Stand-in used when no credential was provided. The server still starts,
/// but every storage call fails with [`StorageError::Configuration`].
#[derive(Clone, Debug)]
pub struct UnconfiguredStore {
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> StorageResult<T> {
        Err(StorageError::Configuration(self.reason.clone()))
    }
}

#[async_trait]
impl BlobStore for UnconfiguredStore {
    async fn put(&self, _path: &str, _data: Bytes) -> StorageResult<()> {
        self.fail()
    }

    async fn list(&self, _prefix: &str) -> StorageResult<Vec<String>> {
        self.fail()
    }

    async fn get(&self, _path: &str) -> StorageResult<Bytes> {
        self.fail()
    }

    async fn exists(&self, _path: &str) -> StorageResult<bool> {
        self.fail()
    }

    fn public_url(&self, path: &str) -> String {
        path.to_string()
    }
}
