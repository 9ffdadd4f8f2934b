//! src/services/storage_service.rs
//!
//! StorageService — the four storage operations the handlers rely on
//! (upload, list, ensure-path, zip) plus event metadata helpers, all written
//! against the [`BlobStore`] capability trait. The concrete backend and the
//! container it talks to are fixed at construction.

use crate::{
    config::{AppConfig, StorageBackend},
    models::event::{Event, PLACEHOLDER_NAME, event_metadata_path},
    services::{
        azure_store::AzureStore,
        blob_store::{BlobStore, StorageError, StorageResult, UnconfiguredStore},
        memory_store::MemoryStore,
    },
};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, Cursor, Write},
    sync::Arc,
};
use tracing::{debug, info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Path probed by the readiness check. It never needs to exist.
const READINESS_PROBE_PATH: &str = "events/.readyz";

#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn BlobStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Build the backend selected by `cfg`.
    ///
    /// A missing connection string is not a startup error: the service comes
    /// up and every storage call reports the configuration problem instead.
    pub fn from_config(cfg: &AppConfig) -> StorageResult<Self> {
        let store: Arc<dyn BlobStore> = match cfg.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage for container {}", cfg.container);
                Arc::new(MemoryStore::new(cfg.container.clone()))
            }
            StorageBackend::Azure => match cfg.connection_string.as_deref() {
                Some(conn) => Arc::new(AzureStore::from_connection_string(conn, &cfg.container)?),
                None => {
                    warn!("AZURE_STORAGE_CONNECTION_STRING not set; storage calls will fail");
                    Arc::new(UnconfiguredStore::new(
                        "AZURE_STORAGE_CONNECTION_STRING not set",
                    ))
                }
            },
        };
        Ok(Self::new(store))
    }

    /// Consume a byte stream and store it at `path`, overwriting whatever was
    /// there. Returns the number of bytes written.
    pub async fn upload<S, E>(&self, path: &str, stream: S) -> StorageResult<u64>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut buffer = BytesMut::new();
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| StorageError::Io(io::Error::other(err)))?;
            buffer.extend_from_slice(&chunk);
        }

        let size = buffer.len() as u64;
        self.store.put(path, buffer.freeze()).await?;
        info!("stored {} ({} bytes)", path, size);
        Ok(size)
    }

    /// Every object name starting with `prefix`, in backend order.
    pub async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let names = self.store.list(prefix).await?;
        debug!("listed {} objects under {}", names.len(), prefix);
        Ok(names)
    }

    /// Make sure `path` "exists" by writing an empty placeholder beneath it.
    ///
    /// Returns `true` when a placeholder was written, `false` when one was
    /// already present.
    pub async fn ensure_path(&self, path: &str) -> StorageResult<bool> {
        let marker = format!("{}/{}", path.trim_end_matches('/'), PLACEHOLDER_NAME);
        if self.store.exists(&marker).await? {
            debug!("placeholder {} already present", marker);
            return Ok(false);
        }
        self.store.put(&marker, Bytes::new()).await?;
        info!("created placeholder {}", marker);
        Ok(true)
    }

    /// Fetch every object in `paths` and bundle them into one zip archive.
    ///
    /// Entries are named by the final path segment. When two paths share a
    /// basename the archive keeps a single entry holding the later object's
    /// bytes, at the position where that name first appeared.
    pub async fn download_as_zip(&self, paths: &[String]) -> StorageResult<Bytes> {
        let mut entries: Vec<(String, Bytes)> = Vec::with_capacity(paths.len());
        for path in paths {
            let data = self.store.get(path).await?;
            let name = basename(path).to_string();
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, slot)) => {
                    warn!("archive entry {} replaced by {}", name, path);
                    *slot = data;
                }
                None => entries.push((name, data)),
            }
        }

        let count = entries.len();
        let archive = tokio::task::spawn_blocking(move || write_archive(entries))
            .await
            .map_err(|err| StorageError::Task(err.to_string()))??;
        info!("built archive with {} entries ({} bytes)", count, archive.len());
        Ok(archive)
    }

    pub async fn save_event(&self, event_id: &str, event: &Event) -> StorageResult<()> {
        let json = serde_json::to_vec(event).map_err(|err| StorageError::Io(err.into()))?;
        self.store
            .put(&event_metadata_path(event_id), Bytes::from(json))
            .await
    }

    /// Read event metadata. A missing blob is `Ok(None)`.
    pub async fn load_event(&self, event_id: &str) -> StorageResult<Option<Event>> {
        match self.store.get(&event_metadata_path(event_id)).await {
            Ok(bytes) => {
                let event = serde_json::from_slice(&bytes)
                    .map_err(|err| StorageError::Io(err.into()))?;
                Ok(Some(event))
            }
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn event_exists(&self, event_id: &str) -> StorageResult<bool> {
        self.store.exists(&event_metadata_path(event_id)).await
    }

    pub fn public_url(&self, path: &str) -> String {
        self.store.public_url(path)
    }

    /// Round-trip to the backend without touching any real object.
    pub async fn check_ready(&self) -> StorageResult<()> {
        self.store.exists(READINESS_PROBE_PATH).await.map(|_| ())
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn write_archive(entries: Vec<(String, Bytes)>) -> StorageResult<Bytes> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(name, options)?;
        zip.write_all(&data)?;
    }
    let cursor = zip.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}
