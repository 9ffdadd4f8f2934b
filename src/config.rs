use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::env;

/// Which object store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Azure Blob Storage, configured by connection string.
    Azure,
    /// Process-local store; contents vanish on restart.
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub container: String,
    pub connection_string: Option<String>,
    pub static_dir: String,
    pub base_url: Option<String>,
    pub backend: StorageBackend,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            container: "wedding-media".into(),
            connection_string: None,
            static_dir: "./static".into(),
            base_url: None,
            backend: StorageBackend::Azure,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "QR-coded photo uploads for events")]
pub struct Args {
    /// Host to bind to (overrides EVENT_MEDIA_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EVENT_MEDIA_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Blob container holding all event media (overrides AZURE_BLOB_CONTAINER)
    #[arg(long)]
    pub container: Option<String>,

    /// Azure Storage connection string (overrides AZURE_STORAGE_CONNECTION_STRING)
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Directory for generated QR images (overrides EVENT_MEDIA_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<String>,

    /// Public base URL encoded into QR codes (overrides EVENT_MEDIA_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Storage backend (overrides EVENT_MEDIA_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<StorageBackend>,

    /// Largest accepted upload in MiB (overrides EVENT_MEDIA_MAX_UPLOAD_MB)
    #[arg(long)]
    pub max_upload_mb: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_sources(args, |key| env::var(key).ok())
    }

    /// Merge CLI args over values from `lookup` over defaults.
    pub fn from_sources(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        // --- Environment fallback ---
        let env_port = match lookup("EVENT_MEDIA_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing EVENT_MEDIA_PORT value `{}`", value))?,
            None => defaults.port,
        };
        let env_backend = match lookup("EVENT_MEDIA_BACKEND") {
            Some(value) => StorageBackend::from_str(&value, true)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing EVENT_MEDIA_BACKEND value `{}`", value))?,
            None => defaults.backend,
        };
        let env_max_upload_mb = match lookup("EVENT_MEDIA_MAX_UPLOAD_MB") {
            Some(value) => Some(
                value
                    .parse::<usize>()
                    .with_context(|| format!("parsing EVENT_MEDIA_MAX_UPLOAD_MB value `{}`", value))?,
            ),
            None => None,
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Merge ---
        let max_upload_bytes = match args.max_upload_mb.or(env_max_upload_mb) {
            Some(mb) => mb * 1024 * 1024,
            None => defaults.max_upload_bytes,
        };
        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("EVENT_MEDIA_HOST"))
                .unwrap_or(defaults.host),
            port: args.port.unwrap_or(env_port),
            container: args
                .container
                .or_else(|| non_empty("AZURE_BLOB_CONTAINER"))
                .unwrap_or(defaults.container),
            connection_string: args
                .connection_string
                .or_else(|| non_empty("AZURE_STORAGE_CONNECTION_STRING")),
            static_dir: args
                .static_dir
                .or_else(|| lookup("EVENT_MEDIA_STATIC_DIR"))
                .unwrap_or(defaults.static_dir),
            base_url: args.base_url.or_else(|| non_empty("EVENT_MEDIA_BASE_URL")),
            backend: args.backend.unwrap_or(env_backend),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
