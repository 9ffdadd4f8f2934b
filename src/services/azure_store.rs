//! Azure Blob Storage backend built on the `object_store` crate.
//!
//! Credentials come from a standard Azure Storage connection string
//! (`AccountName=...;AccountKey=...;EndpointSuffix=...`), the same value the
//! Azure portal hands out.

use crate::services::blob_store::{BlobStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{
    ObjectStore, PutPayload,
    azure::{AzureConfigKey, MicrosoftAzure, MicrosoftAzureBuilder},
    path::Path as ObjectPath,
};
use tracing::{debug, info};

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
const EMULATOR_ACCOUNT: &str = "devstoreaccount1";
const EMULATOR_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// Parsed form of an Azure Storage connection string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub endpoint_suffix: Option<String>,
    pub protocol: Option<String>,
    pub sas_token: Option<String>,
    pub use_emulator: bool,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. Keys are case-insensitive, values
    /// may themselves contain `=` (account keys are base64).
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let mut parsed = Self::default();
        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                StorageError::Configuration(format!(
                    "malformed connection string segment `{}`",
                    pair
                ))
            })?;
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "blobendpoint" => {
                    parsed.blob_endpoint = Some(value.trim_end_matches('/').to_string())
                }
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                "defaultendpointsprotocol" => parsed.protocol = Some(value),
                "sharedaccesssignature" => parsed.sas_token = Some(value),
                "usedevelopmentstorage" => {
                    parsed.use_emulator = value.eq_ignore_ascii_case("true")
                }
                other => debug!("ignoring connection string key `{}`", other),
            }
        }

        if parsed.use_emulator {
            return Ok(parsed);
        }
        if parsed.account_name.is_none() {
            return Err(StorageError::Configuration(
                "connection string has no AccountName".into(),
            ));
        }
        if parsed.account_key.is_none() && parsed.sas_token.is_none() {
            return Err(StorageError::Configuration(
                "connection string has neither AccountKey nor SharedAccessSignature".into(),
            ));
        }
        Ok(parsed)
    }

    /// Base URL of the blob service, without a trailing slash.
    pub fn blob_endpoint(&self) -> String {
        if let Some(endpoint) = &self.blob_endpoint {
            return endpoint.clone();
        }
        if self.use_emulator {
            return EMULATOR_BLOB_ENDPOINT.to_string();
        }
        format!(
            "{}://{}.blob.{}",
            self.protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
            self.account_name.as_deref().unwrap_or(EMULATOR_ACCOUNT),
            self.endpoint_suffix
                .as_deref()
                .unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
        )
    }
}

/// [`BlobStore`] backed by one Azure Blob container.
#[derive(Debug)]
pub struct AzureStore {
    client: MicrosoftAzure,
    container: String,
    endpoint: String,
}

impl AzureStore {
    pub fn from_connection_string(raw: &str, container: &str) -> StorageResult<Self> {
        let conn = ConnectionString::parse(raw)?;

        let mut builder = MicrosoftAzureBuilder::new().with_container_name(container);
        if conn.use_emulator {
            builder = builder.with_use_emulator(true);
        } else {
            if let Some(account) = &conn.account_name {
                builder = builder.with_account(account);
            }
            if let Some(key) = &conn.account_key {
                builder = builder.with_access_key(key);
            }
            if let Some(sas) = &conn.sas_token {
                builder = builder.with_config(AzureConfigKey::SasKey, sas);
            }
            if let Some(endpoint) = &conn.blob_endpoint {
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(endpoint.starts_with("http://"));
            }
        }

        let client = builder.build()?;
        let endpoint = conn.blob_endpoint();
        info!(
            "Configured Azure Blob storage at {} (container {})",
            endpoint, container
        );

        Ok(Self {
            client,
            container: container.to_string(),
            endpoint,
        })
    }
}

fn object_path(path: &str) -> StorageResult<ObjectPath> {
    ObjectPath::parse(path).map_err(|_| StorageError::InvalidPath(path.to_string()))
}

/// Directory part of a free-form prefix. `object_store` lists by whole path
/// segments, so the caller filters the remainder by plain string prefix.
fn listing_root(prefix: &str) -> &str {
    match prefix.rfind('/') {
        Some(pos) => &prefix[..pos],
        None => "",
    }
}

fn map_not_found(path: &str, err: object_store::Error) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound(path.to_string()),
        other => StorageError::Backend(other),
    }
}

#[async_trait]
impl BlobStore for AzureStore {
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let location = object_path(path)?;
        let size = data.len();
        self.client.put(&location, PutPayload::from(data)).await?;
        debug!("uploaded {} ({} bytes) to {}", path, size, self.container);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let root = listing_root(prefix);
        let root_path = if root.is_empty() {
            None
        } else {
            Some(object_path(root)?)
        };

        let metas: Vec<_> = self
            .client
            .list(root_path.as_ref())
            .try_collect()
            .await?;

        Ok(metas
            .into_iter()
            .map(|meta| meta.location.to_string())
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        let location = object_path(path)?;
        let result = self
            .client
            .get(&location)
            .await
            .map_err(|err| map_not_found(path, err))?;
        Ok(result.bytes().await?)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let location = object_path(path)?;
        match self.client.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(StorageError::Backend(err)),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.container, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "DefaultEndpointsProtocol=https;AccountName=weddingpics;\
        AccountKey=c2VjcmV0a2V5Zm9yYXp1cmU=;EndpointSuffix=core.windows.net";

    #[test]
    fn parses_standard_connection_string() {
        let conn = ConnectionString::parse(SAMPLE).unwrap();
        assert_eq!(conn.account_name.as_deref(), Some("weddingpics"));
        assert_eq!(conn.account_key.as_deref(), Some("c2VjcmV0a2V5Zm9yYXp1cmU="));
        assert_eq!(conn.protocol.as_deref(), Some("https"));
        assert_eq!(conn.blob_endpoint(), "https://weddingpics.blob.core.windows.net");
    }

    #[test]
    fn explicit_blob_endpoint_wins() {
        let conn = ConnectionString::parse(
            "AccountName=a;AccountKey=k;BlobEndpoint=http://localhost:10000/a/",
        )
        .unwrap();
        assert_eq!(conn.blob_endpoint(), "http://localhost:10000/a");
    }

    #[test]
    fn development_storage_needs_no_account() {
        let conn = ConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert!(conn.use_emulator);
        assert_eq!(conn.blob_endpoint(), EMULATOR_BLOB_ENDPOINT);
    }

    #[test]
    fn missing_account_or_credential_is_configuration_error() {
        assert!(matches!(
            ConnectionString::parse("AccountKey=k"),
            Err(StorageError::Configuration(_))
        ));
        assert!(matches!(
            ConnectionString::parse("AccountName=a"),
            Err(StorageError::Configuration(_))
        ));
        assert!(matches!(
            ConnectionString::parse("AccountName"),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn listing_root_strips_partial_segment() {
        assert_eq!(listing_root("events/E/a/"), "events/E/a");
        assert_eq!(listing_root("events/E/a"), "events/E");
        assert_eq!(listing_root("events"), "");
    }

    #[test]
    fn public_url_joins_endpoint_container_and_path() {
        let store = AzureStore::from_connection_string(SAMPLE, "wedding-media").unwrap();
        assert_eq!(
            store.public_url("events/E/a/x.jpg"),
            "https://weddingpics.blob.core.windows.net/wedding-media/events/E/a/x.jpg"
        );
    }
}
