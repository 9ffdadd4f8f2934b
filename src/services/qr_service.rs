//! QR code generation for guest upload links.
//!
//! One SVG per sub-event is written to `{static_dir}/qr/{event_id}/` and later
//! served back by the admin page. These images never touch the blob store.

use qrcode::{QrCode, render::svg};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs::{self, File};
use tracing::{debug, info};

const QR_DIR: &str = "qr";
const QR_EXTENSION: &str = "svg";
const QR_MIN_DIMENSION: u32 = 240;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("could not encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("invalid asset name `{0}`")]
    InvalidName(String),
    #[error("QR image `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type QrResult<T> = Result<T, QrError>;

/// Render `text` as a QR code SVG document.
pub fn encode(text: &str) -> QrResult<String> {
    let code = QrCode::new(text.as_bytes())?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .build())
}

/// File stem for a sub-event's QR image. Anything outside
/// `[A-Za-z0-9_ -]` becomes `_`.
pub fn file_stem(subevent: &str) -> String {
    if subevent.is_empty() {
        return "_".to_string();
    }
    subevent
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reject names that could escape the asset directory.
fn ensure_name_safe(name: &str) -> QrResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.bytes().any(|b| b.is_ascii_control())
    {
        return Err(QrError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct QrService {
    static_dir: PathBuf,
}

impl QrService {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    fn event_dir(&self, event_id: &str) -> PathBuf {
        self.static_dir.join(QR_DIR).join(event_id)
    }

    /// Write one QR image per sub-event, each encoding
    /// `{base_url}/upload/{event_id}/{subevent}`. Returns the written paths
    /// relative to the static directory.
    pub async fn write_event_codes(
        &self,
        event_id: &str,
        base_url: &str,
        subevents: &[String],
    ) -> QrResult<Vec<String>> {
        ensure_name_safe(event_id)?;
        let dir = self.event_dir(event_id);
        fs::create_dir_all(&dir).await?;

        let mut written = Vec::with_capacity(subevents.len());
        for subevent in subevents {
            let url = upload_url(base_url, event_id, subevent);
            let svg = encode(&url)?;
            let file_name = format!("{}.{}", file_stem(subevent), QR_EXTENSION);
            fs::write(dir.join(&file_name), svg).await?;
            debug!("wrote QR code for {}", url);
            written.push(format!("{}/{}/{}", QR_DIR, event_id, file_name));
        }

        info!("generated {} QR codes for event {}", written.len(), event_id);
        Ok(written)
    }

    /// Generated images for an event as `qr/{event_id}/{file}` paths, sorted.
    /// An event without a QR directory has no images.
    pub async fn list_event_codes(&self, event_id: &str) -> QrResult<Vec<String>> {
        if ensure_name_safe(event_id).is_err() {
            return Ok(Vec::new());
        }
        let mut entries = match fs::read_dir(self.event_dir(event_id)).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(QrError::Io(err)),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(QR_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                images.push(format!("{}/{}/{}", QR_DIR, event_id, name));
            }
        }
        images.sort();
        Ok(images)
    }

    /// Open a generated image for streaming.
    pub async fn open_code(&self, event_id: &str, file_name: &str) -> QrResult<File> {
        ensure_name_safe(event_id)?;
        ensure_name_safe(file_name)?;
        let path = self.event_dir(event_id).join(file_name);
        File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                QrError::NotFound(format!("{}/{}", event_id, file_name))
            } else {
                QrError::Io(err)
            }
        })
    }
}

/// Public upload URL a QR code points at.
pub fn upload_url(base_url: &str, event_id: &str, subevent: &str) -> String {
    format!(
        "{}/upload/{}/{}",
        base_url.trim_end_matches('/'),
        encode_path_segment(event_id),
        encode_path_segment(subevent)
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn encode_produces_svg_document() {
        let svg = encode("http://localhost:3000/upload/abc/reception").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn upload_url_encodes_segments() {
        assert_eq!(
            upload_url("http://host:3000/", "abc", "first dance"),
            "http://host:3000/upload/abc/first%20dance"
        );
        assert_eq!(upload_url("https://x", "e1", "a/b"), "https://x/upload/e1/a%2Fb");
    }

    #[test]
    fn file_stem_neutralises_separators() {
        assert_eq!(file_stem("reception"), "reception");
        assert_eq!(file_stem("first dance"), "first dance");
        assert_eq!(file_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_stem("a.b"), "a_b");
        assert_eq!(file_stem(""), "_");
    }

    #[tokio::test]
    async fn writes_and_lists_one_image_per_subevent() {
        let dir = tempfile::tempdir().unwrap();
        let service = QrService::new(dir.path());

        let written = service
            .write_event_codes(
                "abc12345",
                "http://localhost:3000",
                &["reception".into(), "mehndi".into()],
            )
            .await
            .unwrap();
        assert_eq!(
            written,
            vec!["qr/abc12345/reception.svg", "qr/abc12345/mehndi.svg"]
        );

        let listed = service.list_event_codes("abc12345").await.unwrap();
        assert_eq!(listed, vec!["qr/abc12345/mehndi.svg", "qr/abc12345/reception.svg"]);
        assert!(dir.path().join("qr/abc12345/mehndi.svg").exists());
    }

    #[tokio::test]
    async fn unknown_event_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = QrService::new(dir.path());

        assert!(service.list_event_codes("missing").await.unwrap().is_empty());
        assert!(service.list_event_codes("..").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_code_streams_written_file_and_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let service = QrService::new(dir.path());
        service
            .write_event_codes("e1", "http://h", &["main".into()])
            .await
            .unwrap();

        let mut file = service.open_code("e1", "main.svg").await.unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).await.unwrap();
        assert!(body.contains("<svg"));

        assert!(matches!(
            service.open_code("e1", "../secret").await,
            Err(QrError::InvalidName(_))
        ));
        assert!(matches!(
            service.open_code("e1", "nope.svg").await,
            Err(QrError::NotFound(_))
        ));
    }
}
