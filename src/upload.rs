//! Transient on-disk storage for uploaded documents.
//!
//! Every request gets its own file under the upload directory. The file is owned by an
//! [`UploadedDocument`], and dropping that handle deletes the file, so cleanup happens on every
//! exit path of the request (success, error, or panic unwinding).

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const FALLBACK_FIELD_NAME: &str = "file";
const MAX_FIELD_NAME_LEN: usize = 64;
const MAX_EXTENSION_LEN: usize = 16;
const NONCE_LEN: usize = 8;

/// Errors raised while receiving an upload into transient storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carried no file part.
    #[error("no file attached to the request")]
    MissingFile,
    /// The request carried more than one file part.
    #[error("expected a single file, received more than one")]
    MultipleFiles,
    /// The upload exceeded the configured size ceiling.
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge {
        /// Configured ceiling in bytes.
        limit: usize,
    },
    /// The request was not a readable multipart body.
    #[error("invalid multipart request: {0}")]
    Rejected(#[from] MultipartRejection),
    /// The multipart stream failed mid-read.
    #[error("failed to read multipart data: {0}")]
    Multipart(#[from] MultipartError),
    /// Writing to the upload directory failed.
    #[error("failed to write upload to disk: {0}")]
    Io(#[from] io::Error),
}

/// Build the storage file name for an upload.
///
/// The result is `"{field}-{timestamp_millis}-{nonce}.{extension}"`. The field name is reduced
/// to `[A-Za-z0-9_-]` and the extension to ASCII alphanumerics, so client-supplied values can
/// never introduce path separators. An empty extension is omitted.
pub fn storage_name(
    field_name: &str,
    timestamp_millis: u64,
    nonce: &str,
    extension: Option<&str>,
) -> String {
    let mut field: String = field_name
        .chars()
        .take(MAX_FIELD_NAME_LEN)
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if field.is_empty() {
        field.push_str(FALLBACK_FIELD_NAME);
    }

    let extension: String = extension
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect();

    if extension.is_empty() {
        format!("{field}-{timestamp_millis}-{nonce}")
    } else {
        format!("{field}-{timestamp_millis}-{nonce}.{extension}")
    }
}

fn now_millis() -> u64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or_default()
}

fn fresh_nonce() -> String {
    let mut nonce = Uuid::new_v4().simple().to_string();
    nonce.truncate(NONCE_LEN);
    nonce
}

fn extension_of(original_filename: &str) -> Option<&str> {
    Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
}

/// A document stored in the upload directory for the lifetime of one request.
///
/// Dropping the value deletes the backing file.
#[derive(Debug)]
pub struct UploadedDocument {
    path: PathBuf,
    field_name: String,
    original_filename: String,
    size: u64,
    sha256: String,
}

impl UploadedDocument {
    /// Location of the stored file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Multipart field name the file arrived under.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// File name reported by the client.
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Size of the stored content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hex-encoded SHA-256 digest of the stored content.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Read the stored content back from disk.
    pub async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }
}

impl Drop for UploadedDocument {
    fn drop(&mut self) {
        // Blocking unlink on the current thread; `Drop` cannot await.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed transient upload"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to remove transient upload"
            ),
        }
    }
}

/// Upload directory plus the size ceiling applied to every incoming file.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Directory that holds in-flight uploads.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Largest accepted upload, in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Pull the single file part out of a multipart body and store it.
    ///
    /// Parts without a file name are skipped. A second file part fails the whole request and
    /// the first file is removed along with it.
    pub async fn receive(&self, mut multipart: Multipart) -> Result<UploadedDocument, UploadError> {
        let mut stored: Option<UploadedDocument> = None;

        while let Some(field) = multipart.next_field().await? {
            if field.file_name().is_none() {
                tracing::debug!(field = ?field.name(), "Skipping non-file multipart field");
                continue;
            }
            if stored.is_some() {
                return Err(UploadError::MultipleFiles);
            }
            stored = Some(self.store_field(field).await?);
        }

        stored.ok_or(UploadError::MissingFile)
    }

    /// Stream a single multipart file part to disk.
    pub async fn store_field(&self, mut field: Field<'_>) -> Result<UploadedDocument, UploadError> {
        let field_name = field.name().unwrap_or_default().to_string();
        let original_filename = field.file_name().unwrap_or_default().to_string();

        let mut slot = self.open_slot(field_name, original_filename).await?;
        while let Some(chunk) = field.chunk().await? {
            slot.write(&chunk).await?;
        }
        slot.finish().await
    }

    /// Store an in-memory buffer as if it had been uploaded under `field_name`.
    pub async fn store_bytes(
        &self,
        field_name: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<UploadedDocument, UploadError> {
        let mut slot = self
            .open_slot(field_name.to_string(), original_filename.to_string())
            .await?;
        slot.write(bytes).await?;
        slot.finish().await
    }

    async fn open_slot(
        &self,
        field_name: String,
        original_filename: String,
    ) -> Result<SlotWriter, UploadError> {
        self.ensure_dir().await?;
        let name = storage_name(
            &field_name,
            now_millis(),
            &fresh_nonce(),
            extension_of(&original_filename),
        );
        let path = self.dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        Ok(SlotWriter {
            file,
            hasher: Sha256::new(),
            max_bytes: self.max_bytes,
            document: UploadedDocument {
                path,
                field_name,
                original_filename,
                size: 0,
                sha256: String::new(),
            },
        })
    }
}

/// Open storage slot being filled. The document is declared last so the file handle closes
/// before the document's `Drop` unlinks the path on an error.
struct SlotWriter {
    file: File,
    hasher: Sha256,
    max_bytes: usize,
    document: UploadedDocument,
}

impl SlotWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let size = self.document.size + chunk.len() as u64;
        if size > self.max_bytes as u64 {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        self.file.write_all(chunk).await?;
        self.hasher.update(chunk);
        self.document.size = size;
        Ok(())
    }

    async fn finish(self) -> Result<UploadedDocument, UploadError> {
        let SlotWriter {
            mut file,
            hasher,
            mut document,
            ..
        } = self;
        file.flush().await?;
        drop(file);
        document.sha256 = hex::encode(hasher.finalize());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "pdf-summarizer-boundary";

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read dir").count()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/summarize")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn multipart_from(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        Multipart::from_request(multipart_request(parts), &())
            .await
            .expect("multipart extractor")
    }

    #[test]
    fn storage_name_combines_field_timestamp_nonce_and_extension() {
        assert_eq!(
            storage_name("file", 1_700_000_000_000, "a1b2c3d4", Some("pdf")),
            "file-1700000000000-a1b2c3d4.pdf"
        );
    }

    #[test]
    fn storage_name_neutralizes_path_characters() {
        assert_eq!(
            storage_name("../../etc", 7, "n", Some("p/df")),
            "______etc-7-n.pdf"
        );
        assert_eq!(storage_name("", 7, "n", None), "file-7-n");
        assert_eq!(storage_name("doc", 7, "n", Some("")), "doc-7-n");
    }

    #[test]
    fn extension_comes_from_the_original_filename() {
        assert_eq!(extension_of("report.final.pdf"), Some("pdf"));
        assert_eq!(extension_of("README"), None);
    }

    #[tokio::test]
    async fn stored_bytes_are_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 1024);

        let document = store
            .store_bytes("file", "hello.pdf", b"hello")
            .await
            .expect("stored");

        assert!(document.path().exists());
        assert!(document.path().starts_with(dir.path()));
        assert_eq!(document.size(), 5);
        assert_eq!(document.original_filename(), "hello.pdf");
        assert_eq!(document.field_name(), "file");
        assert_eq!(
            document.sha256(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(document.read_bytes().await.expect("read"), b"hello");
        let name = document
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .expect("file name");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".pdf"));

        let path = document.path().to_path_buf();
        drop(document);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn concurrent_uploads_with_same_name_get_distinct_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 1024);

        let (first, second) = tokio::join!(
            store.store_bytes("file", "same.pdf", b"first"),
            store.store_bytes("file", "same.pdf", b"second"),
        );
        let first = first.expect("first upload");
        let second = second.expect("second upload");

        assert_ne!(first.path(), second.path());
        assert_eq!(first.read_bytes().await.expect("read"), b"first");
        assert_eq!(second.read_bytes().await.expect("read"), b"second");
        assert_eq!(entries(dir.path()), 2);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 4);

        let error = store
            .store_bytes("file", "big.pdf", b"0123456789")
            .await
            .expect_err("too large");

        assert!(matches!(error, UploadError::TooLarge { limit: 4 }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn store_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested").join("uploads");
        let store = UploadStore::new(&nested, 1024);

        let document = store
            .store_bytes("file", "a.pdf", b"%PDF-")
            .await
            .expect("stored");
        assert!(document.path().starts_with(&nested));
    }

    #[tokio::test]
    async fn receive_stores_the_single_file_and_ignores_text_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 1024);
        let multipart = multipart_from(&[
            ("note", None, b"ignored"),
            ("pdf", Some("paper.pdf"), b"%PDF-1.4 body"),
        ])
        .await;

        let document = store.receive(multipart).await.expect("document");

        assert_eq!(document.field_name(), "pdf");
        assert_eq!(document.original_filename(), "paper.pdf");
        assert_eq!(document.read_bytes().await.expect("read"), b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn receive_without_file_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 1024);
        let multipart = multipart_from(&[("note", None, b"only text")]).await;

        let error = store.receive(multipart).await.expect_err("missing file");

        assert!(matches!(error, UploadError::MissingFile));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn receive_rejects_second_file_and_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(dir.path(), 1024);
        let multipart = multipart_from(&[
            ("file", Some("a.pdf"), b"first"),
            ("file", Some("b.pdf"), b"second"),
        ])
        .await;

        let error = store.receive(multipart).await.expect_err("two files");

        assert!(matches!(error, UploadError::MultipleFiles));
        assert_eq!(entries(dir.path()), 0);
    }
}
