//! Plain-text extraction from PDF bytes.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF library rejected the document.
    #[error("failed to extract text from PDF: {0}")]
    Parse(String),
    /// The blocking extraction task panicked or was cancelled.
    #[error("text extraction task failed: {0}")]
    Worker(String),
}

/// Plain text recovered from an uploaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Wrap already-extracted text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the document yielded nothing but whitespace (for example an image-only scan).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Interface implemented by document-to-text backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from raw document bytes.
    async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError>;
}

/// Extractor backed by the `pdf-extract` crate.
///
/// Parsing is CPU-bound and runs on Tokio's blocking pool. Panics inside the parser are caught
/// there and reported as [`ExtractionError::Worker`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Construct the extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError> {
        let byte_len = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|error| ExtractionError::Worker(error.to_string()))?
            .map_err(|error| ExtractionError::Parse(error.to_string()))?;

        let text = ExtractedText::new(text);
        tracing::debug!(
            bytes = byte_len,
            chars = text.char_count(),
            "Extracted text from PDF"
        );
        Ok(text)
    }
}
