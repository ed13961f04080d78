//! Error taxonomy for the summarization pipeline.

use crate::extraction::ExtractionError;
use crate::summarization::SummarizationClientError;
use crate::upload::UploadError;
use thiserror::Error;

/// Errors emitted anywhere between receiving an upload and returning its summary.
///
/// The HTTP layer collapses every variant into the same generic failure response; the variants
/// exist so the log line says which stage failed.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The upload was missing, malformed, oversized, or could not be stored.
    #[error("Failed to receive upload: {0}")]
    Upload(#[from] UploadError),
    /// The stored file could not be read back.
    #[error("Failed to read stored upload: {0}")]
    Io(#[from] std::io::Error),
    /// The PDF library could not produce text for the document.
    #[error("Failed to extract text: {0}")]
    Extraction(#[from] ExtractionError),
    /// The text-generation service did not return a summary.
    #[error("Failed to summarize text: {0}")]
    Summarization(#[from] SummarizationClientError),
}

impl ProcessingError {
    /// Short label for the failing stage, used as a structured log field.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::Io(_) => "read",
            Self::Extraction(_) => "extraction",
            Self::Summarization(_) => "summarization",
        }
    }
}
