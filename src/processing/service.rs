//! Processing service coordinating upload storage, extraction, and summarization.

use crate::{
    extraction::TextExtractor,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::types::ProcessingError,
    summarization::{SummarizationClient, SummaryResult},
    upload::{UploadError, UploadStore, UploadedDocument},
};
use async_trait::async_trait;
use axum::extract::{Multipart, multipart::MultipartRejection};
use std::sync::Arc;

/// Runs one request's document through storage, extraction, and summarization.
///
/// The service owns long-lived, read-only handles to the extractor and the summarization client.
/// Construct it once near process start and share it through an `Arc`; per-request state lives
/// entirely in the [`UploadedDocument`] each call creates and drops.
pub struct ProcessingService {
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn SummarizationClient>,
    uploads: UploadStore,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Store the single file from `multipart`, summarize it, and delete it again.
    ///
    /// A body that could not be read as multipart counts as a failed request.
    async fn summarize_upload(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<SummaryResult, ProcessingError>;

    /// Largest accepted upload, in bytes.
    fn max_upload_bytes(&self) -> usize;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a service from its collaborators.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn SummarizationClient>,
        uploads: UploadStore,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            uploads,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Transient storage used for incoming documents.
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Read a stored document back, extract its text, and summarize it.
    ///
    /// The document is borrowed; the caller's handle decides when the file is removed.
    pub async fn summarize_document(
        &self,
        document: &UploadedDocument,
    ) -> Result<SummaryResult, ProcessingError> {
        let bytes = document.read_bytes().await?;
        let text = self.extractor.extract(bytes).await?;
        if text.is_blank() {
            tracing::warn!(
                filename = document.original_filename(),
                "Document contains no extractable text"
            );
        }

        let summary = self.summarizer.summarize(text.as_str()).await?;
        tracing::info!(
            filename = document.original_filename(),
            sha256 = document.sha256(),
            text_chars = text.char_count(),
            summary_chars = summary.text.chars().count(),
            model = %summary.model,
            "Document summarized"
        );
        Ok(summary)
    }

    async fn run(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<SummaryResult, ProcessingError> {
        let multipart = multipart.map_err(UploadError::from)?;
        let document = self.uploads.receive(multipart).await?;
        self.metrics.record_document(document.size());
        tracing::info!(
            filename = document.original_filename(),
            field = document.field_name(),
            path = %document.path().display(),
            bytes = document.size(),
            sha256 = document.sha256(),
            "Stored upload"
        );

        self.summarize_document(&document).await
    }
}

#[async_trait]
impl SummarizeApi for ProcessingService {
    async fn summarize_upload(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<SummaryResult, ProcessingError> {
        match self.run(multipart).await {
            Ok(summary) => {
                self.metrics.record_summary();
                Ok(summary)
            }
            Err(error) => {
                self.metrics.record_failure();
                Err(error)
            }
        }
    }

    fn max_upload_bytes(&self) -> usize {
        self.uploads.max_bytes()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
