//! HTTP surface for the PDF summarizer.
//!
//! - `POST /summarize` – Upload one PDF as a multipart file part; returns `{ "summary": "..." }`.
//!   Any failure (no file, unreadable PDF, provider error) returns
//!   `500 { "message": "Error processing the PDF" }`. The cause is only logged.
//! - `GET /metrics` – Document and summary counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::processing::{ProcessingError, SummarizeApi};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Body returned for every failed summarization request.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error processing the PDF";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummarizeApi + 'static,
{
    let body_limit = service
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/summarize", post(summarize_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Success response for the `POST /summarize` endpoint.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

/// Summarize an uploaded PDF.
///
/// The upload is written to transient storage, read back, converted to text, and sent to the
/// summarization provider. The stored file is deleted before the response goes out, whatever
/// the outcome.
async fn summarize_document<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi,
{
    let summary = service.summarize_upload(multipart).await?;
    Ok(Json(SummaryResponse {
        summary: summary.text,
    }))
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummarizeApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'static str>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Upload a single PDF file part; returns { \"summary\": string } or 500 { \"message\": \"Error processing the PDF\" }.",
                content_type: Some("multipart/form-data"),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return document, byte, summary, and failure counters.",
                content_type: None,
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(stage = self.0.stage(), error = %self.0, "Error processing the PDF");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": GENERIC_FAILURE_MESSAGE })),
        )
            .into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
