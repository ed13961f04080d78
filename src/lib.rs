#![deny(missing_docs)]

//! Core library for the PDF summarization server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction backends.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters.
pub mod metrics;
/// Upload-to-summary pipeline orchestration.
pub mod processing;
/// Chat-completions client used to generate summaries.
pub mod summarization;
/// Transient on-disk storage for uploaded documents.
pub mod upload;
