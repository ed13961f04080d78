//! Upload-to-summary pipeline: transient storage, text extraction, and summarization.

mod service;
pub mod types;

pub use service::{ProcessingService, SummarizeApi};
pub use types::ProcessingError;
