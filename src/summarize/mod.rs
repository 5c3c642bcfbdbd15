//! Structured summarization pipeline: chunking, model inference, and report assembly.

pub mod chunking;
pub mod keywords;
pub mod report;
mod service;
pub mod types;

pub use service::{HealthSnapshot, ServiceApi, SummaryService};
pub use types::{StructuredReport, SummarizeError, SummaryStyle};
