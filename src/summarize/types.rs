//! Core data types and error definitions for the summarization pipeline.

use crate::config::Language;
use crate::extraction::ExtractionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by the summarization pipeline.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Requested language has no loaded model.
    #[error("No summarizer available for language: {0}")]
    Unavailable(Language),
    /// Model registry has not finished initializing; callers should retry later.
    #[error("Model registry not initialized")]
    NotReady,
    /// Upstream PDF text could not be produced.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Anything else; surfaced opaquely, no partial report is returned.
    #[error("Internal summarization error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Summary style requested by the caller.
///
/// Style maps to output-length targets passed to the model: executive summaries aim for
/// (max 100, min 30) tokens, technical ones for (max 200, min 50).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    /// Detailed summary keeping methodological vocabulary.
    #[default]
    Technical,
    /// Short, high-level summary.
    Executive,
}

impl SummaryStyle {
    /// Output-length targets `(max_length, min_length)` for model invocation.
    pub fn length_targets(self) -> (usize, usize) {
        match self {
            Self::Executive => (100, 30),
            Self::Technical => (200, 50),
        }
    }
}

/// Five-field structured summary produced for every request.
///
/// Every field is always populated, either with extracted content or a fixed sentinel
/// string; downstream consumers rely on no field ever being empty. A report is built fresh
/// per request and never cached or mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredReport {
    /// Brief summary (at most 60 words).
    pub tl_dr: String,
    /// Ranked key phrases, at most 8.
    pub key_points: Vec<String>,
    /// Methodology description.
    pub methods: String,
    /// Results and findings.
    pub results: String,
    /// Identified limitations, at most 5.
    pub limitations: Vec<String>,
}
