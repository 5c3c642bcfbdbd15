//! Model-inference clients for abstractive summarization.
//!
//! The pipeline treats "run model on a text chunk, get a condensed string back" as an opaque
//! capability behind the [`SummarizerClient`] trait. The shipped implementation talks to a
//! local Ollama runtime over HTTP; decoding is deterministic (temperature 0) so repeated
//! requests over the same input produce the same summary.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while invoking a summarization model.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Model endpoint was unreachable or explicitly missing.
    #[error("Inference endpoint unavailable: {0}")]
    EndpointUnavailable(String),
    /// Model returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Model response could not be parsed.
    #[error("Malformed model response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summarization model backends.
///
/// A client is bound to one model at construction time; the registry owns one client per
/// supported language and shares it read-only across requests.
#[async_trait]
pub trait SummarizerClient: Send + Sync {
    /// Condense `text` into a summary between `min_length` and `max_length` tokens.
    async fn invoke(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, InferenceError>;

    /// Model identifier used for logging and diagnostics.
    fn model_id(&self) -> &str;
}

/// Summarization client backed by an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaSummarizer {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizer {
    /// Construct a client for one model hosted at `base_url`.
    pub fn new(base_url: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent("scholar-nlp/summarizer")
            .build()
            .expect("Failed to construct reqwest::Client for inference");
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn build_prompt(text: &str, max_length: usize, min_length: usize) -> String {
        format!(
            "System: You condense academic text into a faithful abstractive summary. \
             Preserve factual claims and terminology. Return between {min_length} and \
             {max_length} tokens as a single paragraph with no preamble.\n\n\
             Summarize the following passage:\n{text}"
        )
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummarizerClient for OllamaSummarizer {
    async fn invoke(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, InferenceError> {
        let payload = json!({
            "model": self.model,
            "prompt": Self::build_prompt(text, max_length, min_length),
            "stream": false,
            "options": {
                // Greedy decoding keeps chunk summaries reproducible.
                "temperature": 0.0,
                "num_predict": max_length,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                InferenceError::EndpointUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::EndpointUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(InferenceError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
