//! PDF download and plain-text extraction.
//!
//! Upstream text source for the summarization pipeline: fetch a PDF over HTTP, pull its text
//! with `pdf-extract`, and normalize whitespace. Anything that makes the document unusable
//! (bad URL, oversized payload, unreadable PDF, near-empty text) surfaces as
//! [`ExtractionError::Unprocessable`] so the API layer can reject the whole request.

use crate::config::get_config;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning a PDF URL into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Document was invalid, oversized, or yielded no usable text.
    #[error("Unprocessable document: {0}")]
    Unprocessable(String),
    /// PDF could not be downloaded from the provided URL.
    #[error("Failed to download PDF: {0}")]
    Download(String),
}

/// Service for extracting text from PDF files.
pub struct TextExtractor {
    http: Client,
}

impl TextExtractor {
    /// Build an extractor with a download client (60s timeout, redirects followed).
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent("scholar-nlp/extractor")
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to construct reqwest::Client for extraction");
        Self { http }
    }

    /// Download a PDF and return its cleaned text together with the character count.
    pub async fn extract_from_url(
        &self,
        pdf_url: &str,
    ) -> Result<(String, usize), ExtractionError> {
        let url = Url::parse(pdf_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .ok_or_else(|| ExtractionError::Unprocessable(format!("Invalid URL: {pdf_url}")))?;

        let bytes = self.download_pdf(url).await?;
        let text = extract_text(bytes).await?;

        let config = get_config();
        let char_count = text.chars().count();
        if char_count < 100 {
            return Err(ExtractionError::Unprocessable(
                "PDF appears to be empty or text extraction failed".into(),
            ));
        }

        if char_count > config.max_text_length {
            tracing::warn!(
                chars = char_count,
                max = config.max_text_length,
                "Extracted text too long; truncating"
            );
            let truncated: String = text.chars().take(config.max_text_length).collect();
            let truncated_count = truncated.chars().count();
            return Ok((truncated, truncated_count));
        }

        Ok((text, char_count))
    }

    async fn download_pdf(&self, url: Url) -> Result<Vec<u8>, ExtractionError> {
        tracing::info!(url = %url, "Downloading PDF");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| ExtractionError::Download(error.to_string()))?;

        let max_bytes = get_config().max_pdf_size_bytes();
        if let Some(length) = response.content_length() {
            if length as usize > max_bytes {
                return Err(ExtractionError::Unprocessable(format!(
                    "PDF too large: {:.1}MB (max: {}MB)",
                    length as f64 / 1024.0 / 1024.0,
                    get_config().max_pdf_size_mb
                )));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.contains("pdf") {
            tracing::warn!(content_type, "Unexpected content type for PDF download");
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| ExtractionError::Download(error.to_string()))?;

        // Content-Length is advisory; enforce the limit on the actual payload too.
        if bytes.len() > max_bytes {
            return Err(ExtractionError::Unprocessable(format!(
                "PDF too large: {:.1}MB (max: {}MB)",
                bytes.len() as f64 / 1024.0 / 1024.0,
                get_config().max_pdf_size_mb
            )));
        }

        tracing::debug!(bytes = bytes.len(), "PDF downloaded");
        Ok(bytes.to_vec())
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run CPU-bound PDF parsing off the request-handling threads and clean the result.
async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|error| ExtractionError::Unprocessable(format!("Extraction task failed: {error}")))?
        .map_err(|error| ExtractionError::Unprocessable(format!("Invalid PDF format: {error}")))?;

    Ok(clean_text(&parsed))
}

/// Trim lines and collapse whitespace runs into single spaces.
fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(word);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG;
    use crate::config::Config;
    use httpmock::{Method::GET, MockServer};
    use std::sync::Once;

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = CONFIG.set(Config {
                ollama_url: "http://127.0.0.1:11434".into(),
                en_summarizer_model: "facebook/bart-large-cnn".into(),
                en_summarizer_model_small: "sshleifer/distilbart-cnn-12-6".into(),
                zh_summarizer_model: Some("csebuetnlp/mT5_multilingual_XLSum".into()),
                use_small_models: false,
                chunk_token_budget: 1500,
                max_pdf_size_mb: 1,
                max_text_length: 1_000_000,
                inference_concurrency: 2,
                server_port: None,
            });
        });
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        let raw = "  Abstract \n\n This paper   presents\ta method. \n";
        assert_eq!(clean_text(raw), "Abstract This paper presents a method.");
    }

    #[tokio::test]
    async fn rejects_invalid_urls() {
        ensure_test_config();
        let extractor = TextExtractor::new();
        let error = extractor
            .extract_from_url("not-a-url")
            .await
            .expect_err("invalid url");
        assert!(matches!(error, ExtractionError::Unprocessable(_)));

        let error = extractor
            .extract_from_url("ftp://example.org/paper.pdf")
            .await
            .expect_err("unsupported scheme");
        assert!(matches!(error, ExtractionError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_payloads() {
        ensure_test_config();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/paper.pdf");
                then.status(200)
                    .header("content-type", "application/pdf")
                    .body(vec![0u8; 2 * 1024 * 1024]);
            })
            .await;

        let extractor = TextExtractor::new();
        let error = extractor
            .extract_from_url(&format!("{}/paper.pdf", server.base_url()))
            .await
            .expect_err("oversized payload");
        assert!(
            matches!(error, ExtractionError::Unprocessable(ref message) if message.contains("too large"))
        );
    }

    #[tokio::test]
    async fn rejects_unreadable_pdf_bytes() {
        ensure_test_config();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/paper.pdf");
                then.status(200)
                    .header("content-type", "application/pdf")
                    .body("this is not a pdf document at all");
            })
            .await;

        let extractor = TextExtractor::new();
        let error = extractor
            .extract_from_url(&format!("{}/paper.pdf", server.base_url()))
            .await
            .expect_err("unreadable pdf");
        assert!(matches!(error, ExtractionError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn surfaces_download_failures() {
        ensure_test_config();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/paper.pdf");
                then.status(404);
            })
            .await;

        let extractor = TextExtractor::new();
        let error = extractor
            .extract_from_url(&format!("{}/paper.pdf", server.base_url()))
            .await
            .expect_err("download failure");
        assert!(matches!(error, ExtractionError::Download(_)));
    }
}
