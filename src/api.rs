//! HTTP surface for the ScholarLens NLP service.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /extract-text` – Download a PDF from the provided URL and return its extracted
//!   text together with the character count.
//! - `POST /summarize` – Produce the five-field structured summary (`tl_dr`, `key_points`,
//!   `methods`, `results`, `limitations`) of the provided text.
//! - `GET /health` – Readiness and model-health snapshot for load balancers and probes.
//! - `GET /status` – Machine-readable service descriptor with an endpoint catalog.
//!
//! Error mapping: validation failures, unprocessable PDFs, and unavailable languages map to
//! 422; a registry that has not finished initializing maps to 503; anything else is an
//! opaque 500 with no partial report.

use crate::config::{Language, get_config};
use crate::extraction::ExtractionError;
use crate::summarize::{ServiceApi, SummarizeError, SummaryStyle};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the extraction and summarization surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ServiceApi + 'static,
{
    Router::new()
        .route("/extract-text", post(extract_text::<S>))
        .route("/summarize", post(summarize::<S>))
        .route("/health", get(health::<S>))
        .route("/status", get(get_status))
        .with_state(service)
}

/// Request body for the `POST /extract-text` endpoint.
#[derive(Deserialize)]
struct ExtractTextRequest {
    /// URL of the PDF document to download and extract.
    pdf_url: String,
}

/// Success response for the `POST /extract-text` endpoint.
#[derive(Serialize)]
struct ExtractTextResponse {
    /// Extracted plain text.
    text: String,
    /// Number of characters in the extracted text.
    chars: usize,
}

/// Download a PDF and extract its text content.
async fn extract_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ExtractTextRequest>,
) -> Result<Json<ExtractTextResponse>, AppError>
where
    S: ServiceApi,
{
    tracing::info!(url = %request.pdf_url, "Extract-text request");
    let (text, chars) = service.extract_text(&request.pdf_url).await?;
    tracing::info!(chars, "Extract-text request completed");
    Ok(Json(ExtractTextResponse { text, chars }))
}

fn default_max_tokens() -> usize {
    1200
}

/// Request body for the `POST /summarize` endpoint.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Text to summarize (50 to 500,000 characters).
    text: String,
    /// Summary style (`technical` | `executive`, defaults to `technical`).
    #[serde(default)]
    style: SummaryStyle,
    /// Language of the text (`en` | `zh`, defaults to `en`).
    #[serde(default)]
    lang: Language,
    /// Upper token bound requested by the caller (100 to 2000, defaults to 1200).
    #[serde(default = "default_max_tokens")]
    max_tokens: usize,
}

/// Success response for the `POST /summarize` endpoint: the structured report fields.
#[derive(Serialize)]
struct SummarizeResponse {
    tl_dr: String,
    key_points: Vec<String>,
    methods: String,
    results: String,
    limitations: Vec<String>,
}

/// Generate a structured summary of the provided text.
async fn summarize<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: ServiceApi,
{
    let char_count = request.text.chars().count();
    if char_count < 50 {
        return Err(AppError::Validation(
            "Text too short (min 50 characters)".into(),
        ));
    }
    if char_count > 500_000 {
        return Err(AppError::Validation(
            "Text too long (max 500K characters)".into(),
        ));
    }
    if !(100..=2000).contains(&request.max_tokens) {
        return Err(AppError::Validation(
            "max_tokens must be between 100 and 2000".into(),
        ));
    }

    tracing::info!(
        chars = char_count,
        style = ?request.style,
        lang = %request.lang,
        "Summarize request"
    );
    let report = service
        .summarize(&request.text, request.style, request.lang, request.max_tokens)
        .await?;
    tracing::info!("Summarize request completed");
    Ok(Json(SummarizeResponse {
        tl_dr: report.tl_dr,
        key_points: report.key_points,
        methods: report.methods,
        results: report.results,
        limitations: report.limitations,
    }))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// `healthy`, `degraded`, or `unready`.
    status: &'static str,
    /// Whether the canary pipeline run produced a fully populated report.
    models_loaded: bool,
    /// Language codes with a loaded model.
    available_languages: Vec<String>,
}

/// Readiness and model-health snapshot.
///
/// Returns 503 while the registry is still initializing; once ready, a failing canary probe
/// reports `degraded` with a 200 so orchestrators can distinguish "starting" from
/// "running but unhealthy".
async fn health<S>(State(service): State<Arc<S>>) -> Response
where
    S: ServiceApi,
{
    let snapshot = service.health().await;
    if !snapshot.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unready",
                models_loaded: false,
                available_languages: snapshot.available_languages,
            }),
        )
            .into_response();
    }

    let status = if snapshot.models_loaded {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        models_loaded: snapshot.models_loaded,
        available_languages: snapshot.available_languages,
    })
    .into_response()
}

/// Service descriptor: configured models, operational limits, and the endpoint catalog.
async fn get_status() -> Json<serde_json::Value> {
    let config = get_config();
    Json(json!({
        "service": "scholar-nlp",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "models": {
            "en": config.model_for(Language::En),
            "zh": config.model_for(Language::Zh),
        },
        "limits": {
            "chunk_token_budget": config.chunk_token_budget,
            "max_pdf_size_mb": config.max_pdf_size_mb,
            "max_text_length": config.max_text_length,
        },
        "endpoints": [
            "/extract-text",
            "/summarize",
            "/health",
            "/status"
        ]
    }))
}

/// HTTP-facing error wrapper applying the service's status-code taxonomy.
enum AppError {
    /// Request failed validation before reaching the pipeline.
    Validation(String),
    /// Pipeline error carrying its own classification.
    Service(SummarizeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::Service(error) => match &error {
                SummarizeError::NotReady => {
                    (StatusCode::SERVICE_UNAVAILABLE, error.to_string())
                }
                SummarizeError::Unavailable(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
                }
                SummarizeError::Extraction(
                    ExtractionError::Unprocessable(_) | ExtractionError::Download(_),
                ) => (StatusCode::UNPROCESSABLE_ENTITY, error.to_string()),
                SummarizeError::Internal(_) => {
                    tracing::error!(error = %error, "Internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<SummarizeError> for AppError {
    fn from(inner: SummarizeError) -> Self {
        Self::Service(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG, Config};
    use crate::summarize::{HealthSnapshot, StructuredReport};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use std::sync::Once;
    use tower::ServiceExt;

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

    struct StubService {
        ready: bool,
        healthy: bool,
    }

    fn sample_report() -> StructuredReport {
        StructuredReport {
            tl_dr: "A compact summary.".into(),
            key_points: vec!["Digital Twin".into(), "Defect Detection".into()],
            methods: "The method uses sensors.".into(),
            results: "Results show high accuracy.".into(),
            limitations: vec!["Narrow polymer range.".into()],
        }
    }

    #[async_trait]
    impl ServiceApi for StubService {
        async fn summarize(
            &self,
            _text: &str,
            _style: SummaryStyle,
            language: Language,
            _max_tokens: usize,
        ) -> Result<StructuredReport, SummarizeError> {
            if !self.ready {
                return Err(SummarizeError::NotReady);
            }
            if language == Language::Zh {
                return Err(SummarizeError::Unavailable(language));
            }
            Ok(sample_report())
        }

        async fn extract_text(&self, pdf_url: &str) -> Result<(String, usize), SummarizeError> {
            if pdf_url.contains("broken") {
                return Err(SummarizeError::Extraction(ExtractionError::Unprocessable(
                    "Invalid PDF format".into(),
                )));
            }
            Ok(("Extracted text".into(), 14))
        }

        async fn health(&self) -> HealthSnapshot {
            HealthSnapshot {
                ready: self.ready,
                models_loaded: self.ready && self.healthy,
                available_languages: if self.ready {
                    vec!["en".into()]
                } else {
                    Vec::new()
                },
            }
        }
    }

    fn router(ready: bool, healthy: bool) -> Router {
        create_router(Arc::new(StubService { ready, healthy }))
    }

    async fn post_json(app: Router, path: &str, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn long_text() -> String {
        "This is a sufficiently long request body for the summarize endpoint. ".repeat(3)
    }

    #[tokio::test]
    async fn summarize_returns_full_report_json() {
        let (status, body) = post_json(
            router(true, true),
            "/summarize",
            json!({ "text": long_text(), "style": "technical", "lang": "en" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tl_dr"], "A compact summary.");
        assert_eq!(body["key_points"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["methods"], "The method uses sensors.");
        assert_eq!(body["results"], "Results show high accuracy.");
        assert_eq!(body["limitations"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn summarize_rejects_short_text() {
        let (status, body) = post_json(
            router(true, true),
            "/summarize",
            json!({ "text": "too short" }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().expect("detail").contains("short"));
    }

    #[tokio::test]
    async fn summarize_rejects_out_of_range_max_tokens() {
        let (status, _) = post_json(
            router(true, true),
            "/summarize",
            json!({ "text": long_text(), "max_tokens": 50 }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn summarize_maps_not_ready_to_503() {
        let (status, _) = post_json(
            router(false, false),
            "/summarize",
            json!({ "text": long_text() }),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn summarize_maps_unavailable_language_to_422() {
        let (status, body) = post_json(
            router(true, true),
            "/summarize",
            json!({ "text": long_text(), "lang": "zh" }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().expect("detail").contains("zh"));
    }

    #[tokio::test]
    async fn extract_text_returns_text_and_chars() {
        let (status, body) = post_json(
            router(true, true),
            "/extract-text",
            json!({ "pdf_url": "https://example.org/paper.pdf" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Extracted text");
        assert_eq!(body["chars"], 14);
    }

    #[tokio::test]
    async fn extract_text_maps_unprocessable_to_422() {
        let (status, _) = post_json(
            router(true, true),
            "/extract-text",
            json!({ "pdf_url": "https://example.org/broken.pdf" }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_ready_and_degraded_states() {
        let response = router(true, true)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["models_loaded"], true);

        let response = router(true, false)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "degraded");

        let response = router(false, false)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn status_exposes_models_limits_and_endpoint_catalog() {
        ensure_test_config();
        let response = router(true, true)
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["service"], "scholar-nlp");
        assert_eq!(body["models"]["en"], "facebook/bart-large-cnn");
        assert_eq!(body["models"]["zh"], "csebuetnlp/mT5_multilingual_XLSum");
        assert_eq!(body["limits"]["chunk_token_budget"], 1500);
        let endpoints = body["endpoints"].as_array().expect("endpoints");
        assert!(endpoints.iter().any(|value| value == "/summarize"));
    }
}
