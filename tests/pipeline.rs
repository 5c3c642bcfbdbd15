//! End-to-end pipeline test against a mocked Ollama endpoint.
//!
//! Boots the real registry/service stack with the inference URL pointing at an httpmock
//! server, then drives initialization, summarization, and health probing through the same
//! code paths the binary uses.

use httpmock::{Method::POST, MockServer};
use scholar_nlp::config::{CONFIG, Config, Language};
use scholar_nlp::registry::ModelRegistry;
use scholar_nlp::summarize::{ServiceApi, SummaryService, SummaryStyle};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn full_pipeline_runs_against_mock_inference_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({
                "response": "The method relies on digital twins. Results show strong accuracy. \
                             A limitation is the small sample.",
                "done": true
            }));
        })
        .await;

    CONFIG
        .set(Config {
            ollama_url: server.base_url(),
            en_summarizer_model: "facebook/bart-large-cnn".into(),
            en_summarizer_model_small: "sshleifer/distilbart-cnn-12-6".into(),
            zh_summarizer_model: None,
            use_small_models: false,
            chunk_token_budget: 1500,
            max_pdf_size_mb: 50,
            max_text_length: 1_000_000,
            inference_concurrency: 2,
            server_port: None,
        })
        .expect("config installed once for the test binary");

    let registry = Arc::new(ModelRegistry::new());
    registry.initialize().await.expect("initialize registry");
    assert!(registry.is_ready().await);
    assert_eq!(registry.available_languages().await, vec![Language::En]);
    // No Chinese model is configured for this run.
    assert!(registry.lookup(Language::Zh).await.is_none());

    let service = SummaryService::new(registry.clone());

    let text = "Digital twin frameworks model injection molding lines in real time. The \
                methodology combines in-cavity sensors with convolutional networks for defect \
                classification. Experiments cover three polymer grades and two machine sizes. \
                Results demonstrate a clear accuracy improvement over threshold baselines. \
                One limitation is the narrow range of polymers evaluated so far.";

    let report = service
        .summarize(text, SummaryStyle::Technical, Language::En, 1200)
        .await
        .expect("structured report");

    // Registry probe plus one chunk (the text fits a single 1500-token window).
    assert_eq!(mock.hits_async().await, 2);

    assert!(!report.tl_dr.is_empty());
    assert!(!report.key_points.is_empty() && report.key_points.len() <= 8);
    assert!(report.methods.contains("method"));
    assert!(report.results.to_lowercase().contains("results"));
    assert!(!report.limitations.is_empty() && report.limitations.len() <= 5);

    // The canary probe drives the same pipeline and sees the same healthy endpoint.
    let snapshot = service.health().await;
    assert!(snapshot.ready);
    assert!(snapshot.models_loaded);
    assert_eq!(snapshot.available_languages, vec!["en"]);

    // Requests racing ahead of their transport share the loaded handles without issue.
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let service_text = text.to_string();
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let service = SummaryService::new(registry);
            service
                .summarize(&service_text, SummaryStyle::Executive, Language::En, 1200)
                .await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("concurrent summary");
    }

    registry.shutdown().await;
    assert!(registry.lookup(Language::En).await.is_none());
    let error = service
        .summarize(text, SummaryStyle::Technical, Language::En, 1200)
        .await
        .expect_err("registry shut down");
    assert!(matches!(
        error,
        scholar_nlp::summarize::SummarizeError::Unavailable(Language::En)
    ));
}
