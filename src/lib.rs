#![deny(missing_docs)]

//! Core library for the ScholarLens NLP service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF download and text extraction.
pub mod extraction;
/// Model-inference client abstraction and the Ollama adapter.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Model lifecycle registry.
pub mod registry;
/// Structured summarization pipeline.
pub mod summarize;
