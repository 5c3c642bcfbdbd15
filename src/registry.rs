//! Model registry owning one summarizer handle per supported language.
//!
//! Handles are expensive to create, so the registry loads each one at most once per process
//! lifetime and shares them read-only across all concurrent requests. The lifecycle is a
//! one-way state machine: `Uninitialized -> Initializing -> Ready` on success, `-> Failed`
//! when the default language cannot be loaded, and `-> ShutDown` once handles are released.

use crate::config::{Language, get_config};
use crate::inference::{InferenceError, OllamaSummarizer, SummarizerClient};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Default language whose model must load for the service to become ready.
pub const DEFAULT_LANGUAGE: Language = Language::En;

/// Short fixed text used to exercise a freshly loaded handle during startup.
const LOAD_PROBE_TEXT: &str =
    "This is a test sentence for health check. The model should process it without errors.";

/// Errors raised while initializing the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The default language's model failed its load probe; fatal at startup.
    #[error("Failed to load default-language model ({language}): {source}")]
    DefaultModelLoad {
        /// Language whose load failed.
        language: Language,
        /// Underlying inference error from the probe invocation.
        #[source]
        source: InferenceError,
    },
    /// A previous initialization attempt already failed; the process must restart.
    #[error("Model registry initialization previously failed")]
    AlreadyFailed,
}

/// Shared, read-only handle to a loaded summarization model.
pub type ModelHandle = Arc<dyn SummarizerClient>;

/// Factory producing a summarizer client for a language/model pair.
///
/// Injectable so tests can substitute stub clients for the Ollama-backed default.
pub type ModelLoader = Box<dyn Fn(Language, &str) -> ModelHandle + Send + Sync>;

enum RegistryState {
    Uninitialized,
    Initializing,
    Ready(HashMap<Language, ModelHandle>),
    Failed,
    ShutDown,
}

/// Process-wide holder of summarization model handles.
pub struct ModelRegistry {
    state: RwLock<RegistryState>,
    loader: ModelLoader,
}

impl ModelRegistry {
    /// Build a registry that loads Ollama-backed clients from the global configuration.
    pub fn new() -> Self {
        Self::with_loader(Box::new(|_, model| {
            let config = get_config();
            Arc::new(OllamaSummarizer::new(
                config.ollama_url.clone(),
                model.to_string(),
            )) as ModelHandle
        }))
    }

    /// Build a registry with a custom model loader.
    pub fn with_loader(loader: ModelLoader) -> Self {
        Self {
            state: RwLock::new(RegistryState::Uninitialized),
            loader,
        }
    }

    /// Load all configured models, marking the registry ready.
    ///
    /// Idempotent: repeated or concurrent calls after the first observe the in-progress or
    /// completed state and return without triggering duplicate loads. Failure to load the
    /// default language is fatal and transitions the registry to `Failed`; a secondary
    /// language's failure is logged and that language is omitted from availability.
    /// A shutdown arriving while loads are in flight wins: the loaded handles are dropped
    /// and the registry stays `ShutDown`.
    pub async fn initialize(&self) -> Result<(), RegistryError> {
        {
            let mut state = self.state.write().await;
            match &*state {
                RegistryState::Uninitialized => {}
                RegistryState::Initializing | RegistryState::Ready(_) => return Ok(()),
                RegistryState::Failed | RegistryState::ShutDown => {
                    return Err(RegistryError::AlreadyFailed);
                }
            }
            *state = RegistryState::Initializing;
        }

        tracing::info!("Initializing summarization models");
        let mut handles = HashMap::new();

        match self.load_language(DEFAULT_LANGUAGE).await {
            Ok(Some(handle)) => {
                handles.insert(DEFAULT_LANGUAGE, handle);
            }
            Ok(None) => unreachable!("default language is always configured"),
            Err(source) => {
                let mut state = self.state.write().await;
                if matches!(&*state, RegistryState::Initializing) {
                    *state = RegistryState::Failed;
                }
                return Err(RegistryError::DefaultModelLoad {
                    language: DEFAULT_LANGUAGE,
                    source,
                });
            }
        }

        match self.load_language(Language::Zh).await {
            Ok(Some(handle)) => {
                handles.insert(Language::Zh, handle);
            }
            Ok(None) => {
                tracing::debug!("No Chinese model configured; skipping");
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Chinese summarizer failed to load; Chinese summarization will not be available"
                );
            }
        }

        let mut state = self.state.write().await;
        if !matches!(&*state, RegistryState::Initializing) {
            // A shutdown landed while models were loading; the loaded handles are dropped
            // instead of resurrecting the registry.
            tracing::info!("Registry shut down during initialization; discarding models");
            return Ok(());
        }
        let languages: Vec<&str> = handles.keys().map(|language| language.code()).collect();
        tracing::info!(?languages, "All models loaded");
        *state = RegistryState::Ready(handles);
        Ok(())
    }

    /// Load and probe the model for one language.
    ///
    /// Returns `Ok(None)` when the language has no configured model. The probe invocation
    /// ensures a dead inference endpoint fails at startup rather than on the first request.
    async fn load_language(
        &self,
        language: Language,
    ) -> Result<Option<ModelHandle>, InferenceError> {
        let config = get_config();
        let Some(model) = config.model_for(language) else {
            return Ok(None);
        };

        tracing::info!(language = %language, model = %model, "Loading summarizer");
        let handle = (self.loader)(language, &model);
        handle.invoke(LOAD_PROBE_TEXT, 20, 5).await?;
        tracing::info!(language = %language, "Summarizer loaded");
        Ok(Some(handle))
    }

    /// Fetch the model handle for a language, if one is loaded.
    ///
    /// Returns `None` both for unconfigured/failed languages and while initialization is
    /// still in progress; a handle is only observable once fully constructed and probed.
    pub async fn lookup(&self, language: Language) -> Option<ModelHandle> {
        match &*self.state.read().await {
            RegistryState::Ready(handles) => handles.get(&language).cloned(),
            _ => None,
        }
    }

    /// Languages with a loaded model, in stable code order.
    pub async fn available_languages(&self) -> Vec<Language> {
        match &*self.state.read().await {
            RegistryState::Ready(handles) => {
                let mut languages: Vec<Language> = handles.keys().copied().collect();
                languages.sort_by_key(|language| language.code());
                languages
            }
            _ => Vec::new(),
        }
    }

    /// Whether initialization completed successfully.
    pub async fn is_ready(&self) -> bool {
        matches!(&*self.state.read().await, RegistryState::Ready(_))
    }

    /// Whether the registry has been shut down; it never becomes ready again afterwards.
    pub async fn is_shut_down(&self) -> bool {
        matches!(&*self.state.read().await, RegistryState::ShutDown)
    }

    /// Release all model handles.
    ///
    /// Idempotent; subsequent lookups return `None`. Safe to invoke with requests in
    /// flight: handles already cloned into a request keep working until dropped.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if matches!(&*state, RegistryState::ShutDown) {
            return;
        }
        tracing::info!("Shutting down model registry");
        *state = RegistryState::ShutDown;
    }
}
