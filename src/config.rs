use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the ScholarLens NLP service.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Ollama runtime used for summarization inference.
    pub ollama_url: String,
    /// English summarization model identifier.
    pub en_summarizer_model: String,
    /// Smaller English model used when `USE_SMALL_MODELS` is set.
    pub en_summarizer_model_small: String,
    /// Optional Chinese summarization model; Chinese support is skipped when unset.
    pub zh_summarizer_model: Option<String>,
    /// Prefer the small model variants for constrained environments.
    pub use_small_models: bool,
    /// Token budget for a single summarization chunk.
    pub chunk_token_budget: usize,
    /// Maximum accepted PDF payload size in megabytes.
    pub max_pdf_size_mb: usize,
    /// Maximum number of characters retained from an extracted document.
    pub max_text_length: usize,
    /// Number of model invocations allowed to run concurrently.
    pub inference_concurrency: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Languages with summarization support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (default language; its model must load for the service to start).
    #[default]
    En,
    /// Chinese (optional; omitted from availability when its model fails to load).
    Zh,
}

impl Language {
    /// Language code used in logs and API responses.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            _ => Err(()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
            en_summarizer_model: load_env_optional("EN_SUMMARIZER_MODEL")
                .unwrap_or_else(|| "facebook/bart-large-cnn".to_string()),
            en_summarizer_model_small: load_env_optional("EN_SUMMARIZER_MODEL_SMALL")
                .unwrap_or_else(|| "sshleifer/distilbart-cnn-12-6".to_string()),
            zh_summarizer_model: load_env_optional("ZH_SUMMARIZER_MODEL"),
            use_small_models: load_env_flag("USE_SMALL_MODELS"),
            chunk_token_budget: parse_env_or("CHUNK_TOKEN_BUDGET", 1500)?,
            max_pdf_size_mb: parse_env_or("MAX_PDF_SIZE_MB", 50)?,
            max_text_length: parse_env_or("MAX_TEXT_LENGTH", 1_000_000)?,
            inference_concurrency: parse_env_or("INFERENCE_CONCURRENCY", 2)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Resolve the model identifier for a language, honoring the small-model switch.
    ///
    /// Returns `None` when the language is not configured (currently only possible for
    /// Chinese when `ZH_SUMMARIZER_MODEL` is unset).
    pub fn model_for(&self, language: Language) -> Option<String> {
        match language {
            Language::En => Some(if self.use_small_models {
                self.en_summarizer_model_small.clone()
            } else {
                self.en_summarizer_model.clone()
            }),
            Language::Zh => self.zh_summarizer_model.clone(),
        }
    }

    /// Maximum accepted PDF payload size in bytes.
    pub fn max_pdf_size_bytes(&self) -> usize {
        self.max_pdf_size_mb * 1024 * 1024
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_flag(key: &str) -> bool {
    load_env_optional(key)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        ollama_url = %config.ollama_url,
        en_model = %config.en_summarizer_model,
        use_small_models = config.use_small_models,
        chunk_token_budget = config.chunk_token_budget,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
