//! Configuration for embedding providers

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model identifier for the default local ONNX model.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Documents longer than this are truncated before embedding to bound
/// inference cost. Measured in characters, not tokens.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;

/// Configuration for embedding providers.
///
/// Covers the model selection and the runtime knobs that consumers of a
/// provider care about: batching, normalization, the per-call time bound,
/// and the input truncation limit applied before text reaches the model.
///
/// # Example
/// ```
/// use docdex_embed::EmbedConfig;
/// use std::time::Duration;
///
/// let config = EmbedConfig::builder()
///     .batch_size(16usize)
///     .embed_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.model_name, "all-MiniLM-L6-v2");
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    #[builder(default = r#"DEFAULT_MODEL_NAME.to_string()"#)]
    pub model_name: String,
    /// Maximum batch size for embedding generation
    #[builder(default = "32")]
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings
    #[builder(default = "true")]
    pub normalize: bool,
    /// Time bound applied to a single embed call by callers
    #[builder(default = "Duration::from_secs(30)")]
    pub embed_timeout: Duration,
    /// Maximum number of characters of input text passed to the model
    #[builder(default = "DEFAULT_MAX_INPUT_CHARS")]
    pub max_input_chars: usize,
}

impl EmbedConfig {
    /// Create a new embedding configuration using the builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::default()
    }

    /// Create a configuration for a named model with defaults otherwise
    pub fn for_model(model_name: impl Into<String>) -> Self {
        EmbedConfigBuilder::default()
            .model_name(model_name)
            .build()
            .expect("Failed to build EmbedConfig")
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    /// Set the per-call time bound (builder style)
    pub fn with_embed_timeout(self, embed_timeout: Duration) -> Self {
        Self {
            embed_timeout,
            ..self
        }
    }

    /// Set the input truncation limit in characters (builder style)
    pub fn with_max_input_chars(self, max_input_chars: usize) -> Self {
        Self {
            max_input_chars,
            ..self
        }
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        EmbedConfigBuilder::default()
            .build()
            .expect("Failed to build default EmbedConfig")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EmbedConfig::default();

        assert_eq!(config.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(config.batch_size, 32);
        assert!(config.normalize);
        assert_eq!(config.embed_timeout, Duration::from_secs(30));
        assert_eq!(config.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_config_builder_methods() {
        let config = EmbedConfig::for_model("custom-model")
            .with_batch_size(64)
            .with_normalize(false)
            .with_embed_timeout(Duration::from_millis(500))
            .with_max_input_chars(1024);

        assert_eq!(config.model_name, "custom-model");
        assert_eq!(config.batch_size, 64);
        assert!(!config.normalize);
        assert_eq!(config.embed_timeout, Duration::from_millis(500));
        assert_eq!(config.max_input_chars, 1024);
    }

    #[test]
    fn test_derive_builder_pattern() {
        let config = EmbedConfig::builder()
            .model_name("custom-model")
            .batch_size(128usize)
            .normalize(false)
            .build()
            .unwrap();

        assert_eq!(config.model_name, "custom-model");
        assert_eq!(config.batch_size, 128);
        assert!(!config.normalize);
    }

    #[test]
    fn test_config_serializes_deterministically() {
        let config = EmbedConfig::default();
        let a = serde_json::to_string(&config).unwrap();
        let b = serde_json::to_string(&config.clone()).unwrap();
        assert_eq!(a, b);
    }
}
