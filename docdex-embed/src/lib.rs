//! # docdex-embed
//!
//! Embedding generation for the docdex document search stack, with a focus on
//! local ONNX models via FastEmbed. Designed for async operation with clean
//! abstractions so the search layer depends on a capability interface rather
//! than any concrete model runtime.
//!
//! ## Features
//!
//! - **Local ONNX Models**: Run embedding models locally without external API calls
//! - **Async-First Design**: Full async/await support with tokio integration
//! - **Model Caching**: Models are loaded once per configuration and shared
//! - **Half-Precision**: Memory-efficient f16 embeddings
//! - **Deterministic Test Double**: A hashing provider for offline and test use
//!
//! ## Quick Start
//!
//! ```no_run
//! use docdex_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//!
//! let texts = vec!["política de contraseñas".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}",
//!          result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Configuration for providers (model, batching, time bounds)
//! - [`provider`]: The [`EmbeddingProvider`] trait and its implementations
//! - [`error`]: Error types and result handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`] type.
//! Unavailable-provider and timeout failures are marked transient so callers
//! can degrade to non-semantic search instead of surfacing an error.

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{DEFAULT_MAX_INPUT_CHARS, DEFAULT_MODEL_NAME, EmbedConfig};
pub use error::{EmbedError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingResult, FastEmbedProvider, HashingEmbeddingProvider,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbedConfig::default();

        assert_eq!(config.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(config.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
        assert!(config.normalize);
    }
}
