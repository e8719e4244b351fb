//! Embedding provider implementations
//!
//! Two providers live here:
//!
//! - [`FastEmbedProvider`] runs a local ONNX model through fastembed. Models
//!   are loaded once per configuration and shared through a process-wide
//!   cache, since loading is by far the most expensive step.
//! - [`HashingEmbeddingProvider`] produces deterministic token-hash vectors
//!   with no model at all. It exists for tests and as an offline fallback:
//!   identical text always maps to identical vectors, so ranking assertions
//!   are reproducible.
//!
//! Both implement [`EmbeddingProvider`], the capability interface consumers
//! depend on. Callers that need a time bound wrap individual calls in
//! `tokio::time::timeout` using the limit from
//! [`EmbedConfig::embed_timeout`](crate::EmbedConfig).

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use fnv::FnvHasher;
use half::f16;
use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, Mutex, OnceLock};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of f16 embeddings.
    ///
    /// The dimension is automatically inferred from the first embedding vector.
    /// If the embeddings vector is empty, dimension defaults to 0.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Type alias for cached model entries (model, dimension)
type ModelCacheEntry = (Arc<Mutex<TextEmbedding>>, usize);

/// Global cache for initialized embedding models to avoid reloading
static MODEL_CACHE: OnceLock<Mutex<HashMap<String, ModelCacheEntry>>> = OnceLock::new();

/// Get the global model cache
fn get_model_cache() -> &'static Mutex<HashMap<String, ModelCacheEntry>> {
    MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;

    /// Get the identifier of the underlying model
    fn model_name(&self) -> &str;
}

/// FastEmbed-based embedding provider using real ONNX models
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Option<Arc<Mutex<TextEmbedding>>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("model", &self.model.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Creates a new uninitialized provider. Call [`initialize`](Self::initialize)
    /// before embedding, or use [`create`](Self::create) to do both in one step.
    pub fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            model: None,
            dimension: 384, // all-MiniLM-L6-v2 output width
        }
    }

    /// Loads the embedding model, reusing a process-wide cache when the same
    /// configuration was already initialized.
    pub async fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing FastEmbed provider for model: {}",
            self.config.model_name
        );

        let cache_key = self.create_cache_key();

        // Check if model is already cached
        let cached_data = {
            let cache = get_model_cache().lock().unwrap();
            cache
                .get(&cache_key)
                .map(|(model, dim)| (Arc::clone(model), *dim))
        };

        if let Some((cached_model, cached_dimension)) = cached_data {
            tracing::info!("Using cached model for: {}", self.config.model_name);
            self.model = Some(cached_model);
            self.dimension = cached_dimension;
            return Ok(());
        }

        let embedding_model = Self::resolve_model(&self.config.model_name)?;

        // Load model in a blocking task
        let model_name = self.config.model_name.clone();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                tracing::info!("Loading embedding model: {model_name}");

                let init_options =
                    InitOptions::new(embedding_model).with_show_download_progress(false);

                let mut model = TextEmbedding::try_new(init_options).map_err(|e| {
                    EmbedError::provider_unavailable(format!(
                        "failed to load model {model_name}: {e}"
                    ))
                })?;

                // Get dimension by generating a test embedding
                let test_embeddings = model
                    .embed(vec!["test".to_string()], None)
                    .map_err(|e| EmbedError::External { source: e })?;
                let dimension = test_embeddings.first().map(|emb| emb.len()).unwrap_or(384);

                tracing::info!("Model loaded successfully. Dimension: {dimension}");
                Ok((model, dimension))
            })
            .await??;

        let model_arc = Arc::new(Mutex::new(model));

        // Cache the model
        {
            let mut cache = get_model_cache().lock().unwrap();
            cache.insert(cache_key, (Arc::clone(&model_arc), dimension));
        }

        self.model = Some(model_arc);
        self.dimension = dimension;

        Ok(())
    }

    /// Creates and initializes a provider in one step.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Map a configured model name onto a fastembed built-in model
    fn resolve_model(model_name: &str) -> Result<EmbeddingModel> {
        match model_name {
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            other => Err(EmbedError::invalid_config(format!(
                "unsupported embedding model: {other}"
            ))),
        }
    }

    /// Create a cache key based on the model configuration
    fn create_cache_key(&self) -> String {
        // Serialize entire config to deterministic JSON
        let config_json =
            serde_json::to_string(&self.config).expect("Config should always serialize");

        // Hash with FNV for deterministic, fast hashing
        let mut hasher = FnvHasher::default();
        hasher.write(config_json.as_bytes());

        format!("{:x}", hasher.finish())
    }

    /// Clears the global model cache.
    pub fn clear_cache() {
        let cache = get_model_cache();
        let mut cache_guard = cache.lock().unwrap();
        cache_guard.clear();
        tracing::info!("Model cache cleared");
    }

    /// Returns the number of cached models.
    pub fn cache_size() -> usize {
        let cache = get_model_cache();
        let cache_guard = cache.lock().unwrap();
        cache_guard.len()
    }

    /// Convert f32 embeddings to f16, normalizing first when configured
    fn convert_to_f16(&self, embeddings: Vec<Vec<f32>>) -> Vec<Vec<f16>> {
        embeddings
            .into_iter()
            .map(|mut embedding| {
                if self.config.normalize {
                    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                    if norm > 0.0 {
                        for value in &mut embedding {
                            *value /= norm;
                        }
                    }
                }
                embedding.into_iter().map(f16::from_f32).collect()
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::provider_unavailable("no embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        let model = self.model.as_ref().ok_or_else(|| {
            EmbedError::provider_unavailable("model not initialized, call initialize() first")
        })?;

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        // Process in batches to avoid memory issues
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(self.config.batch_size) {
            let chunk = chunk.to_vec();
            let model_clone = Arc::clone(model);

            let batch_embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                tracing::debug!("Processing batch of {} texts", chunk.len());

                let mut model_guard = model_clone.lock().unwrap();
                let embeddings = model_guard
                    .embed(chunk, None)
                    .map_err(|e| EmbedError::External { source: e })?;

                Ok(embeddings)
            })
            .await??;

            let f16_embeddings = self.convert_to_f16(batch_embeddings);
            all_embeddings.extend(f16_embeddings);
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Deterministic embedding provider backed by token hashing.
///
/// Each whitespace-separated token is hashed into one of `dimension` buckets
/// with a sign bit, and the resulting count vector is L2-normalized. Texts
/// sharing tokens land near each other, identical texts map to identical
/// vectors, and no model files are needed. Useful as the test double behind
/// [`EmbeddingProvider`] and as an offline fallback.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider emitting vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f16> {
        let mut buckets = vec![0.0f32; self.dimension];

        for token in text.to_lowercase().split_whitespace() {
            let token: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            if token.is_empty() {
                continue;
            }

            let mut hasher = FnvHasher::default();
            hasher.write(token.as_bytes());
            let hash = hasher.finish();

            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            buckets[bucket] += sign;
        }

        let norm: f32 = buckets.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut buckets {
                *value /= norm;
            }
        }

        buckets.into_iter().map(f16::from_f32).collect()
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        Ok(self.embed_one(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let embeddings = texts.iter().map(|t| self.embed_one(t)).collect();
        Ok(EmbeddingResult::new(embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "token-hash"
    }
}
