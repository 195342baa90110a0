use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// FastEmbed-based embedding provider (all-MiniLM-L6-v2 by default)
pub struct FastEmbedManager {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
    batch_size: Option<usize>,
}

/// Resolve a configured model name to a FastEmbed model and its output dimension
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    let short = name.rsplit('/').next().unwrap_or(name);
    match short.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(EmbeddingError::UnknownModel(name.to_string())),
    }
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::from_model_name("all-MiniLM-L6-v2", None)
    }

    /// Create a manager for a configured model name
    pub fn from_model_name(name: &str, batch_size: Option<usize>) -> Result<Self> {
        let (model, dimension) = resolve_model(name)?;
        tracing::info!("Initializing FastEmbed model: {} ({} dims)", name, dimension);

        let mut options = InitOptions::default();
        options.model_name = model;
        options.show_download_progress = false;

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))
            .context("Failed to initialize FastEmbed model")?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            model_name: name.to_string(),
            dimension,
            batch_size,
        })
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let expected = texts.len();
        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::LockPoisoned(e.to_string()))?;
        let embeddings = model
            .embed(texts, self.batch_size)
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: embeddings.len(),
            }
            .into());
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_names() {
        assert_eq!(resolve_model("all-MiniLM-L6-v2").unwrap().1, 384);
        assert_eq!(
            resolve_model("sentence-transformers/all-MiniLM-L6-v2")
                .unwrap()
                .1,
            384
        );
        assert_eq!(resolve_model("BAAI/bge-base-en-v1.5").unwrap().1, 768);
        assert_eq!(resolve_model("bge-small-en-v1.5").unwrap().1, 384);
    }

    #[test]
    fn test_resolve_unknown_model() {
        let err = resolve_model("text-embedding-3-large").unwrap_err();
        assert!(matches!(err, EmbeddingError::UnknownModel(_)));
    }

    #[test]
    fn test_unknown_model_fails_to_construct() {
        assert!(FastEmbedManager::from_model_name("nope", None).is_err());
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn test_embedding_generation() {
        let manager = FastEmbedManager::new().unwrap();
        let texts = vec![
            "export interface Heat { id: string; dancers: string[] }".to_string(),
            "# Scoring\nJudges mark each couple per round.".to_string(),
        ];

        let embeddings = manager.embed_batch(texts).unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
        assert_eq!(manager.model_name(), "all-MiniLM-L6-v2");
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn test_empty_batch() {
        let manager = FastEmbedManager::new().unwrap();
        assert!(manager.embed_batch(vec![]).unwrap().is_empty());
    }
}
