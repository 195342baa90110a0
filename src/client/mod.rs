//! Core library client for monorepo-rag
//!
//! [`RagClient`] is the explicit context object for the whole system: it owns
//! the embedding model handle, the vector store, the loaded tracker state and
//! the configuration, and exposes ingest, query and list as plain async methods.
//! The MCP server and the CLI are thin wrappers around it.

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager};
use crate::error::{EmbeddingError, IndexingError, RagError, VectorDbError};
use crate::indexer::{ContentFilter, PathClassifier, TextChunker};
use crate::tracker::IndexTracker;
use crate::types::*;
use crate::vector_db::{LanceVectorDB, MemoryVectorDB, ScoredDocument, VectorDatabase};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Main client for interacting with the RAG system
///
/// # Example
///
/// ```no_run
/// use monorepo_rag::{Config, IngestRequest, QueryRequest, RagClient};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = RagClient::with_config(Config::default()).await?;
///
///     let ingest = client.ingest(IngestRequest::default()).await;
///     println!("{:?}", ingest.message);
///
///     let response = client.query(QueryRequest::new("heat scheduling")).await;
///     for chunk in response.chunks {
///         println!("{}", chunk);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RagClient {
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) vector_db: Arc<dyn VectorDatabase>,
    pub(crate) chunker: Arc<TextChunker>,
    pub(crate) filter: Arc<ContentFilter>,
    pub(crate) classifier: Arc<PathClassifier>,
    // Held for the duration of one ingest run; serializes concurrent runs
    pub(crate) tracker: Arc<Mutex<IndexTracker>>,
    pub(crate) tracker_path: PathBuf,
    pub(crate) config: Arc<Config>,
}

impl RagClient {
    /// Create a new RAG client from the default config file and environment
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Create a new RAG client with custom configuration
    pub async fn with_config(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Initializing RAG client with configuration");
        tracing::debug!("Vector DB backend: {}", config.vector_db.backend);
        tracing::debug!("Embedding model: {}", config.embedding.model_name);
        tracing::debug!("Chunk size: {}", config.project.max_chunk_size);

        let model_name = config.embedding.model_name.clone();
        let batch_size = config.embedding.batch_size;
        let embedding_provider = tokio::task::spawn_blocking(move || {
            FastEmbedManager::from_model_name(&model_name, Some(batch_size))
        })
        .await
        .context("Failed to spawn embedding model task")?
        .context("Failed to initialize embedding provider")?;

        let vector_db: Arc<dyn VectorDatabase> = match config.vector_db.backend.as_str() {
            "memory" => {
                tracing::info!("Using in-memory vector database backend");
                Arc::new(MemoryVectorDB::new())
            }
            _ => {
                tracing::info!(
                    "Using LanceDB vector database backend at {}",
                    config.vector_db.lancedb_path.display()
                );
                Arc::new(
                    LanceVectorDB::with_path(
                        &config.vector_db.lancedb_path.to_string_lossy(),
                        &config.vector_db.collection_name,
                    )
                    .await
                    .context("Failed to initialize LanceDB vector database")?,
                )
            }
        };

        Self::with_components(config, Arc::new(embedding_provider), vector_db).await
    }

    /// Assemble a client from explicit collaborators
    pub async fn with_components(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_db: Arc<dyn VectorDatabase>,
    ) -> anyhow::Result<Self> {
        vector_db
            .initialize(embedding_provider.dimension())
            .await
            .context("Failed to initialize vector database collection")?;

        let tracker_path = config.tracker.path.clone();
        let tracker = IndexTracker::load_or_default(&tracker_path);
        tracing::info!("Using tracker file: {:?}", tracker_path);

        Ok(Self {
            embedding_provider,
            vector_db,
            chunker: Arc::new(TextChunker::new(config.project.max_chunk_size)),
            filter: Arc::new(ContentFilter::new(&config.filter)),
            classifier: Arc::new(PathClassifier::new(config.project.type_prefixes())),
            tracker: Arc::new(Mutex::new(tracker)),
            tracker_path,
            config: Arc::new(config),
        })
    }

    /// Index the configured directories, incrementally unless `force_rebuild` is set
    ///
    /// Never fails: errors are reported in the response.
    pub async fn ingest(&self, request: IngestRequest) -> IngestResponse {
        self.ingest_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`ingest`](Self::ingest) but stops at the next file boundary once `cancel` fires
    pub async fn ingest_with_cancel(
        &self,
        request: IngestRequest,
        cancel: CancellationToken,
    ) -> IngestResponse {
        ingest_response(self.run_ingest(request.force_rebuild, cancel).await)
    }

    /// Run the indexing pipeline and return its report
    pub async fn run_ingest(
        &self,
        force_rebuild: bool,
        cancel: CancellationToken,
    ) -> Result<IndexReport, RagError> {
        indexing::do_ingest(self, force_rebuild, cancel, None, None).await
    }

    /// Query the index and return matching chunk texts
    ///
    /// Never fails: errors are reported in the response.
    pub async fn query(&self, request: QueryRequest) -> QueryResponse {
        let top_k = request.top_k_or(self.config.search.top_k);
        match self.search(&request).await {
            Ok(results) => QueryResponse {
                ok: true,
                query: request.query,
                top_k,
                type_filter: request.type_filter,
                chunks: results.into_iter().map(|r| r.document).collect(),
                error: None,
            },
            Err(e) => QueryResponse {
                ok: false,
                query: request.query,
                top_k,
                type_filter: request.type_filter,
                chunks: vec![],
                error: Some(e.to_user_string()),
            },
        }
    }

    /// Nearest neighbours of the query, post-filtered by type
    ///
    /// Exactly `top_k` neighbours are requested from the store, falling back to
    /// `search.top_k` when the request leaves it out; filtering can only shrink
    /// the result.
    pub async fn search(&self, request: &QueryRequest) -> Result<Vec<ScoredDocument>, RagError> {
        request.validate()?;
        let top_k = request.top_k_or(self.config.search.top_k);

        let query_embedding = self
            .embed_with_timeout(vec![request.query.clone()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                actual: 0,
            })?;

        let mut results = self
            .vector_db
            .search(query_embedding, top_k)
            .await
            .map_err(|e| VectorDbError::SearchFailed(format!("{:#}", e)))?;

        if let Some(type_filter) = request.type_filter {
            results.retain(|r| r.metadata.doc_type == type_filter);
        }

        tracing::debug!(
            "Query '{}' returned {} chunks (top_k {}, filter {:?})",
            request.query,
            results.len(),
            top_k,
            request.type_filter
        );
        Ok(results)
    }

    /// Ids and metadata of every indexed chunk, ordered by source then chunk index
    pub async fn list_documents(&self) -> ListResponse {
        match self.vector_db.get_all().await {
            Ok(mut documents) => {
                documents.sort_by(|a, b| {
                    (a.meta.source.as_str(), a.meta.chunk_index, a.id.as_str()).cmp(&(
                        b.meta.source.as_str(),
                        b.meta.chunk_index,
                        b.id.as_str(),
                    ))
                });
                ListResponse {
                    ok: true,
                    count: documents.len(),
                    documents,
                    error: None,
                }
            }
            Err(e) => ListResponse {
                ok: false,
                count: 0,
                documents: vec![],
                error: Some(VectorDbError::ListFailed(format!("{:#}", e)).to_string()),
            },
        }
    }

    /// Wrap the best-matching chunks around a user request as LLM context
    pub async fn build_prompt(
        &self,
        user_request: &str,
        top_k: Option<usize>,
        type_filter: Option<DocType>,
    ) -> Result<String, RagError> {
        let mut request = QueryRequest::new(user_request).with_type_filter(type_filter);
        request.top_k = top_k;
        let chunks: Vec<String> = self
            .search(&request)
            .await?
            .into_iter()
            .map(|r| r.document)
            .collect();

        Ok(format_prompt(user_request, &chunks))
    }

    /// Persist the tracker and flush the vector store
    pub async fn flush(&self) -> Result<(), RagError> {
        self.tracker.lock().await.save(&self.tracker_path)?;
        self.vector_db
            .flush()
            .await
            .map_err(|e| RagError::other(format!("Failed to flush vector database: {:#}", e)))?;
        Ok(())
    }

    /// Get the configuration used by this client
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the embedding dimension used by this client
    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.dimension()
    }

    /// Embed on a blocking thread, bounded by the configured timeout
    pub(crate) async fn embed_with_timeout(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let expected = texts.len();
        let timeout_secs = self.config.embedding.timeout_secs;
        let provider = self.embedding_provider.clone();
        let embed_future = tokio::task::spawn_blocking(move || provider.embed_batch(texts));

        let embeddings = match tokio::time::timeout(Duration::from_secs(timeout_secs), embed_future)
            .await
        {
            Ok(Ok(Ok(embeddings))) => embeddings,
            Ok(Ok(Err(e))) => {
                return Err(EmbeddingError::GenerationFailed(format!("{:#}", e)).into());
            }
            Ok(Err(e)) => {
                return Err(
                    EmbeddingError::GenerationFailed(format!("Embedding task panicked: {}", e))
                        .into(),
                );
            }
            Err(_) => return Err(EmbeddingError::Timeout(timeout_secs).into()),
        };

        if embeddings.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: embeddings.len(),
            }
            .into());
        }
        Ok(embeddings)
    }
}

/// Map a pipeline result to the structured ingest response
pub(crate) fn ingest_response(result: Result<IndexReport, RagError>) -> IngestResponse {
    match result {
        Ok(report) => IngestResponse::success(report),
        Err(RagError::Indexing(e @ IndexingError::ClearFailed(_))) => {
            IngestResponse::failure(e.to_string())
        }
        Err(e) => IngestResponse::failure(format!("Indexing failed: {}", e)),
    }
}

/// Prompt text for `user_request` given retrieved context chunks
pub fn format_prompt(user_request: &str, chunks: &[String]) -> String {
    if chunks.is_empty() {
        return format!("No project context found for request: {}\n\n", user_request);
    }
    format!(
        "Project context (from RAG):\n\n{}\n\nUser request:\n{}\n",
        chunks.join("\n\n"),
        user_request
    )
}

// Indexing pipeline
pub(crate) mod indexing;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;
