// LanceDB is the default embedded vector database
pub mod lance_client;
pub use lance_client::LanceVectorDB;

// In-memory store for tests and throwaway sessions
pub mod memory_client;
pub use memory_client::MemoryVectorDB;

use crate::types::{ChunkMetadata, DocumentSummary};
use anyhow::Result;

/// One vector-store row: id, embedding, chunk text and metadata
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// A nearest-neighbour hit, best first
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Distance reported by the store (lower is closer)
    pub distance: f32,
}

/// Deterministic entry id for a chunk of a file
pub fn chunk_id(absolute_path: &str, chunk_index: usize) -> String {
    format!("{}-{}", absolute_path, chunk_index)
}

/// Trait for vector database operations
#[async_trait::async_trait]
pub trait VectorDatabase: Send + Sync {
    /// Initialize the database and create the collection if needed
    async fn initialize(&self, dimension: usize) -> Result<()>;

    /// Insert entries, overwriting any existing entry with the same id
    async fn upsert(&self, entries: Vec<StoreEntry>) -> Result<usize>;

    /// Ids and metadata of every stored entry
    async fn get_all(&self) -> Result<Vec<DocumentSummary>>;

    /// Nearest neighbours of `query_vector`, ranked best first
    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredDocument>>;

    /// Delete entries by id
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Number of stored entries
    async fn count(&self) -> Result<usize>;

    /// Flush/save changes to disk
    async fn flush(&self) -> Result<()>;
}
