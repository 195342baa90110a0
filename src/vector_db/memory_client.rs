use crate::error::VectorDbError;
use crate::types::DocumentSummary;
use crate::vector_db::{ScoredDocument, StoreEntry, VectorDatabase};
use anyhow::Result;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Non-persistent vector store with brute-force squared-L2 search
#[derive(Default)]
pub struct MemoryVectorDB {
    dimension: RwLock<Option<usize>>,
    entries: RwLock<BTreeMap<String, StoreEntry>>,
}

impl MemoryVectorDB {
    pub fn new() -> Self {
        Self::default()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait::async_trait]
impl VectorDatabase for MemoryVectorDB {
    async fn initialize(&self, dimension: usize) -> Result<()> {
        let mut current = self.dimension.write().await;
        if current.is_none() {
            tracing::debug!("Initializing in-memory store with dimension {}", dimension);
            *current = Some(dimension);
        }
        Ok(())
    }

    async fn upsert(&self, entries: Vec<StoreEntry>) -> Result<usize> {
        let dimension = (*self.dimension.read().await).ok_or(VectorDbError::NotInitialized)?;

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(VectorDbError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            }
            .into());
        }

        let count = entries.len();
        let mut stored = self.entries.write().await;
        for entry in entries {
            stored.insert(entry.id.clone(), entry);
        }
        Ok(count)
    }

    async fn get_all(&self) -> Result<Vec<DocumentSummary>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .map(|e| DocumentSummary {
                id: e.id.clone(),
                meta: e.metadata.clone(),
            })
            .collect())
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredDocument>> {
        let dimension = (*self.dimension.read().await).ok_or(VectorDbError::NotInitialized)?;
        if query_vector.len() != dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: dimension,
                actual: query_vector.len(),
            }
            .into());
        }

        let stored = self.entries.read().await;
        let mut results: Vec<ScoredDocument> = stored
            .values()
            .map(|e| ScoredDocument {
                id: e.id.clone(),
                document: e.document.clone(),
                metadata: e.metadata.clone(),
                distance: squared_l2(&query_vector, &e.embedding),
            })
            .collect();

        // Stable sort keeps id order among equal distances
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(limit);
        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut stored = self.entries.write().await;
        Ok(ids.iter().filter(|id| stored.remove(*id).is_some()).count())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
