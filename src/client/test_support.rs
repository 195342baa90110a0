//! Deterministic collaborators for client tests (no model download, no disk store)

use super::RagClient;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::types::DocumentSummary;
use crate::vector_db::{MemoryVectorDB, ScoredDocument, StoreEntry, VectorDatabase};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) const TEST_DIMENSION: usize = 16;

/// Ordered log of store and embedder calls shared by the test doubles
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

/// Bag-of-words hashing embedder; identical texts map to identical vectors
pub(crate) struct HashEmbedder {
    events: EventLog,
    embedded: Mutex<Vec<String>>,
    fail_marker: Option<String>,
}

impl HashEmbedder {
    pub(crate) fn new(events: EventLog) -> Self {
        Self {
            events,
            embedded: Mutex::new(Vec::new()),
            fail_marker: None,
        }
    }

    /// Fail any batch containing a text with `marker`
    pub(crate) fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// Every text embedded so far
    pub(crate) fn embedded_texts(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }

    pub(crate) fn vector_for(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; TEST_DIMENSION];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() as usize) % TEST_DIMENSION] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            v[0] = 1.0;
        } else {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        self.events
            .lock()
            .unwrap()
            .push(format!("embed:{}", texts.len()));

        if let Some(marker) = &self.fail_marker
            && texts.iter().any(|t| t.contains(marker.as_str()))
        {
            anyhow::bail!("model rejected input");
        }

        self.embedded.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }
}

/// In-memory store that logs deletes and upserts, with optional failures
pub(crate) struct RecordingStore {
    inner: MemoryVectorDB,
    events: EventLog,
    fail_get_all: bool,
    fail_search: bool,
}

impl RecordingStore {
    pub(crate) fn new(events: EventLog) -> Self {
        Self {
            inner: MemoryVectorDB::new(),
            events,
            fail_get_all: false,
            fail_search: false,
        }
    }

    pub(crate) fn failing_get_all(mut self) -> Self {
        self.fail_get_all = true;
        self
    }

    pub(crate) fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }
}

#[async_trait::async_trait]
impl VectorDatabase for RecordingStore {
    async fn initialize(&self, dimension: usize) -> anyhow::Result<()> {
        self.inner.initialize(dimension).await
    }

    async fn upsert(&self, entries: Vec<StoreEntry>) -> anyhow::Result<usize> {
        self.events
            .lock()
            .unwrap()
            .push(format!("upsert:{}", entries.len()));
        self.inner.upsert(entries).await
    }

    async fn get_all(&self) -> anyhow::Result<Vec<DocumentSummary>> {
        if self.fail_get_all {
            anyhow::bail!("collection unavailable");
        }
        self.inner.get_all().await
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: usize,
    ) -> anyhow::Result<Vec<ScoredDocument>> {
        if self.fail_search {
            anyhow::bail!("store offline");
        }
        self.inner.search(query_vector, limit).await
    }

    async fn delete(&self, ids: &[String]) -> anyhow::Result<usize> {
        self.events
            .lock()
            .unwrap()
            .push(format!("delete:{}", ids.len()));
        self.inner.delete(ids).await
    }

    async fn count(&self) -> anyhow::Result<usize> {
        self.inner.count().await
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.inner.flush().await
    }
}

/// Scratch project tree plus a client wired to the test doubles
pub(crate) struct TestEnv {
    pub(crate) temp: TempDir,
    pub(crate) client: RagClient,
    pub(crate) embedder: Arc<HashEmbedder>,
    pub(crate) store: Arc<RecordingStore>,
    pub(crate) events: EventLog,
}

impl TestEnv {
    pub(crate) fn root(&self) -> &Path {
        self.temp.path()
    }

    pub(crate) fn tracker_path(&self) -> std::path::PathBuf {
        self.temp.path().join(".rag").join("indexed_files.json")
    }

    /// Write a file relative to the project root
    pub(crate) fn write(&self, rel: &str, content: &str) -> std::path::PathBuf {
        write_file(self.temp.path(), rel, content)
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

pub(crate) fn write_file(root: &Path, rel: &str, content: &str) -> std::path::PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Config pointing at `root` with the in-memory backend and a tracker inside `root`
pub(crate) fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.project.root = root.to_path_buf();
    config.vector_db.backend = "memory".to_string();
    config.tracker.path = root.join(".rag").join("indexed_files.json");
    config
}

pub(crate) async fn build_env(
    configure: impl FnOnce(&mut Config),
    embedder: impl FnOnce(EventLog) -> HashEmbedder,
    store: impl FnOnce(EventLog) -> RecordingStore,
) -> TestEnv {
    let temp = TempDir::new().unwrap();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut config = test_config(temp.path());
    configure(&mut config);

    let embedder = Arc::new(embedder(events.clone()));
    let store = Arc::new(store(events.clone()));
    let client = RagClient::with_components(config, embedder.clone(), store.clone())
        .await
        .unwrap();

    TestEnv {
        temp,
        client,
        embedder,
        store,
        events,
    }
}

pub(crate) async fn default_env() -> TestEnv {
    build_env(|_| {}, HashEmbedder::new, RecordingStore::new).await
}
