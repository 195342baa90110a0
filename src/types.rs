use crate::error::ValidationError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest `top_k` accepted by a query
pub const MAX_TOP_K: usize = 100;

/// Semantic document type assigned to every chunk from the directory it lives in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Design,
    Schema,
    Code,
    Architecture,
    Domain,
    Backend,
    Frontend,
    #[default]
    Unknown,
}

impl DocType {
    pub const ALL: [DocType; 8] = [
        DocType::Design,
        DocType::Schema,
        DocType::Code,
        DocType::Architecture,
        DocType::Domain,
        DocType::Backend,
        DocType::Frontend,
        DocType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Design => "design",
            DocType::Schema => "schema",
            DocType::Code => "code",
            DocType::Architecture => "architecture",
            DocType::Domain => "domain",
            DocType::Backend => "backend",
            DocType::Frontend => "frontend",
            DocType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DocType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidValue("type".to_string(), s.to_string()))
    }
}

/// Metadata stored alongside every chunk in the vector store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkMetadata {
    /// File path relative to the project root
    pub source: String,
    /// 0-based position of the chunk within its file's chunk sequence
    pub chunk_index: usize,
    /// Document type derived from the file's directory
    #[serde(rename = "type", default)]
    pub doc_type: DocType,
}

/// Request to (re)index the configured project directories
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IngestRequest {
    /// If true, clear the existing index and rebuild from scratch (default: false)
    #[serde(default)]
    pub force_rebuild: bool,
}

/// Summary of one indexing pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexReport {
    /// Chunks embedded and written to the vector store
    pub chunks_added: usize,
    /// Files that produced at least one stored chunk
    pub files_indexed: usize,
    /// Files whose modification time matched the tracked value
    pub files_unchanged: usize,
    /// Files dropped by the noise filters or that yielded no indexable chunks
    pub files_skipped: usize,
    /// Non-fatal per-file errors
    #[serde(default)]
    pub errors: Vec<String>,
    /// Whether the run stopped early at a file boundary
    #[serde(default)]
    pub cancelled: bool,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Structured result of an ingest call
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IngestResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<IndexReport>,
}

impl IngestResponse {
    pub fn success(report: IndexReport) -> Self {
        let message = if report.cancelled {
            format!(
                "Indexing cancelled after adding {} chunks",
                report.chunks_added
            )
        } else {
            format!(
                "Indexing completed successfully. Added {} chunks from {} files",
                report.chunks_added, report.files_indexed
            )
        };
        Self {
            ok: true,
            message: Some(message),
            error: None,
            report: Some(report),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(error.into()),
            report: None,
        }
    }
}

/// Request to query the index
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryRequest {
    /// The search query to find relevant project context
    #[serde(default)]
    pub query: String,
    /// Number of chunks to return (default: `search.top_k` from the config, 5 unless changed)
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Optional filter by type: design, schema, domain, frontend, backend, architecture, code
    #[serde(default)]
    pub type_filter: Option<DocType>,
}

pub(crate) fn default_top_k() -> usize {
    5
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            type_filter: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// The requested `top_k`, or `default` when the caller left it out
    pub fn top_k_or(&self, default: usize) -> usize {
        self.top_k.unwrap_or(default)
    }

    pub fn with_type_filter(mut self, type_filter: Option<DocType>) -> Self {
        self.type_filter = type_filter;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::MissingParameter("query".to_string()));
        }
        if let Some(top_k) = self.top_k.filter(|k| *k == 0 || *k > MAX_TOP_K) {
            return Err(ValidationError::ConstraintViolation {
                field: "top_k".to_string(),
                constraint: format!("between 1 and {}", MAX_TOP_K),
                actual: top_k.to_string(),
            });
        }
        if self.type_filter == Some(DocType::Unknown) {
            return Err(ValidationError::InvalidValue(
                "type_filter".to_string(),
                DocType::Unknown.to_string(),
            ));
        }
        Ok(())
    }
}

/// Structured result of a query call
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResponse {
    pub ok: bool,
    pub query: String,
    pub top_k: usize,
    pub type_filter: Option<DocType>,
    /// Matching chunk texts, best match first
    pub chunks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request to list indexed documents
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListRequest {}

/// One stored vector-store entry, without its text or embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    pub id: String,
    pub meta: ChunkMetadata,
}

/// Structured result of a list call
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListResponse {
    pub ok: bool,
    pub count: usize,
    pub documents: Vec<DocumentSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListResponse {
    /// Number of stored chunks per source file, sorted by source
    pub fn chunks_by_source(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for doc in &self.documents {
            *counts.entry(doc.meta.source.clone()).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }
}
