/// Configuration system for monorepo-rag
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use crate::paths::{PlatformPaths, absolutize};
use crate::types::DocType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What to scan and how to chunk it
    #[serde(default)]
    pub project: ProjectConfig,

    /// Noise filters applied to files and chunks
    #[serde(default)]
    pub filter: FilterConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector database configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,

    /// Indexed-file tracker configuration
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

/// One entry of the ordered directory-to-type table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirTypeMapping {
    /// Directory relative to the project root (or absolute)
    pub dir: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
}

impl DirTypeMapping {
    pub fn new(dir: impl Into<String>, doc_type: DocType) -> Self {
        Self {
            dir: dir.into(),
            doc_type,
        }
    }
}

/// Project scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root; relative entries elsewhere are resolved against it
    #[serde(default = "default_project_root")]
    pub root: PathBuf,

    /// Root directories to scan, relative to the project root
    #[serde(default = "default_rag_dirs")]
    pub rag_dirs: Vec<String>,

    /// File name suffixes eligible for indexing
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,

    /// Soft character budget per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Directory-to-type table
    #[serde(default = "default_dir_types")]
    pub dir_types: Vec<DirTypeMapping>,

    /// Directory names never descended into
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

/// Noise filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Substrings marking generated, vendored or declaration files
    #[serde(default = "default_skip_file_patterns")]
    pub skip_file_patterns: Vec<String>,

    /// Auto-generated symbol names that mark a chunk as boilerplate
    #[serde(default = "default_boilerplate_keywords")]
    pub boilerplate_keywords: Vec<String>,

    /// Line prefixes treated as comments when counting meaningful lines
    #[serde(default = "default_comment_markers")]
    pub comment_markers: Vec<String>,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "BAAI/bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Batch size used inside a single embedding call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout in seconds for one embedding call
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Database backend: "lancedb" or "memory"
    #[serde(default = "default_db_backend")]
    pub backend: String,

    /// LanceDB data directory path
    #[serde(default = "default_lancedb_path")]
    pub lancedb_path: PathBuf,

    /// Collection (table) name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Sidecar JSON file mapping absolute file path to last indexed mtime
    #[serde(default = "default_tracker_path")]
    pub path: PathBuf,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of chunks returned by a query
    #[serde(default = "crate::types::default_top_k")]
    pub top_k: usize,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_rag_dirs() -> Vec<String> {
    [
        "rag/design",
        "rag/schema",
        "rag/code",
        "rag/project-structure",
        "shared",
        "server/src",
        "client/src",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_file_types() -> Vec<String> {
    vec![".ts".to_string(), ".tsx".to_string(), ".md".to_string()]
}

fn default_max_chunk_size() -> usize {
    800
}

fn default_dir_types() -> Vec<DirTypeMapping> {
    vec![
        DirTypeMapping::new("rag/design", DocType::Design),
        DirTypeMapping::new("rag/schema", DocType::Schema),
        DirTypeMapping::new("rag/code", DocType::Code),
        DirTypeMapping::new("rag/project-structure", DocType::Architecture),
        DirTypeMapping::new("shared", DocType::Domain),
        DirTypeMapping::new("server/src", DocType::Backend),
        DirTypeMapping::new("client/src", DocType::Frontend),
    ]
}

fn default_exclude_dirs() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        "dist".to_string(),
        ".git".to_string(),
    ]
}

fn default_skip_file_patterns() -> Vec<String> {
    vec![
        ".d.ts".to_string(),
        "node_modules".to_string(),
        "dist".to_string(),
        ".git".to_string(),
    ]
}

fn default_boilerplate_keywords() -> Vec<String> {
    [
        "ProjectLoadingStartEvent",
        "ProjectLoadingFinishEvent",
        "CompilerOptionsDiagnosticsRequest",
        "ProjectLanguageServiceStateEvent",
        "NavtoRequest",
        "FileSpan",
        "EventBody",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_comment_markers() -> Vec<String> {
    vec!["//".to_string()]
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_embedding_timeout() -> u64 {
    60
}

fn default_db_backend() -> String {
    "lancedb".to_string()
}

fn default_lancedb_path() -> PathBuf {
    PlatformPaths::default_lancedb_path()
}

fn default_collection_name() -> String {
    "monorepo_rag".to_string()
}

fn default_tracker_path() -> PathBuf {
    PlatformPaths::default_tracker_path()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_project_root(),
            rag_dirs: default_rag_dirs(),
            file_types: default_file_types(),
            max_chunk_size: default_max_chunk_size(),
            dir_types: default_dir_types(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            skip_file_patterns: default_skip_file_patterns(),
            boilerplate_keywords: default_boilerplate_keywords(),
            comment_markers: default_comment_markers(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: default_db_backend(),
            lancedb_path: default_lancedb_path(),
            collection_name: default_collection_name(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            path: default_tracker_path(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: crate::types::default_top_k(),
        }
    }
}

impl ProjectConfig {
    /// Absolute project root (canonicalized when it exists)
    pub fn resolved_root(&self) -> PathBuf {
        if let Ok(canonical) = std::fs::canonicalize(&self.root) {
            return canonical;
        }
        match std::env::current_dir() {
            Ok(cwd) => absolutize(&cwd, &self.root),
            Err(_) => self.root.clone(),
        }
    }

    /// Absolute directories to scan, in configured order
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        let root = self.resolved_root();
        self.rag_dirs
            .iter()
            .map(|dir| absolutize(&root, Path::new(dir)))
            .collect()
    }

    /// Absolute directory prefixes paired with their type, in configured order
    pub fn type_prefixes(&self) -> Vec<(PathBuf, DocType)> {
        let root = self.resolved_root();
        self.dir_types
            .iter()
            .map(|m| (absolutize(&root, Path::new(&m.dir)), m.doc_type))
            .collect()
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, RagError> {
        let config_path = PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        fn invalid(key: &str, reason: impl Into<String>) -> RagError {
            ConfigError::InvalidValue {
                key: key.to_string(),
                reason: reason.into(),
            }
            .into()
        }

        if self.vector_db.backend != "lancedb" && self.vector_db.backend != "memory" {
            return Err(invalid(
                "vector_db.backend",
                format!(
                    "must be 'lancedb' or 'memory', got '{}'",
                    self.vector_db.backend
                ),
            ));
        }

        if self.vector_db.collection_name.trim().is_empty() {
            return Err(invalid("vector_db.collection_name", "must not be empty"));
        }

        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be greater than 0"));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(invalid("embedding.timeout_secs", "must be greater than 0"));
        }

        if self.project.max_chunk_size == 0 {
            return Err(invalid("project.max_chunk_size", "must be greater than 0"));
        }

        if self.project.rag_dirs.is_empty() {
            return Err(invalid("project.rag_dirs", "must list at least one directory"));
        }

        if self.project.file_types.is_empty() {
            return Err(invalid("project.file_types", "must list at least one suffix"));
        }

        if self.search.top_k == 0 || self.search.top_k > crate::types::MAX_TOP_K {
            return Err(invalid(
                "search.top_k",
                format!(
                    "must be between 1 and {}, got {}",
                    crate::types::MAX_TOP_K,
                    self.search.top_k
                ),
            ));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("MONOREPO_RAG_PROJECT_ROOT") {
            self.project.root = PathBuf::from(root);
        }

        if let Ok(backend) = std::env::var("MONOREPO_RAG_DB_BACKEND") {
            self.vector_db.backend = backend;
        }

        if let Ok(path) = std::env::var("MONOREPO_RAG_LANCEDB_PATH") {
            self.vector_db.lancedb_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MONOREPO_RAG_TRACKER_PATH") {
            self.tracker.path = PathBuf::from(path);
        }

        if let Ok(model) = std::env::var("MONOREPO_RAG_MODEL") {
            self.embedding.model_name = model;
        }

        if let Ok(batch_size) = std::env::var("MONOREPO_RAG_BATCH_SIZE")
            && let Ok(size) = batch_size.parse()
        {
            self.embedding.batch_size = size;
        }

        if let Ok(max_chunk) = std::env::var("MONOREPO_RAG_MAX_CHUNK_SIZE")
            && let Ok(size) = max_chunk.parse()
        {
            self.project.max_chunk_size = size;
        }
    }

    /// Load from `path` (or the default location), then apply env overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, RagError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, RagError> {
        Self::load(None)
    }
}
