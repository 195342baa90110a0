/// Platform-specific default locations for the vector store, tracker sidecar and config file
///
/// Follows the XDG Base Directory layout on Linux and the native layout on
/// macOS and Windows (via the `dirs` crate), falling back to the current
/// directory when no home directory can be determined.
use std::path::{Path, PathBuf};

/// Folder name used under each platform directory
pub const APP_DIR_NAME: &str = "monorepo-rag";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Data directory: `$XDG_DATA_HOME`, `~/Library/Application Support`, `%LOCALAPPDATA%`
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Cache directory: `$XDG_CACHE_HOME`, `~/Library/Caches`, `%LOCALAPPDATA%`
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Config directory: `$XDG_CONFIG_HOME`, `~/Library/Application Support`, `%APPDATA%`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {data_dir}/monorepo-rag/lancedb
    pub fn default_lancedb_path() -> PathBuf {
        Self::data_dir().join(APP_DIR_NAME).join("lancedb")
    }

    /// Returns: {cache_dir}/monorepo-rag/indexed_files.json
    pub fn default_tracker_path() -> PathBuf {
        Self::cache_dir().join(APP_DIR_NAME).join("indexed_files.json")
    }

    /// Returns: {config_dir}/monorepo-rag/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join(APP_DIR_NAME).join("config.toml")
    }
}

/// Make `path` absolute against `base` without touching the filesystem
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Path of `path` relative to `root`, or `path` itself when it lies outside `root`
pub fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
