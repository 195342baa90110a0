use crate::paths::relative_to;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// A candidate file found under one of the scan roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the project root
    pub relative_path: String,
}

/// Walks the configured scan roots and collects files with an allowed suffix
pub struct FileWalker {
    project_root: PathBuf,
    roots: Vec<PathBuf>,
    file_types: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl FileWalker {
    pub fn new(project_root: impl AsRef<Path>, roots: Vec<PathBuf>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            roots,
            file_types: vec![],
            exclude_dirs: vec![],
        }
    }

    pub fn with_file_types(mut self, file_types: Vec<String>) -> Self {
        self.file_types = file_types;
        self
    }

    pub fn with_exclude_dirs(mut self, exclude_dirs: Vec<String>) -> Self {
        self.exclude_dirs = exclude_dirs;
        self
    }

    /// Collect eligible files from every root, in root order then file-name order.
    ///
    /// Missing roots and unreadable entries are logged and skipped.
    pub fn walk(&self) -> Vec<DiscoveredFile> {
        let mut files = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                tracing::warn!("Directory {} not found, skipping", root.display());
                continue;
            }
            self.walk_root(root, &mut files);
        }

        tracing::info!("Found {} candidate files", files.len());
        files
    }

    fn walk_root(&self, root: &Path, files: &mut Vec<DiscoveredFile>) {
        let exclude_dirs = self.exclude_dirs.clone();

        let walker = WalkBuilder::new(root)
            .standard_filters(false) // Index exactly what is on disk
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && exclude_dirs
                        .iter()
                        .any(|name| entry.file_name() == name.as_str()))
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if !self.has_allowed_suffix(path) {
                continue;
            }

            files.push(DiscoveredFile {
                path: path.to_path_buf(),
                relative_path: relative_to(path, &self.project_root),
            });
        }
    }

    fn has_allowed_suffix(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.file_types
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }
}
