use crate::types::DocType;
use std::path::{Path, PathBuf};

/// Maps a file path to a document type by its directory
///
/// Matching is component-wise (`server/src` does not match `server/srcs`).
/// The longest matching prefix wins; prefixes of equal depth resolve to the
/// entry listed first.
#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    prefixes: Vec<(PathBuf, DocType)>,
}

impl PathClassifier {
    pub fn new(prefixes: Vec<(PathBuf, DocType)>) -> Self {
        Self { prefixes }
    }

    pub fn classify(&self, path: &Path) -> DocType {
        let mut best: Option<(usize, DocType)> = None;

        for (prefix, doc_type) in &self.prefixes {
            if !path.starts_with(prefix) {
                continue;
            }
            let depth = prefix.components().count();
            if best.is_none_or(|(best_depth, _)| depth > best_depth) {
                best = Some((depth, *doc_type));
            }
        }

        best.map(|(_, doc_type)| doc_type).unwrap_or_default()
    }

    pub fn prefixes(&self) -> &[(PathBuf, DocType)] {
        &self.prefixes
    }
}
