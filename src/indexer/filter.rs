use crate::config::FilterConfig;
use std::path::Path;

/// Minimum number of meaningful lines a chunk needs to be worth embedding
pub const MIN_MEANINGFUL_LINES: usize = 2;

/// Drops generated, vendored and low-information content before embedding
#[derive(Debug, Clone)]
pub struct ContentFilter {
    skip_file_patterns: Vec<String>,
    boilerplate_keywords: Vec<String>,
    comment_markers: Vec<String>,
}

impl ContentFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            skip_file_patterns: config.skip_file_patterns.clone(),
            boilerplate_keywords: config.boilerplate_keywords.clone(),
            comment_markers: config.comment_markers.clone(),
        }
    }

    /// True if the path contains any configured noise substring
    pub fn should_skip_file(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.skip_file_patterns
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }

    /// True if the chunk is boilerplate or has fewer than two meaningful lines
    pub fn should_skip_chunk(&self, chunk: &str) -> bool {
        if self.matching_keyword(chunk).is_some() {
            return true;
        }
        self.meaningful_line_count(chunk) < MIN_MEANINGFUL_LINES
    }

    /// Lines that are non-blank after trimming and do not start with a comment marker
    pub fn meaningful_line_count(&self, chunk: &str) -> usize {
        super::chunker::split_lines(chunk)
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                !self
                    .comment_markers
                    .iter()
                    .any(|marker| line.starts_with(marker.as_str()))
            })
            .count()
    }

    /// First configured boilerplate keyword found in the chunk
    pub fn matching_keyword(&self, chunk: &str) -> Option<&str> {
        self.boilerplate_keywords
            .iter()
            .find(|keyword| chunk.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
