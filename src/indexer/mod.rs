//! File discovery, chunking, noise filtering and directory typing
//!
//! These are the pure building blocks of the indexing pipeline. None of them
//! fail on ordinary input: empty text yields no chunks and an unmapped path
//! classifies as `unknown`.

mod chunker;
mod classifier;
mod file_walker;
mod filter;

pub use chunker::{TextChunker, chunk_text, split_lines};
pub use classifier::PathClassifier;
pub use file_walker::{DiscoveredFile, FileWalker};
pub use filter::{ContentFilter, MIN_MEANINGFUL_LINES};
