//! # Monorepo RAG - Incremental Indexing and Retrieval for a Project Monorepo
//!
//! A Rust library and Model Context Protocol (MCP) server that keeps a vector
//! index of a project's design documents, schemas and source files, and
//! retrieves the most relevant chunks for a natural-language request.
//!
//! ## Overview
//!
//! A fixed set of project directories is walked, each eligible file is split
//! into line-aligned chunks, noise (generated declarations, protocol
//! boilerplate, low-information fragments) is filtered out, and the remaining
//! chunks are embedded and upserted into a vector collection tagged with a
//! document type derived from the file's directory. Re-running ingest only
//! touches files whose modification time changed.
//!
//! ## Key Features
//!
//! - **Local embeddings**: FastEmbed (all-MiniLM-L6-v2)
//! - **Embedded store**: LanceDB on disk, or an in-memory backend
//! - **Incremental indexing**: mtime tracker persisted as a JSON sidecar
//! - **Type filtering**: design, schema, code, architecture, domain, backend, frontend
//! - **MCP Protocol**: `rag_query`, `rag_ingest`, `rag_list` tools and a `rag-context` prompt
//!
//! ## Architecture
//!
//! ```text
//! MCP client / CLI
//!        |
//!   RagMcpServer            (stdio transport)
//!        |
//!    RagClient              (context object)
//!        |
//!   +----+-------+-----------+-------------+
//!   |            |           |             |
//! FastEmbed   LanceDB /   IndexTracker   indexer
//!             memory      (JSON sidecar) (walk, chunk, filter, classify)
//! ```
//!
//! ## Modules
//!
//! - [`client`]: `RagClient`, the indexing pipeline and the query engine
//! - [`mcp_server`]: MCP protocol server implementation with tools and prompts
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`vector_db`]: Vector database abstraction (LanceDB and in-memory)
//! - [`indexer`]: File walking, chunking, noise filtering and type classification
//! - [`tracker`]: Persistent mtime tracker for incremental updates
//! - [`config`]: Configuration management with environment variable support
//! - [`types`]: Request/response types with JSON schema
//! - [`error`]: Error types
//! - [`paths`]: Platform directories and path helpers
//!
//! ## Usage Example
//!
//! ```no_run
//! use monorepo_rag::{Config, IngestRequest, QueryRequest, RagClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RagClient::with_config(Config::load(None)?).await?;
//!
//!     client.ingest(IngestRequest::default()).await;
//!     let response = client.query(QueryRequest::new("how are heats scheduled")).await;
//!     for chunk in response.chunks {
//!         println!("{}", chunk);
//!     }
//!
//!     client.flush().await?;
//!     Ok(())
//! }
//! ```

/// RAG client: indexing pipeline and query engine
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed (all-MiniLM-L6-v2)
pub mod embedding;

/// Error types and utilities
pub mod error;

/// File walking, chunking, noise filtering and path classification
pub mod indexer;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Platform directories and path helpers
pub mod paths;

/// Persistent file mtime tracker for incremental indexing
pub mod tracker;

/// Request/response types with JSON schema definitions
pub mod types;

/// Vector database abstraction supporting LanceDB and an in-memory store
pub mod vector_db;

pub use client::RagClient;
pub use config::Config;
pub use error::RagError;
pub use types::*;
