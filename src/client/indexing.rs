use super::RagClient;
use crate::error::{IndexingError, RagError, VectorDbError};
use crate::indexer::{DiscoveredFile, FileWalker};
use crate::tracker::{IndexTracker, file_mtime};
use crate::types::{ChunkMetadata, IndexReport};
use crate::vector_db::{StoreEntry, chunk_id};
use rmcp::{Peer, RoleServer, model::ProgressNotificationParam, model::ProgressToken};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// What happened to one discovered file
#[derive(Debug, PartialEq)]
enum FileOutcome {
    /// Chunks were embedded and stored; the mtime may be recorded
    Indexed { chunks: usize, mtime: f64 },
    /// Modification time matches the tracker
    Unchanged,
    /// Dropped by the file filter or produced no indexable chunks
    Skipped,
}

/// Run the indexing pipeline once
///
/// The tracker lock is held for the whole run, so concurrent calls serialize.
/// Cancellation is only observed between files.
pub async fn do_ingest(
    client: &RagClient,
    force_rebuild: bool,
    cancel: CancellationToken,
    peer: Option<Peer<RoleServer>>,
    progress_token: Option<ProgressToken>,
) -> Result<IndexReport, RagError> {
    let start = Instant::now();
    let mut tracker = client.tracker.lock().await;

    if force_rebuild {
        let cleared = clear_collection(client).await?;
        tracker.clear();
        tracing::info!("Force rebuild: cleared {} entries", cleared);
    }

    let project = &client.config.project;
    let walker = FileWalker::new(project.resolved_root(), project.scan_roots())
        .with_file_types(project.file_types.clone())
        .with_exclude_dirs(project.exclude_dirs.clone());

    // Walk on a blocking thread
    let files = tokio::task::spawn_blocking(move || walker.walk())
        .await
        .map_err(|e| IndexingError::WalkFailed(e.to_string()))?;
    let total_files = files.len();

    let mut report = IndexReport::default();

    for (idx, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(
                "Indexing cancelled after {}/{} files",
                idx,
                total_files
            );
            report.cancelled = true;
            break;
        }

        if let (Some(peer), Some(token)) = (&peer, &progress_token) {
            let _ = peer
                .notify_progress(ProgressNotificationParam {
                    progress_token: token.clone(),
                    progress: idx as f64,
                    total: Some(total_files as f64),
                    message: Some(format!("Indexing {}", file.relative_path)),
                })
                .await;
        }

        match index_file(client, &tracker, file).await {
            Ok(FileOutcome::Indexed { chunks, mtime }) => {
                tracker.record(file.path.to_string_lossy(), mtime);
                report.chunks_added += chunks;
                report.files_indexed += 1;
            }
            Ok(FileOutcome::Unchanged) => report.files_unchanged += 1,
            Ok(FileOutcome::Skipped) => report.files_skipped += 1,
            Err(e) => {
                tracing::warn!("Failed to index {}: {}", file.relative_path, e);
                report
                    .errors
                    .push(format!("{}: {}", file.relative_path, e));
            }
        }
    }

    if let Err(e) = tracker.save(&client.tracker_path) {
        tracing::warn!("{}", e);
        report.errors.push(e.to_string());
    }
    drop(tracker);

    if let Err(e) = client.vector_db.flush().await {
        tracing::warn!("Failed to flush vector database: {:#}", e);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Indexing complete. Added {} chunks ({} files indexed, {} unchanged, {} skipped, {} errors)",
        report.chunks_added,
        report.files_indexed,
        report.files_unchanged,
        report.files_skipped,
        report.errors.len()
    );
    Ok(report)
}

/// Delete every stored entry in a single call
async fn clear_collection(client: &RagClient) -> Result<usize, IndexingError> {
    let ids: Vec<String> = client
        .vector_db
        .get_all()
        .await
        .map_err(|e| IndexingError::ClearFailed(format!("{:#}", e)))?
        .into_iter()
        .map(|doc| doc.id)
        .collect();

    if ids.is_empty() {
        return Ok(0);
    }

    client
        .vector_db
        .delete(&ids)
        .await
        .map_err(|e| IndexingError::ClearFailed(format!("{:#}", e)))?;
    Ok(ids.len())
}

/// Filter, chunk, embed and store one file
async fn index_file(
    client: &RagClient,
    tracker: &IndexTracker,
    file: &DiscoveredFile,
) -> Result<FileOutcome, RagError> {
    if client.filter.should_skip_file(Path::new(&file.relative_path)) {
        tracing::debug!("Skipping filtered file: {}", file.relative_path);
        return Ok(FileOutcome::Skipped);
    }

    let key = file.path.to_string_lossy();
    let mtime = file_mtime(&file.path).map_err(|e| IndexingError::MtimeUnavailable {
        file: file.relative_path.clone(),
        reason: e.to_string(),
    })?;

    if !tracker.needs_update(&key, mtime) {
        tracing::debug!("Unchanged: {}", file.relative_path);
        return Ok(FileOutcome::Unchanged);
    }

    let content = tokio::fs::read_to_string(&file.path)
        .await
        .map_err(|e| IndexingError::FileReadFailed {
            file: file.relative_path.clone(),
            reason: e.to_string(),
        })?;

    let chunks: Vec<String> = client
        .chunker
        .chunk(&content)
        .into_iter()
        .filter(|chunk| !client.filter.should_skip_chunk(chunk))
        .collect();

    if chunks.is_empty() {
        // Not recorded, so the file is retried on the next run
        tracing::debug!("No indexable chunks in {}", file.relative_path);
        return Ok(FileOutcome::Skipped);
    }

    let embeddings = client.embed_with_timeout(chunks.clone()).await?;
    let doc_type = client.classifier.classify(&file.path);

    let entries: Vec<StoreEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(chunk_index, (document, embedding))| StoreEntry {
            id: chunk_id(&key, chunk_index),
            embedding,
            document,
            metadata: ChunkMetadata {
                source: file.relative_path.clone(),
                chunk_index,
                doc_type,
            },
        })
        .collect();

    let stored = client
        .vector_db
        .upsert(entries)
        .await
        .map_err(|e| VectorDbError::UpsertFailed(format!("{:#}", e)))?;

    tracing::info!(
        "Indexed {} ({} chunks, type {})",
        file.relative_path,
        stored,
        doc_type
    );
    Ok(FileOutcome::Indexed {
        chunks: stored,
        mtime,
    })
}
