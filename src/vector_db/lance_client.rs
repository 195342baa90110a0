//! LanceDB vector database client (embedded, no server required)

use crate::error::VectorDbError;
use crate::types::{ChunkMetadata, DocType, DocumentSummary};
use crate::vector_db::{ScoredDocument, StoreEntry, VectorDatabase};
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::Table;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use std::sync::Arc;

/// Ids per `DELETE ... WHERE id IN (...)` statement
const DELETE_BATCH_SIZE: usize = 500;

pub struct LanceVectorDB {
    connection: Connection,
    table_name: String,
    db_path: String,
}

impl LanceVectorDB {
    /// Create a new LanceDB instance at the platform default path
    pub async fn new(table_name: &str) -> Result<Self> {
        let db_path = crate::paths::PlatformPaths::default_lancedb_path()
            .to_string_lossy()
            .to_string();
        Self::with_path(&db_path, table_name).await
    }

    /// Create a new LanceDB instance with custom path
    pub async fn with_path(db_path: &str, table_name: &str) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {}", db_path);

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self {
            connection,
            table_name: table_name.to_string(),
            db_path: db_path.to_string(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create schema for the collection table
    fn create_schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("id", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("doc_type", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
        ]))
    }

    async fn get_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .context("Failed to open table")
    }

    /// Convert store entries to a RecordBatch
    fn create_record_batch(entries: Vec<StoreEntry>, schema: Arc<Schema>) -> Result<RecordBatch> {
        let dimension = entries[0].embedding.len();

        let id_array = StringArray::from(entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>());
        let source_array = StringArray::from(
            entries
                .iter()
                .map(|e| e.metadata.source.as_str())
                .collect::<Vec<_>>(),
        );
        let chunk_index_array = UInt32Array::from(
            entries
                .iter()
                .map(|e| e.metadata.chunk_index as u32)
                .collect::<Vec<_>>(),
        );
        let doc_type_array = StringArray::from(
            entries
                .iter()
                .map(|e| e.metadata.doc_type.as_str())
                .collect::<Vec<_>>(),
        );
        let content_array = StringArray::from(
            entries
                .iter()
                .map(|e| e.document.as_str())
                .collect::<Vec<_>>(),
        );

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            entries
                .into_iter()
                .map(|e| Some(e.embedding.into_iter().map(Some))),
            dimension as i32,
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(vector_array),
                Arc::new(id_array),
                Arc::new(source_array),
                Arc::new(chunk_index_array),
                Arc::new(doc_type_array),
                Arc::new(content_array),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    /// Read the id and metadata columns of a batch
    fn summaries_from_batch(batch: &RecordBatch) -> Result<Vec<DocumentSummary>> {
        let ids = string_column(batch, "id")?;
        let sources = string_column(batch, "source")?;
        let doc_types = string_column(batch, "doc_type")?;
        let chunk_indexes = batch
            .column_by_name("chunk_index")
            .context("Missing chunk_index column")?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .context("Invalid chunk_index type")?;

        Ok((0..batch.num_rows())
            .map(|i| DocumentSummary {
                id: ids.value(i).to_string(),
                meta: ChunkMetadata {
                    source: sources.value(i).to_string(),
                    chunk_index: chunk_indexes.value(i) as usize,
                    doc_type: doc_types.value(i).parse().unwrap_or(DocType::Unknown),
                },
            })
            .collect())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Missing {} column", name))?
        .as_any()
        .downcast_ref::<StringArray>()
        .with_context(|| format!("Invalid {} type", name))
}

/// SQL string literal with single quotes doubled
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait::async_trait]
impl VectorDatabase for LanceVectorDB {
    async fn initialize(&self, dimension: usize) -> Result<()> {
        tracing::info!(
            "Initializing LanceDB with dimension {} at {}",
            dimension,
            self.db_path
        );

        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")?;

        if table_names.contains(&self.table_name) {
            tracing::info!("Table '{}' already exists", self.table_name);
            return Ok(());
        }

        let schema = Self::create_schema(dimension);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches =
            RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema.clone());

        self.connection
            .create_table(&self.table_name, Box::new(batches))
            .execute()
            .await
            .context("Failed to create table")?;

        tracing::info!("Created table '{}'", self.table_name);
        Ok(())
    }

    async fn upsert(&self, entries: Vec<StoreEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let dimension = entries[0].embedding.len();
        let schema = Self::create_schema(dimension);
        let batch = Self::create_record_batch(entries, schema.clone())?;
        let count = batch.num_rows();
        let batches = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);

        let table = self.get_table().await?;
        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(batches))
            .await
            .context("Failed to upsert records")?;

        tracing::debug!("Upserted {} entries into '{}'", count, self.table_name);
        Ok(count)
    }

    async fn get_all(&self) -> Result<Vec<DocumentSummary>> {
        let table = self.get_table().await?;
        let total = table
            .count_rows(None)
            .await
            .context("Failed to count rows")?;
        if total == 0 {
            return Ok(vec![]);
        }

        let stream = table
            .query()
            .select(Select::Columns(vec![
                "id".to_string(),
                "source".to_string(),
                "chunk_index".to_string(),
                "doc_type".to_string(),
            ]))
            .limit(total)
            .execute()
            .await
            .context("Failed to query entries")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect entries")?;

        let mut documents = Vec::with_capacity(total);
        for batch in &batches {
            documents.extend(Self::summaries_from_batch(batch)?);
        }
        Ok(documents)
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredDocument>> {
        let table = self.get_table().await?;

        let stream = table
            .vector_search(query_vector)
            .context("Failed to create vector search")?
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute search")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut results = Vec::new();
        for batch in &batches {
            let summaries = Self::summaries_from_batch(batch)?;
            let contents = string_column(batch, "content")?;
            let distances = batch
                .column_by_name("_distance")
                .context("Missing _distance column")?
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("Invalid _distance type")?;

            for (i, summary) in summaries.into_iter().enumerate() {
                results.push(ScoredDocument {
                    id: summary.id,
                    document: contents.value(i).to_string(),
                    metadata: summary.meta,
                    distance: distances.value(i),
                });
            }
        }

        // Batches may arrive out of order; the store's ranking is by distance
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let table = self
            .get_table()
            .await
            .map_err(|e| VectorDbError::DeleteFailed(format!("{:#}", e)))?;
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let list = batch
                .iter()
                .map(|id| quote_literal(id))
                .collect::<Vec<_>>()
                .join(", ");
            table
                .delete(&format!("id IN ({})", list))
                .await
                .map_err(|e| VectorDbError::DeleteFailed(e.to_string()))?;
        }

        tracing::info!("Deleted {} entries from '{}'", ids.len(), self.table_name);
        Ok(ids.len())
    }

    async fn count(&self) -> Result<usize> {
        let table = self.get_table().await?;
        table
            .count_rows(None)
            .await
            .context("Failed to count rows")
    }

    async fn flush(&self) -> Result<()> {
        // LanceDB persists on every write
        Ok(())
    }
}
