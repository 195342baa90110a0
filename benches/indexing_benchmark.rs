/// Benchmarks for chunking, filtering and pipeline throughput
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use monorepo_rag::config::Config;
use monorepo_rag::embedding::EmbeddingProvider;
use monorepo_rag::indexer::{ContentFilter, chunk_text};
use monorepo_rag::vector_db::MemoryVectorDB;
use monorepo_rag::{IngestRequest, RagClient};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const DIMENSION: usize = 32;

/// Cheap deterministic embedder so the benchmark measures the pipeline, not the model
struct ByteHistogramEmbedder;

impl EmbeddingProvider for ByteHistogramEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMENSION];
                for b in text.bytes() {
                    v[b as usize % DIMENSION] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "byte-histogram"
    }
}

fn module_source(i: usize) -> String {
    format!(
        r#"// Heat scheduling module {i}
import {{ Heat, Couple }} from '../shared/types';

export interface HeatSlot{i} {{
  heatId: number;
  round: string;
  couples: Couple[];
}}

export function scheduleHeat{i}(heat: Heat, couples: Couple[]): HeatSlot{i} {{
  const sorted = [...couples].sort((a, b) => a.number - b.number);
  return {{
    heatId: heat.id,
    round: heat.round ?? 'final',
    couples: sorted.slice(0, {max}),
  }};
}}

export function heatLabel{i}(slot: HeatSlot{i}): string {{
  return `Heat ${{slot.heatId}} (${{slot.round}})`;
}}
"#,
        max = 6 + i % 4
    )
}

/// Helper to create test files
fn create_test_files(dir: &TempDir, count: usize) -> anyhow::Result<()> {
    let src_dir = dir.path().join("server").join("src");
    std::fs::create_dir_all(&src_dir)?;

    for i in 0..count {
        std::fs::write(src_dir.join(format!("heat_{}.ts", i)), module_source(i))?;
    }

    Ok(())
}

fn benchmark_indexing(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("indexing");

    for file_count in [10, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", file_count)),
            file_count,
            |b, &count| {
                b.iter(|| {
                    rt.block_on(async {
                        let project_dir = TempDir::new().unwrap();
                        create_test_files(&project_dir, count).unwrap();

                        let mut config = Config::default();
                        config.project.root = project_dir.path().to_path_buf();
                        config.vector_db.backend = "memory".to_string();
                        config.tracker.path = project_dir.path().join("indexed_files.json");

                        let client = RagClient::with_components(
                            config,
                            Arc::new(ByteHistogramEmbedder),
                            Arc::new(MemoryVectorDB::new()),
                        )
                        .await
                        .unwrap();

                        client
                            .ingest(black_box(IngestRequest::default()))
                            .await
                    })
                });
            },
        );
    }

    group.finish();
}

fn benchmark_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");

    for file_count in [10, 50, 100].iter() {
        let sources: Vec<String> = (0..*file_count).map(module_source).collect();
        let filter = ContentFilter::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", file_count)),
            &sources,
            |b, sources| {
                b.iter(|| {
                    sources
                        .iter()
                        .flat_map(|source| chunk_text(black_box(source), 800))
                        .filter(|chunk| !filter.should_skip_chunk(chunk))
                        .count()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_indexing, benchmark_chunking);
criterion_main!(benches);
