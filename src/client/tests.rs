use super::*;
use crate::client::test_support::*;
use tokio_util::sync::CancellationToken;

const DESIGN_MD: &str = "# Judging design\nJudges score couples per heat.\nScores roll up per round.\n";
const SCHEMA_MD: &str = "# Couple schema\nA couple has a leader.\nA couple has a follower.\n";
const ROUTES_TS: &str = "router.get('/heats', listHeats);\nrouter.post('/heats', createHeat);\n";
const VIEW_TSX: &str = "export const HeatView = () => {\n  return <HeatTable />;\n};\n";

async fn indexed_env() -> TestEnv {
    let env = default_env().await;
    env.write("rag/design/judging.md", DESIGN_MD);
    env.write("rag/schema/couple.md", SCHEMA_MD);
    env.write("server/src/routes.ts", ROUTES_TS);
    env.write("client/src/HeatView.tsx", VIEW_TSX);
    let report = env
        .client
        .run_ingest(false, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.chunks_added, 4);
    env
}

// ===== Construction =====

#[tokio::test]
async fn test_with_components_uses_provider_dimension() {
    let env = default_env().await;
    assert_eq!(env.client.embedding_dimension(), TEST_DIMENSION);
    assert_eq!(env.client.config().vector_db.backend, "memory");
}

#[tokio::test]
async fn test_client_clone_shares_tracker() {
    let env = default_env().await;
    let cloned = env.client.clone();
    assert!(Arc::ptr_eq(&env.client.tracker, &cloned.tracker));
}

// ===== Query engine =====

#[tokio::test]
async fn test_query_exact_text_ranks_first() {
    let env = indexed_env().await;

    let response = env
        .client
        .query(QueryRequest::new(SCHEMA_MD.trim_end()).with_top_k(2))
        .await;

    assert!(response.ok);
    assert_eq!(response.top_k, 2);
    assert_eq!(response.chunks.len(), 2);
    assert_eq!(response.chunks[0], SCHEMA_MD.trim_end());
}

#[tokio::test]
async fn test_query_without_top_k_uses_configured_default() {
    let env = build_env(
        |config| config.search.top_k = 3,
        HashEmbedder::new,
        RecordingStore::new,
    )
    .await;
    env.write("rag/design/judging.md", DESIGN_MD);
    env.write("rag/schema/couple.md", SCHEMA_MD);
    env.write("server/src/routes.ts", ROUTES_TS);
    env.write("client/src/HeatView.tsx", VIEW_TSX);
    env.client
        .run_ingest(false, CancellationToken::new())
        .await
        .unwrap();

    let response = env.client.query(QueryRequest::new("heat")).await;
    assert!(response.ok);
    assert_eq!(response.top_k, 3);
    assert_eq!(response.chunks.len(), 3);

    let prompt = env.client.build_prompt("heat", None, None).await.unwrap();
    let included = [DESIGN_MD, SCHEMA_MD, ROUTES_TS, VIEW_TSX]
        .iter()
        .filter(|chunk| prompt.contains(chunk.trim_end()))
        .count();
    assert_eq!(included, 3);
}

#[tokio::test]
async fn test_query_respects_top_k() {
    let env = indexed_env().await;

    for top_k in 1..=5 {
        let response = env
            .client
            .query(QueryRequest::new("heat").with_top_k(top_k))
            .await;
        assert!(response.ok);
        assert_eq!(response.chunks.len(), top_k.min(4));
    }
}

#[tokio::test]
async fn test_type_filter_only_shrinks_results() {
    let env = indexed_env().await;

    for top_k in 1..=4 {
        let unfiltered = env
            .client
            .search(&QueryRequest::new("couple heat scores").with_top_k(top_k))
            .await
            .unwrap();

        for doc_type in [DocType::Design, DocType::Schema, DocType::Backend] {
            let filtered = env
                .client
                .search(
                    &QueryRequest::new("couple heat scores")
                        .with_top_k(top_k)
                        .with_type_filter(Some(doc_type)),
                )
                .await
                .unwrap();

            let expected: Vec<&str> = unfiltered
                .iter()
                .filter(|r| r.metadata.doc_type == doc_type)
                .map(|r| r.id.as_str())
                .collect();
            let actual: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();

            assert_eq!(actual, expected);
            assert!(filtered.len() <= top_k);
            assert!(filtered.iter().all(|r| r.metadata.doc_type == doc_type));
        }
    }
}

#[tokio::test]
async fn test_type_filter_finds_matching_chunk() {
    let env = indexed_env().await;

    let response = env
        .client
        .query(
            QueryRequest::new(VIEW_TSX.trim_end())
                .with_top_k(4)
                .with_type_filter(Some(DocType::Frontend)),
        )
        .await;

    assert!(response.ok);
    assert_eq!(response.chunks, vec![VIEW_TSX.trim_end().to_string()]);
    assert_eq!(response.type_filter, Some(DocType::Frontend));
}

#[tokio::test]
async fn test_query_missing_text_is_reported() {
    let env = default_env().await;

    let response = env.client.query(QueryRequest::new("  ")).await;

    assert!(!response.ok);
    assert!(response.chunks.is_empty());
    assert_eq!(
        response.error.as_deref(),
        Some("Validation error: 'query' parameter is required")
    );
    assert!(env.events().is_empty());
}

#[tokio::test]
async fn test_query_store_failure_is_reported() {
    let env = build_env(|_| {}, HashEmbedder::new, |events| {
        RecordingStore::new(events).failing_search()
    })
    .await;

    let response = env.client.query(QueryRequest::new("heats")).await;

    assert!(!response.ok);
    assert!(response.error.unwrap().contains("store offline"));
}

#[tokio::test]
async fn test_query_embedding_failure_is_reported() {
    let env = build_env(
        |_| {},
        |events| HashEmbedder::new(events).failing_on("boom"),
        RecordingStore::new,
    )
    .await;

    let response = env.client.query(QueryRequest::new("boom")).await;

    assert!(!response.ok);
    assert!(response.error.unwrap().starts_with("Embedding error"));
}

#[tokio::test]
async fn test_query_empty_index() {
    let env = default_env().await;
    let response = env.client.query(QueryRequest::new("anything")).await;
    assert!(response.ok);
    assert!(response.chunks.is_empty());
}

// ===== Listing =====

#[tokio::test]
async fn test_list_documents_sorted_by_source() {
    let env = indexed_env().await;

    let response = env.client.list_documents().await;

    assert!(response.ok);
    assert_eq!(response.count, 4);
    let sources: Vec<&str> = response
        .documents
        .iter()
        .map(|d| d.meta.source.as_str())
        .collect();
    assert_eq!(
        sources,
        vec![
            "client/src/HeatView.tsx",
            "rag/design/judging.md",
            "rag/schema/couple.md",
            "server/src/routes.ts",
        ]
    );
    assert_eq!(response.chunks_by_source().len(), 4);
}

#[tokio::test]
async fn test_list_documents_failure_is_reported() {
    let env = build_env(|_| {}, HashEmbedder::new, |events| {
        RecordingStore::new(events).failing_get_all()
    })
    .await;

    let response = env.client.list_documents().await;

    assert!(!response.ok);
    assert_eq!(response.count, 0);
    assert!(response.error.unwrap().contains("collection unavailable"));
}

// ===== Prompt builder =====

#[test]
fn test_format_prompt_with_context() {
    let prompt = format_prompt(
        "Add a heat filter",
        &["chunk one".to_string(), "chunk two".to_string()],
    );
    assert_eq!(
        prompt,
        "Project context (from RAG):\n\nchunk one\n\nchunk two\n\nUser request:\nAdd a heat filter\n"
    );
}

#[test]
fn test_format_prompt_without_context() {
    assert_eq!(
        format_prompt("Add a heat filter", &[]),
        "No project context found for request: Add a heat filter\n\n"
    );
}

#[tokio::test]
async fn test_build_prompt_uses_query_results() {
    let env = indexed_env().await;

    let prompt = env
        .client
        .build_prompt(ROUTES_TS.trim_end(), Some(1), Some(DocType::Backend))
        .await
        .unwrap();

    assert!(prompt.starts_with("Project context (from RAG):\n\n"));
    assert!(prompt.contains("router.get('/heats', listHeats);"));
    assert!(prompt.ends_with(&format!("User request:\n{}\n", ROUTES_TS.trim_end())));
}

#[tokio::test]
async fn test_build_prompt_rejects_zero_top_k() {
    let env = default_env().await;
    let err = env.client.build_prompt("x", Some(0), None).await.unwrap_err();
    assert!(err.is_user_error());
}

// ===== Flush =====

#[tokio::test]
async fn test_flush_writes_tracker() {
    let env = default_env().await;
    env.client
        .tracker
        .lock()
        .await
        .record("/some/file.ts", 42.0);

    env.client.flush().await.unwrap();

    let tracker = crate::tracker::IndexTracker::load(&env.tracker_path()).unwrap();
    assert_eq!(tracker.get("/some/file.ts"), Some(42.0));
}
