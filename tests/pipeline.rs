//! End-to-end pipeline tests: upload a generated PDF, ask questions over
//! the API, and check streamed answers and citations.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tokio::sync::mpsc;
use tower::ServiceExt;

use pdf_chat::config::AppConfig;
use pdf_chat::error::Result;
use pdf_chat::providers::{ChatTurn, CompletionProvider, EmbeddingProvider};
use pdf_chat::server::routes;
use pdf_chat::server::state::AppState;
use pdf_chat::types::chat::ChatEvent;
use pdf_chat::types::response::{LlmHealth, StatsResponse};

const DIMS: usize = 16;

/// Deterministic bag-of-words embedder: each token bumps one dimension, so
/// shared vocabulary means cosine similarity. No network, fully reproducible.
struct HashEmbedder;

fn hash_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if token.len() < 2 {
            continue;
        }
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        v[(hasher.finish() % DIMS as u64) as usize] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embed(text))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash-test"
    }
}

/// Canned completion: cites the first page anchor found in the prompt
/// context and streams the answer word by word. Counts invocations so
/// tests can assert the model was (not) called.
struct ScriptedCompletion {
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn stream_completion(
        &self,
        _model: &str,
        messages: &[ChatTurn],
        tokens: mpsc::Sender<String>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let page = regex::Regex::new(r"\(Page (\d+)\)")
            .unwrap()
            .captures(prompt)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "1".to_string());

        let answer = format!("The operating voltage range is 9 to 30 volts DC (Page {}).", page);
        for word in answer.split_inclusive(' ') {
            let _ = tokens.send(word.to_string()).await;
        }
        Ok(answer)
    }

    async fn health_check(&self) -> LlmHealth {
        LlmHealth {
            healthy: true,
            reason: String::new(),
        }
    }

    fn name(&self) -> &str {
        "scripted-test"
    }
}

/// Build a small multi-page PDF with one text line per page
fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

fn manual_pdf() -> Vec<u8> {
    build_pdf(&[
        "Introduction to the tracker device and its installation procedure.",
        "Power supply: the operating voltage range is 9 to 30 volts DC.",
        "The antenna mounts on the roof with the supplied bracket hardware.",
    ])
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    // One chunk per page for these tiny fixture documents
    config.chunking.min_chunk_size = 10;
    config
}

fn test_state() -> (AppState, Arc<ScriptedCompletion>) {
    let completion = Arc::new(ScriptedCompletion::new());
    let state = AppState::with_providers(
        test_config(),
        Arc::new(HashEmbedder),
        completion.clone() as Arc<dyn CompletionProvider>,
    );
    (state, completion)
}

fn test_router(state: &AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(10 * 1024 * 1024))
        .with_state(state.clone())
}

async fn post_chat(router: Router, body: serde_json::Value) -> Vec<ChatEvent> {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8_lossy(&bytes);

    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter_map(|data| serde_json::from_str::<ChatEvent>(data).ok())
        .collect()
}

#[tokio::test]
async fn upload_then_ask_cites_page_two() {
    let (state, completion) = test_state();

    let response = state
        .ingest_document("manual.pdf", &manual_pdf())
        .await
        .expect("ingest");
    assert_eq!(response.status, "success");
    assert_eq!(response.page_count, 3);
    assert!(response.chunk_count >= 3);

    // Retrieval puts the voltage chunk first for a voltage question
    let results = state
        .retrieve("What is the operating voltage range?")
        .await
        .expect("retrieve");
    assert!(!results.is_empty());
    assert_eq!(results[0].chunk.page_number, 2);

    // The streamed answer carries the page 2 citation through to `done`
    let events = post_chat(
        test_router(&state),
        serde_json::json!({ "message": "What is the operating voltage range?" }),
    )
    .await;

    let content: String = events
        .iter()
        .filter_map(|e| match e {
            ChatEvent::Content { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert!(content.contains("9 to 30 volts"));
    assert!(content.contains("(Page 2)"));

    match events.last().expect("terminal event") {
        ChatEvent::Done { citations, session_id, .. } => {
            assert_eq!(citations.as_deref(), Some(&[2][..]));
            assert!(session_id.is_some());
        }
        other => panic!("stream did not end with done: {:?}", other),
    }
    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn chat_without_documents_answers_deterministically() {
    let (state, completion) = test_state();

    let events = post_chat(
        test_router(&state),
        serde_json::json!({ "message": "What is the voltage range?" }),
    )
    .await;

    assert!(matches!(events.first(), Some(ChatEvent::Content { content }) if content.contains("cannot find")));
    assert!(matches!(events.last(), Some(ChatEvent::Done { .. })));
    // No model call when there is nothing to ground an answer in
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_message_yields_error_then_done() {
    let (state, _) = test_state();

    let events = post_chat(
        test_router(&state),
        serde_json::json!({ "message": "   " }),
    )
    .await;

    assert!(matches!(events.first(), Some(ChatEvent::Error { .. })));
    assert!(matches!(events.last(), Some(ChatEvent::Done { .. })));
}

#[tokio::test]
async fn session_continues_across_requests() {
    let (state, _) = test_state();
    state
        .ingest_document("manual.pdf", &manual_pdf())
        .await
        .expect("ingest");

    let events = post_chat(
        test_router(&state),
        serde_json::json!({ "message": "What is the voltage range?" }),
    )
    .await;
    let session_id = match events.last() {
        Some(ChatEvent::Done { session_id: Some(id), .. }) => id.clone(),
        other => panic!("missing session id: {:?}", other),
    };

    let events = post_chat(
        test_router(&state),
        serde_json::json!({ "message": "And the antenna?", "session_id": session_id }),
    )
    .await;
    match events.last() {
        Some(ChatEvent::Done { session_id: Some(id), .. }) => assert_eq!(*id, session_id),
        other => panic!("session was not continued: {:?}", other),
    }

    // Both turns landed in the same transcript
    let transcript = state.sessions().export_markdown(&session_id).expect("export");
    assert!(transcript.contains("What is the voltage range?"));
    assert!(transcript.contains("And the antenna?"));
}

#[tokio::test]
async fn reupload_same_content_does_not_duplicate() {
    let (state, _) = test_state();
    let pdf = manual_pdf();

    let first = state.ingest_document("manual.pdf", &pdf).await.expect("ingest");
    let second = state.ingest_document("manual.pdf", &pdf).await.expect("re-ingest");
    assert_eq!(first.chunk_count, second.chunk_count);

    let stats = state.stats();
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.total_chunks as u32, first.chunk_count);
    assert_eq!(stats.vector_store_stats.vector_count as u32, first.chunk_count);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let (state, _) = test_state();
    let err = state
        .ingest_document("notes.txt", b"plain text")
        .await
        .expect_err("should reject");
    assert!(err.to_string().contains("Unsupported"));
}

#[tokio::test]
async fn stats_and_reset_roundtrip() {
    let (state, _) = test_state();
    state
        .ingest_document("manual.pdf", &manual_pdf())
        .await
        .expect("ingest");

    let router = test_router(&state);
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let stats: StatsResponse = serde_json::from_slice(&bytes).expect("stats json");
    assert_eq!(stats.document_count, 1);
    assert!(stats.total_chunks >= 3);
    assert_eq!(stats.search_stats.vector_store_stats.dimensions, Some(DIMS));

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/reset")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let stats = state.stats();
    assert_eq!(stats.document_count, 0);
    assert_eq!(stats.total_chunks, 0);
}

#[tokio::test]
async fn ingestion_is_deterministic_across_states() {
    let pdf = manual_pdf();
    let (state_a, _) = test_state();
    let (state_b, _) = test_state();

    let a = state_a.ingest_document("manual.pdf", &pdf).await.expect("ingest a");
    let b = state_b.ingest_document("manual.pdf", &pdf).await.expect("ingest b");
    assert_eq!(a.chunk_count, b.chunk_count);

    let qa = state_a.retrieve("voltage range").await.expect("retrieve a");
    let qb = state_b.retrieve("voltage range").await.expect("retrieve b");
    let ids_a: Vec<&str> = qa.iter().map(|r| r.chunk.id.as_str()).collect();
    let ids_b: Vec<&str> = qb.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
}
