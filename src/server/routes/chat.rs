//! Streaming chat endpoint

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::generation::{extract_page_citations, PromptBuilder, NO_CONTEXT_MESSAGE};
use crate::server::state::AppState;
use crate::types::chat::{ChatEvent, ChatRequest, Role};

/// POST /api/chat
///
/// Streams the answer as SSE `data:` frames of JSON [`ChatEvent`]s. Every
/// stream terminates with a `done` event; errors emit an `error` event
/// first. When the client disconnects, the dropped receiver stops the
/// producer task.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<ChatEvent>(64);
    tokio::spawn(run_chat(state, request, tx));

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize chat event: {}", e);
            r#"{"type":"error","content":"internal serialization error"}"#.to_string()
        });
        Ok(Event::default().data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Drives one chat turn, emitting events on `tx`
async fn run_chat(state: AppState, request: ChatRequest, tx: mpsc::Sender<ChatEvent>) {
    let session_id = state.sessions().resolve(request.session_id.as_deref());
    let question = request.message.trim().to_string();

    if question.is_empty() {
        let _ = tx.send(ChatEvent::error("Message must not be empty")).await;
        let _ = tx.send(ChatEvent::done(session_id, Vec::new())).await;
        return;
    }

    state.sessions().append(&session_id, Role::User, &question);

    let results = match state.retrieve(&question).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Retrieval failed: {}", e);
            let _ = tx
                .send(ChatEvent::error(format!("Search failed: {}", e)))
                .await;
            let _ = tx.send(ChatEvent::done(session_id, Vec::new())).await;
            return;
        }
    };

    // Nothing relevant indexed: answer deterministically, no model call
    if results.is_empty() {
        state
            .sessions()
            .append(&session_id, Role::Assistant, NO_CONTEXT_MESSAGE);
        let _ = tx.send(ChatEvent::content(NO_CONTEXT_MESSAGE)).await;
        let _ = tx.send(ChatEvent::done(session_id, Vec::new())).await;
        return;
    }

    // History without the question just appended; the prompt carries it
    let mut history = state.sessions().history(&session_id);
    history.pop();
    let messages = PromptBuilder::build_messages(&question, &results, &history);

    let (token_tx, mut token_rx) = mpsc::channel::<String>(64);
    let event_tx = tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(token) = token_rx.recv().await {
            if event_tx.send(ChatEvent::content(token)).await.is_err() {
                break;
            }
        }
    });

    let outcome = state
        .fallback()
        .stream(state.completions(), &messages, token_tx)
        .await;
    let _ = forwarder.await;

    match outcome {
        Ok(answer) => {
            let citations = extract_page_citations(&answer);
            state.sessions().append(&session_id, Role::Assistant, &answer);
            let _ = tx.send(ChatEvent::done(session_id, citations)).await;
        }
        Err(e) => {
            tracing::error!("Completion failed: {}", e);
            let _ = tx
                .send(ChatEvent::error(format!("Answer generation failed: {}", e)))
                .await;
            let _ = tx.send(ChatEvent::done(session_id, Vec::new())).await;
        }
    }
}
