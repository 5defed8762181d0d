//! Completion provider trait and ordered model fallback

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::types::response::LlmHealth;

/// One message in an OpenAI-style chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for streaming chat completions.
///
/// Implementations speak to one vendor; which models to try, and in what
/// order, is the caller's concern (see [`ModelFallback`]).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stream a completion for `model`, sending each token on `tokens` as
    /// it arrives. Returns the accumulated completion text.
    async fn stream_completion(
        &self,
        model: &str,
        messages: &[ChatTurn],
        tokens: mpsc::Sender<String>,
    ) -> Result<String>;

    /// Check reachability and credentials
    async fn health_check(&self) -> LlmHealth;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Ordered retry across models.
///
/// Models are tried in order; a model that fails before producing any
/// output is skipped and the next one is tried. Once a model has streamed
/// tokens, its failure is final, since the partial output has already
/// reached the client and cannot be retracted.
pub struct ModelFallback {
    models: Vec<String>,
}

impl ModelFallback {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn stream(
        &self,
        provider: &dyn CompletionProvider,
        messages: &[ChatTurn],
        tokens: mpsc::Sender<String>,
    ) -> Result<String> {
        let mut last_error: Option<Error> = None;

        for (attempt, model) in self.models.iter().enumerate() {
            // Tokens pass through an interposer channel so we know whether
            // this model emitted anything before failing.
            let (mid_tx, mut mid_rx) = mpsc::channel::<String>(64);
            let out = tokens.clone();
            let emitted = Arc::new(AtomicBool::new(false));
            let emitted_mark = Arc::clone(&emitted);
            let forwarder = tokio::spawn(async move {
                while let Some(token) = mid_rx.recv().await {
                    emitted_mark.store(true, Ordering::Relaxed);
                    if out.send(token).await.is_err() {
                        break;
                    }
                }
            });

            let result = provider.stream_completion(model, messages, mid_tx).await;
            let _ = forwarder.await;

            match result {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!("Completion succeeded on fallback model {}", model);
                    }
                    return Ok(text);
                }
                Err(e) if emitted.load(Ordering::Relaxed) => {
                    tracing::error!("Model {} failed mid-stream: {}", model, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Model {} failed before producing output: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("No completion models configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Provider that fails for the given models and echoes for the rest
    struct FlakyProvider {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionProvider for FlakyProvider {
        async fn stream_completion(
            &self,
            model: &str,
            _messages: &[ChatTurn],
            tokens: mpsc::Sender<String>,
        ) -> Result<String> {
            self.calls.lock().push(model.to_string());
            if self.failing.contains(&model) {
                return Err(Error::llm(format!("{} is down", model)));
            }
            let text = format!("answer from {}", model);
            let _ = tokens.send(text.clone()).await;
            Ok(text)
        }

        async fn health_check(&self) -> LlmHealth {
            LlmHealth {
                healthy: true,
                reason: String::new(),
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn provider(failing: Vec<&'static str>) -> FlakyProvider {
        FlakyProvider {
            failing,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn first_model_wins_when_healthy() {
        let p = provider(vec![]);
        let fallback = ModelFallback::new(vec!["m1".to_string(), "m2".to_string()]);
        let (tx, mut rx) = mpsc::channel(8);
        let text = fallback
            .stream(&p, &[ChatTurn::user("hi")], tx)
            .await
            .unwrap();
        assert_eq!(text, "answer from m1");
        assert_eq!(rx.recv().await.unwrap(), "answer from m1");
        assert_eq!(*p.calls.lock(), vec!["m1"]);
    }

    #[tokio::test]
    async fn failed_model_falls_through_in_order() {
        let p = provider(vec!["m1", "m2"]);
        let fallback =
            ModelFallback::new(vec!["m1".to_string(), "m2".to_string(), "m3".to_string()]);
        let (tx, _rx) = mpsc::channel(8);
        let text = fallback
            .stream(&p, &[ChatTurn::user("hi")], tx)
            .await
            .unwrap();
        assert_eq!(text, "answer from m3");
        assert_eq!(*p.calls.lock(), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn all_models_failing_returns_last_error() {
        let p = provider(vec!["m1", "m2"]);
        let fallback = ModelFallback::new(vec!["m1".to_string(), "m2".to_string()]);
        let (tx, _rx) = mpsc::channel(8);
        let err = fallback
            .stream(&p, &[ChatTurn::user("hi")], tx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("m2 is down"));
    }
}
