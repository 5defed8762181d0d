//! Groq chat completion client (OpenAI-compatible API) with SSE streaming

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::types::response::LlmHealth;

use super::completion::{ChatTurn, CompletionProvider};

/// Groq API client.
///
/// Speaks the OpenAI chat-completions protocol, so the base URL can point
/// at any compatible endpoint.
pub struct GroqClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::llm("GROQ_API_KEY is not set"))
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn stream_completion(
        &self,
        model: &str,
        messages: &[ChatTurn],
        tokens: mpsc::Sender<String>,
    ) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Completion failed: HTTP {} ({})",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        // SSE frames arrive as `data: <json>` lines; a frame may be split
        // across network chunks, so bytes are buffered until a newline.
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut full_text = String::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::llm(format!("Stream read failed: {}", e)))?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    break 'outer;
                }

                let parsed: StreamChunk = match serde_json::from_str(data) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::debug!("Skipping unparseable stream frame: {}", e);
                        continue;
                    }
                };
                for choice in parsed.choices {
                    if let Some(content) = choice.delta.content {
                        if content.is_empty() {
                            continue;
                        }
                        full_text.push_str(&content);
                        // A closed receiver means the client went away
                        if tokens.send(content).await.is_err() {
                            tracing::debug!("Token receiver dropped, stopping stream");
                            break 'outer;
                        }
                    }
                }
            }
        }

        if full_text.is_empty() {
            return Err(Error::llm("Completion stream produced no content"));
        }
        Ok(full_text)
    }

    /// Validate reachability and the API key via the models listing.
    ///
    /// A 401/403 is reported distinctly from a network failure so the
    /// health endpoint can tell a bad key from a down service.
    async fn health_check(&self) -> LlmHealth {
        let api_key = match self.api_key() {
            Ok(k) => k,
            Err(_) => {
                return LlmHealth {
                    healthy: false,
                    reason: "GROQ_API_KEY is not set".to_string(),
                }
            }
        };

        let url = format!("{}/models", self.config.base_url);
        match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) if response.status().is_success() => LlmHealth {
                healthy: true,
                reason: String::new(),
            },
            Ok(response) if response.status().as_u16() == 401 || response.status().as_u16() == 403 => {
                LlmHealth {
                    healthy: false,
                    reason: "API key rejected".to_string(),
                }
            }
            Ok(response) => LlmHealth {
                healthy: false,
                reason: format!("HTTP {}", response.status()),
            },
            Err(e) => LlmHealth {
                healthy: false,
                reason: format!("Unreachable: {}", e),
            },
        }
    }

    fn name(&self) -> &str {
        "groq"
    }
}
