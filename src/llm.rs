use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::host::{Completion, CompletionProvider};

/// Request to send to the provider
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Forwarded as the `user` field so the provider can group calls per chat
    pub session_id: Option<String>,
}

/// Message in conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            session_id: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Client for OpenAI-compatible chat completion endpoints
#[derive(Clone)]
pub struct LlmClient {
    provider: ProviderConfig,
    api_key: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(provider: ProviderConfig) -> Result<Self> {
        let api_key = provider.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured for {}. Set `provider.api_key` or {}.",
                provider.name,
                provider.api_key_env.as_deref().unwrap_or("an api_key_env variable")
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            provider,
            api_key,
            client,
        })
    }

    /// Stream a completion and return the accumulated assistant text
    pub async fn complete(&self, request: LlmRequest) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.provider.base_url.trim_end_matches('/')
        );

        let mut payload = serde_json::json!({
            "model": self.provider.model,
            "messages": request.messages,
            "stream": true,
            "temperature": request.temperature.unwrap_or(0.7),
            "max_tokens": request.max_tokens.unwrap_or(4000)
        });
        if let Some(session_id) = &request.session_id {
            payload["user"] = serde_json::json!(session_id);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.provider.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "{} API error ({}): {}",
                self.provider.name,
                status,
                error_text
            ));
        }

        let mut stream = response.bytes_stream();
        let mut sse = SseAccumulator::default();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read response stream")?;
            if sse.push(&chunk) {
                break;
            }
        }

        let text = sse.finish();
        debug!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn text_chat(&self, prompt: &str, session_id: &str) -> Result<Completion> {
        let request = LlmRequest::new(vec![LlmMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }])
        .with_temperature(0.9)
        .with_max_tokens(2000)
        .with_session(session_id);

        let text = self.complete(request).await?;
        Ok(Completion { text })
    }
}

/// Collects `choices[0].delta.content` out of a Server-Sent Events body
#[derive(Debug, Default)]
pub struct SseAccumulator {
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl SseAccumulator {
    /// Feed a chunk. Returns true once `[DONE]` has been seen.
    ///
    /// Lines are only decoded once complete, so multi-byte characters split
    /// across chunks survive.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        self.buffer.extend_from_slice(chunk);

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            self.process_line(&line);
            if self.done {
                break;
            }
        }

        self.done
    }

    /// Flush any trailing line without a newline and return the text
    pub fn finish(mut self) -> String {
        if !self.done {
            let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
            self.process_line(&line);
        }
        self.text
    }

    fn process_line(&mut self, line: &str) {
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            return;
        }

        if let Ok(chunk) = serde_json::from_str::<serde_json::Value>(data) {
            if let Some(choice) = chunk.get("choices").and_then(|c| c.get(0)) {
                let content = choice
                    .get("delta")
                    .and_then(|d| d.get("content"))
                    .or_else(|| choice.get("message").and_then(|m| m.get("content")))
                    .and_then(|c| c.as_str());
                if let Some(content) = content {
                    self.text.push_str(content);
                }
            }
        }
    }
}
