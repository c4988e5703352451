use futures::StreamExt;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage as LibraryChatMessage;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AssistantError;

/// One (role, content) entry of the wire message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
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
}

#[derive(Debug, Clone)]
pub enum StreamingResponse {
    Start,
    Chunk(String),
    End(String),
    Error(String),
}

/// Client for the local Ollama backend. The direct reqwest path is the
/// primary tier; the typed ollama-rs client is the secondary tier used when
/// the direct call fails.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    pub model: String,
    pub temperature: f32,
}

impl OllamaClient {
    pub fn new(endpoint: String, model: String, temperature: f32) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .user_agent("bootsmith/0.1")
            .build()
            .map_err(|e| AssistantError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            temperature,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint)
    }

    /// Splits the endpoint into the (host, port) pair the library client
    /// wants. A missing port falls back to Ollama's default.
    fn host_and_port(&self) -> (String, u16) {
        if let Some((host, port)) = self.endpoint.rsplit_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host.to_string(), port);
            }
        }
        (self.endpoint.clone(), 11434)
    }

    fn payload(&self, messages: &[ApiMessage], stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
            "options": {"temperature": self.temperature},
        })
    }

    /// Non-streaming chat over the direct HTTP path.
    pub async fn chat(
        &self,
        messages: &[ApiMessage],
        timeout: Duration,
    ) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(self.chat_url())
            .timeout(timeout)
            .json(&self.payload(messages, false))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "chat request failed with status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let content = body["message"]["content"].as_str().unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AssistantError::EmptyResponse);
        }
        Ok(content.to_string())
    }

    /// Non-streaming chat through the ollama-rs client, the secondary tier.
    pub async fn chat_via_library(
        &self,
        messages: &[ApiMessage],
    ) -> Result<String, AssistantError> {
        let (host, port) = self.host_and_port();
        let ollama = Ollama::builder().host(host).port(port).build();

        let library_messages: Vec<LibraryChatMessage> = messages
            .iter()
            .map(|m| match m.role.as_str() {
                "system" => LibraryChatMessage::system(m.content.clone()),
                "assistant" => LibraryChatMessage::assistant(m.content.clone()),
                _ => LibraryChatMessage::user(m.content.clone()),
            })
            .collect();

        let request = ChatMessageRequest::new(self.model.clone(), library_messages)
            .options(ModelOptions::default().temperature(self.temperature));

        let response = ollama
            .send_chat_messages(request)
            .await
            .map_err(|e| AssistantError::Transport(format!("ollama-rs chat failed: {}", e)))?;

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(AssistantError::EmptyResponse);
        }
        Ok(content)
    }

    /// Streaming chat. Chunks arrive on the returned channel as they come
    /// off the wire; `End` carries the full accumulated text.
    pub fn chat_stream(
        &self,
        messages: Vec<ApiMessage>,
        timeout: Duration,
    ) -> mpsc::UnboundedReceiver<StreamingResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(async move {
            if let Err(e) = client.run_stream(messages, timeout, tx.clone()).await {
                let _ = tx.send(StreamingResponse::Error(e.to_string()));
            }
        });

        rx
    }

    async fn run_stream(
        &self,
        messages: Vec<ApiMessage>,
        timeout: Duration,
        tx: mpsc::UnboundedSender<StreamingResponse>,
    ) -> Result<(), AssistantError> {
        let response = self
            .client
            .post(self.chat_url())
            .timeout(timeout)
            .json(&self.payload(&messages, true))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "stream request failed with status {}",
                response.status()
            )));
        }

        let _ = tx.send(StreamingResponse::Start);

        let mut stream = response.bytes_stream();
        let mut line_buffer = String::new();
        let mut full_response = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            line_buffer.push_str(&String::from_utf8_lossy(&chunk));

            // The chat endpoint streams NDJSON; a network chunk may carry
            // any number of complete lines plus a partial tail.
            while let Some(newline) = line_buffer.find('\n') {
                let line = line_buffer[..newline].trim().to_string();
                line_buffer.drain(..=newline);
                if line.is_empty() {
                    continue;
                }
                if Self::consume_stream_line(&line, &tx, &mut full_response) {
                    let _ = tx.send(StreamingResponse::End(full_response));
                    return Ok(());
                }
            }
        }

        // Trailing line without a final newline.
        let tail = line_buffer.trim();
        if !tail.is_empty() {
            Self::consume_stream_line(tail, &tx, &mut full_response);
        }

        let _ = tx.send(StreamingResponse::End(full_response));
        Ok(())
    }

    /// Parses one NDJSON line, forwarding content. Returns true on the done
    /// marker. Malformed lines are skipped.
    fn consume_stream_line(
        line: &str,
        tx: &mpsc::UnboundedSender<StreamingResponse>,
        full_response: &mut String,
    ) -> bool {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            return false;
        };
        if let Some(content) = value["message"]["content"].as_str() {
            if !content.is_empty() {
                full_response.push_str(content);
                let _ = tx.send(StreamingResponse::Chunk(content.to_string()));
            }
        }
        value["done"].as_bool().unwrap_or(false)
    }

    /// Connectivity probe against `/api/tags`. Returns the available model
    /// names on success.
    pub async fn test_connection(&self) -> Result<Vec<String>, AssistantError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "tags request failed with status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let models = body["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(models)
    }

    /// Checks whether a model is loaded via `/api/show`.
    pub async fn check_model(&self, model_name: &str) -> Result<bool, AssistantError> {
        let response = self
            .client
            .get(format!("{}/api/show", self.endpoint))
            .query(&[("name", model_name)])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// One-shot chat probe confirming the model actually answers.
    pub async fn test_model(&self) -> Result<String, AssistantError> {
        let messages = [ApiMessage::user("Hello, are you working?")];
        let content = self.chat(&messages, Duration::from_secs(30)).await?;
        let preview: String = content.chars().take(100).collect();
        Ok(preview)
    }
}
