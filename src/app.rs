use anyhow::Result;

use crate::api::{ApiMessage, OllamaClient, StreamingResponse};
use crate::archive::ArchiveBuilder;
use crate::chat::{ChatMessage, MessageType};
use crate::config::Config;
use crate::error::AssistantError;
use crate::extract::extract_code_blocks;
use crate::generate::Generator;
use crate::session::{LogLevel, RegisteredFile, Session};
use std::time::Duration;

const CHAT_SYSTEM_PROMPT: &str = "You are an expert Java Spring Boot developer assistant.\n\
    Your task is to help developers by generating Java Spring Boot code examples, explaining concepts, and answering questions.\n\
    When generating code, make sure it's complete, well-commented, and follows best practices.\n\
    For larger applications, organize your response to show the file structure and explain how the components work together.\n\
    Always provide complete file contents rather than snippets.\n\
    When generating code with multiple files, ensure the names are consistent across files (package names, class names, etc.)\n\
    Use the latest Spring Boot conventions and practices.";

/// How many prior conversation turns ride along as context.
const CONTEXT_TURNS: usize = 5;

const STREAM_TIMEOUT: Duration = Duration::from_secs(120);
const LAST_RESORT_TIMEOUT: Duration = Duration::from_secs(500);

/// Where a chat turn ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingFirstToken,
    Streaming,
    Complete,
    Failed,
}

#[derive(Debug)]
pub struct TurnOutcome {
    pub state: TurnState,
    pub response: String,
    pub registered: Vec<RegisteredFile>,
    /// User-visible diagnostic, set when the turn failed.
    pub diagnostic: Option<String>,
}

/// Top-level orchestrator: owns the session, the backend client, and the
/// generation pipeline, and drives the interactive chat loop.
pub struct App {
    pub config: Config,
    pub session: Session,
    client: OllamaClient,
    generator: Generator,
    archiver: ArchiveBuilder,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load_or_default()?;
        Ok(Self::with_config(config)?)
    }

    pub fn with_config(config: Config) -> Result<Self, AssistantError> {
        let client = OllamaClient::new(
            config.ai.api_url.clone(),
            config.ai.model.clone(),
            config.ai.temperature,
        )?;
        Ok(Self {
            config,
            session: Session::new(),
            generator: Generator::new(client.clone()),
            archiver: ArchiveBuilder::new(),
            client,
        })
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn archiver(&self) -> &ArchiveBuilder {
        &self.archiver
    }

    pub fn set_model(&mut self, model: &str) -> Result<()> {
        self.config.ai.model = model.to_string();
        self.config.save()?;
        self.client = OllamaClient::new(
            self.config.ai.api_url.clone(),
            self.config.ai.model.clone(),
            self.config.ai.temperature,
        )?;
        self.generator = Generator::new(self.client.clone());
        Ok(())
    }

    pub fn clear_conversation(&mut self) {
        self.session.conversation.clear();
    }

    /// Assembles the wire message list: system prompt, up to five most
    /// recent prior turns in original order, then the current prompt.
    fn assemble_messages(&self, prompt: &str) -> Vec<ApiMessage> {
        let mut messages = vec![ApiMessage::system(CHAT_SYSTEM_PROMPT)];

        let conversation = &self.session.conversation;
        let start = conversation.len().saturating_sub(CONTEXT_TURNS);
        for turn in &conversation[start..] {
            if matches!(turn.message_type, MessageType::User | MessageType::Assistant) {
                messages.push(ApiMessage {
                    role: turn.role().to_string(),
                    content: turn.content.clone(),
                });
            }
        }

        messages.push(ApiMessage::user(prompt));
        messages
    }

    /// Runs one chat turn: stream the response (chunks go to `on_chunk` as
    /// they arrive), fall back to a long non-streaming call when the stream
    /// yields nothing, then register every extracted code block as an
    /// artifact. A turn that produces no content fails with a diagnostic
    /// and registers nothing.
    pub async fn chat_turn<F: FnMut(&str)>(&mut self, prompt: &str, mut on_chunk: F) -> TurnOutcome {
        // Cheap connectivity probe; outcome is logged, never blocking.
        match self.client.test_connection().await {
            Ok(models) => self.session.log(
                LogLevel::Info,
                format!("backend reachable, {} models available", models.len()),
            ),
            Err(e) => self
                .session
                .log(LogLevel::Warning, format!("connectivity probe failed: {}", e)),
        }

        let messages = self.assemble_messages(prompt);
        self.session
            .conversation
            .push(ChatMessage::new(MessageType::User, prompt.to_string()));

        let mut state = TurnState::AwaitingFirstToken;
        let mut full_response = String::new();

        let mut rx = self.client.chat_stream(messages.clone(), STREAM_TIMEOUT);
        while let Some(event) = rx.recv().await {
            match event {
                StreamingResponse::Start => {}
                StreamingResponse::Chunk(chunk) => {
                    if state == TurnState::AwaitingFirstToken {
                        state = TurnState::Streaming;
                    }
                    full_response.push_str(&chunk);
                    on_chunk(&chunk);
                }
                StreamingResponse::End(_) => break,
                StreamingResponse::Error(e) => {
                    self.session
                        .log(LogLevel::Warning, format!("streaming failed: {}", e));
                    break;
                }
            }
        }

        if full_response.trim().is_empty() {
            if state == TurnState::AwaitingFirstToken {
                self.session
                    .log(LogLevel::Warning, "stream produced no tokens at all");
            }
            self.session
                .log(LogLevel::Info, "stream yielded nothing, trying non-streaming call");
            match self.client.chat(&messages, LAST_RESORT_TIMEOUT).await {
                Ok(content) => {
                    on_chunk(&content);
                    full_response = content;
                }
                Err(e) => {
                    self.session
                        .log(LogLevel::Error, format!("non-streaming fallback failed: {}", e));
                }
            }
        }

        if full_response.trim().is_empty() {
            self.session
                .log(LogLevel::Error, "received empty response from backend");
            return TurnOutcome {
                state: TurnState::Failed,
                response: String::new(),
                registered: Vec::new(),
                diagnostic: Some(
                    "Received an empty response. Check that Ollama is running \
                     (`ollama serve`) and the model is pulled (`ollama pull <model>`)."
                        .to_string(),
                ),
            };
        }

        let state = TurnState::Complete;
        self.session.log(
            LogLevel::Info,
            format!("response complete, length {}", full_response.len()),
        );
        self.session
            .conversation
            .push(ChatMessage::new(MessageType::Assistant, full_response.clone()));

        let blocks = extract_code_blocks(&full_response);
        if blocks.is_empty() {
            self.session
                .log(LogLevel::Warning, "no code blocks found in the response");
        }
        let registered: Vec<RegisteredFile> = blocks
            .iter()
            .map(|block| self.session.register_block(block))
            .collect();

        TurnOutcome {
            state,
            response: full_response,
            registered,
            diagnostic: None,
        }
    }

    pub async fn build_zip(&mut self, use_scaffold: bool) -> Result<Vec<u8>, AssistantError> {
        self.archiver.build(&mut self.session, use_scaffold).await
    }

    pub async fn run_local_build(&mut self) -> crate::runner::BuildOutcome {
        crate::runner::build_locally(&mut self.session, &self.archiver).await
    }

    // Generation flows, delegated so callers never need to split the
    // session and the generator borrows themselves.

    pub async fn generate_unit_test(&mut self, filename: &str) -> Result<String, AssistantError> {
        self.generator
            .generate_unit_test(&mut self.session, filename)
            .await
    }

    pub async fn generate_integration_tests(&mut self) -> Result<String, AssistantError> {
        self.generator
            .generate_integration_tests(&mut self.session)
            .await
    }

    pub async fn generate_documentation(&mut self) -> Result<String, AssistantError> {
        self.generator.generate_documentation(&mut self.session).await
    }

    pub async fn generate_openapi_spec(&mut self) -> Result<String, AssistantError> {
        self.generator.generate_openapi_spec(&mut self.session).await
    }

    pub async fn generate_docker_files(&mut self) -> Result<Vec<String>, AssistantError> {
        self.generator.generate_docker_files(&mut self.session).await
    }

    pub async fn generate_ci_workflow(&mut self) -> Result<String, AssistantError> {
        self.generator.generate_ci_workflow(&mut self.session).await
    }
}
