// Library exports for the bootsmith pipeline components.

pub mod api;
pub mod app;
pub mod archive;
pub mod chat;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod naming;
pub mod organize;
pub mod output;
pub mod runner;
pub mod session;

pub use api::{ApiMessage, OllamaClient, StreamingResponse};
pub use app::{App, TurnOutcome, TurnState};
pub use archive::{build_plain_zip, ArchiveBuilder};
pub use classify::{classify, FileType};
pub use config::{AiConfig, Config};
pub use error::AssistantError;
pub use extract::{extract_code_blocks, extract_tagged_block, CodeBlock};
pub use generate::Generator;
pub use naming::{suggest_filename, unique_filename, Category};
pub use organize::{organize_project_files, DirRole, OrganizedLayout};
pub use runner::{build_locally, BuildOutcome};
pub use session::{LogEntry, LogLevel, ProjectMetadata, RegisteredFile, Session};
