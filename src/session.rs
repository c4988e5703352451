use chrono::{DateTime, Local};
use std::collections::HashMap;

use crate::chat::ChatMessage;
use crate::classify::{classify, FileType};
use crate::extract::CodeBlock;
use crate::naming::{suggest_filename, unique_filename, Category};

/// Mutable project configuration read by every generation operation.
/// Raw strings throughout; no validation beyond that.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    pub app_name: String,
    pub group_id: String,
    pub artifact_id: String,
    pub description: String,
    pub java_version: String,
    pub spring_boot_version: String,
}

impl ProjectMetadata {
    /// Dot-joined base package, e.g. `com.example.demo`.
    pub fn package_name(&self) -> String {
        format!("{}.{}", self.group_id, self.artifact_id)
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            app_name: "spring-boot-app".to_string(),
            group_id: "com.example".to_string(),
            artifact_id: "demo".to_string(),
            description: "Spring Boot Application".to_string(),
            java_version: "17".to_string(),
            spring_boot_version: "3.2.3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Append-only observational record; pipeline logic never reads these back.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// A newly registered artifact, reported back to the caller for display.
#[derive(Debug, Clone)]
pub struct RegisteredFile {
    pub filename: String,
    pub file_type: FileType,
    pub category: Category,
}

/// All per-session mutable state, passed explicitly to every pipeline
/// operation. Two parallel stores hold content (main and test), while the
/// category index tracks membership per category in insertion order for
/// browsing.
///
/// Invariant: a filename in the category index exists in exactly one store,
/// test category in the test store, main/config in the main store.
pub struct Session {
    pub metadata: ProjectMetadata,
    pub conversation: Vec<ChatMessage>,
    main_files: HashMap<String, String>,
    test_files: HashMap<String, String>,
    categories: HashMap<Category, Vec<String>>,
    logs: Vec<LogEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            metadata: ProjectMetadata::default(),
            conversation: Vec::new(),
            main_files: HashMap::new(),
            test_files: HashMap::new(),
            categories: HashMap::from([
                (Category::Main, Vec::new()),
                (Category::Test, Vec::new()),
                (Category::Config, Vec::new()),
            ]),
            logs: Vec::new(),
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        };
        match level {
            LogLevel::Debug => tracing::debug!("{}", entry.message),
            LogLevel::Info => tracing::info!("{}", entry.message),
            LogLevel::Warning => tracing::warn!("{}", entry.message),
            LogLevel::Error => tracing::error!("{}", entry.message),
        }
        self.logs.push(entry);
    }

    pub fn recent_logs(&self, count: usize) -> &[LogEntry] {
        let start = self.logs.len().saturating_sub(count);
        &self.logs[start..]
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn main_files(&self) -> &HashMap<String, String> {
        &self.main_files
    }

    pub fn test_files(&self) -> &HashMap<String, String> {
        &self.test_files
    }

    /// Union of both stores, used for archive and build requests.
    pub fn all_files(&self) -> HashMap<String, String> {
        let mut all = self.main_files.clone();
        all.extend(
            self.test_files
                .iter()
                .map(|(name, content)| (name.clone(), content.clone())),
        );
        all
    }

    pub fn filenames_in_category(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(|names| names.as_slice())
            .unwrap_or(&[])
    }

    /// Registers an extracted block as a main-store artifact, applying the
    /// classifier, the filename suggester, and the collision rule.
    pub fn register_block(&mut self, block: &CodeBlock) -> RegisteredFile {
        let file_type = classify(&block.code, block.language.as_deref());
        let (suggested, category) = suggest_filename(&block.code, file_type);
        let filename = unique_filename(&suggested, &block.code, &self.main_files);

        self.main_files.insert(filename.clone(), block.code.clone());
        self.index_filename(category, &filename);

        RegisteredFile {
            filename,
            file_type,
            category,
        }
    }

    /// Stores a generated test class under the test store. Generated tests
    /// carry a derived, deterministic name, so collisions here are re-posts
    /// and simply replace the previous content.
    pub fn register_test_file(&mut self, filename: &str, content: &str) {
        self.test_files
            .insert(filename.to_string(), content.to_string());
        self.index_filename(Category::Test, filename);
    }

    /// Stores a generated config-category artifact (docs, OpenAPI spec,
    /// Docker files, CI workflow) under the main store.
    pub fn register_config_file(&mut self, filename: &str, content: &str) {
        self.main_files
            .insert(filename.to_string(), content.to_string());
        self.index_filename(Category::Config, filename);
    }

    fn index_filename(&mut self, category: Category, filename: &str) {
        let names = self.categories.entry(category).or_default();
        if !names.iter().any(|existing| existing == filename) {
            names.push(filename.to_string());
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn java_block(code: &str) -> CodeBlock {
        CodeBlock {
            language: Some("java".to_string()),
            code: code.to_string(),
        }
    }

    #[test]
    fn registered_block_lands_in_main_store_and_index() {
        let mut session = Session::new();
        let registered = session.register_block(&java_block(
            "@Service\npublic class OrderService {}",
        ));

        assert_eq!(registered.filename, "OrderService.java");
        assert_eq!(registered.category, Category::Main);
        assert!(session.main_files().contains_key("OrderService.java"));
        assert_eq!(
            session.filenames_in_category(Category::Main),
            &["OrderService.java".to_string()]
        );
    }

    #[test]
    fn same_class_name_different_content_gets_suffixed() {
        let mut session = Session::new();
        session.register_block(&java_block("public class OrderService { int a; }"));
        let second = session.register_block(&java_block("public class OrderService { int b; }"));

        assert_eq!(second.filename, "OrderService_1.java");
        assert_eq!(session.main_files().len(), 2);
    }

    #[test]
    fn identical_repost_does_not_duplicate() {
        let mut session = Session::new();
        session.register_block(&java_block("public class OrderService {}"));
        session.register_block(&java_block("public class OrderService {}"));

        assert_eq!(session.main_files().len(), 1);
        assert_eq!(session.filenames_in_category(Category::Main).len(), 1);
    }

    #[test]
    fn test_artifacts_live_in_the_test_store() {
        let mut session = Session::new();
        session.register_test_file("OrderServiceTest.java", "class OrderServiceTest {}");

        assert!(session.test_files().contains_key("OrderServiceTest.java"));
        assert!(!session.main_files().contains_key("OrderServiceTest.java"));
        assert_eq!(
            session.filenames_in_category(Category::Test),
            &["OrderServiceTest.java".to_string()]
        );
    }

    #[test]
    fn logs_are_append_only_until_cleared() {
        let mut session = Session::new();
        session.log(LogLevel::Info, "one");
        session.log(LogLevel::Warning, "two");
        assert_eq!(session.recent_logs(10).len(), 2);
        assert_eq!(session.recent_logs(1)[0].message, "two");

        session.clear_logs();
        assert!(session.recent_logs(10).is_empty());
    }
}
