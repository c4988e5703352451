use regex::Regex;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::sync::OnceLock;
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::classify::{classify, FileType};
use crate::error::AssistantError;
use crate::organize::{organize_project_files, DirRole};
use crate::session::{LogLevel, ProjectMetadata, Session};

pub const INITIALIZR_URL: &str = "https://start.spring.io/starter.zip";

fn package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^package\s+[a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*\s*;")
            .expect("package regex is valid")
    })
}

/// Rewrites the `package` declaration of a Java file to `package_name`, or
/// inserts one at the top when the file has none. Only the first declaration
/// is touched.
pub fn rewrite_package_declaration(content: &str, package_name: &str) -> String {
    let replacement = format!("package {};", package_name);
    if package_regex().is_match(content) {
        package_regex().replace(content, replacement.as_str()).into_owned()
    } else {
        format!("{}\n\n{}", replacement, content)
    }
}

/// Serializes the session's artifacts into a deflate zip, optionally merged
/// over a Spring Initializr skeleton.
pub struct ArchiveBuilder {
    http: Client,
    initializr_url: String,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            initializr_url: INITIALIZR_URL.to_string(),
        }
    }

    /// Points the scaffold fetch at a different endpoint (used in tests).
    pub fn with_initializr_url(mut self, url: impl Into<String>) -> Self {
        self.initializr_url = url.into();
        self
    }

    /// Builds the project archive. With `use_scaffold` the Initializr
    /// skeleton is fetched and merged; any scaffold failure falls back to
    /// the plain archive rather than erroring, so this only fails on local
    /// zip I/O problems.
    pub async fn build(
        &self,
        session: &mut Session,
        use_scaffold: bool,
    ) -> Result<Vec<u8>, AssistantError> {
        let files = session.all_files();

        if use_scaffold {
            match self.build_with_skeleton(&session.metadata, &files).await {
                Ok(bytes) => {
                    session.log(LogLevel::Info, "merged generated files into Initializr skeleton");
                    return Ok(bytes);
                }
                Err(e) => {
                    session.log(
                        LogLevel::Error,
                        format!("scaffold fetch failed, falling back to plain archive: {}", e),
                    );
                }
            }
        }

        build_plain_zip(&files)
    }

    async fn fetch_skeleton(&self, metadata: &ProjectMetadata) -> Result<Vec<u8>, AssistantError> {
        let params = [
            ("type", "maven-project".to_string()),
            ("language", "java".to_string()),
            ("bootVersion", metadata.spring_boot_version.clone()),
            ("baseDir", metadata.app_name.clone()),
            ("groupId", metadata.group_id.clone()),
            ("artifactId", metadata.artifact_id.clone()),
            ("name", metadata.app_name.clone()),
            ("description", metadata.description.clone()),
            ("packageName", metadata.package_name()),
            ("packaging", "jar".to_string()),
            ("javaVersion", metadata.java_version.clone()),
            ("dependencies", "web,data-jpa,lombok,actuator".to_string()),
        ];

        let response = self
            .http
            .get(&self.initializr_url)
            .query(&params)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "Initializr returned status {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn build_with_skeleton(
        &self,
        metadata: &ProjectMetadata,
        files: &HashMap<String, String>,
    ) -> Result<Vec<u8>, AssistantError> {
        let skeleton_bytes = self.fetch_skeleton(metadata).await?;
        let mut skeleton = ZipArchive::new(Cursor::new(skeleton_bytes))?;

        let package_name = metadata.package_name();
        let package_path = package_name.replace('.', "/");
        // Initializr nests every skeleton entry under baseDir, so overlay
        // paths carry the same prefix to land inside the project.
        let base_dir = &metadata.app_name;

        // Overlay entries first, so skeleton copies can honor the conflict
        // rule: a skeleton path wins unless the artifact is pom.xml.
        let layout = organize_project_files(files);
        let mut overlay: Vec<(String, String, String)> = Vec::new();
        for (role, role_files) in &layout {
            for (filename, content) in role_files {
                let (path, content) = if role.is_source() {
                    let rewritten = if classify(content, None) == FileType::Java {
                        rewrite_package_declaration(content, &package_name)
                    } else {
                        content.clone()
                    };
                    (
                        format!("{}/{}/{}/{}", base_dir, role.path(), package_path, filename),
                        rewritten,
                    )
                } else {
                    (
                        format!("{}/{}", base_dir, entry_path(*role, filename)),
                        content.clone(),
                    )
                };
                overlay.push((path, filename.clone(), content));
            }
        }

        let skeleton_names: HashSet<String> =
            skeleton.file_names().map(str::to_string).collect();
        let overwritten: HashSet<&str> = overlay
            .iter()
            .filter(|(path, filename, _)| {
                filename == "pom.xml" && skeleton_names.contains(path)
            })
            .map(|(path, _, _)| path.as_str())
            .collect();

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..skeleton.len() {
            let mut entry = skeleton.by_index(index)?;
            let name = entry.name().to_string();
            if overwritten.contains(name.as_str()) {
                continue;
            }
            if entry.is_dir() {
                writer.add_directory(name, options)?;
            } else {
                let mut data = Vec::new();
                entry.read_to_end(&mut data)?;
                writer.start_file(name, options)?;
                writer.write_all(&data)?;
            }
        }

        for (path, filename, content) in &overlay {
            // Skeleton keeps its version of any overlapping path, except
            // the build descriptor which is always ours.
            if skeleton_names.contains(path) && filename != "pom.xml" {
                continue;
            }
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_path(role: DirRole, filename: &str) -> String {
    let dir = role.path();
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", dir, filename)
    }
}

/// Plain archive path: organized layout only, no skeleton.
pub fn build_plain_zip(files: &HashMap<String, String>) -> Result<Vec<u8>, AssistantError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let layout = organize_project_files(files);
    for (role, role_files) in &layout {
        for (filename, content) in role_files {
            writer.start_file(entry_path(*role, filename), options)?;
            writer.write_all(content.as_bytes())?;
        }
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Entry names of a zip, for inspection and tests.
pub fn list_zip_entries(bytes: &[u8]) -> Result<Vec<String>, AssistantError> {
    let archive = ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_package_when_missing() {
        let rewritten = rewrite_package_declaration("public class A {}", "com.example.demo");
        assert!(rewritten.starts_with("package com.example.demo;\n\n"));
        assert!(rewritten.ends_with("public class A {}"));
    }

    #[test]
    fn replaces_existing_package_in_place() {
        let content = "package old.pkg;\n\npublic class A {}";
        let rewritten = rewrite_package_declaration(content, "com.example.demo");
        assert_eq!(rewritten, "package com.example.demo;\n\npublic class A {}");
    }

    #[test]
    fn only_first_package_line_is_replaced() {
        let content = "package old.one;\npackage old.two;\nclass A {}";
        let rewritten = rewrite_package_declaration(content, "com.example.demo");
        assert!(rewritten.contains("package com.example.demo;"));
        assert!(rewritten.contains("package old.two;"));
        assert!(!rewritten.contains("package old.one;"));
    }

    #[test]
    fn malformed_package_line_is_treated_as_missing() {
        // No trailing semicolon, so it does not parse as a declaration.
        let content = "package broken\nclass A {}";
        let rewritten = rewrite_package_declaration(content, "com.example.demo");
        assert!(rewritten.starts_with("package com.example.demo;"));
        assert!(rewritten.contains("package broken"));
    }

    #[test]
    fn plain_zip_places_files_at_role_paths() {
        let files = HashMap::from([
            (
                "OrderService.java".to_string(),
                "public class OrderService {}".to_string(),
            ),
            ("application.properties".to_string(), "server.port=8080".to_string()),
        ]);

        let bytes = build_plain_zip(&files).expect("zip builds");
        let entries = list_zip_entries(&bytes).expect("zip lists");

        assert!(entries.contains(&"src/main/java/OrderService.java".to_string()));
        assert!(entries.contains(&"src/main/resources/application.properties".to_string()));
    }
}
