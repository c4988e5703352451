use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use zip::ZipArchive;

use crate::archive::ArchiveBuilder;
use crate::session::{LogLevel, Session};

const BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Structured result of the local build simulation. Failures are reported,
/// never raised; nothing here is fatal to the process.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub success: bool,
    pub message: String,
    pub output: String,
}

impl BuildOutcome {
    fn failure(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: output.into(),
        }
    }
}

fn maven_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "mvn.cmd"
    } else {
        "mvn"
    }
}

/// Builds the scaffolded project in a scratch directory with Maven and
/// locates the produced jar. The jar is reported, not executed.
pub async fn build_locally(session: &mut Session, archive: &ArchiveBuilder) -> BuildOutcome {
    let zip_bytes = match archive.build(session, true).await {
        Ok(bytes) => bytes,
        Err(e) => return BuildOutcome::failure(format!("error assembling project: {}", e), ""),
    };

    let temp_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            return BuildOutcome::failure(format!("error creating scratch directory: {}", e), "")
        }
    };
    session.log(
        LogLevel::Info,
        format!("created scratch directory: {}", temp_dir.path().display()),
    );

    if let Err(e) = extract_zip(&zip_bytes, temp_dir.path()) {
        return BuildOutcome::failure(format!("error extracting project files: {}", e), "");
    }
    session.log(LogLevel::Info, "extracted project files to scratch directory");

    // The Initializr skeleton nests everything under the app name; a plain
    // fallback archive sits at the scratch root.
    let mut project_dir = temp_dir.path().join(&session.metadata.app_name);
    if !project_dir.exists() {
        project_dir = temp_dir.path().to_path_buf();
    }
    session.log(
        LogLevel::Info,
        format!("using project directory: {}", project_dir.display()),
    );

    let command = maven_command();
    session.log(
        LogLevel::Info,
        format!("running: {} clean package -DskipTests", command),
    );

    let build = Command::new(command)
        .args(["clean", "package", "-DskipTests"])
        .current_dir(&project_dir)
        .output();

    let output = match tokio::time::timeout(BUILD_TIMEOUT, build).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            session.log(LogLevel::Error, format!("failed to launch Maven: {}", e));
            return BuildOutcome::failure(format!("failed to launch Maven: {}", e), "");
        }
        Err(_) => {
            session.log(LogLevel::Error, "Maven build timed out");
            return BuildOutcome::failure("build timed out after 300 seconds", "");
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        session.log(LogLevel::Error, format!("Maven build failed: {}", stderr));
        return BuildOutcome::failure("build failed", stderr);
    }
    session.log(LogLevel::Info, "Maven build successful");

    match find_built_jar(&project_dir.join("target")) {
        Some(jar_path) => {
            session.log(LogLevel::Info, format!("found jar: {}", jar_path.display()));
            let jar_name = jar_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            BuildOutcome {
                success: true,
                message: "project built successfully".to_string(),
                output: format!(
                    "Build output:\n{}\n\nTo run the application:\njava -jar {}",
                    stdout, jar_name
                ),
            }
        }
        None => {
            session.log(LogLevel::Error, "no jar file found after build");
            BuildOutcome::failure("no jar file found after build", stdout)
        }
    }
}

fn extract_zip(bytes: &[u8], target: &Path) -> Result<(), zip::result::ZipError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    archive.extract(target)
}

/// Picks the built jar out of `target/`, ignoring `-sources` jars.
fn find_built_jar(target_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(target_dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            match name {
                Some(name) => name.ends_with(".jar") && !name.ends_with("-sources.jar"),
                None => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jar_discovery_skips_sources_jar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path();
        std::fs::write(target.join("demo-0.0.1-sources.jar"), b"x").unwrap();
        std::fs::write(target.join("demo-0.0.1.jar"), b"x").unwrap();

        let jar = find_built_jar(target).expect("finds the jar");
        assert!(jar.to_string_lossy().ends_with("demo-0.0.1.jar"));
    }

    #[test]
    fn jar_discovery_handles_missing_target_dir() {
        assert!(find_built_jar(Path::new("/nonexistent/target")).is_none());
    }
}
