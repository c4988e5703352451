use std::collections::{BTreeMap, HashMap};

use crate::classify::{classify, FileType};
use crate::naming::has_test_markers;

/// Conventional directory roles a file can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirRole {
    MainSource,
    MainResource,
    TestSource,
    TestResource,
    Root,
}

impl DirRole {
    pub fn path(&self) -> &'static str {
        match self {
            DirRole::MainSource => "src/main/java",
            DirRole::MainResource => "src/main/resources",
            DirRole::TestSource => "src/test/java",
            DirRole::TestResource => "src/test/resources",
            DirRole::Root => "",
        }
    }

    pub fn all() -> [DirRole; 5] {
        [
            DirRole::MainSource,
            DirRole::MainResource,
            DirRole::TestSource,
            DirRole::TestResource,
            DirRole::Root,
        ]
    }

    pub fn is_source(&self) -> bool {
        matches!(self, DirRole::MainSource | DirRole::TestSource)
    }
}

/// A projection of the artifact stores into directory roles. Rebuilt from
/// scratch on every archive/build request, never persisted.
pub type OrganizedLayout = BTreeMap<DirRole, BTreeMap<String, String>>;

fn is_structured_config(file_type: FileType) -> bool {
    matches!(
        file_type,
        FileType::Properties | FileType::Yaml | FileType::Json
    )
}

/// Routes every file into a role directory. Pure function of
/// (filename, content): Java with test markers goes to test sources, plain
/// Java to main sources, structured config splits on a "test" filename
/// substring, reserved names and everything else land at the root.
pub fn organize_project_files(files: &HashMap<String, String>) -> OrganizedLayout {
    let mut layout: OrganizedLayout = DirRole::all()
        .into_iter()
        .map(|role| (role, BTreeMap::new()))
        .collect();

    for (filename, content) in files {
        let role = route_file(filename, content);
        layout
            .entry(role)
            .or_default()
            .insert(filename.clone(), content.clone());
    }

    layout
}

/// The routing rule for a single file.
pub fn route_file(filename: &str, content: &str) -> DirRole {
    let file_type = classify(content, None);

    if file_type == FileType::Java {
        if has_test_markers(content) {
            DirRole::TestSource
        } else {
            DirRole::MainSource
        }
    } else if is_structured_config(file_type) {
        if filename.to_lowercase().contains("test") {
            DirRole::TestResource
        } else {
            DirRole::MainResource
        }
    } else {
        // Reserved names (pom.xml, readme.md, dockerfile, case-insensitive)
        // and anything unrecognized live at the project root.
        DirRole::Root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_of(entries: &[(&str, &str)]) -> OrganizedLayout {
        let files = entries
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        organize_project_files(&files)
    }

    #[test]
    fn java_with_test_markers_goes_to_test_sources() {
        let layout = layout_of(&[(
            "OrderServiceTest.java",
            "import org.junit.jupiter.api.Test;\npublic class OrderServiceTest {}",
        )]);
        assert!(layout[&DirRole::TestSource].contains_key("OrderServiceTest.java"));
    }

    #[test]
    fn plain_java_goes_to_main_sources() {
        let layout = layout_of(&[("OrderService.java", "public class OrderService {}")]);
        assert!(layout[&DirRole::MainSource].contains_key("OrderService.java"));
    }

    #[test]
    fn config_splits_on_test_filename() {
        let layout = layout_of(&[
            ("application.properties", "server.port=8080"),
            ("application-test.properties", "server.port=0"),
        ]);
        assert!(layout[&DirRole::MainResource].contains_key("application.properties"));
        assert!(layout[&DirRole::TestResource].contains_key("application-test.properties"));
    }

    #[test]
    fn reserved_names_stay_at_root() {
        let layout = layout_of(&[
            ("pom.xml", "<project><dependencies/></project>"),
            ("README.md", "# Demo"),
            ("Dockerfile", "FROM eclipse-temurin:17"),
        ]);
        // pom.xml classifies as xml, which is not structured config, so it
        // routes to root via the reserved-name rule; the other two are text.
        assert!(layout[&DirRole::Root].contains_key("pom.xml"));
        assert!(layout[&DirRole::Root].contains_key("README.md"));
        assert!(layout[&DirRole::Root].contains_key("Dockerfile"));
    }

    #[test]
    fn every_file_appears_in_exactly_one_role() {
        let layout = layout_of(&[
            ("A.java", "public class A {}"),
            ("application.yml", "---\nspring:\n  profiles: dev"),
            ("notes.txt", "plain"),
        ]);
        let total: usize = layout.values().map(|files| files.len()).sum();
        assert_eq!(total, 3);
    }
}
