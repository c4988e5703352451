use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::classify::FileType;

/// Where an artifact belongs: main source, test source, or configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Main,
    Test,
    Config,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Main => write!(f, "main"),
            Category::Test => write!(f, "test"),
            Category::Config => write!(f, "config"),
        }
    }
}

fn class_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"public\s+class\s+(\w+)").expect("class regex is valid"))
}

/// True when Java content carries test markers (a JUnit import or a test
/// annotation).
pub fn has_test_markers(content: &str) -> bool {
    content.contains("import org.junit") || content.contains("@Test")
}

/// Captures the first `public class <Identifier>` name, if any.
pub fn extract_class_name(content: &str) -> Option<String> {
    class_name_regex()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derives a filename and category from content and its detected type.
pub fn suggest_filename(content: &str, file_type: FileType) -> (String, Category) {
    match file_type {
        FileType::Java => {
            let is_test = has_test_markers(content);
            match extract_class_name(content) {
                Some(class_name) => {
                    let category = if is_test { Category::Test } else { Category::Main };
                    (format!("{}.java", class_name), category)
                }
                None if is_test => ("TestClass.java".to_string(), Category::Test),
                None => ("JavaClass.java".to_string(), Category::Main),
            }
        }
        FileType::Xml => {
            let lower = content.to_lowercase();
            if lower.contains("pom") {
                ("pom.xml".to_string(), Category::Config)
            } else if lower.contains("application-context") {
                ("application-context.xml".to_string(), Category::Config)
            } else {
                ("config.xml".to_string(), Category::Config)
            }
        }
        FileType::Properties => {
            if content.to_lowercase().contains("test") {
                ("application-test.properties".to_string(), Category::Config)
            } else {
                ("application.properties".to_string(), Category::Config)
            }
        }
        FileType::Yaml => {
            if content.to_lowercase().contains("test") {
                ("application-test.yml".to_string(), Category::Config)
            } else {
                ("application.yml".to_string(), Category::Config)
            }
        }
        FileType::Json => ("config.json".to_string(), Category::Config),
        FileType::Text => ("file.txt".to_string(), Category::Config),
    }
}

/// Caller-side uniqueness rule: a suggested name that collides with an
/// existing artifact holding different content gets `_1`, `_2`… appended
/// before the extension until unique. Identical content under the same name
/// is a re-post and keeps the original name.
pub fn unique_filename(
    suggested: &str,
    content: &str,
    existing: &HashMap<String, String>,
) -> String {
    let (base, extension) = match suggested.rsplit_once('.') {
        Some((base, ext)) => (base.to_string(), ext.to_string()),
        None => (suggested.to_string(), String::new()),
    };

    let mut filename = suggested.to_string();
    let mut counter = 1;
    while existing.get(&filename).is_some_and(|stored| stored != content) {
        filename = if extension.is_empty() {
            format!("{}_{}", base, counter)
        } else {
            format!("{}_{}.{}", base, counter, extension)
        };
        counter += 1;
    }
    filename
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_class_name_becomes_filename() {
        let content = "@Service\npublic class OrderService {}";
        let (filename, category) = suggest_filename(content, FileType::Java);
        assert_eq!(filename, "OrderService.java");
        assert_eq!(category, Category::Main);
    }

    #[test]
    fn junit_import_marks_test_category() {
        let content = "import org.junit.jupiter.api.Test;\npublic class OrderServiceTest {}";
        let (filename, category) = suggest_filename(content, FileType::Java);
        assert_eq!(filename, "OrderServiceTest.java");
        assert_eq!(category, Category::Test);
    }

    #[test]
    fn anonymous_java_falls_back_to_placeholder() {
        assert_eq!(
            suggest_filename("class Hidden {}", FileType::Java),
            ("JavaClass.java".to_string(), Category::Main)
        );
        assert_eq!(
            suggest_filename("@Test\nvoid check() {}", FileType::Java),
            ("TestClass.java".to_string(), Category::Test)
        );
    }

    #[test]
    fn xml_names_follow_descriptor_markers() {
        assert_eq!(
            suggest_filename("<project>pom layout</project>", FileType::Xml).0,
            "pom.xml"
        );
        assert_eq!(
            suggest_filename("<beans>application-context</beans>", FileType::Xml).0,
            "application-context.xml"
        );
        assert_eq!(suggest_filename("<other/>", FileType::Xml).0, "config.xml");
    }

    #[test]
    fn properties_split_on_test_substring() {
        assert_eq!(
            suggest_filename("spring.datasource.url=jdbc:h2:mem:db", FileType::Properties).0,
            "application.properties"
        );
        assert_eq!(
            suggest_filename("spring.test.database=H2", FileType::Properties).0,
            "application-test.properties"
        );
    }

    #[test]
    fn fixed_names_for_json_and_text() {
        assert_eq!(suggest_filename("{}", FileType::Json).0, "config.json");
        assert_eq!(suggest_filename("notes", FileType::Text).0, "file.txt");
    }

    #[test]
    fn collision_with_different_content_gets_suffix() {
        let mut store = HashMap::new();
        store.insert("OrderService.java".to_string(), "version one".to_string());

        let renamed = unique_filename("OrderService.java", "version two", &store);
        assert_eq!(renamed, "OrderService_1.java");

        store.insert("OrderService_1.java".to_string(), "version two".to_string());
        let renamed = unique_filename("OrderService.java", "version three", &store);
        assert_eq!(renamed, "OrderService_2.java");
    }

    #[test]
    fn identical_content_is_a_repost() {
        let mut store = HashMap::new();
        store.insert("OrderService.java".to_string(), "same".to_string());
        assert_eq!(
            unique_filename("OrderService.java", "same", &store),
            "OrderService.java"
        );
    }
}
