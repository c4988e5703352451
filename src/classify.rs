use serde::{Deserialize, Serialize};

/// File types the pipeline distinguishes. Both YAML spellings normalize to
/// `Yaml`; anything unrecognized falls through to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Java,
    Xml,
    Properties,
    Yaml,
    Json,
    Text,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Java => "java",
            FileType::Xml => "xml",
            FileType::Properties => "properties",
            FileType::Yaml => "yml",
            FileType::Json => "json",
            FileType::Text => "txt",
        }
    }

    /// Maps a fence language token to a type, if recognized.
    pub fn from_hint(hint: &str) -> Option<FileType> {
        match hint.to_lowercase().as_str() {
            "java" => Some(FileType::Java),
            "xml" => Some(FileType::Xml),
            "properties" => Some(FileType::Properties),
            "yml" | "yaml" => Some(FileType::Yaml),
            "json" => Some(FileType::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Ordered content heuristics, first match wins. Substring sniffing by
/// design: adversarial input (say, YAML that quotes `public class`) will
/// misclassify, and that is an accepted limitation of the pipeline rather
/// than something to parse our way out of.
const CONTENT_RULES: [(fn(&str) -> bool, FileType); 5] = [
    (looks_like_java, FileType::Java),
    (looks_like_xml, FileType::Xml),
    (looks_like_properties, FileType::Properties),
    (looks_like_yaml, FileType::Yaml),
    (looks_like_json, FileType::Json),
];

fn looks_like_java(content: &str) -> bool {
    content.contains("public class") || content.contains("import org.springframework")
}

fn looks_like_xml(content: &str) -> bool {
    content.contains("<project") || content.contains("<dependencies") || content.contains("<?xml")
}

fn looks_like_properties(content: &str) -> bool {
    content.contains("spring.datasource.url") || content.contains("server.port")
}

fn looks_like_yaml(content: &str) -> bool {
    content.contains("---") && content.contains(':') && content.contains("  ")
}

fn looks_like_json(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Decides a file type from content and an optional fence language hint.
/// A recognized hint wins outright; otherwise the content rules apply in
/// order.
pub fn classify(content: &str, hint: Option<&str>) -> FileType {
    if let Some(file_type) = hint.and_then(FileType::from_hint) {
        return file_type;
    }

    for (rule, file_type) in CONTENT_RULES {
        if rule(content) {
            return file_type;
        }
    }

    FileType::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_takes_priority_over_content() {
        // Content looks like Java, but the fence said yaml.
        assert_eq!(classify("public class A {}", Some("yaml")), FileType::Yaml);
        assert_eq!(classify("public class A {}", Some("yml")), FileType::Yaml);
    }

    #[test]
    fn unrecognized_hint_falls_through_to_content() {
        assert_eq!(classify("public class A {}", Some("kotlin")), FileType::Java);
    }

    #[test]
    fn java_rule_matches_class_or_spring_import() {
        assert_eq!(classify("public class OrderService {}", None), FileType::Java);
        assert_eq!(
            classify("import org.springframework.boot.SpringApplication;", None),
            FileType::Java
        );
    }

    #[test]
    fn xml_rule_matches_project_descriptor_markers() {
        assert_eq!(classify("<?xml version=\"1.0\"?>", None), FileType::Xml);
        assert_eq!(classify("<project><dependencies/></project>", None), FileType::Xml);
    }

    #[test]
    fn properties_rule_matches_datasource_or_port_keys() {
        assert_eq!(
            classify("spring.datasource.url=jdbc:h2:mem:test", None),
            FileType::Properties
        );
        assert_eq!(classify("server.port=8080", None), FileType::Properties);
    }

    #[test]
    fn yaml_rule_needs_separator_colon_and_indent() {
        assert_eq!(classify("---\nspring:\n  profiles: dev", None), FileType::Yaml);
        // Missing the document separator
        assert_ne!(classify("spring:\nprofiles: dev", None), FileType::Yaml);
    }

    #[test]
    fn json_rule_matches_braced_content() {
        assert_eq!(classify("{\"name\": \"demo\"}", None), FileType::Json);
        assert_eq!(classify("  {\"a\":1}  ", None), FileType::Json);
    }

    #[test]
    fn fallback_is_text() {
        assert_eq!(classify("nothing structured at all", None), FileType::Text);
    }

    #[test]
    fn classify_is_idempotent_under_its_own_hint() {
        for content in [
            "public class A {}",
            "<?xml version=\"1.0\"?>",
            "server.port=8080",
            "---\na:\n  b: 1",
            "{\"x\":1}",
            "plain text",
        ] {
            let first = classify(content, None);
            let again = classify(content, Some(first.extension()));
            // Text's extension ("txt") is not a recognized hint, so the
            // content rules re-run and must land on the same answer.
            assert_eq!(first, again);
        }
    }
}
