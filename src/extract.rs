use regex::Regex;
use std::sync::OnceLock;

/// A fenced region lifted out of a model response. `language` is the token
/// that followed the opening fence, normalized to the recognized set, or
/// `None` when the fence carried no (or an unknown) tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

const RECOGNIZED_LANGUAGES: [&str; 6] = ["java", "xml", "properties", "yml", "yaml", "json"];

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```(?:(java|xml|properties|yml|yaml|json))?\s*([\s\S]*?)```")
            .expect("fence regex is valid")
    })
}

/// Scans text for fenced code regions and returns them in source order.
///
/// An unterminated fence at the end of input is simply not matched; this is
/// intentional leniency, not a bug. Duplicate blocks are all returned;
/// de-duplication happens at registration time.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    if text.trim().is_empty() {
        tracing::warn!("no text to extract code blocks from");
        return Vec::new();
    }

    let blocks: Vec<CodeBlock> = fence_regex()
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language: caps.get(1).map(|m| normalize_language(m.as_str())),
            code: caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        })
        .collect();

    tracing::info!(count = blocks.len(), "extracted code blocks");
    blocks
}

/// Extracts the first fenced block tagged with one of `tags` from a
/// response. Used by the generation flows to pull the dominant block out of
/// a reply that wraps its payload in markdown.
pub fn extract_tagged_block(text: &str, tags: &[&str]) -> Option<String> {
    for tag in tags {
        let pattern = format!(r"```{}\s*([\s\S]*?)```", regex::escape(tag));
        let re = Regex::new(&pattern).expect("tag pattern is valid");
        if let Some(caps) = re.captures(text) {
            return caps.get(1).map(|m| m.as_str().trim().to_string());
        }
    }
    None
}

fn normalize_language(token: &str) -> String {
    let lower = token.to_lowercase();
    if RECOGNIZED_LANGUAGES.contains(&lower.as_str()) {
        lower
    } else {
        "text".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_blocks_in_source_order() {
        let text = "first:\n```java\nclass A {}\n```\nthen:\n```yaml\nkey: value\n```\n";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language.as_deref(), Some("java"));
        assert_eq!(blocks[0].code, "class A {}");
        assert_eq!(blocks[1].language.as_deref(), Some("yaml"));
        assert_eq!(blocks[1].code, "key: value");
    }

    #[test]
    fn missing_language_token_yields_no_hint() {
        let blocks = extract_code_blocks("```\nplain content\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, None);
        assert_eq!(blocks[0].code, "plain content");
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(extract_code_blocks("").is_empty());
        assert!(extract_code_blocks("   \n  ").is_empty());
    }

    #[test]
    fn no_fences_returns_empty() {
        assert!(extract_code_blocks("just prose, no code here").is_empty());
    }

    #[test]
    fn unterminated_fence_is_not_matched() {
        let blocks = extract_code_blocks("```java\npublic class Dangling {");
        assert!(blocks.is_empty());
    }

    #[test]
    fn duplicate_blocks_are_both_returned() {
        let text = "```java\nclass A {}\n```\n```java\nclass A {}\n```";
        assert_eq!(extract_code_blocks(text).len(), 2);
    }

    #[test]
    fn tagged_block_extraction_tries_tags_in_order() {
        let text = "intro\n```yml\nname: ci\n```\noutro";
        assert_eq!(
            extract_tagged_block(text, &["yaml", "yml"]).as_deref(),
            Some("name: ci")
        );
        assert_eq!(extract_tagged_block(text, &["dockerfile"]), None);
    }
}
