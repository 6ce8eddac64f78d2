//! Pull the code out of a markdown-formatted model response.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

/// Extracts the code payload from a raw generation response.
pub trait CodeExtractor: Send + Sync {
    /// `None` when the response carries no code block.
    fn extract_code(&self, raw: &str) -> Option<String>;
}

/// Picks the first fenced block, preferring one tagged with `preferred_language`.
#[derive(Debug, Clone, Default)]
pub struct FencedCodeExtractor {
    pub preferred_language: Option<String>,
}

impl FencedCodeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preferring(language: impl Into<String>) -> Self {
        Self {
            preferred_language: Some(language.into()),
        }
    }
}

impl CodeExtractor for FencedCodeExtractor {
    fn extract_code(&self, raw: &str) -> Option<String> {
        let blocks = fenced_blocks(raw);
        let preferred = self.preferred_language.as_deref().and_then(|lang| {
            blocks
                .iter()
                .find(|(info, _)| info_matches(info, lang))
                .map(|(_, code)| code.clone())
        });
        preferred.or_else(|| blocks.into_iter().next().map(|(_, code)| code))
    }
}

/// All fenced code blocks as `(info string, body)` pairs, in document order.
fn fenced_blocks(raw: &str) -> Vec<(String, String)> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, String)> = None;

    for event in Parser::new(raw) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                current = Some((info.trim().to_string(), String::new()));
            }
            Event::Text(text) => {
                if let Some((_, body)) = current.as_mut() {
                    body.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, mut body)) = current.take() {
                    if body.ends_with('\n') {
                        body.pop();
                        if body.ends_with('\r') {
                            body.pop();
                        }
                    }
                    blocks.push((info, body));
                }
            }
            _ => {}
        }
    }

    blocks
}

fn info_matches(info: &str, language: &str) -> bool {
    info.split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .is_some_and(|tag| tag.eq_ignore_ascii_case(language))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_fenced_block() {
        let raw = "Here you go:\n```\nlet a = 1;\nlet b = 2;\n```\nand\n```\nother\n```";
        let code = FencedCodeExtractor::new().extract_code(raw).unwrap();
        assert_eq!(code, "let a = 1;\nlet b = 2;");
    }

    #[test]
    fn test_prefers_requested_language() {
        let raw = "```text\nnotes\n```\n\n```rust\nfn main() {}\n```";
        let code = FencedCodeExtractor::preferring("rust").extract_code(raw).unwrap();
        assert_eq!(code, "fn main() {}");
    }

    #[test]
    fn test_falls_back_when_language_missing() {
        let raw = "```python\nprint(1)\n```";
        let code = FencedCodeExtractor::preferring("go").extract_code(raw).unwrap();
        assert_eq!(code, "print(1)");
    }

    #[test]
    fn test_keeps_indentation() {
        let raw = "```dart\n    print('hi');\n  }\n```";
        let code = FencedCodeExtractor::new().extract_code(raw).unwrap();
        assert_eq!(code, "    print('hi');\n  }");
    }

    #[test]
    fn test_no_fence_is_none() {
        assert!(FencedCodeExtractor::new().extract_code("just prose").is_none());
        assert!(FencedCodeExtractor::new().extract_code("").is_none());
    }
}
