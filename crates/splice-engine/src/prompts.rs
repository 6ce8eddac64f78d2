//! Prompt templates for the completion and optimize flows

use splice_core::index::Language;
use splice_core::sentinel::{CURSOR_MARKER, SELECTION_MARKER};
use splice_core::ChatMessage;

const OPTIMIZE_RULES: &str = r#"RULES:
- Only change the code between the two selection markers.
- Keep the public behavior of the selected code unchanged.
- Preserve indentation and surrounding style.
- Reply with a single fenced code block containing the optimized selection.
- No placeholders, ellipses, or commentary inside the block."#;

/// Single-turn conversation asking for the code to insert at the cursor marker.
pub fn completion_prompt(
    language: Language,
    marked_document: &str,
    relevant_context: &str,
    max_context_chars: usize,
) -> Vec<ChatMessage> {
    let language = language.display_name();
    let context = clip_section(relevant_context, max_context_chars);
    let prompt = format!(
        r#"You are a {language} inline code generation expert. You look at the {CURSOR_MARKER} position of the user and understand the code before and after it.
Also analyze and refer to the contextual code attached from the project.
Respond with the code block that should be inserted at the cursor position by predicting what the user is trying to accomplish.

Here is the current active editor:
```
{marked_document}
```

Some contextual code that might be relevant:
```
{context}
```

Output the code block to be inserted where the user {CURSOR_MARKER} is at."#
    );
    vec![ChatMessage::user(prompt)]
}

/// System + user conversation asking for an optimized selection.
pub fn optimize_messages(
    language: Language,
    marked_document: &str,
    contextual_code: &str,
    max_context_chars: usize,
) -> Vec<ChatMessage> {
    let language = language.display_name();
    let system = format!(
        "You are a senior {language} engineer who refactors code for readability and performance.\n\
         The selection is wrapped in {SELECTION_MARKER} markers.\n\n{OPTIMIZE_RULES}"
    );

    let context = contextual_code.trim();
    let context_section = if context.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nDefinitions referenced by the selection:\n```\n{}\n```",
            clip_section(context, max_context_chars)
        )
    };
    let user = format!(
        "Optimize the selected code in this file:\n```\n{marked_document}\n```{context_section}"
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Keep the head and tail of an oversized section.
pub(crate) fn clip_section(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head_len = max_chars / 2;
    let tail_len = max_chars - head_len;
    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();
    format!(
        "{}\n... ({} characters omitted) ...\n{}",
        head,
        total - max_chars,
        tail
    )
}
