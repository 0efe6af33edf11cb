use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::events::ConversationRole;

/// Single entry of a serialized conversation history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub role: ConversationRole,
    #[serde(default)]
    pub content: Value,
}

impl HistoryEntry {
    /// Text carried by the entry, exactly as sent. Content-part arrays
    /// contribute their non-blank text parts. Blank text counts as none.
    pub fn text(&self) -> Option<String> {
        let text = match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        };

        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Parse the host's serialized history. Entries that are not objects, or
/// that lack a role, are skipped.
pub fn parse_history(raw: &str) -> Result<Vec<HistoryEntry>> {
    let values: Vec<Value> =
        serde_json::from_str(raw).context("Conversation history is not a JSON array")?;

    Ok(values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Most recent `max` user messages with text, oldest first.
pub fn collect_dream_material(entries: &[HistoryEntry], max: usize) -> Vec<String> {
    let mut lines: Vec<String> = entries
        .iter()
        .rev()
        .filter(|entry| entry.role.is_user())
        .filter_map(HistoryEntry::text)
        .take(max)
        .collect();

    lines.reverse();
    lines
}

pub fn format_dialogue(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn history(values: Value) -> Vec<HistoryEntry> {
        parse_history(&values.to_string()).unwrap()
    }

    #[test]
    fn skips_non_objects_and_unknown_shapes() {
        let entries = history(json!([
            "stray string",
            42,
            {"content": "no role"},
            {"role": "user", "content": "hello"},
            {"role": "function_call", "content": "odd role"},
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text().as_deref(), Some("hello"));
        assert_eq!(entries[1].role, ConversationRole::Other);
    }

    #[test]
    fn malformed_history_is_an_error() {
        assert!(parse_history("{not json").is_err());
        assert!(parse_history(r#"{"role": "user"}"#).is_err());
    }

    #[test]
    fn keeps_only_user_messages_with_text() {
        let entries = history(json!([
            {"role": "system", "content": "be nice"},
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "reply"},
            {"role": "user", "content": "   "},
            {"role": "user", "content": null},
            {"role": "user", "content": "second"},
        ]));

        assert_eq!(collect_dream_material(&entries, 300), vec!["first", "second"]);
    }

    #[test]
    fn caps_to_most_recent_in_chronological_order() {
        let values: Vec<Value> = (1..=10)
            .map(|i| json!({"role": "user", "content": format!("m{}", i)}))
            .collect();
        let entries = history(Value::Array(values));

        assert_eq!(
            collect_dream_material(&entries, 3),
            vec!["m8", "m9", "m10"]
        );
    }

    #[test]
    fn content_parts_contribute_text() {
        let entries = history(json!([
            {"role": "user", "content": [
                {"type": "text", "text": "look at"},
                {"type": "image_url", "image_url": {"url": "http://x"}},
                {"type": "text", "text": "this"}
            ]},
            {"role": "user", "content": [{"type": "image_url", "image_url": {"url": "http://y"}}]},
        ]));

        assert_eq!(collect_dream_material(&entries, 300), vec!["look at this"]);
    }

    #[test]
    fn message_text_is_passed_through_verbatim() {
        let code = "  fn main() {\n    dream();\n}  ";
        let entries = history(json!([
            {"role": "user", "content": code},
            {"role": "user", "content": [
                {"type": "text", "text": " indented"},
                {"type": "text", "text": "  "},
                {"type": "text", "text": "tail\n"}
            ]},
        ]));

        let material = collect_dream_material(&entries, 300);
        assert_eq!(material, vec![code.to_string(), " indented tail\n".to_string()]);
        assert_eq!(
            format_dialogue(&material[..1]),
            format!("- {}", code)
        );
    }

    #[test]
    fn dialogue_lines_are_bulleted() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(format_dialogue(&lines), "- a\n- b");
        assert_eq!(format_dialogue(&[]), "");
    }
}
