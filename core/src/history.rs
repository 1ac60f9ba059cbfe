use serde::Serialize;

use crate::errors::SetuResult;
use crate::types::{ConversationTurn, Role};

/// Wire shape used when serializing a transcript into the `history` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    /// `[{"role": "...", "content": "..."}]`
    Plain,
    /// `[{"role": "...", "content": [{"text": "..."}]}]`
    Parts,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct PartsTurn<'a> {
    role: Role,
    content: [TextPart<'a>; 1],
}

/// Serializes the transcript for the backend.
///
/// When `window` is set only the most recent `window` turns are kept.
pub fn serialize_history(
    turns: &[ConversationTurn],
    format: HistoryFormat,
    window: Option<usize>,
) -> SetuResult<String> {
    let start = match window {
        Some(n) => turns.len().saturating_sub(n),
        None => 0,
    };
    let recent = &turns[start..];

    let json = match format {
        HistoryFormat::Plain => serde_json::to_string(recent)?,
        HistoryFormat::Parts => {
            let parts: Vec<PartsTurn<'_>> = recent
                .iter()
                .map(|turn| PartsTurn {
                    role: turn.role,
                    content: [TextPart {
                        text: &turn.content,
                    }],
                })
                .collect();
            serde_json::to_string(&parts)?
        }
    };

    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::assistant("Namaste!"),
            ConversationTurn::user("PM Kisan kya hai?"),
            ConversationTurn::assistant("Kisanon ke liye yojana hai."),
        ]
    }

    #[test]
    fn test_plain_history_keeps_all_turns() {
        let json = serialize_history(&sample(), HistoryFormat::Plain, None).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"assistant","content":"Namaste!"},{"role":"user","content":"PM Kisan kya hai?"},{"role":"assistant","content":"Kisanon ke liye yojana hai."}]"#
        );
    }

    #[test]
    fn test_parts_history_truncates_to_window() {
        let json = serialize_history(&sample(), HistoryFormat::Parts, Some(2)).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"user","content":[{"text":"PM Kisan kya hai?"}]},{"role":"assistant","content":[{"text":"Kisanon ke liye yojana hai."}]}]"#
        );
    }

    #[test]
    fn test_window_larger_than_transcript() {
        let json = serialize_history(&sample()[..1], HistoryFormat::Plain, Some(5)).unwrap();
        assert_eq!(json, r#"[{"role":"assistant","content":"Namaste!"}]"#);
    }

    #[test]
    fn test_empty_history() {
        let json = serialize_history(&[], HistoryFormat::Parts, Some(5)).unwrap();
        assert_eq!(json, "[]");
    }
}
