//! Events observed while driving one conversational turn.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One event in a turn's stream.
///
/// A turn interleaves assistant text, tool activity, and rounds that produce
/// neither; the final answer is the concatenation of the `Text` payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A fragment of assistant text.
    Text { content: String },
    /// The model invoked a tool.
    ToolInvocation { name: String, arguments: String },
    /// A tool finished and returned output.
    ToolResult { name: String, output: String },
    /// A round that produced tool plumbing or nothing visible.
    Thought,
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { content } => write!(f, "text({} chars)", content.len()),
            Self::ToolInvocation { name, arguments } => write!(f, "{}({})", name, arguments),
            Self::ToolResult { name, output } => {
                write!(f, "{} returned {} chars", name, output.len())
            }
            Self::Thought => write!(f, "thought"),
        }
    }
}

/// Concatenate a turn's text fragments in arrival order.
pub fn collect_text(events: &[TurnEvent]) -> String {
    events.iter().fold(String::new(), |mut acc, event| {
        if let TurnEvent::Text { content } = event {
            acc.push_str(content);
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_text_ignores_non_text_events() {
        let events = vec![
            TurnEvent::Thought,
            TurnEvent::Text {
                content: "Here is ".to_string(),
            },
            TurnEvent::ToolInvocation {
                name: "discover_sources".to_string(),
                arguments: r#"{"topic": "rust"}"#.to_string(),
            },
            TurnEvent::ToolResult {
                name: "discover_sources".to_string(),
                output: "Found 3 sources".to_string(),
            },
            TurnEvent::Text {
                content: "the course.".to_string(),
            },
        ];

        assert_eq!(collect_text(&events), "Here is the course.");
    }

    #[test]
    fn test_collect_text_of_empty_stream() {
        assert_eq!(collect_text(&[]), "");
    }

    #[test]
    fn test_event_display() {
        let event = TurnEvent::ToolInvocation {
            name: "search_code".to_string(),
            arguments: r#"{"pattern": "fn main"}"#.to_string(),
        };
        assert_eq!(format!("{event}"), r#"search_code({"pattern": "fn main"})"#);
    }
}
