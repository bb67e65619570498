//! Transcript entries sent to agents
//!
//! Every delivery is a complete transcript: a JSON array of
//! `{"Role": ..., "Text": ...}` objects written as a single line. Agents
//! replay it into their chat history, so the field names and role strings
//! are part of the contract and must not change.
//!
//! ```text
//! [{"Role":"user","Text":"user:hello everyone"},{"Role":"assistant","Text":"hi!"}]
//! ```

use serde::{Deserialize, Serialize};

/// Role of a transcript entry from the receiving agent's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    /// Someone else speaking: the operator or another agent
    User,
    /// The receiving agent's own earlier turn
    Assistant,
}

/// One line of conversation as seen by a specific agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who is speaking, relative to the receiver
    #[serde(rename = "Role")]
    pub role: WireRole,
    /// The text, prefixed with `source:` for third-party lines
    #[serde(rename = "Text")]
    pub text: String,
}

impl TranscriptEntry {
    /// A line authored by someone other than the receiver, tagged with its source
    pub fn quoted(source: &str, text: &str) -> Self {
        Self {
            role: WireRole::User,
            text: format!("{}:{}", source, text),
        }
    }

    /// One of the receiver's own earlier lines
    pub fn own(text: impl Into<String>) -> Self {
        Self {
            role: WireRole::Assistant,
            text: text.into(),
        }
    }
}

/// A full transcript, in log order
pub type Transcript = Vec<TranscriptEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_field_names() {
        let entry = TranscriptEntry::quoted("user", "hello everyone");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"Role":"user","Text":"user:hello everyone"}"#);
    }

    #[test]
    fn test_own_entry_is_assistant() {
        let json = serde_json::to_string(&TranscriptEntry::own("hi there")).unwrap();
        assert_eq!(json, r#"{"Role":"assistant","Text":"hi there"}"#);
    }

    #[test]
    fn test_quoted_keeps_colons_in_text() {
        let entry = TranscriptEntry::quoted("alice", "time is 10:30");
        assert_eq!(entry.text, "alice:time is 10:30");
        assert_eq!(entry.role, WireRole::User);
    }
}
