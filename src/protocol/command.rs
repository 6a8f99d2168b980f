//! Inbound command definitions and envelope decoding.
//!
//! The coordinator drives the agent with JSON envelopes of the form
//! `{"type": "START"}`. Decoding is deliberately forgiving: a payload
//! that is not JSON is reported as malformed (and logged by the
//! transport), a well-formed envelope with an unknown `type` is ignored.
//! Neither ever tears the connection down.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Command
// ============================================================================

/// A remote command addressed to the orchestrator.
///
/// Wire form: `{"type": "<NAME>"}`. The command set is fire-and-forget:
/// acceptance carries no correlation id, and effects are observable only
/// through later [`super::OutboundEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Begin a multi-page run. No-op while a run is in progress.
    Start,
    /// Request cooperative cancellation at the next page boundary.
    Stop,
    /// Export the current dataset (CSV and JSON), in any state.
    Export,
    /// Forced reset of the whole session, including mid-run.
    Clear,
    /// Request an immediate status snapshot.
    Status,
    /// One-shot extraction of the current page, outside the run lifecycle.
    ScrapeCurrentPage,
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Export => "EXPORT",
            Self::Clear => "CLEAR",
            Self::Status => "STATUS",
            Self::ScrapeCurrentPage => "SCRAPE_CURRENT_PAGE",
        }
    }
}

// ============================================================================
// Inbound Decoding
// ============================================================================

/// Decoded form of one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A recognized command.
    Command(Command),
    /// Valid JSON but not a known envelope; carries the `type` field
    /// (possibly empty) for logging. Silently ignored by the transport.
    Unrecognized(String),
    /// Not valid JSON; carries the parse error text.
    Malformed(String),
}

/// Decodes one inbound frame into a dispatchable value.
///
/// Never fails: undecodable input degrades to [`Inbound::Unrecognized`]
/// or [`Inbound::Malformed`] so the caller can log and move on.
#[must_use]
pub fn decode_inbound(text: &str) -> Inbound {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return Inbound::Malformed(err.to_string()),
    };

    match Command::deserialize(&value) {
        Ok(command) => Inbound::Command(command),
        Err(_) => {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Inbound::Unrecognized(kind)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let json = serde_json::to_string(&Command::Start).expect("serialize");
        assert_eq!(json, r#"{"type":"START"}"#);

        let json = serde_json::to_string(&Command::ScrapeCurrentPage).expect("serialize");
        assert_eq!(json, r#"{"type":"SCRAPE_CURRENT_PAGE"}"#);
    }

    #[test]
    fn test_decode_all_commands() {
        let cases = [
            ("START", Command::Start),
            ("STOP", Command::Stop),
            ("EXPORT", Command::Export),
            ("CLEAR", Command::Clear),
            ("STATUS", Command::Status),
            ("SCRAPE_CURRENT_PAGE", Command::ScrapeCurrentPage),
        ];

        for (name, expected) in cases {
            let envelope = format!(r#"{{"type":"{name}"}}"#);
            assert_eq!(decode_inbound(&envelope), Inbound::Command(expected));
            assert_eq!(expected.name(), name);
        }
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let decoded = decode_inbound(r#"{"type":"STOP","origin":"gateway"}"#);
        assert_eq!(decoded, Inbound::Command(Command::Stop));
    }

    #[test]
    fn test_decode_unknown_type() {
        let decoded = decode_inbound(r#"{"type":"REBOOT"}"#);
        assert_eq!(decoded, Inbound::Unrecognized("REBOOT".to_string()));
    }

    #[test]
    fn test_decode_non_envelope_json() {
        assert_eq!(
            decode_inbound("[1,2,3]"),
            Inbound::Unrecognized(String::new())
        );
        assert_eq!(
            decode_inbound(r#"{"no_type":true}"#),
            Inbound::Unrecognized(String::new())
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_inbound("{nope"), Inbound::Malformed(_)));
        assert!(matches!(decode_inbound(""), Inbound::Malformed(_)));
    }
}
