//! Replay script format.
//!
//! A script is JSON lines, one [`ScriptStep`] per line, tagged by `step`:
//!
//! ```text
//! # comments and blank lines are skipped
//! {"step": "sign_in", "id": "u1", "names": "Una"}
//! {"step": "open_room", "id": "u2", "names": "Ugo"}
//! {"step": "inbox", "changes": [{"type": "added", "doc": {"docId": "d1", "roomId": "roomu1u3", "timestamp": "t1"}}]}
//! {"step": "messages", "with": "u2", "count": 4}
//! ```

use huddle_app::DocChange;
use huddle_core::InboxRecord;
use serde::{Deserialize, Serialize};

use crate::ReplayError;

/// One scripted user action or stream delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// The auth layer reports a signed-in user.
    SignIn {
        /// User id.
        id: String,
        /// Display name(s).
        #[serde(default)]
        names: String,
        /// Profile image.
        #[serde(default)]
        image: Option<String>,
    },

    /// The auth layer reports sign-out.
    SignOut,

    /// User opens the room with another participant.
    OpenRoom {
        /// Other participant's id.
        id: String,
        /// Other participant's display name(s).
        #[serde(default)]
        names: String,
        /// Other participant's profile image.
        #[serde(default)]
        image: Option<String>,
    },

    /// User closes the room with another participant.
    CloseRoom {
        /// Other participant's id.
        with: String,
    },

    /// User shows or hides the room list.
    ShowRooms {
        /// New visibility.
        visible: bool,
    },

    /// Inbox collection changes.
    Inbox {
        /// Changes in stream order.
        changes: Vec<DocChange<InboxRecord>>,
    },

    /// A room's message collection size.
    Messages {
        /// Other participant's id.
        with: String,
        /// Number of messages now in the room.
        count: u64,
        /// Deliver on this generation instead of the live one.
        #[serde(default)]
        generation: Option<u64>,
    },

    /// Move the replay clock forward.
    AdvanceClock {
        /// Milliseconds to advance.
        millis: u64,
    },
}

/// Parse a whole script.
///
/// # Errors
///
/// Returns [`ReplayError::Parse`] naming the first line that is not a valid
/// step.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ReplayError> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| {
            serde_json::from_str(text).map_err(|source| ReplayError::Parse { line, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use huddle_app::ChangeKind;

    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let script = r#"
            {"step": "sign_in", "id": "u1", "names": "Una"}
            {"step": "open_room", "id": "u2"}
            {"step": "close_room", "with": "u2"}
            {"step": "show_rooms", "visible": true}
            {"step": "inbox", "changes": [{"type": "removed", "doc": {"docId": "d1"}}]}
            {"step": "messages", "with": "u2", "count": 3}
            {"step": "advance_clock", "millis": 10}
            {"step": "sign_out"}
        "#;

        let steps = parse_script(script).unwrap();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[1], ScriptStep::OpenRoom { id: "u2".into(), names: String::new(), image: None });
        assert!(matches!(
            &steps[4],
            ScriptStep::Inbox { changes } if changes[0].kind == ChangeKind::Removed
        ));
        assert_eq!(steps[5], ScriptStep::Messages { with: "u2".into(), count: 3, generation: None });
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let script = "# setup\n\n{\"step\": \"sign_out\"}\n   # trailing\n";
        assert_eq!(parse_script(script).unwrap(), vec![ScriptStep::SignOut]);
    }

    #[test]
    fn reports_line_of_bad_step() {
        let script = "{\"step\": \"sign_out\"}\n# ok\n{\"step\": \"dance\"}\n";

        let err = parse_script(script).unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 3, .. }));
    }

    #[test]
    fn inbox_record_fields_are_optional() {
        let script = r#"{"step": "inbox", "changes": [{"type": "added", "doc": {"docId": "d9", "text": "x"}}]}"#;

        let steps = parse_script(script).unwrap();
        let ScriptStep::Inbox { changes } = &steps[0] else {
            panic!("expected inbox step");
        };
        assert_eq!(changes[0].doc.room_id, None);
        assert_eq!(changes[0].doc.payload["text"], "x");
    }

    #[test]
    fn inbox_documents_keep_extra_fields() {
        let script = r#"{"step": "inbox", "changes": [{"type": "added", "doc": {"docId": "d9", "roomId": "r", "timestamp": "t", "text": "hello", "payload": {"n": 1}}}]}"#;

        let steps = parse_script(script).unwrap();
        let ScriptStep::Inbox { changes } = &steps[0] else {
            panic!("expected inbox step");
        };
        let payload = &changes[0].doc.payload;
        assert_eq!(payload["text"], "hello");
        assert_eq!(payload["payload"]["n"], 1);
    }
}
