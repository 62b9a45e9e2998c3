//! Participant and room identifiers.
//!
//! Both parties of a conversation compute the same [`RoomId`] independently
//! from their two user ids, so no coordination round-trip is needed before
//! the first message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix separating room ids from other id namespaces in the backing store.
pub const ROOM_ID_PREFIX: &str = "room";

/// Opaque user identifier handed out by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Canonical room identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Wrap an already-derived identifier, e.g. one read back from a stream.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Derive the room id shared by two participants.
///
/// The ids are ordered lexicographically and joined behind
/// [`ROOM_ID_PREFIX`] without a separator, so the result does not depend on
/// argument order. Equal ids (self-chat) still produce a deterministic id;
/// whether self-chat is allowed is up to the caller.
pub fn derive_room_id(a: &UserId, b: &UserId) -> RoomId {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut id = String::with_capacity(ROOM_ID_PREFIX.len() + low.0.len() + high.0.len());
    id.push_str(ROOM_ID_PREFIX);
    id.push_str(&low.0);
    id.push_str(&high.0);
    RoomId(id)
}

/// A chat participant as presented to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable user id.
    pub id: UserId,
    /// Display name(s).
    pub names: String,
    /// Profile image location. `None` if the user has none.
    #[serde(default)]
    pub image: Option<String>,
}

impl Participant {
    /// Participant without a profile image.
    pub fn new(id: impl Into<String>, names: impl Into<String>) -> Self {
        Self { id: UserId::new(id), names: names.into(), image: None }
    }

    /// Set the profile image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_sorts_participants() {
        let id = derive_room_id(&"u2".into(), &"u1".into());
        assert_eq!(id.as_str(), "roomu1u2");
    }

    #[test]
    fn derive_self_chat_is_deterministic() {
        let id = derive_room_id(&"alice".into(), &"alice".into());
        assert_eq!(id.as_str(), "roomalicealice");
    }

    #[test]
    fn derive_compares_bytes_not_lengths() {
        // "Z" sorts before "a" in byte order
        let id = derive_room_id(&"a".into(), &"Zed".into());
        assert_eq!(id.as_str(), "roomZeda");
    }

    #[test]
    fn user_id_serializes_transparently() {
        let participant = Participant::new("u1", "Una");
        assert_eq!(participant.id.to_string(), "u1");
        assert!(participant.image.is_none());
        assert_eq!(participant.with_image("a.png").image.as_deref(), Some("a.png"));
    }
}
