//! Room identity and `/documents/{id}` routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Path prefix under which rooms are addressed.
pub const DOCUMENTS_PREFIX: &str = "/documents";

/// Identifier of a shared room (one Document per room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random room.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Extract the room from a `/documents/{id}` path.
    ///
    /// A trailing slash is tolerated; a missing or empty segment, or anything
    /// nested below the id, yields `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(DOCUMENTS_PREFIX)?.strip_prefix('/')?;
        let id = rest.strip_suffix('/').unwrap_or(rest);
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::new(id))
    }

    /// Path addressing this room.
    pub fn path(&self) -> String {
        format!("{}/{}", DOCUMENTS_PREFIX, self.0)
    }

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
        Self::new(id)
    }
}

/// Where a client should go for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRoute {
    /// The path already names a room.
    Existing(RoomId),
    /// No room in the path; navigate to this freshly generated one.
    Redirect(RoomId),
}

impl RoomRoute {
    pub fn room(&self) -> &RoomId {
        match self {
            RoomRoute::Existing(room) | RoomRoute::Redirect(room) => room,
        }
    }
}

/// Resolve `path` to a room, generating one when the path carries none.
pub fn resolve_room(path: &str) -> RoomRoute {
    match RoomId::from_path(path) {
        Some(room) => RoomRoute::Existing(room),
        None => RoomRoute::Redirect(RoomId::generate()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(RoomId::from_path("/documents/abc"), Some(RoomId::new("abc")));
        assert_eq!(RoomId::from_path("/documents/abc/"), Some(RoomId::new("abc")));
        assert_eq!(RoomId::from_path("/documents/"), None);
        assert_eq!(RoomId::from_path("/documents"), None);
        assert_eq!(RoomId::from_path("/documents/a/b"), None);
        assert_eq!(RoomId::from_path("/other/abc"), None);
    }

    #[test]
    fn test_resolve_room() {
        let existing = resolve_room("/documents/room-1");
        assert_eq!(existing, RoomRoute::Existing(RoomId::new("room-1")));

        let RoomRoute::Redirect(room) = resolve_room("/") else {
            panic!("expected a redirect");
        };
        assert!(Uuid::parse_str(room.as_str()).is_ok());
        assert_eq!(RoomId::from_path(&room.path()), Some(room));
    }

    #[test]
    fn test_generated_rooms_differ() {
        assert_ne!(RoomId::generate(), RoomId::generate());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&RoomId::new("r")).unwrap();
        assert_eq!(json, "\"r\"");
    }
}
