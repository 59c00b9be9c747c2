//! Identity types for players, abilities, events and stored records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session slot of a connected player (the host's player index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw slot index
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Opaque identifier assigned by the persistence collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new record ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}", self.0)
    }
}

/// Unique key of a hero or skill type
///
/// String-based so content files and stored rows can refer to it directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityKey(pub String);

impl AbilityKey {
    /// Create a new ability key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AbilityKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AbilityKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Name of a typed event routed to heroes and skills (e.g. `player_kill`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(pub String);

impl EventName {
    /// Create a new event name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id() {
        let id = PlayerId::new(5);
        assert_eq!(id.raw(), 5);
        assert_eq!(format!("{}", id), "player:5");
    }

    #[test]
    fn test_ability_key() {
        let key = AbilityKey::new("paladin.condemn");
        assert_eq!(key.as_str(), "paladin.condemn");
        assert_eq!(format!("{}", key), "paladin.condemn");
    }

    #[test]
    fn test_event_name_compares_with_str() {
        let name = EventName::from("player_kill");
        assert_eq!(name, "player_kill");
    }
}
