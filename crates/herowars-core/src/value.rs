//! Dynamic values carried in event arguments and instance scratch state

use crate::identity::{AbilityKey, PlayerId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamic value passed alongside an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// No value / null
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (damage, levels, XP)
    Int(i64),
    /// Floating point value (multipliers, durations)
    Float(f64),
    /// String value
    String(String),
    /// Reference to a connected player
    Player(PlayerId),
    /// Reference to a hero or skill type
    Ability(AbilityKey),
    /// List of values
    List(Vec<Value>),
    /// Map of string keys to values
    Map(EventArgs),
}

/// Ordered argument map for events
///
/// Uses IndexMap so argument order is stable across dispatches.
pub type EventArgs = IndexMap<String, Value>;

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a player reference
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Value::Player(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get this value as an ability key
    pub fn as_ability(&self) -> Option<&AbilityKey> {
        match self {
            Value::Ability(key) => Some(key),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Player(_) => "player",
            Value::Ability(_) => "ability",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Player(id) => write!(f, "{}", id),
            Value::Ability(key) => write!(f, "{}", key),
            Value::List(list) => {
                write!(f, "[")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<PlayerId> for Value {
    fn from(id: PlayerId) -> Self {
        Value::Player(id)
    }
}

impl From<AbilityKey> for Value {
    fn from(key: AbilityKey) -> Self {
        Value::Ability(key)
    }
}

impl From<&AbilityKey> for Value {
    fn from(key: &AbilityKey) -> Self {
        Value::Ability(key.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(vec: Vec<T>) -> Self {
        Value::List(vec.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Int(42).as_float(), Some(42.0));
        assert_eq!(Value::Player(PlayerId(3)).as_player(), Some(PlayerId(3)));
        assert_eq!(Value::from("knife").as_str(), Some("knife"));
        assert_eq!(
            Value::from(AbilityKey::new("paladin")).as_ability(),
            Some(&AbilityKey::new("paladin"))
        );
    }

    #[test]
    fn test_value_display() {
        let v: Value = vec![1i64, 2, 3].into();
        assert_eq!(v.to_string(), "[1, 2, 3]");
        assert_eq!(Value::Player(PlayerId(9)).to_string(), "player:9");
    }
}
