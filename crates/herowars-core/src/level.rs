//! Level bounds shared by heroes and skills

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on an ability's level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaxLevel {
    /// Capped at this level (inclusive)
    Finite(u32),
    /// No cap
    Unbounded,
}

impl MaxLevel {
    /// Check whether `level` is a legal value under this bound
    pub fn allows(&self, level: u32) -> bool {
        match self {
            MaxLevel::Finite(max) => level <= *max,
            MaxLevel::Unbounded => true,
        }
    }

    /// Check whether `level` sits at (or beyond) the cap
    pub fn is_reached(&self, level: u32) -> bool {
        match self {
            MaxLevel::Finite(max) => level >= *max,
            MaxLevel::Unbounded => false,
        }
    }

    /// The cap, if finite
    pub fn as_finite(&self) -> Option<u32> {
        match self {
            MaxLevel::Finite(max) => Some(*max),
            MaxLevel::Unbounded => None,
        }
    }

    /// Reject `level` if it falls outside `0..=max`
    pub fn check(&self, level: u32) -> Result<()> {
        if self.allows(level) {
            Ok(())
        } else {
            Err(Error::LevelOutOfRange { level, max: *self })
        }
    }
}

impl From<Option<u32>> for MaxLevel {
    fn from(max: Option<u32>) -> Self {
        match max {
            Some(max) => MaxLevel::Finite(max),
            None => MaxLevel::Unbounded,
        }
    }
}

impl fmt::Display for MaxLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxLevel::Finite(max) => write!(f, "{}", max),
            MaxLevel::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Old and new level reported by any level mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub old_level: u32,
    pub new_level: u32,
}

impl LevelChange {
    /// Create a level change record
    pub fn new(old_level: u32, new_level: u32) -> Self {
        Self {
            old_level,
            new_level,
        }
    }

    /// True if the level went up
    pub fn is_level_up(&self) -> bool {
        self.new_level > self.old_level
    }

    /// True if the level went down
    pub fn is_level_down(&self) -> bool {
        self.new_level < self.old_level
    }

    /// True if anything changed
    pub fn changed(&self) -> bool {
        self.new_level != self.old_level
    }
}
