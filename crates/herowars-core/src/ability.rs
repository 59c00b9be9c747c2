//! Immutable hero and skill type definitions
//!
//! A type is loaded once from content and shared (through `Arc`) by every
//! instance bound to it. Instances read type data through plain field access.

use crate::callback::{HeroCallback, SkillCallback};
use crate::error::{Error, Result};
use crate::identity::{AbilityKey, EventName};
use crate::level::MaxLevel;
use crate::variable::{Variable, VariableRange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reserved callback name invoked when an instance becomes active
pub const INIT_CALLBACK: &str = "init";

/// Prefix marking helper behaviors that are never bound to events
pub const PRIVATE_PREFIX: char = '_';

/// A display string in several languages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized(pub IndexMap<String, String>);

impl Localized {
    /// Language used when the requested one is missing
    pub const FALLBACK_LANGUAGE: &'static str = "en";

    /// Text in `language`, falling back to English, then to any language
    pub fn text(&self, language: &str) -> Option<&str> {
        self.0
            .get(language)
            .or_else(|| self.0.get(Self::FALLBACK_LANGUAGE))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }
}

/// Fields shared by hero and skill definitions
#[derive(Debug, Clone)]
pub struct AbilityDef {
    /// Unique key, used for storage
    pub key: AbilityKey,
    /// Original creator of the content (not the player using it)
    pub author: Option<String>,
    /// Minimum level required to access the ability
    pub required_level: u32,
    /// Maximum level the ability may reach
    pub max_level: MaxLevel,
    /// Display strings by string key (`name`, `description`, messages...)
    pub strings: IndexMap<String, Localized>,
    /// Data variables used by callbacks
    pub variables: IndexMap<String, Variable>,
}

impl AbilityDef {
    /// Create a definition with no strings or variables
    pub fn new(key: impl Into<AbilityKey>, required_level: u32, max_level: MaxLevel) -> Self {
        Self {
            key: key.into(),
            author: None,
            required_level,
            max_level,
            strings: IndexMap::new(),
            variables: IndexMap::new(),
        }
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    /// Add a display string in one language
    pub fn with_string(
        mut self,
        key: impl Into<String>,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.strings
            .entry(key.into())
            .or_default()
            .0
            .insert(language.into(), text.into());
        self
    }

    /// Display name
    pub fn name(&self) -> Option<&Localized> {
        self.strings.get("name")
    }

    /// Display description
    pub fn description(&self) -> Option<&Localized> {
        self.strings.get("description")
    }

    /// Resolve variable `name` at `level`
    pub fn current(&self, name: &str, level: u32) -> Result<f64> {
        self.variable(name).map(|v| v.current(level))
    }

    /// Display range of variable `name`
    pub fn range(&self, name: &str) -> Result<VariableRange> {
        self.variable(name).map(|v| v.range(self.max_level))
    }

    fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables.get(name).ok_or_else(|| Error::UnknownVariable {
            ability: self.key.clone(),
            name: name.to_string(),
        })
    }
}

/// Event callbacks bound to one type
///
/// Built explicitly per ability; there is no runtime introspection.
#[derive(Clone)]
pub struct Callbacks<C> {
    /// Invoked once when the instance becomes active
    pub init: Option<C>,
    /// Event name to callback
    pub events: IndexMap<EventName, C>,
}

impl<C> Callbacks<C> {
    /// Create an empty callback table
    pub fn new() -> Self {
        Self {
            init: None,
            events: IndexMap::new(),
        }
    }

    /// Bind a callback to an event
    pub fn on(mut self, event: impl Into<EventName>, callback: C) -> Self {
        self.events.insert(event.into(), callback);
        self
    }

    /// Set the init callback
    pub fn on_init(mut self, callback: C) -> Self {
        self.init = Some(callback);
        self
    }

    /// Look up the callback for an event
    pub fn get(&self, event: &EventName) -> Option<&C> {
        self.events.get(event)
    }

    /// Check whether an event has a callback
    pub fn handles(&self, event: &str) -> bool {
        self.events.keys().any(|e| e == event)
    }

    /// Reject event names that are reserved
    pub fn validate(&self, owner: &AbilityKey) -> Result<()> {
        for event in self.events.keys() {
            let name = event.as_str();
            if name.is_empty() || name.starts_with(PRIVATE_PREFIX) || name == INIT_CALLBACK {
                return Err(Error::Definition(format!(
                    "{}: reserved event name '{}'",
                    owner, name
                )));
            }
        }
        Ok(())
    }
}

impl<C> Default for Callbacks<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Callbacks<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("init", &self.init.is_some())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Skill type definition
#[derive(Debug)]
pub struct SkillType {
    pub def: AbilityDef,
    /// Always enabled, never leveled
    pub passive: bool,
    /// Hero levels between successive skill levels
    ///
    /// An interval of 2 with required level 1 allows leveling at 1, 3, 5...
    pub level_interval: u32,
    pub callbacks: Callbacks<SkillCallback>,
}

impl SkillType {
    /// Default minimum hero level for a skill
    pub const DEFAULT_REQUIRED_LEVEL: u32 = 1;
    /// Default skill level cap
    pub const DEFAULT_MAX_LEVEL: u32 = 8;
    /// Default hero-level spacing between skill levels
    pub const DEFAULT_LEVEL_INTERVAL: u32 = 2;

    /// Create a skill type
    pub fn new(
        def: AbilityDef,
        passive: bool,
        level_interval: u32,
        callbacks: Callbacks<SkillCallback>,
    ) -> Result<Self> {
        if level_interval == 0 {
            return Err(Error::Definition(format!(
                "{}: level_interval must be at least 1",
                def.key
            )));
        }
        validate_variables(&def)?;
        callbacks.validate(&def.key)?;
        Ok(Self {
            def,
            passive,
            level_interval,
            callbacks,
        })
    }

    /// Hero level needed to raise a skill from `level` to `level + 1`
    pub fn next_required_level(&self, level: u32) -> u32 {
        self.def
            .required_level
            .saturating_add(self.level_interval.saturating_mul(level))
    }
}

/// Hero type definition
#[derive(Debug)]
pub struct HeroType {
    pub def: AbilityDef,
    /// Skill types in display and dispatch order
    pub skill_types: Vec<Arc<SkillType>>,
    pub callbacks: Callbacks<HeroCallback>,
}

impl HeroType {
    /// Create a hero type
    pub fn new(
        def: AbilityDef,
        skill_types: Vec<Arc<SkillType>>,
        callbacks: Callbacks<HeroCallback>,
    ) -> Result<Self> {
        validate_variables(&def)?;
        callbacks.validate(&def.key)?;
        let mut seen = std::collections::HashSet::new();
        for skill in &skill_types {
            if !seen.insert(&skill.def.key) {
                return Err(Error::Definition(format!(
                    "{}: duplicate skill key '{}'",
                    def.key, skill.def.key
                )));
            }
        }
        Ok(Self {
            def,
            skill_types,
            callbacks,
        })
    }

    /// Find a skill type by key
    pub fn skill_type(&self, key: &AbilityKey) -> Option<&Arc<SkillType>> {
        self.skill_types.iter().find(|s| &s.def.key == key)
    }
}

fn validate_variables(def: &AbilityDef) -> Result<()> {
    for (name, variable) in &def.variables {
        variable
            .validate()
            .map_err(|e| Error::Definition(format!("{}.{}: {}", def.key, name, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::skill_callback;

    #[test]
    fn test_localized_fallback() {
        let def = AbilityDef::new("paladin", 0, MaxLevel::Unbounded)
            .with_string("name", "en", "Paladin")
            .with_string("name", "fi", "Paladiini");
        let name = def.name().unwrap();
        assert_eq!(name.text("fi"), Some("Paladiini"));
        assert_eq!(name.text("de"), Some("Paladin"));
    }

    #[test]
    fn test_current_unknown_variable() {
        let def = AbilityDef::new("paladin.condemn", 1, MaxLevel::Finite(8))
            .with_variable("chance", Variable::Table(vec![10.0, 20.0]));
        assert_eq!(def.current("chance", 2).unwrap(), 20.0);
        assert!(matches!(
            def.current("duration", 2),
            Err(Error::UnknownVariable { .. })
        ));
    }

    #[test]
    fn test_next_required_level() {
        let skill = SkillType::new(
            AbilityDef::new("s", 1, MaxLevel::Finite(8)),
            false,
            2,
            Callbacks::new(),
        )
        .unwrap();
        assert_eq!(skill.next_required_level(0), 1);
        assert_eq!(skill.next_required_level(1), 3);
        assert_eq!(skill.next_required_level(2), 5);
    }

    #[test]
    fn test_reserved_event_names_rejected() {
        let callbacks = Callbacks::new().on("init", skill_callback(|_| Ok(())));
        let err = SkillType::new(
            AbilityDef::new("s", 1, MaxLevel::Finite(8)),
            false,
            2,
            callbacks,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Definition(_)));

        let callbacks = Callbacks::new().on("_helper", skill_callback(|_| Ok(())));
        assert!(callbacks.validate(&AbilityKey::new("s")).is_err());
    }

    #[test]
    fn test_zero_level_interval_rejected() {
        let err = SkillType::new(
            AbilityDef::new("s", 1, MaxLevel::Finite(8)),
            false,
            0,
            Callbacks::new(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_duplicate_skill_keys_rejected() {
        let skill = Arc::new(
            SkillType::new(
                AbilityDef::new("dup", 1, MaxLevel::Finite(8)),
                false,
                2,
                Callbacks::new(),
            )
            .unwrap(),
        );
        let err = HeroType::new(
            AbilityDef::new("hero", 0, MaxLevel::Unbounded),
            vec![skill.clone(), skill],
            Callbacks::new(),
        );
        assert!(err.is_err());
    }
}
