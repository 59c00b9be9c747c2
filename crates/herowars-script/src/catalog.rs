//! Behavior catalog: the callbacks content directories bind to
//!
//! Behaviors are registered in code and looked up by the hero's directory
//! name. A hero behavior lists its skill behaviors in the order the skills
//! are dispatched and displayed.

use herowars_core::{Callbacks, EventName, HeroCallback, SkillCallback};
use indexmap::IndexMap;

/// Callbacks for one hero and its skills
#[derive(Debug, Default)]
pub struct HeroBehavior {
    pub callbacks: Callbacks<HeroCallback>,
    /// Skill behavior name to callbacks, in skill order
    pub skills: IndexMap<String, Callbacks<SkillCallback>>,
}

impl HeroBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a hero-level callback
    pub fn on(mut self, event: impl Into<EventName>, callback: HeroCallback) -> Self {
        self.callbacks = self.callbacks.on(event, callback);
        self
    }

    /// Set the hero's init callback
    pub fn on_init(mut self, callback: HeroCallback) -> Self {
        self.callbacks = self.callbacks.on_init(callback);
        self
    }

    /// Append a skill behavior
    pub fn skill(mut self, name: impl Into<String>, callbacks: Callbacks<SkillCallback>) -> Self {
        self.skills.insert(name.into(), callbacks);
        self
    }
}

/// Hero behaviors by content directory name
#[derive(Debug, Default)]
pub struct BehaviorCatalog {
    heroes: IndexMap<String, HeroBehavior>,
}

impl BehaviorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hero behavior, replacing any previous one for `name`
    pub fn register(&mut self, name: impl Into<String>, behavior: HeroBehavior) {
        self.heroes.insert(name.into(), behavior);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, name: impl Into<String>, behavior: HeroBehavior) -> Self {
        self.register(name, behavior);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HeroBehavior> {
        self.heroes.get(name)
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}
