//! The loaded set of hero types
//!
//! Built once per server session and shared read-only with the engine.
//! Iteration order is ascending `required_level`, ties kept in insertion order.

use crate::ability::HeroType;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::AbilityKey;
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    heroes: IndexMap<AbilityKey, Arc<HeroType>>,
}

impl TypeRegistry {
    /// Build a registry from hero types in load order
    ///
    /// Duplicate hero keys and skill keys shared between heroes are rejected.
    pub fn new(heroes: impl IntoIterator<Item = HeroType>) -> Result<Self> {
        let mut map: IndexMap<AbilityKey, Arc<HeroType>> = IndexMap::new();
        let mut skill_owner: IndexMap<AbilityKey, AbilityKey> = IndexMap::new();
        for hero in heroes {
            let key = hero.def.key.clone();
            if map.contains_key(&key) {
                return Err(Error::Definition(format!("duplicate hero key '{}'", key)));
            }
            for skill in &hero.skill_types {
                if let Some(owner) = skill_owner.insert(skill.def.key.clone(), key.clone()) {
                    return Err(Error::Definition(format!(
                        "skill key '{}' used by both '{}' and '{}'",
                        skill.def.key, owner, key
                    )));
                }
            }
            map.insert(key, Arc::new(hero));
        }
        // sort_by on IndexMap is stable
        map.sort_by(|_, a, _, b| a.def.required_level.cmp(&b.def.required_level));
        Ok(Self { heroes: map })
    }

    pub fn get(&self, key: &AbilityKey) -> Option<&Arc<HeroType>> {
        self.heroes.get(key)
    }

    /// Look up a hero type, failing with `UnknownHero`
    pub fn require(&self, key: &AbilityKey) -> Result<&Arc<HeroType>> {
        self.get(key).ok_or_else(|| Error::UnknownHero(key.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<HeroType>> {
        self.heroes.values()
    }

    pub fn first(&self) -> Option<&Arc<HeroType>> {
        self.heroes.values().next()
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }

    /// Hero handed to a brand new player
    pub fn starting_hero(&self, config: &Config) -> Result<&Arc<HeroType>> {
        match config.starting_hero() {
            Some(key) => self.require(key),
            None => self
                .first()
                .ok_or_else(|| Error::Definition("no hero types loaded".to_string())),
        }
    }

    /// Hero types unlocked at `total_level`
    pub fn selectable(&self, total_level: u32) -> impl Iterator<Item = &Arc<HeroType>> {
        self.iter()
            .filter(move |hero| hero.def.required_level <= total_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDef, Callbacks, SkillType};
    use crate::level::MaxLevel;

    fn hero(key: &str, required: u32) -> HeroType {
        HeroType::new(
            AbilityDef::new(key, required, MaxLevel::Unbounded),
            Vec::new(),
            Callbacks::new(),
        )
        .unwrap()
    }

    fn keys(registry: &TypeRegistry) -> Vec<&str> {
        registry.iter().map(|h| h.def.key.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_required_level_stable() {
        let registry = TypeRegistry::new([
            hero("titan", 20),
            hero("paladin", 0),
            hero("pirate", 10),
            hero("assassin", 0),
        ])
        .unwrap();
        assert_eq!(keys(&registry), ["paladin", "assassin", "pirate", "titan"]);
    }

    #[test]
    fn test_selectable() {
        let registry =
            TypeRegistry::new([hero("paladin", 0), hero("pirate", 10), hero("titan", 20)]).unwrap();
        let unlocked: Vec<_> = registry
            .selectable(10)
            .map(|h| h.def.key.as_str())
            .collect();
        assert_eq!(unlocked, ["paladin", "pirate"]);
    }

    #[test]
    fn test_starting_hero() {
        let registry = TypeRegistry::new([hero("pirate", 10), hero("paladin", 0)]).unwrap();
        let mut config = Config::default();
        assert_eq!(registry.starting_hero(&config).unwrap().def.key.as_str(), "paladin");

        config.starting_hero = Some(AbilityKey::new("pirate"));
        assert_eq!(registry.starting_hero(&config).unwrap().def.key.as_str(), "pirate");

        config.starting_hero = Some(AbilityKey::new("ghost"));
        assert!(matches!(
            registry.starting_hero(&config),
            Err(Error::UnknownHero(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        assert!(TypeRegistry::new([hero("paladin", 0), hero("paladin", 3)]).is_err());

        let shared = Arc::new(
            SkillType::new(
                AbilityDef::new("shared.skill", 1, MaxLevel::Finite(4)),
                false,
                2,
                Callbacks::new(),
            )
            .unwrap(),
        );
        let a = HeroType::new(
            AbilityDef::new("a", 0, MaxLevel::Unbounded),
            vec![shared.clone()],
            Callbacks::new(),
        )
        .unwrap();
        let b = HeroType::new(
            AbilityDef::new("b", 0, MaxLevel::Unbounded),
            vec![shared],
            Callbacks::new(),
        )
        .unwrap();
        assert!(TypeRegistry::new([a, b]).is_err());
    }
}
