//! Read-only rows for the presentation collaborator

use crate::ability::AbilityDef;
use crate::budget;
use crate::event::names;
use crate::hero::Hero;
use crate::identity::AbilityKey;
use crate::level::MaxLevel;
use crate::player::Player;
use crate::registry::TypeRegistry;
use serde::Serialize;

/// Language used when the caller has no preference
pub const DEFAULT_LANGUAGE: &str = "en";

fn display_name(def: &AbilityDef, language: &str) -> String {
    def.name()
        .and_then(|name| name.text(language))
        .unwrap_or(def.key.as_str())
        .to_string()
}

/// Summary line for a hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroInfo {
    pub key: AbilityKey,
    pub name: String,
    pub level: u32,
    pub xp: u64,
    /// `None` at the level cap
    pub required_xp: Option<u64>,
    pub skill_points: i64,
}

impl HeroInfo {
    pub fn new(hero: &Hero, language: &str) -> Self {
        Self {
            key: hero.key().clone(),
            name: display_name(hero.def(), language),
            level: hero.level(),
            xp: hero.xp(),
            required_xp: hero.required_xp(),
            skill_points: budget::skill_points(hero),
        }
    }
}

/// One row of the skills menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillRow {
    pub key: AbilityKey,
    pub name: String,
    pub description: Option<String>,
    pub level: u32,
    pub max_level: MaxLevel,
    pub passive: bool,
    /// Bound to the ultimate key
    pub ultimate: bool,
    pub upgradable: bool,
    pub downgradable: bool,
}

/// Rows for every live skill of a hero, in type order
pub fn skill_menu(hero: &Hero, language: &str) -> Vec<SkillRow> {
    hero.skills()
        .iter()
        .map(|skill| SkillRow {
            key: skill.key().clone(),
            name: display_name(skill.def(), language),
            description: skill
                .def()
                .description()
                .and_then(|d| d.text(language))
                .map(str::to_string),
            level: skill.level(),
            max_level: skill.def().max_level,
            passive: skill.passive(),
            ultimate: skill.ty().callbacks.handles(names::PLAYER_ULTIMATE),
            upgradable: budget::can_upgrade(hero, skill.key()),
            downgradable: budget::can_downgrade(hero, skill.key()),
        })
        .collect()
}

/// One row of the change-hero menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroRow {
    pub key: AbilityKey,
    pub name: String,
    pub required_level: u32,
    pub unlocked: bool,
    /// Level of the player's instance, if owned
    pub owned_level: Option<u32>,
    pub active: bool,
}

/// Rows for every hero type in registry order
pub fn hero_menu(registry: &TypeRegistry, player: &Player, language: &str) -> Vec<HeroRow> {
    let total_level = player.total_level();
    registry
        .iter()
        .map(|ty| {
            let key = &ty.def.key;
            HeroRow {
                key: key.clone(),
                name: display_name(&ty.def, language),
                required_level: ty.def.required_level,
                unlocked: ty.def.required_level <= total_level,
                owned_level: player.owned_hero(key).map(Hero::level),
                active: player.active_key() == Some(key),
            }
        })
        .collect()
}
