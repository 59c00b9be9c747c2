//! Server configuration
//!
//! Loaded from RON. Every field has a default so an empty `()` document is a
//! valid configuration.

use crate::error::{Error, Result};
use crate::event::{DuoOrder, DuoRoute, DuoRoutes};
use crate::hero::XpCurve;
use crate::identity::{AbilityKey, EventName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// XP curve and per-event rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpConfig {
    /// XP required to leave level 0
    pub base: u64,
    /// Additional XP each level requires
    pub per_level: u64,
    /// XP granted to the acting player per event
    pub rewards: IndexMap<EventName, i64>,
}

impl XpConfig {
    pub fn curve(&self) -> XpCurve {
        XpCurve::new(self.base, self.per_level)
    }
}

impl Default for XpConfig {
    fn default() -> Self {
        let rewards = [
            ("player_kill", 30),
            ("player_assist", 15),
            ("bomb_defused", 30),
            ("bomb_exploded", 20),
            ("bomb_planted", 20),
        ]
        .into_iter()
        .map(|(event, xp)| (EventName::new(event), xp))
        .collect();
        Self {
            base: 80,
            per_level: 15,
            rewards,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub xp: XpConfig,
    /// Hero given to new players; the first hero in registry order if unset
    pub starting_hero: Option<AbilityKey>,
    /// Content root holding one directory per hero
    pub heroes_dir: PathBuf,
    /// How duo game events split into attacker and victim notifications
    pub routes: DuoRoutes,
    /// Events after which the acting player's progress is saved
    pub persist_on: Vec<EventName>,
}

impl Default for Config {
    fn default() -> Self {
        let mut routes = DuoRoutes::new();
        routes.insert(
            EventName::new("player_death"),
            DuoRoute::new("player_kill", "player_death", "player_suicide")
                .with_order(DuoOrder::VictimFirst),
        );
        routes.insert(
            EventName::new("player_hurt"),
            DuoRoute::new("player_attack", "player_victim", "player_self_hurt")
                .with_order(DuoOrder::VictimFirst),
        );
        routes.insert(
            EventName::new("take_damage"),
            DuoRoute::new("pre_player_attack", "pre_player_victim", "pre_player_victim"),
        );
        Self {
            xp: XpConfig::default(),
            starting_hero: None,
            heroes_dir: PathBuf::from("heroes"),
            routes,
            persist_on: vec![
                EventName::new("player_death"),
                EventName::new("player_suicide"),
            ],
        }
    }
}

impl Config {
    /// Parse a RON document
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_ron_str(&source)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// A non-empty starting hero key, if configured
    pub fn starting_hero(&self) -> Option<&AbilityKey> {
        self.starting_hero
            .as_ref()
            .filter(|key| !key.as_str().is_empty())
    }
}
