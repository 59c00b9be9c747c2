//! Connected players and their owned heroes

use crate::error::{Error, Result};
use crate::hero::Hero;
use crate::identity::{AbilityKey, PlayerId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// When the upgrade-skills menu pops up on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpgradePopup {
    Never,
    #[default]
    OnDeath,
    OnLevelUp,
}

/// Per-player preferences, persisted with the player record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default)]
    pub upgrade_skills_popup: UpgradePopup,
    /// Use the inspect key to trigger the ultimate
    #[serde(default = "default_inspect_to_ult")]
    pub inspect_to_ult: bool,
}

fn default_inspect_to_ult() -> bool {
    true
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            upgrade_skills_popup: UpgradePopup::default(),
            inspect_to_ult: default_inspect_to_ult(),
        }
    }
}

/// A connected player's session state
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    /// Stable account identifier used as the storage key
    pub account: String,
    /// Bots play normally but are never persisted
    pub is_bot: bool,
    pub settings: PlayerSettings,
    heroes: IndexMap<AbilityKey, Hero>,
    active: Option<AbilityKey>,
}

impl Player {
    /// Create a player with no heroes
    pub fn new(id: PlayerId, account: impl Into<String>) -> Self {
        Self {
            id,
            account: account.into(),
            is_bot: false,
            settings: PlayerSettings::default(),
            heroes: IndexMap::new(),
            active: None,
        }
    }

    /// Mark the player as a bot
    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// Every hero the player owns, in acquisition order
    pub fn heroes(&self) -> &IndexMap<AbilityKey, Hero> {
        &self.heroes
    }

    pub fn owns(&self, key: &AbilityKey) -> bool {
        self.heroes.contains_key(key)
    }

    /// Add an owned hero, replacing any previous instance of the same key
    pub fn insert_hero(&mut self, hero: Hero) {
        self.heroes.insert(hero.key().clone(), hero);
    }

    pub fn owned_hero(&self, key: &AbilityKey) -> Option<&Hero> {
        self.heroes.get(key)
    }

    /// Key of the active hero
    pub fn active_key(&self) -> Option<&AbilityKey> {
        self.active.as_ref()
    }

    /// Point the active hero at an owned hero
    pub fn set_active(&mut self, key: &AbilityKey) -> Result<()> {
        if !self.heroes.contains_key(key) {
            return Err(Error::HeroNotOwned(key.clone()));
        }
        self.active = Some(key.clone());
        Ok(())
    }

    /// The active hero
    pub fn hero(&self) -> Result<&Hero> {
        self.active
            .as_ref()
            .and_then(|key| self.heroes.get(key))
            .ok_or(Error::NoActiveHero)
    }

    pub fn hero_mut(&mut self) -> Result<&mut Hero> {
        match self.active.as_ref() {
            Some(key) => self.heroes.get_mut(key).ok_or(Error::NoActiveHero),
            None => Err(Error::NoActiveHero),
        }
    }

    /// Sum of every owned hero's level
    pub fn total_level(&self) -> u32 {
        self.heroes
            .values()
            .fold(0u32, |acc, hero| acc.saturating_add(hero.level()))
    }
}

/// Read-only view of every player except the one being dispatched to
#[derive(Debug, Clone, Copy)]
pub struct Roster<'a> {
    players: &'a IndexMap<PlayerId, Player>,
}

impl<'a> Roster<'a> {
    pub fn new(players: &'a IndexMap<PlayerId, Player>) -> Self {
        Self { players }
    }

    pub fn get(&self, id: PlayerId) -> Option<&'a Player> {
        self.players.get(&id)
    }

    /// Active hero of another player
    pub fn hero(&self, id: PlayerId) -> Option<&'a Hero> {
        self.get(id).and_then(|p| p.hero().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Player> + 'a {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
