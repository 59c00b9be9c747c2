//! The storage collaborator
//!
//! The engine calls these synchronously and propagates failures. Record ids
//! are assigned by the store on first save and written back onto the hero or
//! skill so later saves update in place.

use crate::error::{Error, Result};
use crate::hero::Hero;
use crate::identity::{AbilityKey, RecordId};
use crate::player::{Player, PlayerSettings};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Stored progress of one hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub id: RecordId,
    pub key: AbilityKey,
    pub level: u32,
    pub xp: u64,
}

/// Stored level of one skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: RecordId,
    pub key: AbilityKey,
    pub level: u32,
}

/// Everything stored for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub account: String,
    pub active_hero: Option<RecordId>,
    pub settings: PlayerSettings,
    pub heroes: Vec<HeroRecord>,
}

/// Durable storage for players, heroes and skill levels
pub trait Persistence: Send {
    /// Load an account, `None` if it has never been stored
    fn load_player(&mut self, account: &str) -> Result<Option<PlayerRecord>>;

    /// Store a new account together with its first hero
    fn create_player(&mut self, account: &str, hero: &mut Hero) -> Result<()>;

    /// Skill levels last saved for a hero
    fn load_skills(&mut self, hero: RecordId) -> Result<Vec<SkillRecord>>;

    /// Insert or update a hero's level and XP
    fn save_hero(&mut self, account: &str, hero: &mut Hero) -> Result<()>;

    /// Insert or update the levels of a hero's live non-passive skills
    fn save_skills(&mut self, hero: &mut Hero) -> Result<()>;

    /// Update the account's active hero and settings
    fn save_player(
        &mut self,
        account: &str,
        active_hero: Option<RecordId>,
        settings: &PlayerSettings,
    ) -> Result<()>;

    /// Store a newly unlocked hero and make it the account's active hero
    ///
    /// Either both writes land or neither does.
    fn add_active_hero(
        &mut self,
        account: &str,
        hero: &mut Hero,
        settings: &PlayerSettings,
    ) -> Result<()>;
}

/// Save a player's active hero, its skills and the account row
///
/// Bots are never saved.
pub fn save_progress(store: &mut dyn Persistence, player: &mut Player) -> Result<()> {
    if player.is_bot {
        return Ok(());
    }
    let account = player.account.clone();
    let settings = player.settings;
    let hero = player.hero_mut()?;
    store.save_hero(&account, hero)?;
    store.save_skills(hero)?;
    let active = hero.record_id();
    store.save_player(&account, active, &settings)
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: u64,
    failing: bool,
    fail_after: Option<usize>,
    players: IndexMap<String, (Option<RecordId>, PlayerSettings)>,
    heroes: IndexMap<RecordId, (String, HeroRecord)>,
    skills: IndexMap<RecordId, (RecordId, SkillRecord)>,
}

impl MemoryInner {
    fn next_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    fn check(&mut self) -> Result<()> {
        match self.fail_after {
            Some(0) => self.failing = true,
            Some(ref mut calls) => *calls -= 1,
            None => {}
        }
        if self.failing {
            Err(Error::Persistence("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn put_hero(&mut self, account: &str, hero: &mut Hero) -> RecordId {
        let id = match hero.record_id() {
            Some(id) => id,
            None => {
                let id = self.next_id();
                hero.set_record_id(id);
                id
            }
        };
        let record = HeroRecord {
            id,
            key: hero.key().clone(),
            level: hero.level(),
            xp: hero.xp(),
        };
        self.heroes.insert(id, (account.to_string(), record));
        id
    }
}

/// In-process store
///
/// Clones share the same data, so a test can hand one clone to the engine
/// and inspect what was written through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing = failing;
            inner.fail_after = None;
        }
    }

    /// Let `calls` more calls succeed, then fail like [`set_failing`](Self::set_failing)
    pub fn fail_after(&self, calls: usize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_after = Some(calls);
        }
    }

    /// Stored skill levels by key for a hero
    pub fn skill_levels(&self, hero: RecordId) -> IndexMap<AbilityKey, u32> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .skills
                    .values()
                    .filter(|(owner, _)| *owner == hero)
                    .map(|(_, s)| (s.key.clone(), s.level))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Persistence("memory store poisoned".to_string()))
    }
}

impl Persistence for MemoryStore {
    fn load_player(&mut self, account: &str) -> Result<Option<PlayerRecord>> {
        let mut inner = self.lock()?;
        inner.check()?;
        let Some((active_hero, settings)) = inner.players.get(account) else {
            return Ok(None);
        };
        let heroes = inner
            .heroes
            .values()
            .filter(|(owner, _)| owner == account)
            .map(|(_, record)| record.clone())
            .collect();
        Ok(Some(PlayerRecord {
            account: account.to_string(),
            active_hero: *active_hero,
            settings: *settings,
            heroes,
        }))
    }

    fn create_player(&mut self, account: &str, hero: &mut Hero) -> Result<()> {
        let mut inner = self.lock()?;
        inner.check()?;
        let id = inner.put_hero(account, hero);
        inner
            .players
            .insert(account.to_string(), (Some(id), PlayerSettings::default()));
        Ok(())
    }

    fn load_skills(&mut self, hero: RecordId) -> Result<Vec<SkillRecord>> {
        let mut inner = self.lock()?;
        inner.check()?;
        Ok(inner
            .skills
            .values()
            .filter(|(owner, _)| *owner == hero)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn save_hero(&mut self, account: &str, hero: &mut Hero) -> Result<()> {
        let mut inner = self.lock()?;
        inner.check()?;
        inner.put_hero(account, hero);
        Ok(())
    }

    fn save_skills(&mut self, hero: &mut Hero) -> Result<()> {
        let mut inner = self.lock()?;
        inner.check()?;
        let owner = hero
            .record_id()
            .ok_or_else(|| Error::Persistence(format!("hero {} has no record", hero.key())))?;
        for skill in hero.skills_mut().iter_mut().filter(|s| !s.passive()) {
            let id = match skill.record_id() {
                Some(id) => id,
                None => {
                    let id = inner.next_id();
                    skill.set_record_id(id);
                    id
                }
            };
            let record = SkillRecord {
                id,
                key: skill.key().clone(),
                level: skill.level(),
            };
            inner.skills.insert(id, (owner, record));
        }
        Ok(())
    }

    fn save_player(
        &mut self,
        account: &str,
        active_hero: Option<RecordId>,
        settings: &PlayerSettings,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner.check()?;
        inner
            .players
            .insert(account.to_string(), (active_hero, *settings));
        Ok(())
    }

    fn add_active_hero(
        &mut self,
        account: &str,
        hero: &mut Hero,
        settings: &PlayerSettings,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner.check()?;
        let id = inner.put_hero(account, hero);
        inner
            .players
            .insert(account.to_string(), (Some(id), *settings));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDef, Callbacks, HeroType, SkillType};
    use crate::hero::XpCurve;
    use crate::level::MaxLevel;

    fn hero() -> Hero {
        let skills = vec![
            Arc::new(
                SkillType::new(
                    AbilityDef::new("paladin.smite", 1, MaxLevel::Finite(8)),
                    false,
                    2,
                    Callbacks::new(),
                )
                .unwrap(),
            ),
            Arc::new(
                SkillType::new(
                    AbilityDef::new("paladin.aura", 1, MaxLevel::Finite(8)),
                    true,
                    2,
                    Callbacks::new(),
                )
                .unwrap(),
            ),
        ];
        let ty = HeroType::new(
            AbilityDef::new("paladin", 0, MaxLevel::Unbounded),
            skills,
            Callbacks::new(),
        )
        .unwrap();
        let mut hero = Hero::new(Arc::new(ty), XpCurve::default());
        hero.build_skills();
        hero
    }

    #[test]
    fn test_create_and_load_player() {
        let mut store = MemoryStore::new();
        assert!(store.load_player("acct").unwrap().is_none());

        let mut hero = hero();
        hero.set_level(4).unwrap();
        store.create_player("acct", &mut hero).unwrap();
        let id = hero.record_id().unwrap();

        let record = store.load_player("acct").unwrap().unwrap();
        assert_eq!(record.active_hero, Some(id));
        assert_eq!(record.heroes.len(), 1);
        assert_eq!(record.heroes[0].level, 4);
    }

    #[test]
    fn test_save_skills_skips_passives_and_updates_in_place() {
        let mut store = MemoryStore::new();
        let mut hero = hero();
        store.create_player("acct", &mut hero).unwrap();
        let id = hero.record_id().unwrap();

        hero.skills_mut()[0].set_level(2).unwrap();
        store.save_skills(&mut hero).unwrap();
        hero.skills_mut()[0].set_level(3).unwrap();
        store.save_skills(&mut hero).unwrap();

        let skills = store.load_skills(id).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].key.as_str(), "paladin.smite");
        assert_eq!(skills[0].level, 3);
    }

    #[test]
    fn test_save_skills_requires_saved_hero() {
        let mut store = MemoryStore::new();
        let mut hero = hero();
        assert!(matches!(
            store.save_skills(&mut hero),
            Err(Error::Persistence(_))
        ));
    }

    #[test]
    fn test_failing_store() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        observer.set_failing(true);
        assert!(store.load_player("acct").is_err());
        observer.set_failing(false);
        assert!(store.load_player("acct").is_ok());

        observer.fail_after(1);
        assert!(store.load_player("acct").is_ok());
        assert!(store.load_player("acct").is_err());
        assert!(store.load_player("acct").is_err());
        observer.set_failing(false);
        assert!(store.load_player("acct").is_ok());
    }
}
