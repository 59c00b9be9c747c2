//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use herowars_core::{Hero, Persistence, PlayerRecord, PlayerSettings, RecordId, SkillRecord};
use native_db::transaction::RwTransaction;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<std::result::Result<Models, String>> = LazyLock::new(|| {
    let mut models = Models::new();
    models
        .define::<StoredPlayer>()
        .map_err(|e| e.to_string())?;
    models.define::<StoredHero>().map_err(|e| e.to_string())?;
    models.define::<StoredSkill>().map_err(|e| e.to_string())?;
    models
        .define::<StoredSequence>()
        .map_err(|e| e.to_string())?;
    Ok(models)
});

/// The defined models, or why defining them failed.
fn checked(defined: &std::result::Result<Models, String>) -> Result<&Models> {
    defined
        .as_ref()
        .map_err(|e| Error::Database(format!("failed to define database models: {e}")))
}

/// Database store for player progress.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(checked(&MODELS)?, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        tracing::info!(path = %path.as_ref().display(), "database opened");
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(checked(&MODELS)?)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Load an account with all of its heroes.
    pub fn load_player(&self, account: &str) -> Result<Option<PlayerRecord>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredPlayer> = r.get().primary(account.to_string())?;
        let Some(stored) = stored else {
            return Ok(None);
        };
        let heroes = self
            .heroes_of(account)?
            .iter()
            .map(StoredHero::to_record)
            .collect();
        Ok(Some(PlayerRecord {
            account: stored.account.clone(),
            active_hero: stored.active_hero(),
            settings: stored.settings()?,
            heroes,
        }))
    }

    /// Store a new account with its first hero, assigning the hero's id.
    pub fn create_player(&self, account: &str, hero: &mut Hero) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let id = match hero.record_id() {
            Some(id) => id,
            None => next_id(&rw)?,
        };
        rw.upsert(stored_hero(account, id, hero))?;
        rw.upsert(StoredPlayer::new(
            account,
            Some(id),
            &PlayerSettings::default(),
        )?)?;
        rw.commit()?;
        hero.set_record_id(id);
        tracing::debug!(account, hero = %hero.key(), "player created");
        Ok(())
    }

    /// Stored skill levels of one hero.
    pub fn load_skills(&self, hero: RecordId) -> Result<Vec<SkillRecord>> {
        Ok(self
            .skills_of(hero)?
            .iter()
            .map(StoredSkill::to_record)
            .collect())
    }

    /// Insert or update a hero's level and XP.
    pub fn save_hero(&self, account: &str, hero: &mut Hero) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let id = match hero.record_id() {
            Some(id) => id,
            None => next_id(&rw)?,
        };
        rw.upsert(stored_hero(account, id, hero))?;
        rw.commit()?;
        hero.set_record_id(id);
        Ok(())
    }

    /// Insert or update the levels of a hero's live non-passive skills.
    pub fn save_skills(&self, hero: &mut Hero) -> Result<()> {
        let owner = hero
            .record_id()
            .ok_or_else(|| Error::NotFound(format!("record for hero {}", hero.key())))?;
        let rw = self.db.rw_transaction()?;
        let mut assigned = Vec::new();
        for (index, skill) in hero.skills().iter().enumerate() {
            if skill.passive() {
                continue;
            }
            let id = match skill.record_id() {
                Some(id) => id,
                None => {
                    let id = next_id(&rw)?;
                    assigned.push((index, id));
                    id
                }
            };
            rw.upsert(StoredSkill {
                id: id.raw(),
                hero_id: owner.raw(),
                key: skill.key().as_str().to_string(),
                level: skill.level(),
            })?;
        }
        rw.commit()?;
        let skills = hero.skills_mut();
        for (index, id) in assigned {
            if let Some(skill) = skills.get_mut(index) {
                skill.set_record_id(id);
            }
        }
        Ok(())
    }

    /// Update an account's active hero and settings.
    pub fn save_player(
        &self,
        account: &str,
        active_hero: Option<RecordId>,
        settings: &PlayerSettings,
    ) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredPlayer::new(account, active_hero, settings)?)?;
        rw.commit()?;
        Ok(())
    }

    /// Store a newly unlocked hero as the account's active hero in one transaction.
    pub fn add_active_hero(
        &self,
        account: &str,
        hero: &mut Hero,
        settings: &PlayerSettings,
    ) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let id = match hero.record_id() {
            Some(id) => id,
            None => next_id(&rw)?,
        };
        rw.upsert(stored_hero(account, id, hero))?;
        rw.upsert(StoredPlayer::new(account, Some(id), settings)?)?;
        rw.commit()?;
        hero.set_record_id(id);
        tracing::debug!(account, hero = %hero.key(), "hero unlocked");
        Ok(())
    }
}

impl Persistence for Store {
    fn load_player(&mut self, account: &str) -> herowars_core::Result<Option<PlayerRecord>> {
        Ok(Store::load_player(self, account)?)
    }

    fn create_player(&mut self, account: &str, hero: &mut Hero) -> herowars_core::Result<()> {
        Ok(Store::create_player(self, account, hero)?)
    }

    fn load_skills(&mut self, hero: RecordId) -> herowars_core::Result<Vec<SkillRecord>> {
        Ok(Store::load_skills(self, hero)?)
    }

    fn save_hero(&mut self, account: &str, hero: &mut Hero) -> herowars_core::Result<()> {
        Ok(Store::save_hero(self, account, hero)?)
    }

    fn save_skills(&mut self, hero: &mut Hero) -> herowars_core::Result<()> {
        Ok(Store::save_skills(self, hero)?)
    }

    fn save_player(
        &mut self,
        account: &str,
        active_hero: Option<RecordId>,
        settings: &PlayerSettings,
    ) -> herowars_core::Result<()> {
        Ok(Store::save_player(self, account, active_hero, settings)?)
    }

    fn add_active_hero(
        &mut self,
        account: &str,
        hero: &mut Hero,
        settings: &PlayerSettings,
    ) -> herowars_core::Result<()> {
        Ok(Store::add_active_hero(self, account, hero, settings)?)
    }
}

fn stored_hero(account: &str, id: RecordId, hero: &Hero) -> StoredHero {
    StoredHero {
        id: id.raw(),
        account: account.to_string(),
        key: hero.key().as_str().to_string(),
        level: hero.level(),
        xp: hero.xp(),
    }
}

/// Hand out the next record id within `rw`.
fn next_id(rw: &RwTransaction<'_>) -> Result<RecordId> {
    let current: Option<StoredSequence> = rw
        .get()
        .primary(StoredSequence::RECORDS.to_string())?;
    let next = current.map_or(1, |s| s.next);
    rw.upsert(StoredSequence {
        name: StoredSequence::RECORDS.to_string(),
        next: next + 1,
    })?;
    Ok(RecordId::new(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use herowars_core::{
        AbilityDef, AbilityKey, Callbacks, Config, Engine, GameTime, HeroType, MaxLevel, PlayerId,
        SkillType, TypeRegistry, UpgradePopup,
    };
    use std::sync::Arc;

    fn paladin() -> HeroType {
        let skill = |key: &str, passive: bool| {
            Arc::new(
                SkillType::new(
                    AbilityDef::new(key, 1, MaxLevel::Finite(8)),
                    passive,
                    1,
                    Callbacks::new(),
                )
                .unwrap(),
            )
        };
        HeroType::new(
            AbilityDef::new("paladin", 0, MaxLevel::Unbounded),
            vec![skill("paladin.condemn", false), skill("paladin.aura", true)],
            Callbacks::new(),
        )
        .unwrap()
    }

    fn hero() -> Hero {
        let mut hero = Hero::new(Arc::new(paladin()), Config::default().xp.curve());
        hero.build_skills();
        hero
    }

    #[test]
    fn test_model_definition_errors_surface() {
        assert!(checked(&MODELS).is_ok());
        let failed: std::result::Result<Models, String> = Err("duplicate primary key".to_string());
        assert!(matches!(
            checked(&failed),
            Err(Error::Database(msg)) if msg.contains("duplicate primary key")
        ));
    }

    #[test]
    fn test_add_active_hero() {
        let store = Store::in_memory().unwrap();
        let mut first = hero();
        store.create_player("steam:1", &mut first).unwrap();

        let assassin = HeroType::new(
            AbilityDef::new("assassin", 0, MaxLevel::Unbounded),
            Vec::new(),
            Callbacks::new(),
        )
        .unwrap();
        let mut second = Hero::new(Arc::new(assassin), Config::default().xp.curve());
        let settings = PlayerSettings {
            upgrade_skills_popup: UpgradePopup::OnLevelUp,
            inspect_to_ult: false,
        };
        store
            .add_active_hero("steam:1", &mut second, &settings)
            .unwrap();

        let record = store.load_player("steam:1").unwrap().unwrap();
        assert_eq!(record.heroes.len(), 2);
        assert_eq!(record.active_hero, second.record_id());
        assert_ne!(second.record_id(), first.record_id());
        assert_eq!(record.settings, settings);
    }

    #[test]
    fn test_create_and_load_player() {
        let store = Store::in_memory().unwrap();
        assert!(store.load_player("steam:1").unwrap().is_none());

        let mut hero = hero();
        hero.set_level(3).unwrap();
        store.create_player("steam:1", &mut hero).unwrap();
        let id = hero.record_id().unwrap();

        let record = store.load_player("steam:1").unwrap().unwrap();
        assert_eq!(record.active_hero, Some(id));
        assert_eq!(record.settings, PlayerSettings::default());
        assert_eq!(record.heroes.len(), 1);
        assert_eq!(record.heroes[0].key.as_str(), "paladin");
        assert_eq!(record.heroes[0].level, 3);
    }

    #[test]
    fn test_accounts_with_shared_prefix_stay_apart() {
        let store = Store::in_memory().unwrap();
        store.create_player("steam:1", &mut hero()).unwrap();
        store.create_player("steam:10", &mut hero()).unwrap();

        let short = store.load_player("steam:1").unwrap().unwrap();
        assert_eq!(short.heroes.len(), 1);
        assert_ne!(
            short.heroes[0].id,
            store.load_player("steam:10").unwrap().unwrap().heroes[0].id
        );
    }

    #[test]
    fn test_save_skills_updates_in_place() {
        let store = Store::in_memory().unwrap();
        let mut hero = hero();
        store.create_player("steam:1", &mut hero).unwrap();

        hero.skills_mut()[0].set_level(2).unwrap();
        store.save_skills(&mut hero).unwrap();
        let skill_id = hero.skills()[0].record_id().unwrap();
        assert!(hero.skills()[1].record_id().is_none());

        hero.skills_mut()[0].set_level(4).unwrap();
        store.save_skills(&mut hero).unwrap();
        assert_eq!(hero.skills()[0].record_id(), Some(skill_id));

        let skills = store.load_skills(hero.record_id().unwrap()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].key.as_str(), "paladin.condemn");
        assert_eq!(skills[0].level, 4);
    }

    #[test]
    fn test_save_skills_requires_saved_hero() {
        let store = Store::in_memory().unwrap();
        let mut hero = hero();
        assert!(matches!(
            store.save_skills(&mut hero),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_settings_and_last_seen() {
        let store = Store::in_memory().unwrap();
        let mut hero = hero();
        store.create_player("steam:1", &mut hero).unwrap();

        let settings = PlayerSettings {
            upgrade_skills_popup: UpgradePopup::OnLevelUp,
            inspect_to_ult: false,
        };
        store
            .save_player("steam:1", hero.record_id(), &settings)
            .unwrap();
        let record = store.load_player("steam:1").unwrap().unwrap();
        assert_eq!(record.settings, settings);
        assert!(store.last_seen("steam:1").unwrap().is_some());
        assert!(store.last_seen("steam:2").unwrap().is_none());
    }

    #[test]
    fn test_engine_progress_survives_reconnect() {
        let registry = Arc::new(TypeRegistry::new([paladin()]).unwrap());
        let mut engine = Engine::new(
            Arc::clone(&registry),
            Config::default(),
            Box::new(Store::in_memory().unwrap()),
        );
        let player = PlayerId(3);
        let now = GameTime::ZERO;

        engine.connect(player, "steam:1", false, now).unwrap();
        engine.set_hero_level(player, 4, now).unwrap();
        engine
            .upgrade_skill(player, &AbilityKey::new("paladin.condemn"), now)
            .unwrap();
        engine.disconnect(player).unwrap();

        engine.connect(player, "steam:1", false, now).unwrap();
        let hero = engine.player(player).unwrap().hero().unwrap();
        assert_eq!(hero.level(), 4);
        assert_eq!(hero.skills()[0].level(), 1);
        assert_eq!(engine.skill_points(player).unwrap(), 3);
    }
}
