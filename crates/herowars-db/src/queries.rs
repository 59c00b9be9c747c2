//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use chrono::{DateTime, Utc};
use herowars_core::RecordId;

impl Store {
    /// All heroes stored for an account, in id order.
    pub fn heroes_of(&self, account: &str) -> Result<Vec<StoredHero>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredHero>(StoredHeroKey::account)?;
        let iter = scan.start_with(account)?;
        let heroes: std::result::Result<Vec<StoredHero>, _> = iter.collect();
        let mut heroes: Vec<StoredHero> = heroes
            .map_err(|e| Error::Database(e.to_string()))?
            .into_iter()
            // start_with matches prefixes, "steam:1" would also match "steam:10"
            .filter(|h| h.account == account)
            .collect();
        heroes.sort_by_key(|h| h.id);
        Ok(heroes)
    }

    /// All skills stored for a hero.
    pub fn skills_of(&self, hero: RecordId) -> Result<Vec<StoredSkill>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredSkill>(StoredSkillKey::hero_id)?;
        let iter = scan.start_with(hero.raw())?;
        let skills: std::result::Result<Vec<StoredSkill>, _> = iter.collect();
        Ok(skills
            .map_err(|e| Error::Database(e.to_string()))?
            .into_iter()
            .filter(|s| s.hero_id == hero.raw())
            .collect())
    }

    /// When an account was last saved.
    pub fn last_seen(&self, account: &str) -> Result<Option<DateTime<Utc>>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredPlayer> = r.get().primary(account.to_string())?;
        Ok(stored.and_then(|p| p.last_seen()))
    }

    /// Number of stored accounts.
    pub fn player_count(&self) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredPlayer>()?;
        let iter = scan.all()?;
        Ok(iter.count())
    }

    /// Remove an account with all of its heroes and skills.
    pub fn delete_player(&self, account: &str) -> Result<()> {
        let heroes = self.heroes_of(account)?;
        let mut skills = Vec::new();
        for hero in &heroes {
            skills.extend(self.skills_of(RecordId::new(hero.id))?);
        }

        let rw = self.db.rw_transaction()?;
        for skill in skills {
            rw.remove(skill)?;
        }
        for hero in heroes {
            rw.remove(hero)?;
        }
        let player = rw
            .get()
            .primary::<StoredPlayer>(account.to_string())?
            .ok_or_else(|| Error::NotFound(format!("account {}", account)))?;
        rw.remove(player)?;
        rw.commit()?;
        tracing::info!(account, "player deleted");
        Ok(())
    }
}
