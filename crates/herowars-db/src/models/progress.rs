//! Hero and skill progress models for database storage.

use herowars_core::{AbilityKey, HeroRecord, RecordId, SkillRecord};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored hero progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredHero {
    /// Primary key - record id.
    #[primary_key]
    pub id: u64,
    /// Owning account.
    #[secondary_key]
    pub account: String,
    /// Hero type key.
    pub key: String,
    pub level: u32,
    pub xp: u64,
}

impl StoredHero {
    pub fn to_record(&self) -> HeroRecord {
        HeroRecord {
            id: RecordId::new(self.id),
            key: AbilityKey::new(self.key.clone()),
            level: self.level,
            xp: self.xp,
        }
    }
}

/// Stored skill level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredSkill {
    /// Primary key - record id.
    #[primary_key]
    pub id: u64,
    /// Record id of the owning hero.
    #[secondary_key]
    pub hero_id: u64,
    /// Skill type key.
    pub key: String,
    pub level: u32,
}

impl StoredSkill {
    pub fn to_record(&self) -> SkillRecord {
        SkillRecord {
            id: RecordId::new(self.id),
            key: AbilityKey::new(self.key.clone()),
            level: self.level,
        }
    }
}
