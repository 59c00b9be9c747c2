//! Account models for database storage.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use herowars_core::{PlayerSettings, RecordId};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored account row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredPlayer {
    /// Primary key - account identifier (SteamID or similar).
    #[primary_key]
    pub account: String,
    /// Record id of the active hero.
    pub active_hero: Option<u64>,
    /// Serialized player settings.
    pub settings: Vec<u8>,
    /// Last save, milliseconds since the Unix epoch.
    pub last_seen: i64,
}

impl StoredPlayer {
    /// Create a row stamped with the current time.
    pub fn new(
        account: &str,
        active_hero: Option<RecordId>,
        settings: &PlayerSettings,
    ) -> Result<Self> {
        let settings =
            bincode::serialize(settings).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            account: account.to_string(),
            active_hero: active_hero.map(|id| id.raw()),
            settings,
            last_seen: Utc::now().timestamp_millis(),
        })
    }

    /// Decode the stored settings.
    pub fn settings(&self) -> Result<PlayerSettings> {
        bincode::deserialize(&self.settings).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn active_hero(&self) -> Option<RecordId> {
        self.active_hero.map(RecordId::new)
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_seen)
    }
}

/// Record id allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Always "records" - single row.
    #[primary_key]
    pub name: String,
    /// Next id to hand out.
    pub next: u64,
}

impl StoredSequence {
    pub const RECORDS: &'static str = "records";
}
