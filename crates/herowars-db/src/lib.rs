//! Herowars DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Accounts with their active hero and settings
//! - Hero progress (level and XP) per account
//! - Skill levels per hero
//!
//! [`Store`] implements [`herowars_core::Persistence`], so it can be handed
//! straight to the engine.

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use models::{StoredHero, StoredPlayer, StoredSkill};
pub use store::Store;
