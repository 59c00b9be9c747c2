//! Herowars Core - hero progression and ability-activation engine
//!
//! This crate provides the game-agnostic core of a hero/skill overlay:
//! - Hero and skill type definitions with level-dependent variables
//! - Hero and skill instances with XP, levels and named cooldown timers
//! - Skill-point budget and upgrade legality
//! - Event routing from raw game events to the active hero and its skills
//! - Reactions (XP rewards, persistence flushes, menu popups)
//! - The persistence trait and an in-memory store
//!
//! The engine never touches the game world. Every operation returns an
//! [`UpdateResult`] whose [`Cmd`]s the host executes.
//!
//! ## Example
//!
//! ```
//! use herowars_core::*;
//! use std::sync::Arc;
//!
//! let paladin = HeroType::new(
//!     AbilityDef::new("paladin", 0, MaxLevel::Unbounded),
//!     Vec::new(),
//!     Callbacks::new(),
//! )?;
//! let registry = TypeRegistry::new([paladin])?;
//! let mut engine = Engine::new(
//!     Arc::new(registry),
//!     Config::default(),
//!     Box::new(MemoryStore::new()),
//! );
//! engine.connect(PlayerId(1), "steam:1", false, GameTime::ZERO)?;
//! engine.grant_xp(PlayerId(1), 100, GameTime::ZERO)?;
//! assert_eq!(engine.total_level(PlayerId(1))?, 1);
//! # Ok::<(), herowars_core::Error>(())
//! ```

mod ability;
mod budget;
mod callback;
mod cmd;
pub mod config;
pub mod display;
mod engine;
mod error;
pub mod event;
mod hero;
mod identity;
mod level;
pub mod persistence;
mod player;
pub mod reaction;
mod registry;
mod rng;
mod routing;
mod skill;
pub mod time;
mod timer;
mod value;
mod variable;

pub use ability::{AbilityDef, Callbacks, HeroType, Localized, SkillType, INIT_CALLBACK};
pub use budget::{
    can_downgrade, can_upgrade, check_downgrade, check_upgrade, downgrade, reset_skills,
    skill_points, upgrade,
};
pub use callback::{
    hero_callback, skill_callback, Env, HeroCallback, HeroCtx, Outbox, SkillCallback, SkillCtx,
};
pub use cmd::{Cmd, Menu};
pub use config::{Config, XpConfig};
pub use display::{HeroInfo, HeroRow, SkillRow};
pub use engine::{Engine, UpdateResult};
pub use error::{Error, Illegal, Result};
pub use event::{DuoOrder, DuoRoute, DuoRoutes, GameEvent, Notification};
pub use hero::{Hero, HeroView, XpCurve};
pub use identity::{AbilityKey, EventName, PlayerId, RecordId};
pub use level::{LevelChange, MaxLevel};
pub use persistence::{HeroRecord, MemoryStore, Persistence, PlayerRecord, SkillRecord};
pub use player::{Player, PlayerSettings, Roster, UpgradePopup};
pub use reaction::{Phase, Reaction, ReactionCtx};
pub use registry::TypeRegistry;
pub use rng::GameRng;
pub use skill::Skill;
pub use time::{GameTime, Remaining};
pub use timer::{TimerState, Timers};
pub use value::{EventArgs, Value};
pub use variable::{Variable, VariableRange};
