//! Herowars Script - RON content loader and behavior catalog
//!
//! Loads hero definitions from content directories:
//! - `data.ron`: levels, variables and per-skill data
//! - `strings.ron`: localized names, descriptions and messages
//!
//! Callbacks are not part of the content. They are registered in code in a
//! [`BehaviorCatalog`] and bound to content by directory name.

mod catalog;
mod error;
mod loader;
mod schema;

pub use catalog::{BehaviorCatalog, HeroBehavior};
pub use error::{Error, Result};
pub use loader::{load, Loader, DATA_FILE, STRINGS_FILE};
pub use schema::{HeroData, HeroStrings, SkillData};
