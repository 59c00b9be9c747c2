//! Schema definitions for hero content files

pub mod hero;
pub mod strings;

pub use hero::{HeroData, SkillData};
pub use strings::HeroStrings;
