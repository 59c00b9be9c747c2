//! RON content loader
//!
//! Every hero lives in its own directory under the content root:
//!
//! ```text
//! heroes/
//!   paladin/
//!     data.ron      levels, variables, skill data
//!     strings.ron   localized names and messages
//! ```
//!
//! The directory name selects the hero's behavior in the
//! [`BehaviorCatalog`]. Skill behaviors without a strings record are skipped.

use crate::catalog::{BehaviorCatalog, HeroBehavior};
use crate::error::{Error, Result};
use crate::schema::{HeroData, HeroStrings};
use herowars_core::{AbilityDef, AbilityKey, HeroType, SkillType, TypeRegistry};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// File holding a hero's levels and variables
pub const DATA_FILE: &str = "data.ron";
/// File holding a hero's display strings
pub const STRINGS_FILE: &str = "strings.ron";

/// Loader for hero content directories
pub struct Loader<'a> {
    catalog: &'a BehaviorCatalog,
    heroes: Vec<HeroType>,
    /// Hero key to the directory it came from
    sources: IndexMap<AbilityKey, String>,
}

impl<'a> Loader<'a> {
    /// Create a loader binding content to `catalog`
    pub fn new(catalog: &'a BehaviorCatalog) -> Self {
        Self {
            catalog,
            heroes: Vec::new(),
            sources: IndexMap::new(),
        }
    }

    /// Load one hero from the contents of its two files
    pub fn load_hero_str(&mut self, dir_name: &str, data: &str, strings: &str) -> Result<()> {
        let data: HeroData = ron::from_str(data)?;
        let strings: HeroStrings = ron::from_str(strings)?;
        let behavior = self
            .catalog
            .get(dir_name)
            .ok_or_else(|| Error::UnresolvedBehavior(dir_name.to_string()))?;

        let hero = build_hero(dir_name, data, strings, behavior)?;
        let key = hero.def.key.clone();
        if let Some(other) = self.sources.get(&key) {
            return Err(Error::DuplicateDefinition(format!(
                "hero '{}' defined by both '{}' and '{}'",
                key, other, dir_name
            )));
        }
        tracing::debug!(hero = %key, skills = hero.skill_types.len(), "hero loaded");
        self.sources.insert(key, dir_name.to_string());
        self.heroes.push(hero);
        Ok(())
    }

    /// Load one hero directory
    pub fn load_hero_dir(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidSchema(format!("unusable hero directory {:?}", path)))?;
        let data = fs::read_to_string(path.join(DATA_FILE))?;
        let strings = fs::read_to_string(path.join(STRINGS_FILE))?;
        self.load_hero_str(dir_name, &data, &strings)
    }

    /// Load every hero directory under `root`
    ///
    /// Directories are visited in name order so load order (the tie-break
    /// between heroes with equal required levels) is reproducible.
    pub fn load_directory(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref();

        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", root),
            )));
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        for dir in dirs {
            self.load_hero_dir(&dir)?;
        }
        Ok(())
    }

    /// Number of heroes loaded so far
    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }

    /// Finish loading and build the registry
    pub fn finish(self) -> Result<TypeRegistry> {
        Ok(TypeRegistry::new(self.heroes)?)
    }
}

/// Load every hero under `root` into a registry
pub fn load(root: impl AsRef<Path>, catalog: &BehaviorCatalog) -> Result<TypeRegistry> {
    let root = root.as_ref();
    let mut loader = Loader::new(catalog);
    loader.load_directory(root)?;
    tracing::info!(root = %root.display(), heroes = loader.len(), "hero content loaded");
    loader.finish()
}

fn build_hero(
    dir_name: &str,
    data: HeroData,
    strings: HeroStrings,
    behavior: &HeroBehavior,
) -> Result<HeroType> {
    let HeroData {
        key,
        author,
        required_level,
        max_level,
        variables,
        skill_defaults,
        mut skills,
    } = data;
    let HeroStrings {
        strings: hero_strings,
        skills: mut skill_strings,
    } = strings;

    let key = key.unwrap_or_else(|| dir_name.to_string());
    if !hero_strings.contains_key("name") {
        return Err(Error::MissingField(format!("{}: strings.name", key)));
    }

    let mut skill_types = Vec::with_capacity(behavior.skills.len());
    for (name, callbacks) in &behavior.skills {
        let Some(strings) = skill_strings.shift_remove(name) else {
            tracing::warn!(hero = %key, skill = %name, "skill behavior has no strings record, skipped");
            continue;
        };
        let skill_data = skills
            .shift_remove(name)
            .unwrap_or_default()
            .layered_over(&skill_defaults);
        let skill_key = skill_data
            .key
            .clone()
            .unwrap_or_else(|| format!("{}.{}", dir_name, name));

        let mut def = AbilityDef::new(
            skill_key,
            skill_data.required_level(),
            skill_data.max_level(),
        );
        def.author = skill_data.author.clone();
        def.strings = strings;
        def.variables = skill_data.variables.clone();
        let skill = SkillType::new(
            def,
            skill_data.passive(),
            skill_data.level_interval(),
            callbacks.clone(),
        )?;
        skill_types.push(Arc::new(skill));
    }
    for name in skills.keys() {
        tracing::warn!(hero = %key, skill = %name, "skill data without behavior ignored");
    }

    let mut def = AbilityDef::new(key, required_level, max_level);
    def.author = author;
    def.strings = hero_strings;
    def.variables = variables;
    Ok(HeroType::new(def, skill_types, behavior.callbacks.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herowars_core::{hero_callback, skill_callback, Callbacks, MaxLevel, Variable};

    const PALADIN_DATA: &str = r#"
    (
        author: Some("Mahi"),
        skill_defaults: (max_level: Some(Finite(8)), level_interval: Some(2)),
        skills: {
            "condemn": (
                variables: { "chance": (base: 6.0, per_level: 2.0) },
            ),
            "god_mode": (
                required_level: Some(6),
                max_level: Some(Finite(1)),
                variables: { "cooldown": 20.0, "duration": 3.0 },
            ),
            "unused": (),
        },
    )
    "#;

    const PALADIN_STRINGS: &str = r#"
    (
        strings: { "name": { "en": "Paladin" } },
        skills: {
            "condemn": { "name": { "en": "Condemn" } },
            "god_mode": { "name": { "en": "God Mode" } },
        },
    )
    "#;

    fn paladin_behavior() -> HeroBehavior {
        HeroBehavior::new()
            .on("player_spawn", hero_callback(|_| Ok(())))
            .skill(
                "condemn",
                Callbacks::new().on("player_attack", skill_callback(|_| Ok(()))),
            )
            .skill("martyr", Callbacks::new())
            .skill(
                "god_mode",
                Callbacks::new().on("player_ultimate", skill_callback(|_| Ok(()))),
            )
    }

    fn catalog() -> BehaviorCatalog {
        BehaviorCatalog::new().with("paladin", paladin_behavior())
    }

    #[test]
    fn test_load_hero() {
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        loader
            .load_hero_str("paladin", PALADIN_DATA, PALADIN_STRINGS)
            .unwrap();
        let registry = loader.finish().unwrap();

        let hero = registry.require(&AbilityKey::new("paladin")).unwrap();
        assert_eq!(hero.def.author.as_deref(), Some("Mahi"));
        assert_eq!(hero.def.max_level, MaxLevel::Unbounded);
        assert!(hero.callbacks.handles("player_spawn"));

        // martyr has no strings record and is skipped
        let keys: Vec<_> = hero
            .skill_types
            .iter()
            .map(|s| s.def.key.as_str())
            .collect();
        assert_eq!(keys, ["paladin.condemn", "paladin.god_mode"]);

        let condemn = &hero.skill_types[0];
        assert_eq!(condemn.def.required_level, 1);
        assert_eq!(condemn.def.max_level, MaxLevel::Finite(8));
        assert_eq!(condemn.level_interval, 2);
        assert_eq!(condemn.def.current("chance", 3).unwrap(), 12.0);

        let god_mode = &hero.skill_types[1];
        assert_eq!(god_mode.def.required_level, 6);
        assert_eq!(god_mode.def.max_level, MaxLevel::Finite(1));
        assert_eq!(
            god_mode.def.variables["cooldown"],
            Variable::Constant(20.0)
        );
        assert_eq!(
            god_mode.def.name().and_then(|n| n.text("en")),
            Some("God Mode")
        );
    }

    #[test]
    fn test_explicit_keys() {
        let data = r#"(key: Some("holy_knight"), skills: { "condemn": (key: Some("smite")) })"#;
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        loader
            .load_hero_str("paladin", data, PALADIN_STRINGS)
            .unwrap();
        let registry = loader.finish().unwrap();
        let hero = registry.first().unwrap();
        assert_eq!(hero.def.key.as_str(), "holy_knight");
        assert_eq!(hero.skill_types[0].def.key.as_str(), "smite");
    }

    #[test]
    fn test_unresolved_behavior() {
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        let err = loader
            .load_hero_str("pirate", "()", PALADIN_STRINGS)
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedBehavior(name) if name == "pirate"));
    }

    #[test]
    fn test_missing_name() {
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        let err = loader
            .load_hero_str("paladin", "()", r#"(strings: {})"#)
            .unwrap_err();
        assert!(matches!(err, Error::MissingField(_)));
    }

    #[test]
    fn test_duplicate_hero_key() {
        let catalog = catalog().with("paladin_copy", paladin_behavior());
        let mut loader = Loader::new(&catalog);
        loader
            .load_hero_str("paladin", "()", PALADIN_STRINGS)
            .unwrap();
        let err = loader
            .load_hero_str("paladin_copy", r#"(key: Some("paladin"))"#, PALADIN_STRINGS)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(_)));
    }

    #[test]
    fn test_reserved_event_name() {
        let behavior = HeroBehavior::new().skill(
            "condemn",
            Callbacks::new().on("_tick", skill_callback(|_| Ok(()))),
        );
        let catalog = BehaviorCatalog::new().with("paladin", behavior);
        let mut loader = Loader::new(&catalog);
        let err = loader
            .load_hero_str("paladin", "()", PALADIN_STRINGS)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(herowars_core::Error::Definition(ref msg)) if msg.contains("paladin.condemn") && msg.contains("_tick")
        ));
    }

    #[test]
    fn test_invalid_variable_is_core_error() {
        let data = r#"(skills: { "condemn": (variables: { "chance": [] }) })"#;
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        let err = loader
            .load_hero_str("paladin", data, PALADIN_STRINGS)
            .unwrap_err();
        assert!(matches!(err, Error::Core(herowars_core::Error::Definition(_))));
    }

    #[test]
    fn test_bad_ron() {
        let catalog = catalog();
        let mut loader = Loader::new(&catalog);
        let err = loader
            .load_hero_str("paladin", "(required_level: \"high\")", PALADIN_STRINGS)
            .unwrap_err();
        assert!(matches!(err, Error::Ron(_)));
    }

    #[test]
    fn test_missing_directory() {
        let catalog = catalog();
        let err = load("/nonexistent/herowars/heroes", &catalog).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
