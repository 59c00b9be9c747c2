//! `data.ron` schema: levels and variables of a hero and its skills

use herowars_core::{MaxLevel, SkillType, Variable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Contents of a hero's `data.ron`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroData {
    /// Storage key, defaults to the directory name
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub required_level: u32,
    #[serde(default = "unbounded")]
    pub max_level: MaxLevel,
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    /// Applied under every entry of `skills`
    #[serde(default)]
    pub skill_defaults: SkillData,
    /// Per-skill data by behavior name
    #[serde(default)]
    pub skills: IndexMap<String, SkillData>,
}

fn unbounded() -> MaxLevel {
    MaxLevel::Unbounded
}

/// Data of one skill; every field is optional so it can layer over defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillData {
    pub key: Option<String>,
    pub author: Option<String>,
    pub required_level: Option<u32>,
    pub max_level: Option<MaxLevel>,
    pub level_interval: Option<u32>,
    pub passive: Option<bool>,
    pub variables: IndexMap<String, Variable>,
}

impl SkillData {
    /// Fill unset fields from `defaults`
    ///
    /// Variables merge by name with this skill's entries winning.
    pub fn layered_over(self, defaults: &SkillData) -> SkillData {
        let mut variables = defaults.variables.clone();
        variables.extend(self.variables);
        SkillData {
            key: self.key.or_else(|| defaults.key.clone()),
            author: self.author.or_else(|| defaults.author.clone()),
            required_level: self.required_level.or(defaults.required_level),
            max_level: self.max_level.or(defaults.max_level),
            level_interval: self.level_interval.or(defaults.level_interval),
            passive: self.passive.or(defaults.passive),
            variables,
        }
    }

    pub fn required_level(&self) -> u32 {
        self.required_level
            .unwrap_or(SkillType::DEFAULT_REQUIRED_LEVEL)
    }

    pub fn max_level(&self) -> MaxLevel {
        self.max_level
            .unwrap_or(MaxLevel::Finite(SkillType::DEFAULT_MAX_LEVEL))
    }

    pub fn level_interval(&self) -> u32 {
        self.level_interval
            .unwrap_or(SkillType::DEFAULT_LEVEL_INTERVAL)
    }

    pub fn passive(&self) -> bool {
        self.passive.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_data_ron() {
        let ron_str = r#"
        (
            author: Some("Mahi"),
            required_level: 5,
            skill_defaults: (max_level: Some(Finite(4)), level_interval: Some(3)),
            skills: {
                "condemn": (
                    variables: {
                        "chance": (base: 6.0, per_level: 2.0),
                        "duration": [0.5, 0.75, 1.0],
                    },
                ),
                "saints_cloak": (passive: Some(true), variables: { "health": 25.0 }),
            },
        )
        "#;

        let data: HeroData = ron::from_str(ron_str).unwrap();
        assert_eq!(data.key, None);
        assert_eq!(data.required_level, 5);
        assert_eq!(data.max_level, MaxLevel::Unbounded);
        assert_eq!(data.skills.len(), 2);
        assert_eq!(
            data.skills["condemn"].variables["duration"],
            Variable::Table(vec![0.5, 0.75, 1.0])
        );
        assert_eq!(
            data.skills["saints_cloak"].variables["health"],
            Variable::Constant(25.0)
        );
    }

    #[test]
    fn test_layered_over_defaults() {
        let mut defaults = SkillData {
            max_level: Some(MaxLevel::Finite(4)),
            passive: Some(false),
            ..SkillData::default()
        };
        defaults
            .variables
            .insert("cooldown".to_string(), Variable::Constant(20.0));
        defaults
            .variables
            .insert("duration".to_string(), Variable::Constant(1.0));

        let mut own = SkillData {
            max_level: Some(MaxLevel::Finite(1)),
            ..SkillData::default()
        };
        own.variables
            .insert("duration".to_string(), Variable::Constant(3.0));

        let merged = own.layered_over(&defaults);
        assert_eq!(merged.max_level(), MaxLevel::Finite(1));
        assert!(!merged.passive());
        assert_eq!(merged.required_level(), SkillType::DEFAULT_REQUIRED_LEVEL);
        assert_eq!(merged.level_interval(), SkillType::DEFAULT_LEVEL_INTERVAL);
        assert_eq!(merged.variables["cooldown"], Variable::Constant(20.0));
        assert_eq!(merged.variables["duration"], Variable::Constant(3.0));
    }
}
