//! Skill instances
//!
//! A skill instance lives only while its hero is the player's active hero.
//! It is rebuilt from the hero type on every activation and its level is
//! restored from persistence.

use crate::ability::{AbilityDef, SkillType};
use crate::error::{Illegal, Result};
use crate::identity::{AbilityKey, RecordId};
use crate::level::LevelChange;
use crate::time::{GameTime, Remaining};
use crate::timer::{self, Timers};
use crate::value::EventArgs;
use std::sync::Arc;

/// A player's instance of a skill type
#[derive(Debug)]
pub struct Skill {
    ty: Arc<SkillType>,
    level: u32,
    record_id: Option<RecordId>,
    /// Cooldowns and other named timers
    pub timers: Timers,
    /// Scratch values tracked by the skill's callbacks (e.g. channel handles)
    pub state: EventArgs,
}

impl Skill {
    /// Create an unlearned skill
    pub fn new(ty: Arc<SkillType>) -> Self {
        Self {
            ty,
            level: 0,
            record_id: None,
            timers: Timers::new(),
            state: EventArgs::new(),
        }
    }

    /// The skill's type
    pub fn ty(&self) -> &Arc<SkillType> {
        &self.ty
    }

    /// The type's shared definition
    pub fn def(&self) -> &AbilityDef {
        &self.ty.def
    }

    /// The skill's key
    pub fn key(&self) -> &AbilityKey {
        &self.ty.def.key
    }

    /// Current level (always 0 for passives)
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Check whether the skill is passive
    pub fn passive(&self) -> bool {
        self.ty.passive
    }

    /// Check whether callbacks fire for this skill
    pub fn is_active(&self) -> bool {
        self.level > 0 || self.ty.passive
    }

    /// Check whether the skill sits at its level cap
    pub fn is_maxed(&self) -> bool {
        self.ty.def.max_level.is_reached(self.level)
    }

    /// Hero level needed for the next skill level
    pub fn next_required_level(&self) -> u32 {
        self.ty.next_required_level(self.level)
    }

    /// Assign a level
    ///
    /// Out-of-range values are rejected, never clamped. Passive skills only
    /// accept level 0.
    pub fn set_level(&mut self, level: u32) -> Result<LevelChange> {
        self.ty.def.max_level.check(level)?;
        if self.ty.passive && level > 0 {
            return Err(Illegal::Passive.into());
        }
        let change = LevelChange::new(self.level, level);
        self.level = level;
        Ok(change)
    }

    /// Storage identifier, once persisted
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Attach the storage identifier
    pub fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    /// Resolve variable `name` at the current level
    pub fn current(&self, name: &str) -> Result<f64> {
        self.ty.def.current(name, self.level)
    }

    /// Check-and-arm the timer `name` with the variable of the same name
    ///
    /// Returns zero when the skill was off cooldown (and is now on it),
    /// otherwise the time left without touching the timer.
    pub fn cooldown(&mut self, name: &str, now: GameTime) -> Result<Remaining> {
        timer::cooldown(&mut self.timers, &self.ty.def, self.level, name, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Callbacks;
    use crate::error::Error;
    use crate::level::MaxLevel;
    use crate::variable::Variable;
    use std::time::Duration;

    fn skill_type(passive: bool) -> Arc<SkillType> {
        let def = AbilityDef::new("assassin.total_vanish", 1, MaxLevel::Finite(4))
            .with_variable("cooldown", Variable::PerLevel { base: 30.0, per_level: -5.0 });
        Arc::new(SkillType::new(def, passive, 2, Callbacks::new()).unwrap())
    }

    #[test]
    fn test_set_level_rejects_out_of_range() {
        let mut skill = Skill::new(skill_type(false));
        assert!(skill.set_level(4).is_ok());
        assert!(matches!(
            skill.set_level(5),
            Err(Error::LevelOutOfRange { level: 5, .. })
        ));
        assert_eq!(skill.level(), 4);
    }

    #[test]
    fn test_passive_is_active_at_level_zero() {
        let mut skill = Skill::new(skill_type(true));
        assert!(skill.is_active());
        assert!(matches!(
            skill.set_level(1),
            Err(Error::Illegal(Illegal::Passive))
        ));
        assert_eq!(skill.level(), 0);
    }

    #[test]
    fn test_unlearned_skill_is_inactive() {
        let mut skill = Skill::new(skill_type(false));
        assert!(!skill.is_active());
        skill.set_level(1).unwrap();
        assert!(skill.is_active());
    }

    #[test]
    fn test_cooldown_twice_same_instant() {
        let mut skill = Skill::new(skill_type(false));
        skill.set_level(2).unwrap();
        let now = GameTime::from_secs(10);

        assert_eq!(skill.cooldown("cooldown", now).unwrap(), Remaining::ZERO);
        assert_eq!(
            skill.cooldown("cooldown", now).unwrap(),
            Remaining::Finite(Duration::from_secs(20))
        );
        assert_eq!(
            skill.cooldown("cooldown", GameTime::from_secs(25)).unwrap(),
            Remaining::Finite(Duration::from_secs(5))
        );
    }
}
