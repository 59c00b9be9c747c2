//! Hero instances and the leveling state machine
//!
//! All XP-driven progression flows through [`Hero::set_xp`]. The machine only
//! reports the old and new level; level-up side effects (popups, persistence,
//! follow-up events) belong to the caller.

use crate::ability::{AbilityDef, HeroType};
use crate::error::{Error, Result};
use crate::identity::{AbilityKey, RecordId};
use crate::level::{LevelChange, MaxLevel};
use crate::skill::Skill;
use crate::time::{GameTime, Remaining};
use crate::timer::{self, Timers};
use crate::value::EventArgs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Required-XP curve: `base` to leave level 0, then `base + level * per_level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpCurve {
    pub base: u64,
    pub per_level: u64,
}

impl XpCurve {
    /// Create a curve; a zero base is raised to 1 so leveling always terminates
    pub fn new(base: u64, per_level: u64) -> Self {
        Self {
            base: base.max(1),
            per_level,
        }
    }

    /// XP needed to advance from `level`, or `None` at the cap
    ///
    /// `u32::MAX` acts as a cap for unbounded heroes.
    pub fn required(&self, level: u32, max: MaxLevel) -> Option<u64> {
        if max.is_reached(level) || level == u32::MAX {
            return None;
        }
        let base = self.base.max(1);
        if level == 0 {
            return Some(base);
        }
        Some(base.saturating_add(u64::from(level).saturating_mul(self.per_level)))
    }

    /// Spend `xp` on levels starting at `level`
    ///
    /// Returns the reached level and the XP left over.
    pub fn advance(&self, level: u32, xp: u64, max: MaxLevel) -> (u32, u64) {
        let cap = max.as_finite().unwrap_or(u32::MAX);
        let (mut low, mut high) = (0, cap.saturating_sub(level));
        while low < high {
            let mid = low + (high - low).div_ceil(2);
            if self.cost(level, mid) <= u128::from(xp) {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        let left = u128::from(xp).saturating_sub(self.cost(level, low));
        (level + low, u64::try_from(left).unwrap_or(0))
    }

    /// Total XP to climb `steps` levels from `from`
    fn cost(&self, from: u32, steps: u32) -> u128 {
        let steps = u128::from(steps);
        let base = u128::from(self.base.max(1));
        let levels = steps * u128::from(from) + steps * steps.saturating_sub(1) / 2;
        (steps * base).saturating_add(u128::from(self.per_level).saturating_mul(levels))
    }
}

impl Default for XpCurve {
    fn default() -> Self {
        Self::new(80, 15)
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A hero owned by a player
#[derive(Debug)]
pub struct Hero {
    ty: Arc<HeroType>,
    level: u32,
    xp: u64,
    curve: XpCurve,
    record_id: Option<RecordId>,
    skills: Vec<Skill>,
    /// Hero-level timers (shared cooldowns, ultimates driven by the hero)
    pub timers: Timers,
    /// Scratch values tracked by the hero's callbacks
    pub state: EventArgs,
}

impl Hero {
    /// Create a fresh hero at level 0 with no XP and no live skills
    pub fn new(ty: Arc<HeroType>, curve: XpCurve) -> Self {
        Self {
            ty,
            level: 0,
            xp: 0,
            curve,
            record_id: None,
            skills: Vec::new(),
            timers: Timers::new(),
            state: EventArgs::new(),
        }
    }

    /// Rebuild a hero from stored progress
    ///
    /// The level must be in range. Stored XP at or above the requirement is
    /// dropped rather than converted into levels.
    pub fn restore(
        ty: Arc<HeroType>,
        curve: XpCurve,
        id: RecordId,
        level: u32,
        xp: u64,
    ) -> Result<Self> {
        let mut hero = Self::new(ty, curve);
        hero.record_id = Some(id);
        hero.xp = xp;
        hero.set_level(level)?;
        Ok(hero)
    }

    pub fn ty(&self) -> &Arc<HeroType> {
        &self.ty
    }

    pub fn def(&self) -> &AbilityDef {
        &self.ty.def
    }

    pub fn key(&self) -> &AbilityKey {
        &self.ty.def.key
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn max_level(&self) -> MaxLevel {
        self.ty.def.max_level
    }

    pub fn curve(&self) -> XpCurve {
        self.curve
    }

    /// XP needed to reach the next level, `None` at the cap
    pub fn required_xp(&self) -> Option<u64> {
        self.curve.required(self.level, self.max_level())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    /// Assign XP and carry over into levels in either direction
    ///
    /// Negative values drain lower levels, each refunding the requirement of
    /// the level it drops to. Draining past level 0 fails with
    /// [`Error::XpUnderflow`], leaving the level untouched and XP at 0.
    /// Gains stop at the cap with XP pinned to 0.
    pub fn set_xp(&mut self, xp: i64) -> Result<LevelChange> {
        let max = self.max_level();
        let old_level = self.level;
        let mut level = self.level;
        let mut xp = xp;

        while xp < 0 {
            if level == 0 {
                self.xp = 0;
                return Err(Error::XpUnderflow { level: old_level });
            }
            level -= 1;
            let refund = self.curve.required(level, max).map_or(i64::MAX, to_signed);
            xp = xp.saturating_add(refund);
        }

        let (level, mut left) = self
            .curve
            .advance(level, u64::try_from(xp).unwrap_or(0), max);
        if self.curve.required(level, max).is_none() {
            left = 0;
        }

        self.level = level;
        self.xp = left;
        Ok(LevelChange::new(old_level, level))
    }

    /// Add (or with a negative amount, remove) XP
    pub fn add_xp(&mut self, amount: i64) -> Result<LevelChange> {
        self.set_xp(to_signed(self.xp).saturating_add(amount))
    }

    /// Assign a level directly, without running the XP loops
    ///
    /// XP is zeroed when it already meets the new level's requirement or when
    /// the new level is the cap.
    pub fn set_level(&mut self, level: u32) -> Result<LevelChange> {
        self.max_level().check(level)?;
        let change = LevelChange::new(self.level, level);
        self.level = level;
        match self.required_xp() {
            Some(required) if self.xp < required => {}
            _ => self.xp = 0,
        }
        Ok(change)
    }

    /// Fresh level-0 instances of the type's skills, not yet installed
    pub fn new_skills(&self) -> Vec<Skill> {
        self.ty
            .skill_types
            .iter()
            .map(|ty| Skill::new(Arc::clone(ty)))
            .collect()
    }

    /// Install skills built by [`Hero::new_skills`], returning the old ones
    pub fn install_skills(&mut self, skills: Vec<Skill>) -> Vec<Skill> {
        std::mem::replace(&mut self.skills, skills)
    }

    /// Replace the live skills with fresh level-0 instances
    pub fn build_skills(&mut self) {
        let skills = self.new_skills();
        self.skills = skills;
    }

    /// Drop the live skills, returning them
    pub fn take_skills(&mut self) -> Vec<Skill> {
        std::mem::take(&mut self.skills)
    }

    /// Live skills in type order (empty while the hero is inactive)
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn skills_mut(&mut self) -> &mut [Skill] {
        &mut self.skills
    }

    /// Find a live skill by key
    pub fn skill(&self, key: &AbilityKey) -> Option<&Skill> {
        self.skills.iter().find(|s| s.key() == key)
    }

    pub fn skill_mut(&mut self, key: &AbilityKey) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|s| s.key() == key)
    }

    /// Borrow the hero read-only alongside its mutable skills
    pub fn split_skills(&mut self) -> (HeroView<'_>, &mut [Skill]) {
        let view = HeroView {
            ty: &self.ty,
            level: self.level,
            xp: self.xp,
            record_id: self.record_id,
            state: &self.state,
        };
        (view, &mut self.skills)
    }

    /// Resolve variable `name` at the hero's level
    pub fn current(&self, name: &str) -> Result<f64> {
        self.ty.def.current(name, self.level)
    }

    /// Check-and-arm a hero-level cooldown
    pub fn cooldown(&mut self, name: &str, now: GameTime) -> Result<Remaining> {
        timer::cooldown(&mut self.timers, &self.ty.def, self.level, name, now)
    }
}

/// Read-only view of a hero handed to skill callbacks
#[derive(Debug, Clone, Copy)]
pub struct HeroView<'a> {
    pub ty: &'a Arc<HeroType>,
    pub level: u32,
    pub xp: u64,
    pub record_id: Option<RecordId>,
    pub state: &'a EventArgs,
}

impl HeroView<'_> {
    pub fn key(&self) -> &AbilityKey {
        &self.ty.def.key
    }

    pub fn current(&self, name: &str) -> Result<f64> {
        self.ty.def.current(name, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Callbacks, SkillType};

    fn hero_type(max: MaxLevel) -> Arc<HeroType> {
        let skills = ["a", "b", "c"]
            .iter()
            .map(|k| {
                Arc::new(
                    SkillType::new(
                        AbilityDef::new(format!("paladin.{}", k), 1, MaxLevel::Finite(8)),
                        false,
                        2,
                        Callbacks::new(),
                    )
                    .unwrap(),
                )
            })
            .collect();
        Arc::new(
            HeroType::new(AbilityDef::new("paladin", 0, max), skills, Callbacks::new()).unwrap(),
        )
    }

    fn hero() -> Hero {
        Hero::new(hero_type(MaxLevel::Unbounded), XpCurve::new(80, 15))
    }

    fn assert_invariant(hero: &Hero) {
        match hero.required_xp() {
            Some(required) => assert!(hero.xp() < required),
            None => assert_eq!(hero.xp(), 0),
        }
    }

    #[test]
    fn test_required_xp_curve() {
        let curve = XpCurve::new(80, 15);
        assert_eq!(curve.required(0, MaxLevel::Unbounded), Some(80));
        assert_eq!(curve.required(1, MaxLevel::Unbounded), Some(95));
        assert_eq!(curve.required(2, MaxLevel::Unbounded), Some(110));
        assert_eq!(curve.required(5, MaxLevel::Finite(5)), None);
    }

    #[test]
    fn test_gain_across_multiple_levels() {
        let mut hero = hero();
        let change = hero.set_xp(260).unwrap();
        assert_eq!(change, LevelChange::new(0, 2));
        assert_eq!(hero.level(), 2);
        assert_eq!(hero.xp(), 85);
    }

    #[test]
    fn test_loss_refunds_lower_level() {
        let mut hero = hero();
        hero.set_xp(260).unwrap();
        // level 2 xp 85, lose 100 -> level 1 with 85 - 100 + 95 = 80
        let change = hero.add_xp(-100).unwrap();
        assert_eq!(change, LevelChange::new(2, 1));
        assert_eq!(hero.xp(), 80);
        assert_invariant(&hero);
    }

    #[test]
    fn test_underflow_keeps_level_and_zeroes_xp() {
        let mut hero = hero();
        hero.set_xp(90).unwrap();
        assert_eq!(hero.level(), 1);

        let err = hero.add_xp(-500).unwrap_err();
        assert!(matches!(err, Error::XpUnderflow { level: 1 }));
        assert_eq!(hero.level(), 1);
        assert_eq!(hero.xp(), 0);
    }

    #[test]
    fn test_advance_matches_curve() {
        let curve = XpCurve::new(80, 15);
        assert_eq!(curve.advance(0, 79, MaxLevel::Unbounded), (0, 79));
        assert_eq!(curve.advance(0, 100, MaxLevel::Unbounded), (1, 20));
        assert_eq!(curve.advance(0, 80 + 95 + 5, MaxLevel::Unbounded), (2, 5));
        assert_eq!(curve.advance(2, 110, MaxLevel::Unbounded), (3, 0));
        assert_eq!(curve.advance(0, 1_000, MaxLevel::Finite(3)), (3, 1_000 - 285));
    }

    #[test]
    fn test_huge_gain_saturates_level() {
        let ty = hero_type(MaxLevel::Unbounded);
        let mut flat = Hero::new(Arc::clone(&ty), XpCurve::new(1, 0));
        let change = flat.set_xp(i64::MAX).unwrap();
        assert_eq!(change.new_level, u32::MAX);
        assert_eq!(flat.xp(), 0);
        assert_invariant(&flat);

        let mut steep = Hero::new(ty, XpCurve::new(80, 15));
        steep.set_xp(i64::MAX).unwrap();
        assert!(steep.level() > 1_000_000);
        assert_invariant(&steep);
    }

    #[test]
    fn test_gain_stops_at_cap() {
        let mut hero = Hero::new(hero_type(MaxLevel::Finite(3)), XpCurve::new(80, 15));
        let change = hero.set_xp(10_000).unwrap();
        assert_eq!(change.new_level, 3);
        assert_eq!(hero.xp(), 0);
        assert_eq!(hero.required_xp(), None);
    }

    #[test]
    fn test_invariant_over_sequence() {
        let mut hero = Hero::new(hero_type(MaxLevel::Finite(10)), XpCurve::new(80, 15));
        for delta in [50i64, 40, 300, -120, 7, 999, -60, 2_000, -30] {
            let _ = hero.add_xp(delta);
            assert_invariant(&hero);
            assert!(hero.level() <= 10);
        }
    }

    #[test]
    fn test_set_level_rezeros_exceeded_xp() {
        let mut hero = hero();
        hero.set_xp(70).unwrap();
        hero.set_level(3).unwrap();
        assert_eq!(hero.xp(), 70);

        // level 3 requires 125, so 100 sticks
        hero.set_xp(100).unwrap();
        assert_eq!((hero.level(), hero.xp()), (3, 100));
        // level 0 requires only 80
        let change = hero.set_level(0).unwrap();
        assert!(change.is_level_down());
        assert_eq!(hero.xp(), 0);
    }

    #[test]
    fn test_set_level_rejects_out_of_range() {
        let mut hero = Hero::new(hero_type(MaxLevel::Finite(5)), XpCurve::default());
        assert!(matches!(
            hero.set_level(6),
            Err(Error::LevelOutOfRange { level: 6, .. })
        ));
        assert_eq!(hero.level(), 0);
        hero.set_level(5).unwrap();
        assert_eq!(hero.xp(), 0);
    }

    #[test]
    fn test_restore_validates_level() {
        let ty = hero_type(MaxLevel::Finite(5));
        assert!(Hero::restore(ty.clone(), XpCurve::default(), RecordId(1), 9, 0).is_err());
        let hero = Hero::restore(ty, XpCurve::default(), RecordId(1), 2, 500).unwrap();
        assert_eq!(hero.level(), 2);
        assert_eq!(hero.xp(), 0);
    }

    #[test]
    fn test_build_and_take_skills() {
        let mut hero = hero();
        assert!(hero.skills().is_empty());
        hero.build_skills();
        let keys: Vec<_> = hero.skills().iter().map(|s| s.key().as_str()).collect();
        assert_eq!(keys, ["paladin.a", "paladin.b", "paladin.c"]);

        let taken = hero.take_skills();
        assert_eq!(taken.len(), 3);
        assert!(hero.skills().is_empty());
    }
}
