//! Skill-point budget and upgrade/downgrade legality
//!
//! Pure functions over a hero and its live skills. The `check_*` variants
//! report the first failing rule so menus can explain a greyed-out entry.

use crate::error::{Illegal, Result};
use crate::hero::Hero;
use crate::identity::AbilityKey;
use crate::level::LevelChange;

/// Unspent skill points: hero level minus the sum of skill levels
pub fn skill_points(hero: &Hero) -> i64 {
    let spent: i64 = hero.skills().iter().map(|s| i64::from(s.level())).sum();
    i64::from(hero.level()) - spent
}

/// Reason an upgrade of `key` is illegal, if any
pub fn check_upgrade(hero: &Hero, key: &AbilityKey) -> std::result::Result<(), Illegal> {
    let skill = hero.skill(key).ok_or(Illegal::NotOwned)?;
    if skill_points(hero) <= 0 {
        return Err(Illegal::NoSkillPoints);
    }
    if skill.is_maxed() {
        return Err(Illegal::MaxLevelReached);
    }
    let required = skill.next_required_level();
    if hero.level() < required {
        return Err(Illegal::HeroLevelTooLow { required });
    }
    if skill.passive() {
        return Err(Illegal::Passive);
    }
    Ok(())
}

pub fn can_upgrade(hero: &Hero, key: &AbilityKey) -> bool {
    check_upgrade(hero, key).is_ok()
}

/// Reason a downgrade of `key` is illegal, if any
pub fn check_downgrade(hero: &Hero, key: &AbilityKey) -> std::result::Result<(), Illegal> {
    let skill = hero.skill(key).ok_or(Illegal::NotOwned)?;
    if skill.passive() {
        return Err(Illegal::Passive);
    }
    if skill.level() == 0 {
        return Err(Illegal::NotLearned);
    }
    Ok(())
}

pub fn can_downgrade(hero: &Hero, key: &AbilityKey) -> bool {
    check_downgrade(hero, key).is_ok()
}

/// Raise `key` by one level
pub fn upgrade(hero: &mut Hero, key: &AbilityKey) -> Result<LevelChange> {
    check_upgrade(hero, key)?;
    let skill = hero.skill_mut(key).ok_or(Illegal::NotOwned)?;
    let level = skill.level() + 1;
    skill.set_level(level)
}

/// Lower `key` by one level
pub fn downgrade(hero: &mut Hero, key: &AbilityKey) -> Result<LevelChange> {
    check_downgrade(hero, key)?;
    let skill = hero.skill_mut(key).ok_or(Illegal::NotOwned)?;
    let level = skill.level() - 1;
    skill.set_level(level)
}

/// Set every live skill back to level 0
///
/// Returns the keys whose level actually changed, so a second call returns
/// an empty list.
pub fn reset_skills(hero: &mut Hero) -> Vec<AbilityKey> {
    let mut changed = Vec::new();
    for skill in hero.skills_mut() {
        if skill.level() > 0 && skill.set_level(0).is_ok() {
            changed.push(skill.key().clone());
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDef, Callbacks, HeroType, SkillType};
    use crate::error::Error;
    use crate::hero::XpCurve;
    use crate::level::MaxLevel;
    use std::sync::Arc;

    fn skill(key: &str, passive: bool, max: u32) -> Arc<SkillType> {
        Arc::new(
            SkillType::new(
                AbilityDef::new(key, 1, MaxLevel::Finite(max)),
                passive,
                2,
                Callbacks::new(),
            )
            .unwrap(),
        )
    }

    fn hero(level: u32) -> Hero {
        let ty = HeroType::new(
            AbilityDef::new("paladin", 0, MaxLevel::Unbounded),
            vec![
                skill("paladin.smite", false, 8),
                skill("paladin.aura", true, 8),
                skill("paladin.ult", false, 1),
            ],
            Callbacks::new(),
        )
        .unwrap();
        let mut hero = Hero::new(Arc::new(ty), XpCurve::default());
        hero.set_level(level).unwrap();
        hero.build_skills();
        hero
    }

    fn key(k: &str) -> AbilityKey {
        AbilityKey::new(k)
    }

    #[test]
    fn test_skill_points() {
        let mut hero = hero(5);
        assert_eq!(skill_points(&hero), 5);
        upgrade(&mut hero, &key("paladin.smite")).unwrap();
        upgrade(&mut hero, &key("paladin.ult")).unwrap();
        assert_eq!(skill_points(&hero), 3);
    }

    #[test]
    fn test_upgrade_needs_points() {
        let mut hero = hero(0);
        assert_eq!(
            check_upgrade(&hero, &key("paladin.smite")),
            Err(Illegal::NoSkillPoints)
        );
        assert!(matches!(
            upgrade(&mut hero, &key("paladin.smite")),
            Err(Error::Illegal(Illegal::NoSkillPoints))
        ));
    }

    #[test]
    fn test_upgrade_respects_level_interval() {
        let mut hero = hero(2);
        // level 0 -> 1 needs hero level 1
        upgrade(&mut hero, &key("paladin.smite")).unwrap();
        // level 1 -> 2 needs hero level 3
        assert_eq!(
            check_upgrade(&hero, &key("paladin.smite")),
            Err(Illegal::HeroLevelTooLow { required: 3 })
        );
        hero.set_level(3).unwrap();
        assert!(can_upgrade(&hero, &key("paladin.smite")));
    }

    #[test]
    fn test_upgrade_rejects_maxed_passive_and_foreign() {
        let mut hero = hero(6);
        upgrade(&mut hero, &key("paladin.ult")).unwrap();
        assert_eq!(
            check_upgrade(&hero, &key("paladin.ult")),
            Err(Illegal::MaxLevelReached)
        );
        assert_eq!(
            check_upgrade(&hero, &key("paladin.aura")),
            Err(Illegal::Passive)
        );
        assert_eq!(
            check_upgrade(&hero, &key("assassin.blink")),
            Err(Illegal::NotOwned)
        );
    }

    #[test]
    fn test_downgrade() {
        let mut hero = hero(4);
        assert_eq!(
            check_downgrade(&hero, &key("paladin.smite")),
            Err(Illegal::NotLearned)
        );
        assert_eq!(
            check_downgrade(&hero, &key("paladin.aura")),
            Err(Illegal::Passive)
        );
        upgrade(&mut hero, &key("paladin.smite")).unwrap();
        let change = downgrade(&mut hero, &key("paladin.smite")).unwrap();
        assert_eq!(change, LevelChange::new(1, 0));
        assert_eq!(skill_points(&hero), 4);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut hero = hero(7);
        upgrade(&mut hero, &key("paladin.smite")).unwrap();
        upgrade(&mut hero, &key("paladin.smite")).unwrap();
        upgrade(&mut hero, &key("paladin.ult")).unwrap();

        assert_eq!(reset_skills(&mut hero).len(), 2);
        assert_eq!(skill_points(&hero), i64::from(hero.level()));
        assert!(reset_skills(&mut hero).is_empty());
        assert_eq!(skill_points(&hero), 7);
    }
}
