//! Delivery of one notification to a player's hero and skills
//!
//! Order is fixed: the hero's callback (never level-gated), then each live
//! skill in type order, skipping skills that are neither learned nor passive.
//! Every callback receives the event args plus `player` and `hero`; skill
//! callbacks additionally get `skill`.

use crate::ability::INIT_CALLBACK;
use crate::callback::{Env, HeroCtx, Outbox, SkillCtx};
use crate::error::Result;
use crate::event::{HERO, PLAYER, SKILL};
use crate::identity::EventName;
use crate::player::{Player, Roster};
use crate::rng::GameRng;
use crate::time::GameTime;
use crate::value::{EventArgs, Value};
use std::sync::Arc;

/// Shared inputs for a delivery
pub(crate) struct Delivery<'a> {
    pub now: GameTime,
    pub roster: Roster<'a>,
    pub rng: &'a mut GameRng,
    pub out: &'a mut Outbox,
}

/// Invoke `event` callbacks on the player's active hero and its skills
///
/// A player without an active hero receives nothing.
pub(crate) fn invoke_callbacks(
    player: &mut Player,
    event: &EventName,
    args: &EventArgs,
    delivery: Delivery<'_>,
) -> Result<()> {
    let player_id = player.id;
    let Ok(hero) = player.hero_mut() else {
        tracing::debug!(player = %player_id, event = %event, "no active hero, notification ignored");
        return Ok(());
    };
    let Delivery {
        now,
        roster,
        rng,
        out,
    } = delivery;

    let mut args = args.clone();
    args.insert(PLAYER.to_string(), Value::Player(player_id));
    args.insert(HERO.to_string(), Value::Ability(hero.key().clone()));

    let hero_type = Arc::clone(hero.ty());
    if let Some(callback) = hero_type.callbacks.get(event) {
        let mut ctx = HeroCtx {
            env: Env {
                event,
                args: &args,
                now,
                player: player_id,
                roster,
                rng: &mut *rng,
                out: &mut *out,
            },
            hero: &mut *hero,
        };
        callback(&mut ctx)?;
    }

    let (view, skills) = hero.split_skills();
    for skill in skills.iter_mut() {
        if !skill.is_active() {
            continue;
        }
        let Some(callback) = skill.ty().callbacks.get(event).cloned() else {
            continue;
        };
        args.insert(SKILL.to_string(), Value::Ability(skill.key().clone()));
        let mut ctx = SkillCtx {
            env: Env {
                event,
                args: &args,
                now,
                player: player_id,
                roster,
                rng: &mut *rng,
                out: &mut *out,
            },
            hero: view,
            skill,
        };
        callback(&mut ctx)?;
    }
    Ok(())
}

/// Run init callbacks on a freshly activated hero: hero first, then every
/// skill in type order
///
/// Skills get their init regardless of level, since a skill learned later
/// in the activation never sees another one.
pub(crate) fn invoke_init(player: &mut Player, delivery: Delivery<'_>) -> Result<()> {
    let player_id = player.id;
    let hero = player.hero_mut()?;
    let Delivery {
        now,
        roster,
        rng,
        out,
    } = delivery;
    let event = EventName::new(INIT_CALLBACK);

    let mut args = EventArgs::new();
    args.insert(PLAYER.to_string(), Value::Player(player_id));
    args.insert(HERO.to_string(), Value::Ability(hero.key().clone()));

    let hero_type = Arc::clone(hero.ty());
    if let Some(init) = &hero_type.callbacks.init {
        let mut ctx = HeroCtx {
            env: Env {
                event: &event,
                args: &args,
                now,
                player: player_id,
                roster,
                rng: &mut *rng,
                out: &mut *out,
            },
            hero: &mut *hero,
        };
        init(&mut ctx)?;
    }

    let (view, skills) = hero.split_skills();
    for skill in skills.iter_mut() {
        let Some(init) = skill.ty().callbacks.init.clone() else {
            continue;
        };
        args.insert(SKILL.to_string(), Value::Ability(skill.key().clone()));
        let mut ctx = SkillCtx {
            env: Env {
                event: &event,
                args: &args,
                now,
                player: player_id,
                roster,
                rng: &mut *rng,
                out: &mut *out,
            },
            hero: view,
            skill,
        };
        init(&mut ctx)?;
    }
    Ok(())
}

