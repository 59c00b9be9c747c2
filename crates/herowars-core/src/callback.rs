//! Callback signatures and the contexts handed to them
//!
//! A callback sees the event being dispatched, the acting player's own hero
//! (and skill, for skill callbacks), a read-only roster of everyone else and
//! an outbox. Anything that touches the world or another player goes into the
//! outbox as a [`Cmd`] or a follow-up [`Notification`].

use crate::cmd::Cmd;
use crate::error::Result;
use crate::event::Notification;
use crate::hero::{Hero, HeroView};
use crate::identity::{EventName, PlayerId};
use crate::player::Roster;
use crate::rng::GameRng;
use crate::skill::Skill;
use crate::time::{GameTime, Remaining};
use crate::value::{EventArgs, Value};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

/// Behavior bound to a hero event
pub type HeroCallback = Arc<dyn Fn(&mut HeroCtx<'_>) -> Result<()> + Send + Sync>;

/// Behavior bound to a skill event
pub type SkillCallback = Arc<dyn Fn(&mut SkillCtx<'_>) -> Result<()> + Send + Sync>;

/// Wrap a closure as a hero callback
pub fn hero_callback<F>(f: F) -> HeroCallback
where
    F: Fn(&mut HeroCtx<'_>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a skill callback
pub fn skill_callback<F>(f: F) -> SkillCallback
where
    F: Fn(&mut SkillCtx<'_>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Side effects collected during one dispatch
#[derive(Debug, Default)]
pub struct Outbox {
    pub cmds: Vec<Cmd>,
    /// Follow-up notifications, dispatched after the current one completes
    pub emitted: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: Cmd) {
        if !cmd.is_none() {
            self.cmds.push(cmd);
        }
    }
}

/// Everything a callback may read or write besides its own instance
pub struct Env<'a> {
    pub event: &'a EventName,
    pub args: &'a EventArgs,
    pub now: GameTime,
    pub player: PlayerId,
    pub roster: Roster<'a>,
    pub rng: &'a mut GameRng,
    pub out: &'a mut Outbox,
}

impl Env<'_> {
    /// Look up an event argument
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Look up a player-valued argument (`attacker`, `victim`...)
    pub fn arg_player(&self, name: &str) -> Option<PlayerId> {
        self.args.get(name).and_then(Value::as_player)
    }

    /// Message the acting player
    pub fn say(&mut self, message: impl Into<String>, tokens: EventArgs) {
        self.out.push(Cmd::say(self.player, message, tokens));
    }

    /// Ask the host to apply an effect to a player
    pub fn apply(&mut self, target: PlayerId, effect: impl Into<String>, params: EventArgs) {
        self.out.push(Cmd::Apply {
            target,
            effect: effect.into(),
            params,
        });
    }

    /// Ask the host to re-deliver an event to the acting player after `delay`
    pub fn schedule(&mut self, event: impl Into<EventName>, delay: Duration, args: EventArgs) {
        let mut notification = Notification::new(event, self.player);
        notification.args = args;
        self.out.push(Cmd::Schedule {
            notification,
            delay,
        });
    }

    /// Fire a follow-up event for the acting player
    pub fn emit(&mut self, event: impl Into<EventName>, args: EventArgs) {
        let player = self.player;
        self.emit_to(player, event, args);
    }

    /// Fire a follow-up event for any player
    pub fn emit_to(&mut self, player: PlayerId, event: impl Into<EventName>, args: EventArgs) {
        let mut notification = Notification::new(event, player);
        notification.args = args;
        self.out.emitted.push(notification);
    }

    /// Roll a percentage chance
    pub fn chance(&mut self, percent: f64) -> bool {
        self.rng.chance(percent)
    }
}

/// Context for hero callbacks
pub struct HeroCtx<'a> {
    pub env: Env<'a>,
    pub hero: &'a mut Hero,
}

impl HeroCtx<'_> {
    pub fn cooldown(&mut self, name: &str) -> Result<Remaining> {
        self.hero.cooldown(name, self.env.now)
    }

    pub fn current(&self, name: &str) -> Result<f64> {
        self.hero.current(name)
    }

    /// Message the acting player with one of the hero's strings
    pub fn say_string(&mut self, key: impl Into<String>, tokens: EventArgs) {
        let cmd = Cmd::Say {
            player: self.env.player,
            source: Some(self.hero.key().clone()),
            message: key.into(),
            tokens,
        };
        self.env.out.push(cmd);
    }
}

impl<'a> Deref for HeroCtx<'a> {
    type Target = Env<'a>;

    fn deref(&self) -> &Self::Target {
        &self.env
    }
}

impl DerefMut for HeroCtx<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.env
    }
}

/// Context for skill callbacks
pub struct SkillCtx<'a> {
    pub env: Env<'a>,
    pub hero: HeroView<'a>,
    pub skill: &'a mut Skill,
}

impl SkillCtx<'_> {
    pub fn cooldown(&mut self, name: &str) -> Result<Remaining> {
        self.skill.cooldown(name, self.env.now)
    }

    pub fn current(&self, name: &str) -> Result<f64> {
        self.skill.current(name)
    }

    /// Message the acting player with one of the skill's strings
    pub fn say_string(&mut self, key: impl Into<String>, tokens: EventArgs) {
        let player = self.env.player;
        self.say_string_to(player, key, tokens);
    }

    /// Message any player (a victim, the killer) with one of the skill's strings
    pub fn say_string_to(&mut self, player: PlayerId, key: impl Into<String>, tokens: EventArgs) {
        let cmd = Cmd::Say {
            player,
            source: Some(self.skill.key().clone()),
            message: key.into(),
            tokens,
        };
        self.env.out.push(cmd);
    }
}

impl<'a> Deref for SkillCtx<'a> {
    type Target = Env<'a>;

    fn deref(&self) -> &Self::Target {
        &self.env
    }
}

impl DerefMut for SkillCtx<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.env
    }
}
