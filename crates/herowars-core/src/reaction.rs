//! Engine-wide reactions to routed notifications
//!
//! Reactions are the generic systems that sit around ability callbacks:
//! XP rewards, persistence flushes, menu popups. Each one picks the phase it
//! runs in so it sees either the pre-ability or the post-ability state.

use crate::budget;
use crate::callback::Outbox;
use crate::cmd::{Cmd, Menu};
use crate::config::Config;
use crate::error::Result;
use crate::event::{names, Notification};
use crate::identity::{EventName, PlayerId};
use crate::level::LevelChange;
use crate::persistence::{self, Persistence};
use crate::player::{Player, UpgradePopup};
use crate::time::GameTime;
use crate::value::EventArgs;
use indexmap::IndexMap;

/// When a reaction runs relative to the hero and skill callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeforeAbilities,
    AfterAbilities,
}

/// Everything a reaction may touch
pub struct ReactionCtx<'a> {
    pub event: &'a EventName,
    pub args: &'a EventArgs,
    pub now: GameTime,
    pub player: &'a mut Player,
    pub persistence: &'a mut dyn Persistence,
    pub out: &'a mut Outbox,
}

/// A generic system that reacts to routed notifications
pub trait Reaction: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    fn phase(&self) -> Phase;

    fn handles(&self, event: &EventName) -> bool;

    fn react(&mut self, ctx: &mut ReactionCtx<'_>) -> Result<()>;
}

/// Notification reporting a hero level change, if the level moved
pub fn level_change_notification(player: PlayerId, change: LevelChange) -> Option<Notification> {
    let event = if change.is_level_up() {
        names::HERO_LEVEL_UP
    } else if change.is_level_down() {
        names::HERO_LEVEL_DOWN
    } else {
        return None;
    };
    Some(
        Notification::new(event, player)
            .with_arg("old_level", change.old_level)
            .with_arg("new_level", change.new_level),
    )
}

/// Grants configured XP to the acting player's hero
#[derive(Debug, Clone)]
pub struct XpRewards {
    rewards: IndexMap<EventName, i64>,
}

impl XpRewards {
    pub fn new(rewards: IndexMap<EventName, i64>) -> Self {
        Self { rewards }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.xp.rewards.clone())
    }
}

impl Reaction for XpRewards {
    fn name(&self) -> &str {
        "xp_rewards"
    }

    fn phase(&self) -> Phase {
        Phase::AfterAbilities
    }

    fn handles(&self, event: &EventName) -> bool {
        self.rewards.contains_key(event)
    }

    fn react(&mut self, ctx: &mut ReactionCtx<'_>) -> Result<()> {
        let Some(&amount) = self.rewards.get(ctx.event) else {
            return Ok(());
        };
        let player_id = ctx.player.id;
        let Ok(hero) = ctx.player.hero_mut() else {
            return Ok(());
        };
        let change = hero.add_xp(amount)?;

        let mut tokens = EventArgs::new();
        tokens.insert("xp".to_string(), amount.into());
        tokens.insert("event".to_string(), ctx.event.as_str().into());
        ctx.out.push(Cmd::say(player_id, "xp_gained", tokens));

        if let Some(notification) = level_change_notification(player_id, change) {
            if change.is_level_up() {
                tracing::info!(player = %player_id, hero = %hero.key(), level = change.new_level, "hero leveled up");
                let mut tokens = EventArgs::new();
                tokens.insert("hero".to_string(), hero.key().into());
                tokens.insert("level".to_string(), change.new_level.into());
                ctx.out.push(Cmd::say(player_id, "level_up", tokens));
            }
            ctx.out.emitted.push(notification);
        }
        Ok(())
    }
}

/// Saves the acting player's progress after configured events
#[derive(Debug, Clone)]
pub struct PersistOnEvents {
    events: Vec<EventName>,
}

impl PersistOnEvents {
    pub fn new(events: Vec<EventName>) -> Self {
        Self { events }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.persist_on.clone())
    }
}

impl Reaction for PersistOnEvents {
    fn name(&self) -> &str {
        "persist_on_events"
    }

    fn phase(&self) -> Phase {
        Phase::AfterAbilities
    }

    fn handles(&self, event: &EventName) -> bool {
        self.events.contains(event)
    }

    fn react(&mut self, ctx: &mut ReactionCtx<'_>) -> Result<()> {
        if ctx.player.is_bot {
            return Ok(());
        }
        tracing::debug!(player = %ctx.player.id, event = %ctx.event, "saving player progress");
        persistence::save_progress(&mut *ctx.persistence, ctx.player)
    }
}

/// Offers the upgrade-skills menu according to the player's setting
#[derive(Debug, Clone, Default)]
pub struct UpgradeSkillsPopup;

impl UpgradeSkillsPopup {
    fn wanted(setting: UpgradePopup, event: &EventName) -> bool {
        match setting {
            UpgradePopup::Never => false,
            UpgradePopup::OnDeath => event == names::PLAYER_DEATH,
            UpgradePopup::OnLevelUp => event == names::HERO_LEVEL_UP,
        }
    }
}

impl Reaction for UpgradeSkillsPopup {
    fn name(&self) -> &str {
        "upgrade_skills_popup"
    }

    fn phase(&self) -> Phase {
        Phase::AfterAbilities
    }

    fn handles(&self, event: &EventName) -> bool {
        event == names::PLAYER_DEATH || event == names::HERO_LEVEL_UP
    }

    fn react(&mut self, ctx: &mut ReactionCtx<'_>) -> Result<()> {
        if !Self::wanted(ctx.player.settings.upgrade_skills_popup, ctx.event) {
            return Ok(());
        }
        let player_id = ctx.player.id;
        let Ok(hero) = ctx.player.hero() else {
            return Ok(());
        };
        let upgradable = hero
            .skills()
            .iter()
            .any(|skill| budget::can_upgrade(hero, skill.key()));
        if budget::skill_points(hero) > 0 && upgradable {
            ctx.out.push(Cmd::ShowMenu {
                player: player_id,
                menu: Menu::UpgradeSkills,
            });
        }
        Ok(())
    }
}

/// The reactions every engine starts with
pub fn defaults(config: &Config) -> Vec<Box<dyn Reaction>> {
    vec![
        Box::new(XpRewards::from_config(config)),
        Box::new(UpgradeSkillsPopup),
        Box::new(PersistOnEvents::from_config(config)),
    ]
}
