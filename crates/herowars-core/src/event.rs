//! Game events and the notifications routed to heroes and skills
//!
//! The game-event translator hands the core either a solo event (one acting
//! player) or a duo event (attacker and victim roles). Duo events are split
//! into one notification per side using a routing table.

use crate::error::{Error, Result};
use crate::identity::{EventName, PlayerId};
use crate::value::{EventArgs, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Argument key holding the attacker of a duo event
pub const ATTACKER: &str = "attacker";
/// Argument key holding the victim of a duo event
pub const VICTIM: &str = "victim";
/// Argument key injected with the acting player
pub const PLAYER: &str = "player";
/// Argument key injected with the acting player's active hero
pub const HERO: &str = "hero";
/// Argument key injected with the skill, for skill callbacks only
pub const SKILL: &str = "skill";

/// Events fired by the core itself
pub mod names {
    pub const PLAYER_CHANGE_HERO: &str = "player_change_hero";
    pub const HERO_LEVEL_UP: &str = "hero_level_up";
    pub const HERO_LEVEL_DOWN: &str = "hero_level_down";
    pub const SKILL_UPGRADE: &str = "skill_upgrade";
    pub const SKILL_DOWNGRADE: &str = "skill_downgrade";
    /// Delivered by the host when the ultimate key goes down / up
    pub const PLAYER_ULTIMATE: &str = "player_ultimate";
    pub const PLAYER_ULTIMATE_END: &str = "player_ultimate_end";
    /// Delivered by the host when the ability key goes down / up
    pub const PLAYER_ABILITY: &str = "player_ability";
    pub const PLAYER_ABILITY_END: &str = "player_ability_end";
    pub const PLAYER_DEATH: &str = "player_death";
}

/// A raw occurrence from the game-event translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// One acting player
    Solo {
        name: EventName,
        player: PlayerId,
        args: EventArgs,
    },
    /// Two roles; either may be unresolvable (world damage, disconnected attacker)
    Duo {
        name: EventName,
        attacker: Option<PlayerId>,
        victim: Option<PlayerId>,
        args: EventArgs,
    },
}

impl GameEvent {
    /// Create a solo event with no arguments
    pub fn solo(name: impl Into<EventName>, player: PlayerId) -> Self {
        GameEvent::Solo {
            name: name.into(),
            player,
            args: EventArgs::new(),
        }
    }

    /// Create a duo event with no arguments
    pub fn duo(
        name: impl Into<EventName>,
        attacker: Option<PlayerId>,
        victim: Option<PlayerId>,
    ) -> Self {
        GameEvent::Duo {
            name: name.into(),
            attacker,
            victim,
            args: EventArgs::new(),
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self {
            GameEvent::Solo { args, .. } | GameEvent::Duo { args, .. } => {
                args.insert(key.into(), value.into());
            }
        }
        self
    }

    /// The raw event name
    pub fn name(&self) -> &EventName {
        match self {
            GameEvent::Solo { name, .. } | GameEvent::Duo { name, .. } => name,
        }
    }
}

/// A typed event addressed to one player's active hero and skills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub event: EventName,
    pub player: PlayerId,
    pub args: EventArgs,
}

impl Notification {
    /// Create a notification with no arguments
    pub fn new(event: impl Into<EventName>, player: PlayerId) -> Self {
        Self {
            event: event.into(),
            player,
            args: EventArgs::new(),
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Check whether this addresses the same player with the same event
    pub fn same_target(&self, other: &Notification) -> bool {
        self.player == other.player && self.event == other.event
    }
}

/// Which side of a duo event is notified first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuoOrder {
    #[default]
    AttackerFirst,
    VictimFirst,
}

/// How a duo event splits into per-side notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuoRoute {
    /// Event delivered to the attacker
    pub attacker: EventName,
    /// Event delivered to the victim
    pub victim: EventName,
    /// Event delivered when only one participant resolves (or both are the same player)
    pub fallback: EventName,
    #[serde(default)]
    pub order: DuoOrder,
}

impl DuoRoute {
    /// Create a route with attacker-first ordering
    pub fn new(
        attacker: impl Into<EventName>,
        victim: impl Into<EventName>,
        fallback: impl Into<EventName>,
    ) -> Self {
        Self {
            attacker: attacker.into(),
            victim: victim.into(),
            fallback: fallback.into(),
            order: DuoOrder::AttackerFirst,
        }
    }

    /// Set the delivery order
    pub fn with_order(mut self, order: DuoOrder) -> Self {
        self.order = order;
        self
    }
}

/// Routing table from raw duo event names to routes
pub type DuoRoutes = IndexMap<EventName, DuoRoute>;

/// Turn a game event into the notifications to deliver, in delivery order
///
/// Duo notifications carry both participants under `attacker` and `victim`
/// (null when unresolvable) so either side can inspect the other.
pub fn split(event: GameEvent, routes: &DuoRoutes) -> Result<Vec<Notification>> {
    match event {
        GameEvent::Solo { name, player, args } => Ok(vec![Notification {
            event: name,
            player,
            args,
        }]),
        GameEvent::Duo {
            name,
            attacker,
            victim,
            mut args,
        } => {
            let route = routes
                .get(&name)
                .ok_or_else(|| Error::UnroutedEvent(name.clone()))?;
            args.insert(ATTACKER.to_string(), attacker.map_or(Value::Null, Value::Player));
            args.insert(VICTIM.to_string(), victim.map_or(Value::Null, Value::Player));

            let notifications = match (attacker, victim) {
                (Some(a), Some(v)) if a != v => {
                    let to_attacker = Notification {
                        event: route.attacker.clone(),
                        player: a,
                        args: args.clone(),
                    };
                    let to_victim = Notification {
                        event: route.victim.clone(),
                        player: v,
                        args,
                    };
                    match route.order {
                        DuoOrder::AttackerFirst => vec![to_attacker, to_victim],
                        DuoOrder::VictimFirst => vec![to_victim, to_attacker],
                    }
                }
                (Some(only), _) | (None, Some(only)) => {
                    tracing::debug!(event = %name, player = %only, fallback = %route.fallback, "duo event degraded to single participant");
                    vec![Notification {
                        event: route.fallback.clone(),
                        player: only,
                        args,
                    }]
                }
                (None, None) => {
                    tracing::warn!(event = %name, "duo event with no resolvable participant");
                    Vec::new()
                }
            };
            Ok(notifications)
        }
    }
}
