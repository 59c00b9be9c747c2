//! Commands (side effects) handed back to the host
//!
//! The core never touches the game world. Callbacks and reactions describe
//! what should happen and the host carries it out after the call returns.

use crate::event::Notification;
use crate::identity::{AbilityKey, PlayerId};
use crate::value::EventArgs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A command to be executed by the host
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cmd {
    /// No operation
    #[default]
    None,

    /// Batch multiple commands
    Batch(Vec<Cmd>),

    /// Send a localized message to a player
    Say {
        player: PlayerId,
        /// Ability whose name prefixes the message, if any
        source: Option<AbilityKey>,
        /// String key (ability string or core message)
        message: String,
        tokens: EventArgs,
    },

    /// Apply a named game effect to a player (freeze, damage, heal...)
    Apply {
        target: PlayerId,
        effect: String,
        params: EventArgs,
    },

    /// Open a presentation menu for a player
    ShowMenu { player: PlayerId, menu: Menu },

    /// Deliver a notification back to the engine after a delay
    Schedule {
        notification: Notification,
        delay: Duration,
    },
}

/// Menus offered by the presentation collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Menu {
    Main,
    ViewSkills,
    UpgradeSkills,
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        // Flatten nested batches and filter out None
        let mut flattened: Vec<Cmd> = cmds
            .into_iter()
            .flat_map(|cmd| match cmd {
                Cmd::None => vec![],
                Cmd::Batch(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            0 => Cmd::None,
            1 => flattened.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(flattened),
        }
    }

    /// Create a message command without an ability prefix
    pub fn say(player: PlayerId, message: impl Into<String>, tokens: EventArgs) -> Self {
        Cmd::Say {
            player,
            source: None,
            message: message.into(),
            tokens,
        }
    }

    /// Check if this is a None command
    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Iterate over the leaf commands
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Cmd> + '_> {
        match self {
            Cmd::None => Box::new(std::iter::empty()),
            Cmd::Batch(cmds) => Box::new(cmds.iter().flat_map(|c| c.iter())),
            other => Box::new(std::iter::once(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_batch_single() {
        let cmd = Cmd::batch(vec![
            Cmd::None,
            Cmd::say(PlayerId(1), "welcome", EventArgs::new()),
            Cmd::None,
        ]);
        assert!(matches!(cmd, Cmd::Say { .. }));
    }

    #[test]
    fn test_cmd_batch_nested() {
        let cmd = Cmd::batch(vec![
            Cmd::batch(vec![
                Cmd::ShowMenu {
                    player: PlayerId(1),
                    menu: Menu::Main,
                },
                Cmd::ShowMenu {
                    player: PlayerId(2),
                    menu: Menu::Main,
                },
            ]),
            Cmd::say(PlayerId(1), "hi", EventArgs::new()),
        ]);

        if let Cmd::Batch(cmds) = &cmd {
            assert_eq!(cmds.len(), 3);
        } else {
            panic!("Expected Batch");
        }
        assert_eq!(cmd.iter().count(), 3);
    }

    #[test]
    fn test_cmd_batch_empty() {
        assert!(Cmd::batch(vec![Cmd::None]).is_none());
        assert_eq!(Cmd::None.iter().count(), 0);
    }
}
