//! Error types for herowars-core

use crate::engine::UpdateResult;
use crate::identity::{AbilityKey, EventName, PlayerId};
use crate::level::MaxLevel;
use thiserror::Error;

/// Why a skill upgrade or downgrade is not allowed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Illegal {
    #[error("no unspent skill points")]
    NoSkillPoints,

    #[error("skill is already at its maximum level")]
    MaxLevelReached,

    #[error("hero level {required} required")]
    HeroLevelTooLow { required: u32 },

    #[error("passive skills cannot be leveled")]
    Passive,

    #[error("skill does not belong to the active hero")]
    NotOwned,

    #[error("skill has not been learned")]
    NotLearned,
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Level {level} outside 0..={max}")]
    LevelOutOfRange { level: u32, max: MaxLevel },

    #[error("XP loss would drop hero below level 0 (stayed at level {level})")]
    XpUnderflow { level: u32 },

    #[error("Unknown hero type: {0}")]
    UnknownHero(AbilityKey),

    #[error("Unknown variable {name} on {ability}")]
    UnknownVariable { ability: AbilityKey, name: String },

    #[error("Hero {0} is not owned by the player")]
    HeroNotOwned(AbilityKey),

    #[error("Hero {key} requires total level {required}")]
    HeroLocked { key: AbilityKey, required: u32 },

    #[error("Player has no active hero")]
    NoActiveHero,

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Player already connected: {0}")]
    PlayerAlreadyConnected(PlayerId),

    #[error("Illegal skill change: {0}")]
    Illegal(#[from] Illegal),

    #[error("No duo route for event: {0}")]
    UnroutedEvent(EventName),

    #[error("Event {event} re-fired for {player} while already dispatching")]
    ReentrantDispatch { event: EventName, player: PlayerId },

    #[error("Definition error: {0}")]
    Definition(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    /// Routing failed after earlier steps had already taken effect
    ///
    /// In-memory changes are not rolled back; `applied` holds the commands
    /// and notifications the host must still honor.
    #[error("Dispatch aborted: {cause}")]
    Dispatch {
        #[source]
        cause: Box<Error>,
        applied: Box<UpdateResult>,
    },
}

impl Error {
    /// The underlying failure, looking through [`Error::Dispatch`]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Dispatch { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Effects that took place before the failure, if any
    pub fn applied(&self) -> Option<&UpdateResult> {
        match self {
            Error::Dispatch { applied, .. } => Some(applied),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
