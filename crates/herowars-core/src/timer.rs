//! Per-instance timers with reservation semantics
//!
//! Each hero and skill instance owns a `Timers` set keyed by name. A timer is
//! either armed with an absolute expiry or reserved (blocking with no known
//! expiry). Names that were never touched behave like expired timers.

use crate::ability::AbilityDef;
use crate::error::Result;
use crate::time::{secs_to_duration, GameTime, Remaining};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// State of a single named timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    /// Blocks until this instant
    Expires(GameTime),
    /// Blocks until explicitly started or cleared
    Reserved,
}

/// Named timers owned by one ability instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timers {
    timers: IndexMap<String, TimerState>,
}

impl Timers {
    /// Create an empty timer set
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left on `name` at `now`
    ///
    /// Never negative. Reserved timers report `Remaining::Infinite`.
    pub fn remaining(&self, name: &str, now: GameTime) -> Remaining {
        match self.timers.get(name) {
            None => Remaining::ZERO,
            Some(TimerState::Reserved) => Remaining::Infinite,
            Some(TimerState::Expires(at)) => Remaining::Finite(at.saturating_since(now)),
        }
    }

    /// Arm `name` to expire `duration` after `now`, clearing any reservation
    pub fn start(&mut self, name: impl Into<String>, duration: Duration, now: GameTime) {
        self.timers.insert(name.into(), TimerState::Expires(now + duration));
    }

    /// Mark `name` as blocking without an expiry
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.timers.insert(name.into(), TimerState::Reserved);
    }

    /// Drop `name`, making it immediately available
    pub fn clear(&mut self, name: &str) -> bool {
        self.timers.shift_remove(name).is_some()
    }

    /// Check whether `name` is currently reserved
    pub fn is_reserved(&self, name: &str) -> bool {
        matches!(self.timers.get(name), Some(TimerState::Reserved))
    }

    /// Check-and-arm in one call
    ///
    /// If `name` has run out, arms it for `duration` and returns the pre-start
    /// remaining value (zero). Otherwise returns the positive remaining value
    /// and leaves the timer untouched.
    pub fn check_and_arm(
        &mut self,
        name: &str,
        duration: Duration,
        now: GameTime,
    ) -> Remaining {
        let remaining = self.remaining(name, now);
        if remaining.is_zero() {
            self.start(name, duration, now);
        }
        remaining
    }

    /// Iterate over timer names and states
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimerState)> {
        self.timers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Check-and-arm `name` using the ability's resolved variable of the same name
/// (in seconds) at `level` as the duration
pub fn cooldown(
    timers: &mut Timers,
    def: &AbilityDef,
    level: u32,
    name: &str,
    now: GameTime,
) -> Result<Remaining> {
    let duration = secs_to_duration(def.current(name, level)?);
    Ok(timers.check_and_arm(name, duration, now))
}
