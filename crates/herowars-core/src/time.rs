//! Game time as supplied by the host
//!
//! The core never reads a wall clock. The host passes the current instant
//! with every call, which keeps timers deterministic under test:
//! - `GameTime` - absolute instant in milliseconds since server start
//! - `Remaining` - time left on a timer, or `Infinite` while reserved

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// An absolute game instant, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GameTime(pub u64);

impl GameTime {
    /// Server start
    pub const ZERO: GameTime = GameTime(0);

    /// Create from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from whole seconds
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Milliseconds since server start
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_since(&self, earlier: GameTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for GameTime {
    type Output = GameTime;

    fn add(self, rhs: Duration) -> GameTime {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        GameTime(self.0.saturating_add(ms))
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

/// Time left on a timer
///
/// Variant order matters: every `Finite` value compares below `Infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Remaining {
    /// Timer expires after this duration (zero when expired or never started)
    Finite(Duration),
    /// Timer is reserved and has no expiry
    Infinite,
}

impl Remaining {
    /// An expired timer
    pub const ZERO: Remaining = Remaining::Finite(Duration::ZERO);

    /// True once the timer no longer blocks
    pub fn is_zero(&self) -> bool {
        matches!(self, Remaining::Finite(d) if d.is_zero())
    }

    /// True for a reserved timer
    pub fn is_infinite(&self) -> bool {
        matches!(self, Remaining::Infinite)
    }

    /// The finite duration, if any
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Remaining::Finite(d) => Some(*d),
            Remaining::Infinite => None,
        }
    }

    /// Seconds left, `f64::INFINITY` while reserved
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            Remaining::Finite(d) => d.as_secs_f64(),
            Remaining::Infinite => f64::INFINITY,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Finite(d) => write!(f, "{:.1}s", d.as_secs_f64()),
            Remaining::Infinite => write!(f, "reserved"),
        }
    }
}

/// Convert a resolved variable (in seconds) into a duration
///
/// Negative, NaN and infinite inputs collapse to zero so a bad content value
/// can never produce a negative remaining time. Values too large for a
/// `Duration` saturate at `Duration::MAX`.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_time_add() {
        let t = GameTime::from_secs(2) + Duration::from_millis(500);
        assert_eq!(t.as_millis(), 2500);
        assert_eq!(t.to_string(), "2.500s");
    }

    #[test]
    fn test_saturating_since() {
        let a = GameTime::from_millis(1000);
        let b = GameTime::from_millis(1500);
        assert_eq!(b.saturating_since(a), Duration::from_millis(500));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn test_infinite_is_greatest() {
        let long = Remaining::Finite(Duration::from_secs(u64::MAX / 2));
        assert!(Remaining::Infinite > long);
        assert!(Remaining::Infinite > Remaining::ZERO);
        assert!(Remaining::ZERO.is_zero());
    }

    #[test]
    fn test_secs_to_duration_rejects_negative() {
        assert_eq!(secs_to_duration(-3.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_secs_to_duration_saturates() {
        assert_eq!(secs_to_duration(1e20), Duration::MAX);
        assert_eq!(secs_to_duration(f64::MAX), Duration::MAX);
        assert_eq!(GameTime::from_secs(1) + secs_to_duration(1e20), GameTime(u64::MAX));
    }
}
