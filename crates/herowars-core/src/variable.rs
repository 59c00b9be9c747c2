//! Per-level variable resolution
//!
//! Ability content declares named variables (`cooldown`, `chance`, `damage`,
//! ...) whose value depends on the instance's level. A variable is one of:
//! - a per-level rule `(base: 5, per_level: 2.5)` resolving to `base + level * per_level`
//! - a table `[10, 15, 20]` indexed by level, floored at the first entry
//! - a constant `30`
//!
//! Values are computed directly from the level each time, never accumulated,
//! so repeated level changes cannot drift.

use crate::level::MaxLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named variable's raw definition
///
/// Deserialization tries the variants in declaration order, which is also
/// the resolution precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    /// `base + level * per_level`
    PerLevel {
        #[serde(default)]
        base: f64,
        per_level: f64,
    },
    /// Entry `clamp(level, 1, len) - 1`
    Table(Vec<f64>),
    /// Same value at every level
    Constant(f64),
}

impl Variable {
    /// Resolve the value at `level`
    pub fn current(&self, level: u32) -> f64 {
        match self {
            Variable::PerLevel { base, per_level } => base + f64::from(level) * per_level,
            Variable::Table(values) => {
                let index = (level as usize).clamp(1, values.len().max(1)) - 1;
                values.get(index).copied().unwrap_or_default()
            }
            Variable::Constant(value) => *value,
        }
    }

    /// Display range from level 1 to `max_level`
    pub fn range(&self, max_level: MaxLevel) -> VariableRange {
        match self {
            Variable::Constant(value) => VariableRange::Fixed(*value),
            _ => match max_level {
                MaxLevel::Finite(max) => VariableRange::Span {
                    low: self.current(1),
                    high: self.current(max),
                },
                MaxLevel::Unbounded => VariableRange::Unbounded {
                    low: self.current(1),
                },
            },
        }
    }

    /// Check the definition can be resolved at every level
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Variable::Table(values) if values.is_empty() => {
                Err("table variable has no entries".to_string())
            }
            Variable::PerLevel { base, per_level } if !base.is_finite() || !per_level.is_finite() => {
                Err("per-level variable must be finite".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Display range of a variable across an ability's levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VariableRange {
    /// Does not depend on level
    Fixed(f64),
    /// Value at level 1 and at the maximum level
    Span { low: f64, high: f64 },
    /// The ability has no maximum level, so no upper bound can be computed
    Unbounded { low: f64 },
}

impl fmt::Display for VariableRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableRange::Fixed(value) => write!(f, "{}", value),
            VariableRange::Span { low, high } => write!(f, "{} - {}", low, high),
            VariableRange::Unbounded { low } => write!(f, "{}+", low),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_level() {
        let v = Variable::PerLevel {
            base: 10.0,
            per_level: 2.5,
        };
        assert_eq!(v.current(0), 10.0);
        assert_eq!(v.current(4), 20.0);
    }

    #[test]
    fn test_table_floors_at_first_entry() {
        let v = Variable::Table(vec![5.0, 7.0, 9.0]);
        assert_eq!(v.current(0), 5.0);
        assert_eq!(v.current(1), 5.0);
        assert_eq!(v.current(2), 7.0);
        assert_eq!(v.current(3), 9.0);
        assert_eq!(v.current(40), 9.0);
    }

    #[test]
    fn test_constant() {
        assert_eq!(Variable::Constant(30.0).current(7), 30.0);
    }

    #[test]
    fn test_no_drift_at_high_levels() {
        let v = Variable::PerLevel {
            base: 0.0,
            per_level: 0.1,
        };
        assert_eq!(v.current(1000), 1000.0 * 0.1);
    }

    #[test]
    fn test_range() {
        let v = Variable::PerLevel {
            base: 0.0,
            per_level: 3.0,
        };
        assert_eq!(
            v.range(MaxLevel::Finite(8)),
            VariableRange::Span {
                low: 3.0,
                high: 24.0
            }
        );
        assert_eq!(
            v.range(MaxLevel::Unbounded),
            VariableRange::Unbounded { low: 3.0 }
        );
        assert_eq!(
            Variable::Constant(4.0).range(MaxLevel::Unbounded),
            VariableRange::Fixed(4.0)
        );
        assert_eq!(
            Variable::Table(vec![1.0, 2.0]).range(MaxLevel::Finite(4)).to_string(),
            "1 - 2"
        );
    }

    #[test]
    fn test_deserialize_variants_from_ron() {
        let v: Variable = ron::from_str("(base: 5, per_level: 2)").unwrap();
        assert_eq!(
            v,
            Variable::PerLevel {
                base: 5.0,
                per_level: 2.0
            }
        );
        let v: Variable = ron::from_str("(per_level: 1.5)").unwrap();
        assert_eq!(v.current(2), 3.0);
        let v: Variable = ron::from_str("[1, 2, 3]").unwrap();
        assert_eq!(v, Variable::Table(vec![1.0, 2.0, 3.0]));
        let v: Variable = ron::from_str("12.5").unwrap();
        assert_eq!(v, Variable::Constant(12.5));
    }

    #[test]
    fn test_validate() {
        assert!(Variable::Table(vec![]).validate().is_err());
        assert!(Variable::Constant(1.0).validate().is_ok());
    }
}
