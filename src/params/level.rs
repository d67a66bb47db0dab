//! Organizational levels and recruitment cohorts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ordinal rank, lowest to highest. Promotion always moves exactly one step up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 7] = [
        Level::L1,
        Level::L2,
        Level::L3,
        Level::L4,
        Level::L5,
        Level::L6,
        Level::L7,
    ];

    pub const LOWEST: Level = Level::L1;
    pub const HIGHEST: Level = Level::L7;

    /// Numeric rank (1-7), used for the weighted average level
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }

    /// Level for a numeric rank (1-7)
    pub fn from_rank(rank: u8) -> Option<Level> {
        match rank {
            1..=7 => Some(Self::ALL[usize::from(rank - 1)]),
            _ => None,
        }
    }

    /// Zero-based position in [`Level::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The level one step up, if any
    pub fn next(self) -> Option<Level> {
        Level::from_rank(self.rank() + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::L1 => "L1",
            Level::L2 => "L2",
            Level::L3 => "L3",
            Level::L4 => "L4",
            Level::L5 => "L5",
            Level::L6 => "L6",
            Level::L7 => "L7",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ValidationError;

    /// Parse the `L1`..`L7` notation used by preset tables
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidLevel { value: s.to_string() };
        let digits = s.trim().strip_prefix('L').ok_or_else(invalid)?;
        let rank: u8 = digits.parse().map_err(|_| invalid())?;
        Level::from_rank(rank).ok_or_else(invalid)
    }
}

/// Recruitment channel a cohort entered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    /// Fresh-graduate hires; new campus hires always enter at the lowest level
    Campus,
    /// Experienced hires, distributed across levels by hiring ratio
    Social,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::Campus, Cohort::Social];

    pub fn as_str(self) -> &'static str {
        match self {
            Cohort::Campus => "campus",
            Cohort::Social => "social",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order_and_next() {
        assert!(Level::L1 < Level::L2);
        assert!(Level::L6 < Level::L7);
        assert_eq!(Level::L3.next(), Some(Level::L4));
        assert_eq!(Level::HIGHEST.next(), None);
        assert_eq!(Level::L5.rank(), 5);
        assert_eq!(Level::L5.index(), 4);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("L1".parse::<Level>().unwrap(), Level::L1);
        assert_eq!(" L7 ".parse::<Level>().unwrap(), Level::L7);
        assert!(matches!("L0".parse::<Level>(), Err(ValidationError::InvalidLevel { .. })));
        assert!(matches!("L8".parse::<Level>(), Err(ValidationError::InvalidLevel { .. })));
        assert!(matches!("3".parse::<Level>(), Err(ValidationError::InvalidLevel { .. })));
        assert!(matches!("Lx".parse::<Level>(), Err(ValidationError::InvalidLevel { .. })));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }
}
