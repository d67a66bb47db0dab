//! Error taxonomy for parameter validation, loading and projection runs

use std::fmt;

use serde::Serialize;

use crate::params::{Cohort, Level};

/// Where an offending input value lives in the parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    pub level: Option<Level>,
    pub cohort: Option<Cohort>,
    pub field: &'static str,
}

impl FieldLocation {
    /// A global scalar (not tied to any level)
    pub fn global(field: &'static str) -> Self {
        Self { level: None, cohort: None, field }
    }

    /// A per-level column shared by both cohorts (e.g. hiring ratio)
    pub fn level(level: Level, field: &'static str) -> Self {
        Self { level: Some(level), cohort: None, field }
    }

    /// A per-level, per-cohort column
    pub fn cohort(level: Level, cohort: Cohort, field: &'static str) -> Self {
        Self { level: Some(level), cohort: Some(cohort), field }
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.level, self.cohort) {
            (Some(level), Some(cohort)) => write!(f, "{} {} {}", level, cohort, self.field),
            (Some(level), None) => write!(f, "{} {}", level, self.field),
            _ => f.write_str(self.field),
        }
    }
}

/// Bad input supplied by the caller
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{location} = {value} is outside [0, 1]")]
    RateOutOfRange { location: FieldLocation, value: f64 },

    #[error("{location} = {value} must not be negative")]
    NegativeValue { location: FieldLocation, value: f64 },

    #[error("{location} is not a finite number")]
    NotFinite { location: FieldLocation },

    #[error("forecast_years = {years} is outside [{min}, {max}]", min = crate::params::MIN_FORECAST_YEARS, max = crate::params::MAX_FORECAST_YEARS)]
    ForecastYearsOutOfRange { years: u32 },

    #[error("input table is missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("required parameter `{field}` was not supplied")]
    MissingField { field: &'static str },

    #[error("invalid level `{value}`, expected L1-L7")]
    InvalidLevel { value: String },

    #[error("level {level} appears more than once")]
    DuplicateLevel { level: Level },

    #[error("levels must be contiguous from L1, but {missing} is missing")]
    LevelGap { missing: Level },

    #[error("input table has no levels")]
    EmptyTable,

    #[error("hiring ratios sum to zero but {social_hires:.2} social hires must be placed")]
    ZeroHiringRatios { social_hires: f64 },
}

/// Phase of the yearly step, used to pinpoint invariant failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Promotion,
    Attrition,
    Hiring,
    Aging,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Promotion => "promotion",
            Phase::Attrition => "attrition",
            Phase::Hiring => "hiring",
            Phase::Aging => "aging",
        };
        f.write_str(name)
    }
}

/// Internal consistency check failed after a phase. Not recoverable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invariant violated in {phase} phase of year {year}: {detail}")]
pub struct InvariantViolation {
    pub year: u32,
    pub phase: Phase,
    pub detail: String,
}

/// Failure of a projection run. A failed year aborts the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Failure while reading a preset table or a global-parameter file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
