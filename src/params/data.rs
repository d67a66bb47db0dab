//! Parameter set: initial cohort populations, behavioural rates and global scalars

use log::warn;
use serde::{Deserialize, Serialize};

use super::level::{Cohort, Level};
use crate::error::{FieldLocation, ValidationError};

/// Shortest supported forecast horizon, in years
pub const MIN_FORECAST_YEARS: u32 = 1;
/// Longest supported forecast horizon, in years
pub const MAX_FORECAST_YEARS: u32 = 5;

pub const DEFAULT_CAMPUS_RATIO: f64 = 0.05;
pub const DEFAULT_CAMPUS_NEW_HIRE_AGE: f64 = 24.2;
pub const DEFAULT_FORECAST_YEARS: u32 = 3;

/// Initial population and rates for one cohort at one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortParams {
    /// Current headcount (may be fractional)
    pub headcount: f64,

    /// Current average age
    pub average_age: f64,

    /// Average age of departing members; reporting only
    pub leaving_age: f64,

    /// Fraction promoted one level up each year
    pub promotion_rate: f64,

    /// Fraction of the post-promotion headcount that departs each year
    pub attrition_rate: f64,
}

/// One row of the input table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub level: Level,
    pub campus: CohortParams,
    pub social: CohortParams,

    /// Average age of social hires entering this level
    pub social_new_hire_age: f64,

    /// Relative weight of this level when distributing social hires.
    /// Weights are normalized at use time and need not sum to 1.
    pub hiring_ratio: f64,
}

impl LevelParams {
    pub fn cohort(&self, cohort: Cohort) -> &CohortParams {
        match cohort {
            Cohort::Campus => &self.campus,
            Cohort::Social => &self.social,
        }
    }

    /// Combined headcount of both cohorts
    pub fn headcount(&self) -> f64 {
        self.campus.headcount + self.social.headcount
    }
}

/// Global scalars, deserializable from a JSON config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParams {
    /// Target fraction of net-new hires that are campus hires
    pub campus_ratio: f64,

    /// Average age of new campus hires
    pub campus_new_hire_age: f64,

    /// Number of years to project (1-5)
    pub forecast_years: u32,

    /// Desired total population at each year end
    pub target_headcount: Option<u32>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            campus_ratio: DEFAULT_CAMPUS_RATIO,
            campus_new_hire_age: DEFAULT_CAMPUS_NEW_HIRE_AGE,
            forecast_years: DEFAULT_FORECAST_YEARS,
            target_headcount: None,
        }
    }
}

/// Validated, immutable configuration for one projection run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    levels: Vec<LevelParams>,
    campus_ratio: f64,
    campus_new_hire_age: f64,
    forecast_years: u32,
    target_headcount: u32,
}

impl ParameterSet {
    pub fn builder() -> ParameterSetBuilder {
        ParameterSetBuilder::default()
    }

    /// Rows in ascending level order, contiguous from L1
    pub fn levels(&self) -> &[LevelParams] {
        &self.levels
    }

    pub fn level(&self, level: Level) -> Option<&LevelParams> {
        self.levels.get(level.index())
    }

    /// Highest level present in the table; nobody is promoted out of it
    pub fn top_level(&self) -> Level {
        self.levels.last().map(|row| row.level).unwrap_or(Level::LOWEST)
    }

    pub fn campus_ratio(&self) -> f64 {
        self.campus_ratio
    }

    pub fn campus_new_hire_age(&self) -> f64 {
        self.campus_new_hire_age
    }

    pub fn forecast_years(&self) -> u32 {
        self.forecast_years
    }

    pub fn target_headcount(&self) -> u32 {
        self.target_headcount
    }

    /// Age assigned to new hires entering `row` through `cohort`
    pub fn new_hire_age(&self, row: &LevelParams, cohort: Cohort) -> f64 {
        match cohort {
            Cohort::Campus => self.campus_new_hire_age,
            Cohort::Social => row.social_new_hire_age,
        }
    }

    /// Sum of the social hiring weights across all levels
    pub fn hiring_ratio_total(&self) -> f64 {
        self.levels.iter().map(|row| row.hiring_ratio).sum()
    }

    /// Total headcount of the initial table
    pub fn initial_headcount(&self) -> f64 {
        self.levels.iter().map(LevelParams::headcount).sum()
    }

    pub fn globals(&self) -> GlobalParams {
        GlobalParams {
            campus_ratio: self.campus_ratio,
            campus_new_hire_age: self.campus_new_hire_age,
            forecast_years: self.forecast_years,
            target_headcount: Some(self.target_headcount),
        }
    }

    /// Copy of this set with different global scalars, re-validated
    pub fn with_globals(&self, globals: GlobalParams) -> Result<ParameterSet, ValidationError> {
        ParameterSetBuilder::default()
            .levels(self.levels.iter().copied())
            .globals(globals)
            .build()
    }

    /// Check every value against its allowed range.
    ///
    /// Runs as part of [`ParameterSetBuilder::build`]; calling it again on a
    /// built set always succeeds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_level_sequence(&self.levels)?;

        for row in &self.levels {
            for cohort in Cohort::ALL {
                let params = row.cohort(cohort);
                let at = |field| FieldLocation::cohort(row.level, cohort, field);
                check_non_negative(at("headcount"), params.headcount)?;
                check_non_negative(at("average_age"), params.average_age)?;
                check_non_negative(at("leaving_age"), params.leaving_age)?;
                check_rate(at("promotion_rate"), params.promotion_rate)?;
                check_rate(at("attrition_rate"), params.attrition_rate)?;
            }
            check_non_negative(
                FieldLocation::cohort(row.level, Cohort::Social, "new_hire_age"),
                row.social_new_hire_age,
            )?;
            check_non_negative(FieldLocation::level(row.level, "hiring_ratio"), row.hiring_ratio)?;
        }

        check_rate(FieldLocation::global("campus_ratio"), self.campus_ratio)?;
        check_non_negative(FieldLocation::global("campus_new_hire_age"), self.campus_new_hire_age)?;
        check_forecast_years(self.forecast_years)?;

        Ok(())
    }
}

/// Builder collecting table rows and global scalars before validation
#[derive(Debug, Clone, Default)]
pub struct ParameterSetBuilder {
    levels: Vec<LevelParams>,
    globals: GlobalParams,
}

impl ParameterSetBuilder {
    pub fn level(mut self, row: LevelParams) -> Self {
        self.levels.push(row);
        self
    }

    pub fn levels<I: IntoIterator<Item = LevelParams>>(mut self, rows: I) -> Self {
        self.levels.extend(rows);
        self
    }

    /// Replace all global scalars at once
    pub fn globals(mut self, globals: GlobalParams) -> Self {
        self.globals = globals;
        self
    }

    pub fn campus_ratio(mut self, ratio: f64) -> Self {
        self.globals.campus_ratio = ratio;
        self
    }

    pub fn campus_new_hire_age(mut self, age: f64) -> Self {
        self.globals.campus_new_hire_age = age;
        self
    }

    pub fn forecast_years(mut self, years: u32) -> Self {
        self.globals.forecast_years = years;
        self
    }

    pub fn target_headcount(mut self, target: u32) -> Self {
        self.globals.target_headcount = Some(target);
        self
    }

    /// Sort rows by level and validate everything
    pub fn build(self) -> Result<ParameterSet, ValidationError> {
        let mut levels = self.levels;
        levels.sort_by_key(|row| row.level);

        let target_headcount = self
            .globals
            .target_headcount
            .ok_or(ValidationError::MissingField { field: "target_headcount" })?;

        let params = ParameterSet {
            levels,
            campus_ratio: self.globals.campus_ratio,
            campus_new_hire_age: self.globals.campus_new_hire_age,
            forecast_years: self.globals.forecast_years,
            target_headcount,
        };
        params.validate()?;

        if let Some(top) = params.levels.last() {
            for cohort in Cohort::ALL {
                let rate = top.cohort(cohort).promotion_rate;
                if rate > 0.0 {
                    warn!(
                        "{} {} promotion_rate {} ignored: {} is the top level",
                        top.level, cohort, rate, top.level
                    );
                }
            }
        }

        Ok(params)
    }
}

/// Rows must be sorted, unique and contiguous from L1
fn check_level_sequence(levels: &[LevelParams]) -> Result<(), ValidationError> {
    if levels.is_empty() {
        return Err(ValidationError::EmptyTable);
    }
    if let Some(pair) = levels.windows(2).find(|pair| pair[0].level == pair[1].level) {
        return Err(ValidationError::DuplicateLevel { level: pair[1].level });
    }
    for (expected, row) in Level::ALL.iter().zip(levels) {
        if row.level != *expected {
            return Err(ValidationError::LevelGap { missing: *expected });
        }
    }
    Ok(())
}

fn check_forecast_years(years: u32) -> Result<(), ValidationError> {
    if (MIN_FORECAST_YEARS..=MAX_FORECAST_YEARS).contains(&years) {
        Ok(())
    } else {
        Err(ValidationError::ForecastYearsOutOfRange { years })
    }
}

fn check_finite(location: FieldLocation, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { location })
    }
}

fn check_non_negative(location: FieldLocation, value: f64) -> Result<(), ValidationError> {
    check_finite(location, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { location, value });
    }
    Ok(())
}

fn check_rate(location: FieldLocation, value: f64) -> Result<(), ValidationError> {
    check_finite(location, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::RateOutOfRange { location, value });
    }
    Ok(())
}
