//! Input model: levels, cohorts, per-level rates and global scalars

mod data;
mod level;
pub mod loader;

pub use data::{
    CohortParams, GlobalParams, LevelParams, ParameterSet, ParameterSetBuilder,
    DEFAULT_CAMPUS_NEW_HIRE_AGE, DEFAULT_CAMPUS_RATIO, DEFAULT_FORECAST_YEARS,
    MAX_FORECAST_YEARS, MIN_FORECAST_YEARS,
};
pub use level::{Cohort, Level};
pub use loader::{load_globals, load_levels, load_levels_from_reader, load_preset};

#[cfg(test)]
pub(crate) use data::tests as fixtures;
