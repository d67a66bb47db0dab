//! Projection engine for multi-year workforce forecasts

mod state;
mod engine;
mod snapshot;

pub use state::{CohortState, LevelState, WorkforceState, YearSummary, HEADCOUNT_EPSILON};
pub use engine::{project, ProjectionEngine};
pub use snapshot::{round_preserving_total, ProjectionResult, RoundedLevelRow, YearFlows, YearRecord};
