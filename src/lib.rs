//! Headcount Forecast - year-by-year workforce structure projection
//!
//! This library provides:
//! - A validated, immutable parameter model for per-level campus/social cohorts
//! - Preset loading from CSV tables
//! - A four-phase yearly step (promotion, attrition, hiring, aging) and a
//!   multi-year driver producing an ordered sequence of snapshots
//! - Scenario comparison over alternative global scalars
//! - CSV export of the projected tables

pub mod error;
pub mod params;
pub mod projection;
pub mod scenario;
pub mod export;

// Re-export commonly used types
pub use error::{InvariantViolation, LoadError, Phase, ProjectionError, ValidationError};
pub use params::{Cohort, GlobalParams, Level, LevelParams, ParameterSet, ParameterSetBuilder};
pub use projection::{ProjectionEngine, ProjectionResult, WorkforceState, YearRecord, YearSummary};
pub use scenario::{Scenario, ScenarioRunner};
