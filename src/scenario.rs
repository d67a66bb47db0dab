//! Scenario runner for comparing alternative global assumptions
//!
//! Holds one validated base parameter set and runs projections with
//! different global scalars (target headcount, campus ratio, horizon)
//! without reloading the preset table.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::ProjectionError;
use crate::params::{GlobalParams, ParameterSet};
use crate::projection::{ProjectionEngine, ProjectionResult};

/// Overrides applied on top of the base globals. `None` keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub target_headcount: Option<u32>,
    pub campus_ratio: Option<f64>,
    pub campus_new_hire_age: Option<f64>,
    pub forecast_years: Option<u32>,
}

impl Scenario {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Scenario that only changes the year-end target
    pub fn with_target(target: u32) -> Self {
        Self {
            name: format!("target {}", target),
            target_headcount: Some(target),
            ..Default::default()
        }
    }

    fn apply(&self, base: GlobalParams) -> GlobalParams {
        GlobalParams {
            campus_ratio: self.campus_ratio.unwrap_or(base.campus_ratio),
            campus_new_hire_age: self.campus_new_hire_age.unwrap_or(base.campus_new_hire_age),
            forecast_years: self.forecast_years.unwrap_or(base.forecast_years),
            target_headcount: self.target_headcount.or(base.target_headcount),
        }
    }
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(params);
/// let results = runner.run_batch(&[Scenario::with_target(1900), Scenario::with_target(2100)]);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base: ParameterSet,
}

impl ScenarioRunner {
    pub fn new(base: ParameterSet) -> Self {
        Self { base }
    }

    /// Projection with the base parameters unchanged
    pub fn run_base(&self) -> Result<ProjectionResult, ProjectionError> {
        ProjectionEngine::new(self.base.clone()).project()
    }

    /// Projection with one scenario's overrides; the overrides are re-validated
    pub fn run(&self, scenario: &Scenario) -> Result<ProjectionResult, ProjectionError> {
        let params = self.base.with_globals(scenario.apply(self.base.globals()))?;
        ProjectionEngine::new(params).project()
    }

    /// Run independent scenarios in parallel. Years within a scenario stay sequential.
    pub fn run_batch(&self, scenarios: &[Scenario]) -> Vec<Result<ProjectionResult, ProjectionError>> {
        scenarios.par_iter().map(|scenario| self.run(scenario)).collect()
    }

    pub fn base(&self) -> &ParameterSet {
        &self.base
    }
}
