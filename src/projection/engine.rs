//! Core projection engine: the four-phase yearly step and the multi-year driver

use log::{debug, info, warn};

use super::snapshot::{ProjectionResult, YearFlows, YearRecord};
use super::state::{CohortState, LevelState, WorkforceState, HEADCOUNT_EPSILON};
use crate::error::{InvariantViolation, Phase, ProjectionError, ValidationError};
use crate::params::{Cohort, Level, ParameterSet};

/// Relative tolerance for the conservation and reconciliation guards
const RECONCILE_TOLERANCE: f64 = 1e-9;

/// Net-new hires for one year
#[derive(Debug, Clone, PartialEq)]
struct HiringPlan {
    total: f64,
    campus: f64,
    /// Social hires per level, aligned with the level table
    social: Vec<f64>,
}

/// Main projection engine
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    params: ParameterSet,
}

impl ProjectionEngine {
    /// Create a new projection engine for a validated parameter set
    pub fn new(params: ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Run the full horizon: year 0 snapshot followed by `forecast_years` steps.
    ///
    /// Any failing year aborts the whole run.
    pub fn project(&self) -> Result<ProjectionResult, ProjectionError> {
        let initial = WorkforceState::from_params(&self.params);
        info!(
            "Projecting {} years from headcount {:.1} toward target {}",
            self.params.forecast_years(),
            initial.total_headcount(),
            self.params.target_headcount()
        );

        let mut result = ProjectionResult::new(initial);
        for year in 1..=self.params.forecast_years() {
            let record = self.step(year, &result.last().state)?;
            result.add_record(record);
        }

        let last = result.last();
        info!(
            "Projection complete: year {} headcount {:.1}, average level {:.2}",
            last.year, last.summary.total_headcount, last.summary.average_level
        );
        Ok(result)
    }

    /// Produce year `year` from the prior year-end state
    pub fn step(&self, year: u32, prior: &WorkforceState) -> Result<YearRecord, ProjectionError> {
        self.check_shape(year, prior)?;
        check_levels(year, Phase::Promotion, prior.levels())?;
        let before = prior.total_headcount();

        // Phase 1: promotion
        let (promoted_levels, promoted) = self.promote(prior);
        check_levels(year, Phase::Promotion, &promoted_levels)?;
        let after_promotion = total_headcount(&promoted_levels);
        if !approx_equal(after_promotion, before) {
            return Err(violation(
                year,
                Phase::Promotion,
                format!("headcount changed from {before} to {after_promotion}"),
            ));
        }
        debug!("Year {}: promoted {:.2} of {:.2}", year, promoted, before);

        // Phase 2: attrition, on post-promotion headcount
        let (survivors, departed, leaver_total_age) = self.attrit(&promoted_levels);
        check_levels(year, Phase::Attrition, &survivors)?;
        let post_attrition = total_headcount(&survivors);
        debug!("Year {}: {:.2} departed, {:.2} remain", year, departed, post_attrition);

        // Phase 3: hiring, balancing against the target
        let plan = self.plan_hiring(year, post_attrition)?;
        if plan.campus < 0.0 || plan.social.iter().any(|n| *n < 0.0) {
            return Err(violation(year, Phase::Hiring, format!("negative hires in {plan:?}")));
        }
        debug!(
            "Year {}: hiring {:.2} ({:.2} campus, {:.2} social)",
            year,
            plan.total,
            plan.campus,
            plan.total - plan.campus
        );

        // Phase 4: aging and intake
        let levels = self.age_and_hire(&survivors, &plan);
        check_levels(year, Phase::Aging, &levels)?;
        let state = WorkforceState::new(levels);

        let expected = post_attrition + plan.total;
        let actual = state.total_headcount();
        if !approx_equal(actual, expected) {
            return Err(violation(
                year,
                Phase::Hiring,
                format!("year-end headcount {actual} does not reconcile to {expected}"),
            ));
        }

        let flows = YearFlows {
            promoted,
            departed,
            leaver_average_age: (departed > HEADCOUNT_EPSILON).then(|| leaver_total_age / departed),
            total_hires: plan.total,
            campus_hires: plan.campus,
            social_hires: state
                .levels()
                .iter()
                .map(|l| l.level)
                .zip(plan.social.iter().copied())
                .collect(),
        };

        let summary = state.summary();
        Ok(YearRecord { year, state, summary, flows: Some(flows) })
    }

    /// The prior state must carry exactly the parameter set's levels, in order
    fn check_shape(&self, year: u32, prior: &WorkforceState) -> Result<(), ProjectionError> {
        let expected: Vec<Level> = self.params.levels().iter().map(|row| row.level).collect();
        let actual: Vec<Level> = prior.levels().iter().map(|state| state.level).collect();
        if actual != expected {
            return Err(violation(
                year,
                Phase::Promotion,
                format!("prior state has levels {actual:?}, parameters have {expected:?}"),
            ));
        }
        Ok(())
    }

    /// Move `promotion_rate` of every cohort one level up. Nobody leaves the top level.
    fn promote(&self, prior: &WorkforceState) -> (Vec<LevelState>, f64) {
        let levels = prior.levels();
        let mut next: Vec<LevelState> = levels.iter().map(|l| LevelState::new(l.level)).collect();
        let mut promoted = 0.0;

        for (idx, (state, row)) in levels.iter().zip(self.params.levels()).enumerate() {
            let has_next = idx + 1 < next.len();
            for cohort in Cohort::ALL {
                let current = *state.cohort(cohort);
                let rate = if has_next { row.cohort(cohort).promotion_rate } else { 0.0 };
                let moving = current.headcount * rate;

                let staying = current.resized(current.headcount - moving);
                let slot = next[idx].cohort_mut(cohort);
                *slot = CohortState::blend([*slot, staying]);

                if has_next {
                    // promotion does not reset age
                    let slot = next[idx + 1].cohort_mut(cohort);
                    *slot = CohortState::blend([*slot, current.resized(moving)]);
                    promoted += moving;
                }
            }
        }

        (next, promoted)
    }

    /// Remove `attrition_rate` of each post-promotion cohort.
    /// Returns survivors, total departures, and the summed leaving age of departures.
    fn attrit(&self, levels: &[LevelState]) -> (Vec<LevelState>, f64, f64) {
        let mut departed = 0.0;
        let mut leaver_total_age = 0.0;

        let survivors = levels
            .iter()
            .zip(self.params.levels())
            .map(|(state, row)| {
                let mut next = *state;
                for cohort in Cohort::ALL {
                    let rates = row.cohort(cohort);
                    let current = *state.cohort(cohort);
                    let departing = current.headcount * rates.attrition_rate;
                    departed += departing;
                    leaver_total_age += departing * rates.leaving_age;
                    *next.cohort_mut(cohort) = current.resized(current.headcount - departing);
                }
                next
            })
            .collect();

        (survivors, departed, leaver_total_age)
    }

    /// Net-new hires needed to bring the post-attrition total up to the target
    fn plan_hiring(&self, year: u32, post_attrition: f64) -> Result<HiringPlan, ValidationError> {
        let target = f64::from(self.params.target_headcount());
        if target < post_attrition {
            warn!(
                "Year {}: post-attrition headcount {:.1} exceeds target {}, no hires",
                year, post_attrition, target
            );
        }

        let total = (target - post_attrition).max(0.0);
        let campus = total * self.params.campus_ratio();
        let social_total = total - campus;

        let rows = self.params.levels();
        let social = if social_total > HEADCOUNT_EPSILON {
            let weight_total = self.params.hiring_ratio_total();
            if weight_total <= 0.0 {
                return Err(ValidationError::ZeroHiringRatios { social_hires: social_total });
            }
            rows.iter()
                .map(|row| social_total * row.hiring_ratio / weight_total)
                .collect()
        } else {
            vec![0.0; rows.len()]
        };

        Ok(HiringPlan { total, campus, social })
    }

    /// Age survivors by one year and blend in new hires at their entry age
    fn age_and_hire(&self, survivors: &[LevelState], plan: &HiringPlan) -> Vec<LevelState> {
        survivors
            .iter()
            .zip(self.params.levels())
            .zip(&plan.social)
            .map(|((state, row), &social_hires)| {
                let mut next = *state;
                for cohort in Cohort::ALL {
                    let hires = match cohort {
                        Cohort::Campus if state.level == Level::LOWEST => plan.campus,
                        Cohort::Campus => 0.0,
                        Cohort::Social => social_hires,
                    };
                    let intake = CohortState::new(hires, self.params.new_hire_age(row, cohort));
                    let aged = state.cohort(cohort).aged(1.0);
                    *next.cohort_mut(cohort) = CohortState::blend([aged, intake]);
                }
                next
            })
            .collect()
    }
}

/// Convenience wrapper: build an engine and run the full horizon
pub fn project(params: &ParameterSet) -> Result<ProjectionResult, ProjectionError> {
    ProjectionEngine::new(params.clone()).project()
}

fn total_headcount(levels: &[LevelState]) -> f64 {
    levels.iter().map(LevelState::headcount).sum()
}

fn approx_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= RECONCILE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn violation(year: u32, phase: Phase, detail: String) -> ProjectionError {
    InvariantViolation { year, phase, detail }.into()
}

/// Headcounts must be non-negative and ages finite and non-negative
fn check_levels(year: u32, phase: Phase, levels: &[LevelState]) -> Result<(), InvariantViolation> {
    for state in levels {
        for cohort in Cohort::ALL {
            let c = state.cohort(cohort);
            if !c.headcount.is_finite() || c.headcount < -HEADCOUNT_EPSILON {
                return Err(InvariantViolation {
                    year,
                    phase,
                    detail: format!("{} {} headcount {}", state.level, cohort, c.headcount),
                });
            }
            if let Some(age) = c.average_age {
                if !age.is_finite() || age < 0.0 {
                    return Err(InvariantViolation {
                        year,
                        phase,
                        detail: format!("{} {} average age {}", state.level, cohort, age),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::fixtures::{cohort, row};
    use crate::params::{CohortParams, LevelParams};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn single_level_params() -> ParameterSet {
        let campus = CohortParams {
            headcount: 100.0,
            average_age: 30.0,
            leaving_age: 32.0,
            promotion_rate: 0.0,
            attrition_rate: 0.1,
        };
        let mut level = row(Level::L1, campus, cohort(0.0, 0.0));
        level.hiring_ratio = 0.0;
        ParameterSet::builder()
            .level(level)
            .campus_ratio(1.0)
            .campus_new_hire_age(25.0)
            .forecast_years(1)
            .target_headcount(100)
            .build()
            .unwrap()
    }

    fn three_level_rows() -> Vec<LevelParams> {
        let mut rows = vec![
            row(Level::L1, cohort(100.0, 25.0), cohort(50.0, 28.0)),
            row(Level::L2, cohort(60.0, 30.0), cohort(80.0, 33.0)),
            row(Level::L3, cohort(20.0, 38.0), cohort(40.0, 41.0)),
        ];
        for (i, r) in rows.iter_mut().enumerate() {
            r.campus.promotion_rate = 0.2;
            r.social.promotion_rate = 0.1;
            r.campus.attrition_rate = 0.05 * (i as f64 + 1.0);
            r.social.attrition_rate = 0.1;
            r.hiring_ratio = (i + 1) as f64;
        }
        rows
    }

    fn three_level_params(target: u32) -> ParameterSet {
        ParameterSet::builder()
            .levels(three_level_rows())
            .campus_ratio(0.3)
            .forecast_years(3)
            .target_headcount(target)
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_level_scenario() {
        let result = ProjectionEngine::new(single_level_params()).project().unwrap();
        assert_eq!(result.records().len(), 2);

        let year1 = result.year(1).unwrap();
        let l1 = year1.state.level(Level::L1).unwrap();
        assert_relative_eq!(l1.campus.headcount, 100.0, epsilon = 1e-9);
        assert_relative_eq!(l1.campus.average_age.unwrap(), 30.4, epsilon = 1e-9);
        assert!(l1.social.is_empty());

        let flows = year1.flows.as_ref().unwrap();
        assert_relative_eq!(flows.departed, 10.0, epsilon = 1e-9);
        assert_relative_eq!(flows.campus_hires, 10.0, epsilon = 1e-9);
        assert_relative_eq!(flows.leaver_average_age.unwrap(), 32.0, epsilon = 1e-9);
        assert_eq!(flows.promoted, 0.0);
    }

    #[test]
    fn test_promotion_precedes_attrition() {
        let mut l1 = row(Level::L1, cohort(100.0, 25.0), cohort(0.0, 0.0));
        l1.campus.promotion_rate = 0.5;
        let mut l2 = row(Level::L2, cohort(0.0, 0.0), cohort(0.0, 0.0));
        l2.campus.attrition_rate = 0.5;
        let params = ParameterSet::builder()
            .levels([l1, l2])
            .campus_ratio(1.0)
            .forecast_years(1)
            .target_headcount(0)
            .build()
            .unwrap();

        let result = ProjectionEngine::new(params).project().unwrap();
        let record = result.last().clone();
        // 50 promoted into L2, then half of those leave
        let l2 = record.state.level(Level::L2).unwrap();
        assert_relative_eq!(l2.campus.headcount, 25.0);
        // promoted members keep their age, then age one year
        assert_relative_eq!(l2.campus.average_age.unwrap(), 26.0);
        assert_relative_eq!(record.flows.unwrap().departed, 25.0);
    }

    #[test]
    fn test_target_is_reached_and_campus_lands_at_l1() {
        let result = ProjectionEngine::new(three_level_params(600)).project().unwrap();
        assert_eq!(result.records().len(), 4);

        for record in &result.records()[1..] {
            assert_abs_diff_eq!(record.summary.total_headcount, 600.0, epsilon = 1e-6);
            let flows = record.flows.as_ref().unwrap();
            assert_abs_diff_eq!(flows.campus_hires, flows.total_hires * 0.3, epsilon = 1e-9);
            assert_abs_diff_eq!(
                flows.social_hires_total(),
                flows.total_hires * 0.7,
                epsilon = 1e-9
            );
            // social hires follow the 1:2:3 weights
            let social: Vec<f64> = flows.social_hires.iter().map(|(_, n)| *n).collect();
            assert_abs_diff_eq!(social[1], 2.0 * social[0], epsilon = 1e-9);
            assert_abs_diff_eq!(social[2], 3.0 * social[0], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_campus_hires_only_enter_lowest_level() {
        let mut rows = three_level_rows();
        for r in rows.iter_mut() {
            r.campus = cohort(0.0, 0.0);
        }
        let params = ParameterSet::builder()
            .levels(rows)
            .campus_ratio(0.5)
            .forecast_years(1)
            .target_headcount(400)
            .build()
            .unwrap();

        let result = ProjectionEngine::new(params).project().unwrap();
        let record = result.year(1).unwrap();
        let levels = record.state.levels();
        assert!(levels[0].campus.headcount > 0.0);
        assert!(levels[1].campus.is_empty());
        assert!(levels[2].campus.is_empty());
        assert_relative_eq!(levels[0].campus.average_age.unwrap(), 24.2, epsilon = 1e-9);
    }

    #[test]
    fn test_target_below_post_attrition_hires_nobody() {
        let params = three_level_params(100);
        let engine = ProjectionEngine::new(params);
        let prior = WorkforceState::from_params(engine.params());
        let record = engine.step(1, &prior).unwrap();
        let flows = record.flows.as_ref().unwrap();

        assert_eq!(flows.total_hires, 0.0);
        assert_relative_eq!(
            record.summary.total_headcount,
            prior.total_headcount() - flows.departed,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_aging_without_hires_adds_one_year() {
        let params = ParameterSet::builder()
            .level(row(Level::L1, cohort(40.0, 27.5), cohort(60.0, 31.0)))
            .forecast_years(5)
            .target_headcount(100)
            .build()
            .unwrap();

        let result = ProjectionEngine::new(params).project().unwrap();
        assert_eq!(result.records().len(), 6);
        for (year, record) in result.records().iter().enumerate() {
            let l1 = record.state.level(Level::L1).unwrap();
            assert_relative_eq!(l1.campus.headcount, 40.0);
            assert_relative_eq!(l1.campus.average_age.unwrap(), 27.5 + year as f64);
            assert_relative_eq!(l1.social.average_age.unwrap(), 31.0 + year as f64);
        }
    }

    #[test]
    fn test_top_level_promotion_rate_is_ignored() {
        let mut rows = three_level_rows();
        rows[2].campus.promotion_rate = 0.9;
        rows[2].social.promotion_rate = 0.9;
        let params = ParameterSet::builder()
            .levels(rows)
            .forecast_years(1)
            .target_headcount(0)
            .build()
            .unwrap();

        let engine = ProjectionEngine::new(params);
        let prior = WorkforceState::from_params(engine.params());
        let (promoted, _) = engine.promote(&prior);
        assert_relative_eq!(total_headcount(&promoted), prior.total_headcount(), epsilon = 1e-9);
        // L3 keeps its own 60 plus 20% of L2 campus and 10% of L2 social
        assert_relative_eq!(promoted[2].headcount(), 60.0 + 12.0 + 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_hiring_ratios_with_social_demand() {
        let mut rows = three_level_rows();
        for r in rows.iter_mut() {
            r.hiring_ratio = 0.0;
        }
        let params = ParameterSet::builder()
            .levels(rows)
            .campus_ratio(0.5)
            .target_headcount(1000)
            .build()
            .unwrap();

        let err = ProjectionEngine::new(params).project().unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::Validation(ValidationError::ZeroHiringRatios { .. })
        ));
    }

    #[test]
    fn test_zero_hiring_ratios_without_social_demand() {
        let mut rows = three_level_rows();
        for r in rows.iter_mut() {
            r.hiring_ratio = 0.0;
        }
        let params = ParameterSet::builder()
            .levels(rows)
            .campus_ratio(1.0)
            .target_headcount(1000)
            .build()
            .unwrap();
        assert!(ProjectionEngine::new(params).project().is_ok());
    }

    #[test]
    fn test_negative_prior_headcount_is_an_invariant_violation() {
        let engine = ProjectionEngine::new(single_level_params());
        let prior = WorkforceState::new(vec![LevelState {
            level: Level::L1,
            campus: CohortState { headcount: -5.0, average_age: Some(30.0) },
            social: CohortState::empty(),
        }]);

        match engine.step(1, &prior) {
            Err(ProjectionError::Invariant(v)) => {
                assert_eq!(v.year, 1);
                assert_eq!(v.phase, Phase::Promotion);
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn test_prior_with_missing_levels_is_rejected() {
        let mut l1 = row(Level::L1, cohort(100.0, 25.0), cohort(0.0, 0.0));
        l1.campus.promotion_rate = 0.5;
        let params = ParameterSet::builder()
            .levels([l1, row(Level::L2, cohort(0.0, 0.0), cohort(0.0, 0.0))])
            .forecast_years(1)
            .target_headcount(0)
            .build()
            .unwrap();
        let engine = ProjectionEngine::new(params);

        // one-level prior against a two-level table would drop the L2 promotions
        let short = WorkforceState::new(vec![LevelState {
            level: Level::L1,
            campus: CohortState::new(100.0, 25.0),
            social: CohortState::empty(),
        }]);
        match engine.step(1, &short) {
            Err(ProjectionError::Invariant(v)) => {
                assert_eq!(v.year, 1);
                assert_eq!(v.phase, Phase::Promotion);
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }

        // same length but a different level
        let shifted = WorkforceState::new(vec![LevelState::new(Level::L1), LevelState::new(Level::L3)]);
        assert!(matches!(engine.step(1, &shifted), Err(ProjectionError::Invariant(_))));

        let full = WorkforceState::from_params(engine.params());
        let record = engine.step(1, &full).unwrap();
        assert_relative_eq!(record.flows.unwrap().promoted, 50.0);
    }

    #[test]
    fn test_emptied_cohort_has_no_age() {
        let mut l1 = row(Level::L1, cohort(10.0, 25.0), cohort(0.0, 0.0));
        l1.campus.attrition_rate = 1.0;
        l1.hiring_ratio = 0.0;
        let params = ParameterSet::builder()
            .level(l1)
            .campus_ratio(1.0)
            .forecast_years(2)
            .target_headcount(0)
            .build()
            .unwrap();

        let result = project(&params).unwrap();
        let last = result.last();
        assert!(last.state.levels()[0].campus.is_empty());
        assert_eq!(last.state.levels()[0].campus.average_age, None);
        assert_eq!(last.summary.average_age, None);
        assert_eq!(last.summary.total_headcount, 0.0);
    }
}
