//! Workforce state at a year end

use serde::Serialize;

use crate::params::{Cohort, Level, ParameterSet};

/// Headcounts at or below this are treated as zero
pub const HEADCOUNT_EPSILON: f64 = 1e-9;

/// Population of one cohort at one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CohortState {
    /// Fractional headcount; rounded only for display
    pub headcount: f64,

    /// Mean age, `None` when the cohort is empty
    pub average_age: Option<f64>,
}

impl CohortState {
    /// Cohort with the given population; the age is dropped if it is empty
    pub fn new(headcount: f64, average_age: f64) -> Self {
        if headcount <= HEADCOUNT_EPSILON {
            Self::empty()
        } else {
            Self { headcount, average_age: Some(average_age) }
        }
    }

    pub fn empty() -> Self {
        Self { headcount: 0.0, average_age: None }
    }

    pub fn is_empty(&self) -> bool {
        self.headcount <= HEADCOUNT_EPSILON
    }

    /// Sum of ages across members
    pub fn total_age(&self) -> f64 {
        match self.average_age {
            Some(age) if !self.is_empty() => self.headcount * age,
            _ => 0.0,
        }
    }

    /// Same average age with a different headcount
    pub fn resized(self, headcount: f64) -> Self {
        if headcount <= HEADCOUNT_EPSILON {
            Self::empty()
        } else {
            Self { headcount, average_age: self.average_age }
        }
    }

    /// Same members, `years` older
    pub fn aged(self, years: f64) -> Self {
        Self {
            headcount: self.headcount,
            average_age: self.average_age.map(|age| age + years),
        }
    }

    /// Headcount-weighted merge of several groups into one cohort
    pub fn blend<I: IntoIterator<Item = CohortState>>(parts: I) -> Self {
        let mut headcount = 0.0;
        let mut aged_headcount = 0.0;
        let mut total_age = 0.0;
        for part in parts {
            if part.is_empty() {
                continue;
            }
            headcount += part.headcount;
            if let Some(age) = part.average_age {
                aged_headcount += part.headcount;
                total_age += part.headcount * age;
            }
        }

        if headcount <= HEADCOUNT_EPSILON {
            return Self::empty();
        }
        Self {
            headcount,
            average_age: (aged_headcount > HEADCOUNT_EPSILON).then(|| total_age / aged_headcount),
        }
    }
}

/// Both cohorts at one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelState {
    pub level: Level,
    pub campus: CohortState,
    pub social: CohortState,
}

impl LevelState {
    pub fn new(level: Level) -> Self {
        Self { level, campus: CohortState::empty(), social: CohortState::empty() }
    }

    pub fn cohort(&self, cohort: Cohort) -> &CohortState {
        match cohort {
            Cohort::Campus => &self.campus,
            Cohort::Social => &self.social,
        }
    }

    pub fn cohort_mut(&mut self, cohort: Cohort) -> &mut CohortState {
        match cohort {
            Cohort::Campus => &mut self.campus,
            Cohort::Social => &mut self.social,
        }
    }

    pub fn headcount(&self) -> f64 {
        self.campus.headcount + self.social.headcount
    }

    pub fn total_age(&self) -> f64 {
        self.campus.total_age() + self.social.total_age()
    }
}

/// Per-level, per-cohort population table. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkforceState {
    levels: Vec<LevelState>,
}

impl WorkforceState {
    pub fn new(levels: Vec<LevelState>) -> Self {
        Self { levels }
    }

    /// Year-0 table built from the input rows
    pub fn from_params(params: &ParameterSet) -> Self {
        let levels = params
            .levels()
            .iter()
            .map(|row| LevelState {
                level: row.level,
                campus: CohortState::new(row.campus.headcount, row.campus.average_age),
                social: CohortState::new(row.social.headcount, row.social.average_age),
            })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[LevelState] {
        &self.levels
    }

    pub fn level(&self, level: Level) -> Option<&LevelState> {
        self.levels.get(level.index())
    }

    pub fn total_headcount(&self) -> f64 {
        self.levels.iter().map(LevelState::headcount).sum()
    }

    pub fn cohort_headcount(&self, cohort: Cohort) -> f64 {
        self.levels.iter().map(|l| l.cohort(cohort).headcount).sum()
    }

    pub fn total_age(&self) -> f64 {
        self.levels.iter().map(LevelState::total_age).sum()
    }

    /// Derived scalars for reporting
    pub fn summary(&self) -> YearSummary {
        let total_headcount = self.total_headcount();
        let campus_headcount = self.cohort_headcount(Cohort::Campus);
        let social_headcount = self.cohort_headcount(Cohort::Social);
        let total_age = self.total_age();
        let weighted_level: f64 = self
            .levels
            .iter()
            .map(|l| f64::from(l.level.rank()) * l.headcount())
            .sum();

        let has_people = total_headcount > HEADCOUNT_EPSILON;
        YearSummary {
            total_headcount,
            campus_headcount,
            social_headcount,
            campus_ratio: if has_people { campus_headcount / total_headcount } else { 0.0 },
            average_level: if has_people { weighted_level / total_headcount } else { 0.0 },
            average_age: has_people.then(|| total_age / total_headcount),
            total_age,
        }
    }
}

/// Per-year summary scalars
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearSummary {
    pub total_headcount: f64,
    pub campus_headcount: f64,
    pub social_headcount: f64,
    /// Share of campus hires in the whole population
    pub campus_ratio: f64,
    /// Headcount-weighted mean of level ranks (1-7)
    pub average_level: f64,
    pub average_age: Option<f64>,
    pub total_age: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_cohort_has_no_age() {
        let cohort = CohortState::new(0.0, 31.0);
        assert!(cohort.is_empty());
        assert_eq!(cohort.average_age, None);
        assert_eq!(cohort.total_age(), 0.0);
    }

    #[test]
    fn test_blend_weights_by_headcount() {
        let blended = CohortState::blend([
            CohortState::new(90.0, 31.0),
            CohortState::new(10.0, 25.0),
        ]);
        assert_relative_eq!(blended.headcount, 100.0);
        assert_relative_eq!(blended.average_age.unwrap(), 30.4, epsilon = 1e-12);
    }

    #[test]
    fn test_blend_skips_empty_parts() {
        let blended = CohortState::blend([CohortState::empty(), CohortState::new(5.0, 40.0)]);
        assert_relative_eq!(blended.average_age.unwrap(), 40.0);

        let nothing = CohortState::blend([CohortState::empty(), CohortState::empty()]);
        assert!(nothing.is_empty());
        assert_eq!(nothing.average_age, None);
    }

    #[test]
    fn test_summary_metrics() {
        let state = WorkforceState::new(vec![
            LevelState {
                level: Level::L1,
                campus: CohortState::new(30.0, 25.0),
                social: CohortState::new(10.0, 29.0),
            },
            LevelState {
                level: Level::L2,
                campus: CohortState::new(10.0, 30.0),
                social: CohortState::new(50.0, 35.0),
            },
        ]);
        let summary = state.summary();
        assert_relative_eq!(summary.total_headcount, 100.0);
        assert_relative_eq!(summary.campus_ratio, 0.4);
        assert_relative_eq!(summary.average_level, 1.6);
        // (750 + 290 + 300 + 1750) / 100
        assert_relative_eq!(summary.average_age.unwrap(), 30.9);
    }

    #[test]
    fn test_summary_of_empty_workforce() {
        let summary = WorkforceState::new(vec![LevelState::new(Level::L1)]).summary();
        assert_eq!(summary.total_headcount, 0.0);
        assert_eq!(summary.campus_ratio, 0.0);
        assert_eq!(summary.average_level, 0.0);
        assert_eq!(summary.average_age, None);
    }
}
