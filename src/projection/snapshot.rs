//! Year-indexed projection output

use serde::Serialize;

use super::state::{WorkforceState, YearSummary, HEADCOUNT_EPSILON};
use crate::params::Level;

/// Movements during one projected year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearFlows {
    /// Headcount promoted one level up (both cohorts)
    pub promoted: f64,

    /// Headcount departed through attrition
    pub departed: f64,

    /// Blended average leaving age of departures, `None` if nobody left
    pub leaver_average_age: Option<f64>,

    /// Total net-new hires required to reach the target
    pub total_hires: f64,

    /// Campus hires, all placed at the lowest level
    pub campus_hires: f64,

    /// Social hires placed at each level, ascending
    pub social_hires: Vec<(Level, f64)>,
}

impl YearFlows {
    pub fn social_hires_total(&self) -> f64 {
        self.social_hires.iter().map(|(_, n)| n).sum()
    }
}

/// One year of output: the full table plus derived scalars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRecord {
    /// 0 for the input snapshot, 1..N for forecast years
    pub year: u32,
    pub state: WorkforceState,
    pub summary: YearSummary,
    /// Absent for year 0
    pub flows: Option<YearFlows>,
}

impl YearRecord {
    pub fn initial(state: WorkforceState) -> Self {
        let summary = state.summary();
        Self { year: 0, state, summary, flows: None }
    }

    /// Table rows with headcounts rounded to integers
    pub fn rounded_rows(&self) -> Vec<RoundedLevelRow> {
        let levels = self.state.levels();
        let mut values = Vec::with_capacity(levels.len() * 2);
        for level in levels {
            values.push(level.campus.headcount);
            values.push(level.social.headcount);
        }
        let rounded = round_preserving_total(&values);
        let overall = self.state.total_headcount();

        levels
            .iter()
            .zip(rounded.chunks(2))
            .map(|(level, counts)| RoundedLevelRow {
                year: self.year,
                level: level.level,
                campus_headcount: counts[0],
                social_headcount: counts[1],
                total_headcount: counts[0] + counts[1],
                campus_average_age: level.campus.average_age,
                social_average_age: level.social.average_age,
                campus_share: share(level.campus.headcount, level.headcount()),
                level_share: share(level.headcount(), overall),
            })
            .collect()
    }
}

/// Display row for one level in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundedLevelRow {
    pub year: u32,
    pub level: Level,
    pub campus_headcount: u64,
    pub social_headcount: u64,
    pub total_headcount: u64,
    pub campus_average_age: Option<f64>,
    pub social_average_age: Option<f64>,
    /// Campus headcount as a fraction of the level, 0 for an empty level
    pub campus_share: f64,
    /// Level headcount as a fraction of the whole workforce
    pub level_share: f64,
}

/// `part / whole`, or 0 when the whole is empty. Uses unrounded headcounts.
fn share(part: f64, whole: f64) -> f64 {
    if whole > HEADCOUNT_EPSILON {
        part / whole
    } else {
        0.0
    }
}

/// Ordered sequence of yearly records, year 0 first. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    records: Vec<YearRecord>,
}

impl ProjectionResult {
    pub fn new(initial: WorkforceState) -> Self {
        Self { records: vec![YearRecord::initial(initial)] }
    }

    pub fn add_record(&mut self, record: YearRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[YearRecord] {
        &self.records
    }

    /// The year-0 snapshot
    pub fn initial(&self) -> &YearRecord {
        &self.records[0]
    }

    /// The last projected year (year 0 if nothing was projected)
    pub fn last(&self) -> &YearRecord {
        &self.records[self.records.len() - 1]
    }

    /// Number of forecast years, excluding year 0
    pub fn forecast_years(&self) -> u32 {
        (self.records.len() - 1) as u32
    }

    pub fn year(&self, year: u32) -> Option<&YearRecord> {
        self.records.get(year as usize)
    }
}

/// Round non-negative values to integers so the parts sum to the rounded total.
///
/// Each value is floored, then the shortfall is handed out one unit at a time
/// to the largest fractional remainders (earlier index wins ties).
pub fn round_preserving_total(values: &[f64]) -> Vec<u64> {
    let clean: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
    let target = clean.iter().sum::<f64>().round() as u64;

    let mut rounded: Vec<u64> = clean.iter().map(|v| v.floor() as u64).collect();
    let floored: u64 = rounded.iter().sum();
    let shortfall = target.saturating_sub(floored) as usize;

    let mut order: Vec<usize> = (0..clean.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = clean[a] - clean[a].floor();
        let rb = clean[b] - clean[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &idx in order.iter().take(shortfall) {
        rounded[idx] += 1;
    }

    rounded
}
