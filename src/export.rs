//! CSV export of projection results

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::projection::ProjectionResult;

/// One line of the per-year summary file
#[derive(Debug, Serialize)]
struct SummaryRow {
    year: u32,
    total_headcount: f64,
    campus_headcount: f64,
    social_headcount: f64,
    campus_ratio: f64,
    average_level: f64,
    average_age: Option<f64>,
    promoted: Option<f64>,
    departed: Option<f64>,
    leaver_average_age: Option<f64>,
    campus_hires: Option<f64>,
    social_hires: Option<f64>,
}

/// Write the rounded per-level table for every year
pub fn write_level_table<W: Write>(result: &ProjectionResult, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in result.records() {
        for row in record.rounded_rows() {
            csv_writer.serialize(row)?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write one summary line per year
pub fn write_summary<W: Write>(result: &ProjectionResult, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in result.records() {
        let s = &record.summary;
        let flows = record.flows.as_ref();
        csv_writer.serialize(SummaryRow {
            year: record.year,
            total_headcount: s.total_headcount,
            campus_headcount: s.campus_headcount,
            social_headcount: s.social_headcount,
            campus_ratio: s.campus_ratio,
            average_level: s.average_level,
            average_age: s.average_age,
            promoted: flows.map(|f| f.promoted),
            departed: flows.map(|f| f.departed),
            leaver_average_age: flows.and_then(|f| f.leaver_average_age),
            campus_hires: flows.map(|f| f.campus_hires),
            social_hires: flows.map(|f| f.social_hires_total()),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_level_table_to_path<P: AsRef<Path>>(result: &ProjectionResult, path: P) -> Result<(), csv::Error> {
    write_level_table(result, File::create(path)?)
}

pub fn write_summary_to_path<P: AsRef<Path>>(result: &ProjectionResult, path: P) -> Result<(), csv::Error> {
    write_summary(result, File::create(path)?)
}

/// Output path for one scenario of a batch: `levels.csv` becomes `levels_<tag>.csv`
pub fn scenario_path(path: &Path, tag: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}_{}", stem, tag),
    };
    path.with_file_name(name)
}
