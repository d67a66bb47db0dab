//! Load preset tables from CSV and global scalars from JSON

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::data::{CohortParams, GlobalParams, LevelParams, ParameterSet};
use crate::error::{LoadError, ValidationError};

/// Columns every preset table must carry
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "level",
    "campus_employee",
    "social_employee",
    "campus_age",
    "social_age",
    "campus_leaving_age",
    "social_leaving_age",
    "social_new_hire_age",
    "campus_promotion_rate",
    "social_promotion_rate",
    "campus_attrition_rate",
    "social_attrition_rate",
    "hiring_ratio",
];

/// Raw CSV row matching the preset columns. Empty cells read as zero.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    level: String,
    campus_employee: Option<f64>,
    social_employee: Option<f64>,
    campus_age: Option<f64>,
    social_age: Option<f64>,
    campus_leaving_age: Option<f64>,
    social_leaving_age: Option<f64>,
    social_new_hire_age: Option<f64>,
    campus_promotion_rate: Option<f64>,
    social_promotion_rate: Option<f64>,
    campus_attrition_rate: Option<f64>,
    social_attrition_rate: Option<f64>,
    hiring_ratio: Option<f64>,
}

impl CsvRow {
    fn to_level_params(self) -> Result<LevelParams, ValidationError> {
        let level = self.level.parse()?;

        Ok(LevelParams {
            level,
            campus: CohortParams {
                headcount: self.campus_employee.unwrap_or(0.0),
                average_age: self.campus_age.unwrap_or(0.0),
                leaving_age: self.campus_leaving_age.unwrap_or(0.0),
                promotion_rate: self.campus_promotion_rate.unwrap_or(0.0),
                attrition_rate: self.campus_attrition_rate.unwrap_or(0.0),
            },
            social: CohortParams {
                headcount: self.social_employee.unwrap_or(0.0),
                average_age: self.social_age.unwrap_or(0.0),
                leaving_age: self.social_leaving_age.unwrap_or(0.0),
                promotion_rate: self.social_promotion_rate.unwrap_or(0.0),
                attrition_rate: self.social_attrition_rate.unwrap_or(0.0),
            },
            social_new_hire_age: self.social_new_hire_age.unwrap_or(0.0),
            hiring_ratio: self.hiring_ratio.unwrap_or(0.0),
        })
    }
}

/// Load the per-level rows of a preset table
pub fn load_levels<P: AsRef<Path>>(path: P) -> Result<Vec<LevelParams>, LoadError> {
    let file = File::open(path)?;
    load_levels_from_reader(file)
}

/// Load preset rows from any reader (e.g., string buffer, uploaded file)
pub fn load_levels_from_reader<R: Read>(reader: R) -> Result<Vec<LevelParams>, LoadError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing }.into());
    }

    let mut levels = Vec::new();
    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        levels.push(row.to_level_params()?);
    }

    Ok(levels)
}

/// Load global scalars from a JSON file; absent keys take their defaults
pub fn load_globals<P: AsRef<Path>>(path: P) -> Result<GlobalParams, LoadError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// Load a preset table and combine it with global scalars into a validated set
pub fn load_preset<P: AsRef<Path>>(path: P, globals: GlobalParams) -> Result<ParameterSet, LoadError> {
    let levels = load_levels(path)?;
    Ok(ParameterSet::builder().levels(levels).globals(globals).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Level;
    use approx::assert_relative_eq;

    const SAMPLE_PRESET: &str = "data/presets/sample.csv";

    #[test]
    fn test_load_sample_preset() {
        let levels = load_levels(SAMPLE_PRESET).expect("Failed to load preset");
        assert_eq!(levels.len(), 7);

        let l1 = &levels[0];
        assert_eq!(l1.level, Level::L1);
        assert_relative_eq!(l1.campus.headcount, 320.0);
        assert_relative_eq!(l1.social.attrition_rate, 0.12);

        let l7 = &levels[6];
        assert_eq!(l7.level, Level::L7);
        assert_relative_eq!(l7.hiring_ratio, 0.0);
    }

    #[test]
    fn test_load_preset_validates() {
        let globals = GlobalParams {
            target_headcount: Some(2000),
            ..GlobalParams::default()
        };
        let params = load_preset(SAMPLE_PRESET, globals).expect("Failed to build parameters");
        assert_eq!(params.top_level(), Level::L7);
        assert_relative_eq!(params.initial_headcount(), 1973.0);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let data = "level,campus_employee,social_employee\nL1,1,2\n";
        let err = load_levels_from_reader(data.as_bytes()).unwrap_err();
        match err {
            LoadError::Validation(ValidationError::MissingColumns { columns }) => {
                assert_eq!(columns.len(), REQUIRED_COLUMNS.len() - 3);
                assert!(columns.contains(&"hiring_ratio".to_string()));
                assert!(!columns.contains(&"level".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_cells_read_as_zero() {
        let data = format!("{}\nL1,10,,25,,,,,,,0.1,,\n", REQUIRED_COLUMNS.join(","));
        let levels = load_levels_from_reader(data.as_bytes()).unwrap();
        assert_relative_eq!(levels[0].campus.headcount, 10.0);
        assert_relative_eq!(levels[0].social.headcount, 0.0);
        assert_relative_eq!(levels[0].campus.attrition_rate, 0.1);
        assert_relative_eq!(levels[0].hiring_ratio, 0.0);
    }

    #[test]
    fn test_bad_level_label() {
        let data = format!("{}\nM1,10,0,25,0,0,0,0,0,0,0,0,0\n", REQUIRED_COLUMNS.join(","));
        let err = load_levels_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Validation(ValidationError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_globals_json_defaults() {
        let globals: GlobalParams = serde_json::from_str(r#"{"target_headcount": 1500}"#).unwrap();
        assert_eq!(globals.target_headcount, Some(1500));
        assert_eq!(globals.forecast_years, 3);
        assert_relative_eq!(globals.campus_new_hire_age, 24.2);
    }
}
