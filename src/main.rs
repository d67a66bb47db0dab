//! Headcount Forecast CLI
//!
//! Loads a preset table, runs the projection and prints/exports the results

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use headcount_forecast::export::{scenario_path, write_level_table_to_path, write_summary_to_path};
use headcount_forecast::params::{load_globals, load_levels, GlobalParams, LevelParams};
use headcount_forecast::{ParameterSet, ProjectionResult, Scenario, ScenarioRunner};

#[derive(Debug, Parser)]
#[command(name = "headcount_forecast", version, about = "Project workforce structure by level and recruitment channel")]
struct Args {
    /// Preset table with one row per level (CSV)
    #[arg(short, long, default_value = "data/presets/sample.csv")]
    preset: PathBuf,

    /// JSON file with global parameters; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fraction of net-new hires recruited from campus (0-1)
    #[arg(long)]
    campus_ratio: Option<f64>,

    /// Average age of new campus hires
    #[arg(long)]
    campus_new_hire_age: Option<f64>,

    /// Number of years to forecast (1-5)
    #[arg(short, long)]
    years: Option<u32>,

    /// Target year-end headcount; repeat to compare several targets.
    /// Defaults to the current total headcount.
    #[arg(short, long)]
    target: Vec<u32>,

    /// Write the per-level table for every year to this CSV file.
    /// With several targets, one file per target (`<stem>_target_<n>.csv`).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the per-year summary to this CSV file; suffixed per target like --output
    #[arg(long)]
    summary_output: Option<PathBuf>,

    /// Print the full result as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut globals = match &args.config {
        Some(path) => load_globals(path)
            .with_context(|| format!("loading global parameters from {}", path.display()))?,
        None => GlobalParams::default(),
    };
    if let Some(ratio) = args.campus_ratio {
        globals.campus_ratio = ratio;
    }
    if let Some(age) = args.campus_new_hire_age {
        globals.campus_new_hire_age = age;
    }
    if let Some(years) = args.years {
        globals.forecast_years = years;
    }

    let levels = load_levels(&args.preset)
        .with_context(|| format!("loading preset {}", args.preset.display()))?;
    info!("Loaded {} levels from {}", levels.len(), args.preset.display());

    if let Some(&first) = args.target.first() {
        globals.target_headcount = Some(first);
    } else if globals.target_headcount.is_none() {
        globals.target_headcount = Some(current_total(&levels));
    }

    let params = ParameterSet::builder()
        .levels(levels)
        .globals(globals)
        .build()
        .context("invalid parameters")?;
    let runner = ScenarioRunner::new(params);

    if args.target.len() > 1 {
        return compare_targets(&runner, &args);
    }

    let result = runner.run_base().context("projection failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
        print_level_table(&result);
    }

    write_outputs(&result, args.output.as_deref(), args.summary_output.as_deref())
}

fn write_outputs(result: &ProjectionResult, output: Option<&Path>, summary_output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        write_level_table_to_path(result, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Level table written to: {}", path.display());
    }
    if let Some(path) = summary_output {
        write_summary_to_path(result, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Summary written to: {}", path.display());
    }
    Ok(())
}

/// Current total headcount, rounded; the default target
fn current_total(levels: &[LevelParams]) -> u32 {
    let total: f64 = levels.iter().map(LevelParams::headcount).sum();
    total.max(0.0).round() as u32
}

fn print_summary(result: &ProjectionResult) {
    println!("{:>4} {:>10} {:>10} {:>8} {:>9} {:>8} {:>9} {:>9} {:>9}",
        "Year", "Headcount", "Campus", "Campus%", "AvgLevel", "AvgAge", "Departed", "Hires", "Promoted");
    println!("{}", "-".repeat(84));

    for record in result.records() {
        let s = &record.summary;
        let (departed, hires, promoted) = match &record.flows {
            Some(f) => (f.departed, f.total_hires, f.promoted),
            None => (0.0, 0.0, 0.0),
        };
        println!("{:>4} {:>10.0} {:>10.0} {:>7.1}% {:>9.2} {:>8} {:>9.1} {:>9.1} {:>9.1}",
            record.year,
            s.total_headcount,
            s.campus_headcount,
            s.campus_ratio * 100.0,
            s.average_level,
            format_age(s.average_age),
            departed,
            hires,
            promoted,
        );
    }

    let start = result.initial().summary.total_headcount;
    let end = result.last().summary.total_headcount;
    println!("\nNet change over {} years: {:+.0}", result.forecast_years(), end - start);
}

fn print_level_table(result: &ProjectionResult) {
    let last = result.last();
    println!("\nYear {} structure:", last.year);
    println!("{:>5} {:>8} {:>8} {:>8} {:>10} {:>10} {:>8} {:>8}",
        "Level", "Campus", "Social", "Total", "CampusAge", "SocialAge", "Campus%", "Share%");
    println!("{}", "-".repeat(72));

    for row in last.rounded_rows() {
        println!("{:>5} {:>8} {:>8} {:>8} {:>10} {:>10} {:>7.1}% {:>7.1}%",
            row.level,
            row.campus_headcount,
            row.social_headcount,
            row.total_headcount,
            format_age(row.campus_average_age),
            format_age(row.social_average_age),
            row.campus_share * 100.0,
            row.level_share * 100.0,
        );
    }
}

fn compare_targets(runner: &ScenarioRunner, args: &Args) -> Result<()> {
    let scenarios: Vec<Scenario> = args.target.iter().copied().map(Scenario::with_target).collect();
    let results = runner.run_batch(&scenarios);

    let mut completed = Vec::with_capacity(results.len());
    for (scenario, result) in scenarios.iter().zip(results) {
        let result = result.with_context(|| format!("scenario '{}' failed", scenario.name))?;
        completed.push((scenario, result));
    }

    if args.json {
        let named: Vec<_> = completed.iter().map(|(s, r)| (&s.name, r)).collect();
        println!("{}", serde_json::to_string_pretty(&named)?);
    } else {
        print_comparison(runner, &completed);
    }

    for (scenario, result) in &completed {
        let tag = scenario.name.replace(' ', "_");
        let output = args.output.as_deref().map(|p| scenario_path(p, &tag));
        let summary_output = args.summary_output.as_deref().map(|p| scenario_path(p, &tag));
        write_outputs(result, output.as_deref(), summary_output.as_deref())?;
    }

    Ok(())
}

fn print_comparison(runner: &ScenarioRunner, completed: &[(&Scenario, ProjectionResult)]) {
    println!("Current headcount: {:.0}\n", runner.base().initial_headcount());
    println!("{:>14} {:>10} {:>8} {:>9} {:>8} {:>10}",
        "Scenario", "Headcount", "Campus%", "AvgLevel", "AvgAge", "TotalHires");
    println!("{}", "-".repeat(64));
    for (scenario, result) in completed {
        let s = &result.last().summary;
        let hires: f64 = result
            .records()
            .iter()
            .filter_map(|r| r.flows.as_ref())
            .map(|f| f.total_hires)
            .sum();
        println!("{:>14} {:>10.0} {:>7.1}% {:>9.2} {:>8} {:>10.1}",
            scenario.name,
            s.total_headcount,
            s.campus_ratio * 100.0,
            s.average_level,
            format_age(s.average_age),
            hires,
        );
    }
}

fn format_age(age: Option<f64>) -> String {
    age.map(|a| format!("{:.1}", a)).unwrap_or_else(|| "-".to_string())
}
