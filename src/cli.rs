//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Bikedash - bike-sharing rental dashboard
///
/// Summarises the cleaned daily and hourly rental tables by hour, working
/// day, season and month, flags anomalous day-over-day swings, and writes
/// the result as a Markdown or JSON report.
///
/// Examples:
///   bikedash
///   bikedash --day data/day_clean.csv --hour data/hour_clean.csv
///   bikedash --start 2012-06-01 --end 2012-08-31 --format json -o summer.json
///   bikedash --sigma 3 --fail-on-anomaly
///   bikedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Daily-grain CSV table
    ///
    /// Defaults to the config value, or dashboard/day_clean.csv.
    #[arg(long, value_name = "FILE", env = "BIKEDASH_DAY")]
    pub day: Option<PathBuf>,

    /// Hourly-grain CSV table
    ///
    /// Defaults to the config value, or dashboard/hour_clean.csv.
    #[arg(long, value_name = "FILE", env = "BIKEDASH_HOUR")]
    pub hour: Option<PathBuf>,

    /// First day of the interactive date range (YYYY-MM-DD)
    ///
    /// Must be given together with --end. Without either, the whole
    /// dataset range is selected.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the interactive date range (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Anomaly threshold as a multiple of the standard deviation
    ///
    /// Default: from config or 2.0.
    #[arg(long, value_name = "SIGMA")]
    pub sigma: Option<f64>,

    /// Output file path for the report (`-` for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bikedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Include the full day-by-day change table in the Markdown report
    #[arg(long)]
    pub include_daily_series: bool,

    /// Exit with code 2 if the selected range contains anomalies
    ///
    /// Useful for scheduled checks.
    #[arg(long)]
    pub fail_on_anomaly: bool,

    /// Generate a default .bikedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(sigma) = self.sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err("Sigma must be a positive number".to_string());
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(format!(
                    "Start date {} is after end date {}",
                    start, end
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
