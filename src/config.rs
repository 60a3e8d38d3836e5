//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bikedash.toml` files.

use crate::analysis::DEFAULT_SIGMA_MULTIPLIER;
use crate::filter::{dataset_end, dataset_start, DateBounds};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".bikedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input tables.
    #[serde(default)]
    pub data: DataConfig,

    /// Date filter limits.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Anomaly detection settings.
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path (`-` for stdout).
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

impl GeneralConfig {
    /// True when the report goes to stdout instead of a file.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("bike_dashboard.md")
}

/// Locations of the cleaned input tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Daily-grain CSV.
    #[serde(default = "default_day_path")]
    pub day_path: PathBuf,

    /// Hourly-grain CSV.
    #[serde(default = "default_hour_path")]
    pub hour_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            day_path: default_day_path(),
            hour_path: default_hour_path(),
        }
    }
}

fn default_day_path() -> PathBuf {
    PathBuf::from("dashboard/day_clean.csv")
}

fn default_hour_path() -> PathBuf {
    PathBuf::from("dashboard/hour_clean.csv")
}

/// Limits for the interactive date selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Earliest selectable date.
    #[serde(default = "dataset_start")]
    pub min_date: NaiveDate,

    /// Latest selectable date.
    #[serde(default = "dataset_end")]
    pub max_date: NaiveDate,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_date: dataset_start(),
            max_date: dataset_end(),
        }
    }
}

impl FilterConfig {
    pub fn bounds(&self) -> DateBounds {
        DateBounds {
            min: self.min_date,
            max: self.max_date,
        }
    }
}

/// Anomaly detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Threshold as a multiple of the sample standard deviation.
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            sigma_multiplier: default_sigma_multiplier(),
        }
    }
}

fn default_sigma_multiplier() -> f64 {
    DEFAULT_SIGMA_MULTIPLIER
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Render the full day-by-day change table in Markdown.
    #[serde(default)]
    pub include_daily_series: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            include_daily_series: false,
        }
    }
}

fn default_title() -> String {
    "Bike Rental Dashboard".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.bikedash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.filter.min_date > self.filter.max_date {
            anyhow::bail!(
                "filter.min_date ({}) is after filter.max_date ({})",
                self.filter.min_date,
                self.filter.max_date
            );
        }

        let sigma = self.anomaly.sigma_multiplier;
        if !sigma.is_finite() || sigma <= 0.0 {
            anyhow::bail!("anomaly.sigma_multiplier must be a positive number, got {}", sigma);
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }

        if let Some(ref day) = args.day {
            self.data.day_path = day.clone();
        }
        if let Some(ref hour) = args.hour {
            self.data.hour_path = hour.clone();
        }

        if let Some(sigma) = args.sigma {
            self.anomaly.sigma_multiplier = sigma;
        }

        // Flags always override
        if args.include_daily_series {
            self.report.include_daily_series = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
