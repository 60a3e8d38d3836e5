//! Bikedash - bike-sharing rental dashboard
//!
//! A CLI tool that loads the cleaned daily and hourly rental tables,
//! aggregates them for the dashboard charts, flags anomalous daily swings,
//! and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (no anomalies, or no --fail-on-anomaly set)
//!   1 - Runtime error (missing table, bad CSV, invalid date range, etc.)
//!   2 - Anomalies found in the selected range with --fail-on-anomaly

mod analysis;
mod cli;
mod config;
mod dashboard;
mod error;
mod filter;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use dashboard::{build_dashboard, DashboardOptions};
use models::{Grain, InteractiveTab};
use std::io::Write;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so `general.verbose` can raise the level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(log_level(&args, &config));

    info!("Bikedash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .bikedash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize table paths, date limits, and the anomaly threshold.");
    Ok(())
}

/// Pick the log level from flags, letting the config file enable verbose mode.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. `RUST_LOG` takes precedence over the flags.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete dashboard workflow. Returns exit code (0 or 2).
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let to_stdout = config.general.writes_to_stdout();
    let chatty = !args.quiet && !to_stdout;

    // Step 1: Load the tables
    if chatty {
        println!("📥 Loading rental tables...");
        println!("   Daily: {}", config.data.day_path.display());
        println!("   Hourly: {}", config.data.hour_path.display());
    }

    let daily = loader::load_dataset(&config.data.day_path, Grain::Daily)
        .context("Failed to load the daily table")?;
    let hourly = loader::load_dataset(&config.data.hour_path, Grain::Hourly)
        .context("Failed to load the hourly table")?;

    // Step 2: Build the dashboard
    if chatty {
        println!("\n📊 Building dashboard...");
    }

    let options = DashboardOptions::from_config(config, args.start, args.end);
    let dashboard = build_dashboard(&daily, &hourly, &options).context("Invalid date range")?;

    if let InteractiveTab::AwaitingInput { prompt } = &dashboard.interactive {
        eprintln!("⚠️  {}", prompt);
    }

    // Step 3: Generate and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&dashboard, config.report.include_daily_series)
        }
    };

    if to_stdout {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .context("Failed to write report to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    } else {
        std::fs::write(&config.general.output, &output).with_context(|| {
            format!(
                "Failed to write report to {}",
                config.general.output.display()
            )
        })?;
        info!("Report written to {}", config.general.output.display());
    }

    let selected = dashboard.selected_views();

    // Print summary
    if chatty {
        println!("\n📊 Dashboard Summary:");
        println!(
            "   Rows: {} daily | {} hourly",
            daily.len(),
            hourly.len()
        );
        println!("   Total rentals: {}", hourly.total_rentals());
        if let InteractiveTab::Ready { range, .. } = &dashboard.interactive {
            println!("   Range: {}", range);
        }
        println!("   Months: {}", selected.trend.len());
        println!(
            "   🔴 Anomalies: {} (threshold ±{:.1})",
            selected.anomalies.anomaly_count(),
            selected.anomalies.threshold
        );
        println!("   Duration: {:.3}s", dashboard.metadata.duration_seconds);
        println!(
            "\n✅ Dashboard complete! Report saved to: {}",
            config.general.output.display()
        );
    }

    // Check --fail-on-anomaly
    if args.fail_on_anomaly && selected.anomalies.anomaly_count() > 0 {
        eprintln!(
            "\n⛔ {} anomalous day(s) in the selected range. Failing (exit code 2).",
            selected.anomalies.anomaly_count()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so failures are returned rather than logged.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}
