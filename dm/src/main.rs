//! DiningMonitor - dining philosophers coordinated by a monitor
//!
//! CLI entry point for running a dinner.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use diningmonitor::cli::{Cli, Command, RunArgs};
use diningmonitor::config::Config;
use diningmonitor::coordinator::CoordinatorError;
use diningmonitor::dinner::{Dinner, DinnerReport};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dining")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("dining.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run(args) => {
            debug!(?args, "main: matched Run command");
            args.apply(&mut config);
            cmd_run(&config, &args).await
        }
        Command::Config => {
            debug!("main: matched Config command");
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Run a dinner until every philosopher is done
async fn cmd_run(config: &Config, args: &RunArgs) -> Result<()> {
    debug!(?config, "cmd_run: called");
    let dinner = Dinner::new(config)?;

    // Ctrl-C interrupts every waiting philosopher
    let table = dinner.table();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, interrupting the table");
            table.interrupt();
        }
    });

    let report = match dinner.serve().await {
        Ok(report) => report,
        Err(e) if e.downcast_ref::<CoordinatorError>() == Some(&CoordinatorError::Interrupted) => {
            eprintln!("{} {:#}", "Dinner interrupted:".red(), e);
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &DinnerReport) {
    println!(
        "{} {} table, {} meals",
        "✓".green(),
        report.variant.to_string().cyan(),
        report.total_meals()
    );
    for p in &report.philosophers {
        println!("  Philosopher {}: {} meals, {} talks", p.id, p.meals, p.talks);
    }
    let stats = &report.table.stats;
    println!(
        "  Naps: {}  Pepper uses: {}  Peak hungry: {}",
        stats.naps, stats.pepper_uses, stats.peak_hungry
    );
}
