//! CLI argument parsing for the dining monitor

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, TableVariant};
use crate::coordinator::Priority;

#[derive(Parser, Debug)]
#[command(name = "dm")]
#[command(author, version, about = "Dining philosophers coordinated by a monitor", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seat the philosophers and run the dinner
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides applied on top of the loaded configuration
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Number of philosophers
    #[arg(short, long)]
    pub philosophers: Option<usize>,

    /// Eat/think/talk cycles per philosopher
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Coordinator variant
    #[arg(short, long, value_enum)]
    pub variant: Option<TableVariant>,

    /// Comma-separated priorities, one per philosopher (lower eats first)
    #[arg(long, value_delimiter = ',')]
    pub priorities: Option<Vec<Priority>>,

    /// Seed for reproducible randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Upper bound of every random pause in milliseconds
    #[arg(long)]
    pub time_to_waste_ms: Option<u64>,

    /// Chance that a philosopher talks after thinking
    #[arg(long)]
    pub talk_chance: Option<f64>,

    /// Do not print narration
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Apply the overrides that were given
    pub fn apply(&self, config: &mut Config) {
        if let Some(philosophers) = self.philosophers {
            config.philosophers = philosophers;
        }
        if let Some(steps) = self.steps {
            config.dining_steps = steps;
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(priorities) = &self.priorities {
            config.priorities = priorities.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.time_to_waste_ms {
            config.time_to_waste_ms = ms;
        }
        if let Some(chance) = self.talk_chance {
            config.talk_chance = chance;
        }
        if self.quiet || self.json {
            config.narrate = false;
        }
    }
}
