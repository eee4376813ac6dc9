//! Dinner configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::{DEFAULT_PEPPER_SHAKERS, Priority};

/// Which coordinator seats the philosophers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableVariant {
    /// Chopsticks, talking/sleeping gate and pepper shakers
    #[default]
    Plain,
    /// Chopsticks and talking/sleeping gate with priority admission to eat
    Priority,
}

impl std::fmt::Display for TableVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Priority => write!(f, "priority"),
        }
    }
}

/// Main dinner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Number of philosophers at the table
    pub philosophers: usize,

    /// Eat/think/talk cycles each philosopher runs
    pub dining_steps: usize,

    /// Chance that a philosopher talks after thinking
    pub talk_chance: f64,

    /// Upper bound of every random pause in milliseconds
    pub time_to_waste_ms: u64,

    /// Pepper shakers on the plain table
    pub pepper_shakers: usize,

    /// Coordinator variant
    pub variant: TableVariant,

    /// Priorities for the priority table, one per philosopher (lower eats first)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<Priority>,

    /// Seed for reproducible randomness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Print narration lines to stdout
    pub narrate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            philosophers: 4,
            dining_steps: 10,
            talk_chance: 0.5,
            time_to_waste_ms: 1000,
            pepper_shakers: DEFAULT_PEPPER_SHAKERS,
            variant: TableVariant::Plain,
            priorities: Vec::new(),
            seed: None,
            narrate: true,
            log_level: None,
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.philosophers == 0 {
            return Err(eyre!("At least one philosopher is needed"));
        }
        if !(0.0..=1.0).contains(&self.talk_chance) {
            return Err(eyre!("talk-chance must be within [0, 1], got {}", self.talk_chance));
        }
        if self.pepper_shakers == 0 {
            return Err(eyre!("pepper-shakers must be at least 1"));
        }
        if !self.priorities.is_empty() && self.priorities.len() != self.philosophers {
            return Err(eyre!(
                "Expected {} priorities, got {}",
                self.philosophers,
                self.priorities.len()
            ));
        }
        Ok(())
    }

    /// Priorities to seat with; defaults to 1..=philosophers
    pub fn effective_priorities(&self) -> Vec<Priority> {
        if self.priorities.is_empty() {
            (1..=self.philosophers as i32).map(Priority).collect()
        } else {
            self.priorities.clone()
        }
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .dining.yml
        let local_config = PathBuf::from(".dining.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/dining/dining.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dining").join("dining.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}
