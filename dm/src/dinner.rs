//! Dinner - seats the philosophers, runs them as tasks, collects the results

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use futures::future::join_all;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, TableVariant};
use crate::coordinator::{Coordinator, DiningTable, PriorityCoordinator, TableSnapshot};
use crate::philosopher::{Philosopher, PhilosopherReport, Routine};

/// Outcome of a finished dinner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DinnerReport {
    pub variant: TableVariant,
    pub philosophers: Vec<PhilosopherReport>,
    pub table: TableSnapshot,
}

impl DinnerReport {
    pub fn total_meals(&self) -> usize {
        self.philosophers.iter().map(|p| p.meals).sum()
    }
}

/// A configured table and the routine every philosopher follows
pub struct Dinner {
    variant: TableVariant,
    table: Arc<dyn DiningTable>,
    routine: Routine,
    seed: Option<u64>,
}

impl Dinner {
    /// Build the table described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        debug!(?config, "Dinner::new: called");
        config.validate()?;

        let table: Arc<dyn DiningTable> = match config.variant {
            TableVariant::Plain => Arc::new(
                Coordinator::with_pepper_shakers(config.philosophers, config.pepper_shakers)
                    .context("Failed to set the plain table")?,
            ),
            TableVariant::Priority => Arc::new(
                PriorityCoordinator::new(config.philosophers, config.effective_priorities())
                    .context("Failed to set the priority table")?,
            ),
        };

        let routine = Routine {
            dining_steps: config.dining_steps,
            talk_chance: config.talk_chance,
            time_to_waste: Duration::from_millis(config.time_to_waste_ms),
            naps: config.variant == TableVariant::Plain,
            narrate: config.narrate,
        };

        Ok(Self {
            variant: config.variant,
            table,
            routine,
            seed: config.seed,
        })
    }

    /// Shared handle to the table, e.g. to interrupt it
    pub fn table(&self) -> Arc<dyn DiningTable> {
        self.table.clone()
    }

    fn rng_for(&self, id: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_os_rng(),
        }
    }

    /// Run one task per philosopher and wait for all of them
    pub async fn serve(self) -> Result<DinnerReport> {
        let seats = self.table.seats();
        info!(variant = %self.variant, seats, steps = self.routine.dining_steps, "Dinner is served");

        let tasks: Vec<_> = (1..=seats)
            .map(|id| {
                let philosopher = Philosopher::new(id, self.table.clone(), self.routine.clone(), self.rng_for(id));
                tokio::spawn(philosopher.run())
            })
            .collect();

        let mut philosophers = Vec::with_capacity(seats);
        let mut failure = None;
        for (index, joined) in join_all(tasks).await.into_iter().enumerate() {
            let id = index + 1;
            match joined.context(format!("Philosopher {} task failed", id))? {
                Ok(report) => philosophers.push(report),
                Err(e) => {
                    warn!(id, error = %e, "Philosopher left the table");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            return Err(e).context("Dinner was cut short");
        }

        let table = self.table.snapshot();
        info!(meals = table.stats.meals, talks = table.stats.talks, "Dinner is over");
        Ok(DinnerReport {
            variant: self.variant,
            philosophers,
            table,
        })
    }
}
