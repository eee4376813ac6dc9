//! Philosopher - drives a table through eat/think/talk cycles
//!
//! The coordinator does all of the synchronization; a philosopher only calls
//! its operations in order and pauses for random intervals in between.

use std::sync::Arc;
use std::time::Duration;

use colored::*;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::{CoordinatorResult, DiningTable};

/// Things a philosopher may say while holding the floor
const PHRASES: &[&str] = &[
    "Eh, it's not easy to be a philosopher: eat, think, talk, eat...",
    "You know, true is false and false is true if you think of it",
    "2 + 2 = 5 for extremely large values of 2...",
    "If thee cannot speak, thee must be silent",
];

/// How a philosopher spends the dinner
#[derive(Debug, Clone)]
pub struct Routine {
    /// Eat/think/talk cycles to run
    pub dining_steps: usize,
    /// Chance of talking after each thinking session
    pub talk_chance: f64,
    /// Upper bound of every random pause
    pub time_to_waste: Duration,
    /// Nap through the coordinator's sleeping gate while eating and thinking
    pub naps: bool,
    /// Print narration lines
    pub narrate: bool,
}

impl Default for Routine {
    fn default() -> Self {
        Self {
            dining_steps: 10,
            talk_chance: 0.5,
            time_to_waste: Duration::from_millis(1000),
            naps: true,
            narrate: true,
        }
    }
}

/// What one philosopher got done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhilosopherReport {
    pub id: usize,
    pub meals: usize,
    pub talks: usize,
}

/// One diner, identified by its 1-based ID
pub struct Philosopher {
    id: usize,
    table: Arc<dyn DiningTable>,
    routine: Routine,
    rng: StdRng,
}

impl Philosopher {
    pub fn new(id: usize, table: Arc<dyn DiningTable>, routine: Routine, rng: StdRng) -> Self {
        debug!(id, ?routine, "Philosopher::new: called");
        Self {
            id,
            table,
            routine,
            rng,
        }
    }

    /// Run every dining step; a failed wait ends the run with its error
    pub async fn run(mut self) -> CoordinatorResult<PhilosopherReport> {
        debug!(id = self.id, "Philosopher::run: called");
        let mut report = PhilosopherReport {
            id: self.id,
            ..Default::default()
        };

        for step in 0..self.routine.dining_steps {
            debug!(id = self.id, step, "Philosopher::run: step");
            self.table.pick_up(self.id).await?;
            self.eat().await?;
            report.meals += 1;
            self.table.put_down(self.id)?;

            self.think().await?;

            if self.rng.random_bool(self.routine.talk_chance) {
                self.table.request_talk(self.id).await?;
                self.talk().await;
                self.table.end_talk(self.id)?;
                report.talks += 1;
            }

            tokio::task::yield_now().await;
        }

        debug!(id = self.id, ?report, "Philosopher::run: done");
        Ok(report)
    }

    async fn eat(&mut self) -> CoordinatorResult<()> {
        self.narrate("has started eating.");
        self.add_pepper().await?;
        tokio::task::yield_now().await;
        self.nap().await?;
        tokio::task::yield_now().await;
        self.narrate("has finished eating.");
        Ok(())
    }

    async fn think(&mut self) -> CoordinatorResult<()> {
        self.narrate("has started thinking.");
        tokio::task::yield_now().await;
        self.nap().await?;
        tokio::task::yield_now().await;
        self.narrate("has finished thinking.");
        Ok(())
    }

    async fn talk(&mut self) {
        self.narrate("has started talking.");
        tokio::task::yield_now().await;
        self.say_something();
        tokio::task::yield_now().await;
        self.narrate("has finished talking.");
    }

    async fn nap(&mut self) -> CoordinatorResult<()> {
        if !self.routine.naps {
            self.pause().await;
            return Ok(());
        }
        self.table.request_sleep(self.id).await?;
        self.narrate("has started sleeping.");
        self.pause().await;
        self.table.end_sleep(self.id)?;
        self.narrate("has finished sleeping.");
        Ok(())
    }

    async fn add_pepper(&mut self) -> CoordinatorResult<()> {
        let table = self.table.clone();
        let Some(pepper) = table.pepper_shakers() else {
            return Ok(());
        };
        pepper.request_pepper_shaker(self.id).await?;
        self.narrate("is using a pepper shaker.");
        self.pause().await;
        pepper.end_pepper_shaker(self.id)?;
        self.narrate("has finished using the pepper shaker.");
        Ok(())
    }

    fn say_something(&mut self) {
        let pick = self.rng.random_range(0..=PHRASES.len());
        let phrase = match PHRASES.get(pick) {
            Some(phrase) => phrase.to_string(),
            None => format!("My number is {}", self.id),
        };
        if self.routine.narrate {
            println!("{} says: {}", self.tag(), phrase.italic());
        }
    }

    /// Sleep for a random interval below `time_to_waste`
    async fn pause(&mut self) {
        let max_ms = self.routine.time_to_waste.as_millis() as u64;
        if max_ms == 0 {
            tokio::task::yield_now().await;
            return;
        }
        let ms = self.rng.random_range(0..max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn tag(&self) -> ColoredString {
        format!("Philosopher {}", self.id).bold()
    }

    fn narrate(&self, action: &str) {
        if self.routine.narrate {
            println!("{} {}", self.tag(), action);
        }
    }
}
