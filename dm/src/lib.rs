//! DiningMonitor - dining philosophers coordinated by a monitor
//!
//! A fixed set of philosophers share chopsticks, a talking turn, a
//! sleeping/talking gate and a small pool of pepper shakers. All of the
//! synchronization lives in a coordinator; philosophers only call its
//! operations in order.
//!
//! # Core Concepts
//!
//! - **One Monitor**: every coordinator guards its state with one lock and
//!   wakes all waiters after each change
//! - **Pairwise Chopsticks**: both chopsticks are taken at once, so no
//!   philosopher ever holds one while waiting for the other
//! - **Priority Admission**: the priority table serves hungry philosophers in
//!   ascending priority order
//!
//! # Modules
//!
//! - [`coordinator`] - Coordinators, table state and snapshots
//! - [`philosopher`] - The eat/think/talk driver
//! - [`dinner`] - Seating and running a whole table
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use diningmonitor::{Coordinator, DiningTable};
//!
//! let table = Coordinator::new(5)?;
//! table.pick_up(1).await?;
//! table.put_down(1)?;
//! ```

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dinner;
pub mod philosopher;

// Re-export commonly used types
pub use config::{Config, TableVariant};
pub use coordinator::{
    Coordinator, CoordinatorError, CoordinatorResult, DiningTable, PepperShakers, PepperSnapshot, PhilosopherState,
    Priority, PriorityCoordinator, TableSnapshot, TableStats,
};
pub use dinner::{Dinner, DinnerReport};
pub use philosopher::{Philosopher, PhilosopherReport, Routine};
