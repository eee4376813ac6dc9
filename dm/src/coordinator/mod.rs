//! Coordinators for the dining table
//!
//! Both variants guard all of their state with a single monitor: one lock,
//! one broadcast wakeup, predicates re-checked after every wakeup.
//!
//! - [`Coordinator`] admits any philosopher whose two chopsticks are free and
//!   manages the pepper shaker pool.
//! - [`PriorityCoordinator`] additionally admits eaters in ascending priority
//!   order.
//!
//! Philosopher IDs are 1-based; out-of-range IDs are rejected.

mod error;
mod monitor;
mod pepper;
mod plain;
mod priority;
mod queue;
mod snapshot;
mod state;

use async_trait::async_trait;

pub use error::{CoordinatorError, CoordinatorResult};
pub use pepper::DEFAULT_PEPPER_SHAKERS;
pub use plain::Coordinator;
pub use priority::PriorityCoordinator;
pub use queue::Priority;
pub use snapshot::{PepperSnapshot, TableSnapshot};
pub use state::{PhilosopherState, TableStats};

/// Chopstick and talking/sleeping protocol shared by every coordinator
#[async_trait]
pub trait DiningTable: Send + Sync {
    /// Number of philosophers at the table
    fn seats(&self) -> usize;

    /// Wait until both chopsticks are free (and, for the priority table, this
    /// philosopher is first in line), then take them
    async fn pick_up(&self, id: usize) -> CoordinatorResult<()>;

    /// Put back the chopsticks this philosopher holds
    fn put_down(&self, id: usize) -> CoordinatorResult<()>;

    /// Wait until nobody talks and nobody sleeps, then take the floor
    async fn request_talk(&self, id: usize) -> CoordinatorResult<()>;

    fn end_talk(&self, id: usize) -> CoordinatorResult<()>;

    /// Wait until nobody talks, then fall asleep
    async fn request_sleep(&self, id: usize) -> CoordinatorResult<()>;

    fn end_sleep(&self, id: usize) -> CoordinatorResult<()>;

    fn snapshot(&self) -> TableSnapshot;

    /// Fail every pending and future wait with [`CoordinatorError::Interrupted`]
    fn interrupt(&self);

    /// Pepper shaker pool, if this table has one
    fn pepper_shakers(&self) -> Option<&dyn PepperShakers> {
        None
    }
}

/// Counting pool of pepper shakers
#[async_trait]
pub trait PepperShakers: Send + Sync {
    /// Wait for a free shaker and take it
    async fn request_pepper_shaker(&self, id: usize) -> CoordinatorResult<()>;

    fn end_pepper_shaker(&self, id: usize) -> CoordinatorResult<()>;
}
