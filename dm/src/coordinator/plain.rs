//! Baseline coordinator: chopsticks, talking/sleeping gate and pepper shakers

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::{CoordinatorError, CoordinatorResult};
use super::monitor::Monitor;
use super::pepper::{DEFAULT_PEPPER_SHAKERS, PepperPool};
use super::snapshot::{PepperSnapshot, TableSnapshot};
use super::state::{PendingWait, PhilosopherState, Seated, TableState};
use super::{DiningTable, PepperShakers};

struct DiningRoom {
    table: TableState,
    pepper: PepperPool,
}

impl Seated for DiningRoom {
    fn table(&self) -> &TableState {
        &self.table
    }

    fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }
}

/// Coordinator admitting any philosopher whose two chopsticks are free
pub struct Coordinator {
    monitor: Monitor<DiningRoom>,
}

impl Coordinator {
    /// Create a coordinator for `seats` philosophers with the default two pepper shakers
    pub fn new(seats: usize) -> CoordinatorResult<Self> {
        Self::with_pepper_shakers(seats, DEFAULT_PEPPER_SHAKERS)
    }

    /// Create a coordinator with a custom pepper shaker pool
    pub fn with_pepper_shakers(seats: usize, pepper_shakers: usize) -> CoordinatorResult<Self> {
        debug!(seats, pepper_shakers, "Coordinator::new: called");
        if pepper_shakers == 0 {
            return Err(CoordinatorError::NoPepperShakers);
        }
        let table = TableState::new(seats)?;
        Ok(Self {
            monitor: Monitor::new(DiningRoom {
                table,
                pepper: PepperPool::new(pepper_shakers, seats),
            }),
        })
    }
}

#[async_trait]
impl DiningTable for Coordinator {
    fn seats(&self) -> usize {
        self.monitor.read(|s| s.table.seats())
    }

    async fn pick_up(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Coordinator::pick_up: called");
        let seat = self.monitor.seat(id)?;
        let pending = PendingWait::new(&self.monitor, seat, PhilosopherState::Hungry);
        self.monitor
            .wait_until(
                |s| s.table.mark_hungry(seat),
                |s| {
                    if s.table.chopsticks_free(seat) {
                        s.table.take_chopsticks(seat);
                        Some(())
                    } else {
                        None
                    }
                },
            )
            .await?;
        pending.complete();
        debug!(id, "Coordinator::pick_up: eating");
        Ok(())
    }

    fn put_down(&self, id: usize) -> CoordinatorResult<()> {
        self.monitor.put_down(id)
    }

    async fn request_talk(&self, id: usize) -> CoordinatorResult<()> {
        self.monitor.request_talk(id).await
    }

    fn end_talk(&self, id: usize) -> CoordinatorResult<()> {
        self.monitor.end_talk(id)
    }

    async fn request_sleep(&self, id: usize) -> CoordinatorResult<()> {
        self.monitor.request_sleep(id).await
    }

    fn end_sleep(&self, id: usize) -> CoordinatorResult<()> {
        self.monitor.end_sleep(id)
    }

    fn snapshot(&self) -> TableSnapshot {
        self.monitor.inspect(|s, interrupted| TableSnapshot {
            pepper: Some(PepperSnapshot {
                available: s.pepper.available(),
                capacity: s.pepper.capacity(),
            }),
            ..TableSnapshot::from_table(&s.table, interrupted)
        })
    }

    fn interrupt(&self) {
        self.monitor.interrupt();
    }

    fn pepper_shakers(&self) -> Option<&dyn PepperShakers> {
        Some(self)
    }
}

#[async_trait]
impl PepperShakers for Coordinator {
    async fn request_pepper_shaker(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Coordinator::request_pepper_shaker: called");
        let seat = self.monitor.seat(id)?;
        self.monitor
            .wait_until(
                |_| {},
                |s| {
                    let fresh = !s.pepper.holds(seat);
                    if s.pepper.try_take(seat) {
                        if fresh {
                            s.table.stats.pepper_uses += 1;
                        }
                        Some(())
                    } else {
                        None
                    }
                },
            )
            .await
    }

    fn end_pepper_shaker(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Coordinator::end_pepper_shaker: called");
        let seat = self.monitor.seat(id)?;
        if !self.monitor.update(|s| s.pepper.put_back(seat)) {
            warn!(id, "end_pepper_shaker without holding a shaker");
        }
        Ok(())
    }
}
