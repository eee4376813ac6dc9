//! Priority coordinator: eating admission ordered by priority
//!
//! A philosopher eats only when both chopsticks are free and it is at the
//! head of the admission queue. The head waits even when a philosopher
//! further back could eat, so a head whose chopsticks stay busy holds up
//! everybody queued behind it.

use async_trait::async_trait;
use tracing::debug;

use super::DiningTable;
use super::error::{CoordinatorError, CoordinatorResult};
use super::monitor::Monitor;
use super::queue::{AdmissionQueue, Priority, Ticket};
use super::snapshot::TableSnapshot;
use super::state::{PhilosopherState, Seated, TableState};

struct PriorityRoom {
    table: TableState,
    queue: AdmissionQueue,
    priorities: Vec<Priority>,
}

impl Seated for PriorityRoom {
    fn table(&self) -> &TableState {
        &self.table
    }

    fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }
}

/// Coordinator admitting hungry philosophers in ascending priority order
pub struct PriorityCoordinator {
    monitor: Monitor<PriorityRoom>,
}

impl PriorityCoordinator {
    /// Create a coordinator; `priorities[i]` belongs to philosopher `i + 1`
    pub fn new(seats: usize, priorities: impl IntoIterator<Item = impl Into<Priority>>) -> CoordinatorResult<Self> {
        let priorities: Vec<Priority> = priorities.into_iter().map(Into::into).collect();
        debug!(seats, ?priorities, "PriorityCoordinator::new: called");
        let table = TableState::new(seats)?;
        if priorities.len() != seats {
            return Err(CoordinatorError::PriorityCountMismatch {
                expected: seats,
                actual: priorities.len(),
            });
        }
        Ok(Self {
            monitor: Monitor::new(PriorityRoom {
                table,
                queue: AdmissionQueue::default(),
                priorities,
            }),
        })
    }

    /// Priority of philosopher `id`
    pub fn priority(&self, id: usize) -> CoordinatorResult<Priority> {
        self.monitor.read(|s| {
            let seat = s.table.seat(id)?;
            Ok(s.priorities[seat])
        })
    }
}

/// Queue entry owned by a pending `pick_up`
///
/// Dropping it before admission (cancelled future, interrupt) takes the
/// entry out of the queue so it cannot hold up the philosophers behind it.
struct QueuedPickUp<'a> {
    monitor: &'a Monitor<PriorityRoom>,
    seat: usize,
    ticket: Ticket,
    admitted: bool,
}

impl Drop for QueuedPickUp<'_> {
    fn drop(&mut self) {
        if self.admitted {
            return;
        }
        debug!(seat = self.seat, "QueuedPickUp::drop: leaving admission queue");
        let seat = self.seat;
        let ticket = self.ticket;
        self.monitor.update(|s| {
            if s.queue.remove(ticket).is_some() && s.table.state(seat) == PhilosopherState::Hungry {
                s.table.set_state(seat, PhilosopherState::Thinking);
            }
        });
    }
}

#[async_trait]
impl DiningTable for PriorityCoordinator {
    fn seats(&self) -> usize {
        self.monitor.read(|s| s.table.seats())
    }

    async fn pick_up(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "PriorityCoordinator::pick_up: called");
        let seat = self.monitor.seat(id)?;
        let (ticket, queued) = self.monitor.access(|s| {
            let priority = s.priorities[seat];
            s.table.mark_hungry(seat);
            (s.queue.push(seat, priority), s.queue.len())
        });
        debug!(id, queued, "PriorityCoordinator::pick_up: queued");
        let mut entry = QueuedPickUp {
            monitor: &self.monitor,
            seat,
            ticket,
            admitted: false,
        };

        self.monitor
            .wait_until(
                |s| s.table.mark_hungry(seat),
                |s| {
                    if s.queue.head() == Some(ticket) && s.table.chopsticks_free(seat) {
                        s.queue.remove(ticket);
                        s.table.take_chopsticks(seat);
                        Some(())
                    } else {
                        None
                    }
                },
            )
            .await?;
        entry.admitted = true;

        debug!(id, "PriorityCoordinator::pick_up: admitted");
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
            admission_queue: s.queue.seats().map(|seat| seat + 1).collect(),
            ..TableSnapshot::from_table(&s.table, interrupted)
        })
    }

    fn interrupt(&self) {
        self.monitor.interrupt();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_priority_count_must_match() {
        assert_eq!(
            PriorityCoordinator::new(3, [1, 2]).err(),
            Some(CoordinatorError::PriorityCountMismatch { expected: 3, actual: 2 })
        );
        assert_eq!(
            PriorityCoordinator::new(2, [1, 2, 3]).err(),
            Some(CoordinatorError::PriorityCountMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(
            PriorityCoordinator::new(0, Vec::<i32>::new()).err(),
            Some(CoordinatorError::EmptyTable)
        );
    }

    #[test]
    fn test_priority_lookup() {
        let coordinator = PriorityCoordinator::new(3, [3, 1, 2]).unwrap();
        assert_eq!(coordinator.priority(1).unwrap(), Priority(3));
        assert_eq!(coordinator.priority(2).unwrap(), Priority(1));
        assert!(coordinator.priority(4).is_err());
    }

    #[tokio::test]
    async fn test_free_table_admits_immediately() {
        let coordinator = PriorityCoordinator::new(3, [3, 1, 2]).unwrap();
        coordinator.pick_up(1).await.unwrap();

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.states[0], PhilosopherState::Eating);
        assert!(snapshot.admission_queue.is_empty());
    }

    /// Seats 2, 4 and 6 block seats 1, 3 and 5 until released together
    #[tokio::test]
    async fn test_admission_follows_priority() {
        let coordinator = Arc::new(PriorityCoordinator::new(6, [3, 9, 1, 9, 2, 9]).unwrap());
        for id in [2, 4, 6] {
            coordinator.pick_up(id).await.unwrap();
        }

        let admitted = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = Vec::new();
        for id in [1, 3, 5] {
            let coordinator = coordinator.clone();
            let admitted = admitted.clone();
            tasks.push(tokio::spawn(async move {
                coordinator.pick_up(id).await.unwrap();
                admitted.lock().unwrap().push(id);
            }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.admission_queue, vec![3, 5, 1]);
        assert!(snapshot.check_invariants().is_ok());

        for id in [2, 4, 6] {
            coordinator.put_down(id).unwrap();
        }
        for task in tasks {
            tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        }

        assert_eq!(*admitted.lock().unwrap(), vec![3, 5, 1]);
        assert!(coordinator.snapshot().admission_queue.is_empty());
    }

    #[tokio::test]
    async fn test_head_blocks_ready_followers() {
        // Seat 1 is head but its chopstick is held by seat 2; seat 4 stays queued
        let coordinator = Arc::new(PriorityCoordinator::new(5, [1, 5, 5, 2, 5]).unwrap());
        coordinator.pick_up(2).await.unwrap();

        let head = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.pick_up(1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let follower = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.pick_up(4).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!follower.is_finished());
        assert_eq!(coordinator.snapshot().admission_queue, vec![1, 4]);

        coordinator.put_down(2).unwrap();
        tokio::time::timeout(Duration::from_secs(1), head).await.unwrap().unwrap().unwrap();
        tokio::time::timeout(Duration::from_secs(1), follower).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_pick_up_leaves_queue() {
        let coordinator = PriorityCoordinator::new(2, [2, 1]).unwrap();
        coordinator.pick_up(1).await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(20), coordinator.pick_up(2)).await;
        assert!(result.is_err());

        let snapshot = coordinator.snapshot();
        assert!(snapshot.admission_queue.is_empty());
        assert_eq!(snapshot.states[1], PhilosopherState::Thinking);
    }

    #[tokio::test]
    async fn test_cancelled_talk_request_resets_waiting() {
        let coordinator = PriorityCoordinator::new(2, [1, 2]).unwrap();
        coordinator.request_talk(2).await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(20), coordinator.request_talk(1)).await;
        assert!(result.is_err());
        assert_eq!(coordinator.snapshot().states[0], PhilosopherState::Thinking);

        coordinator.end_talk(2).unwrap();
        coordinator.request_talk(1).await.unwrap();
        assert_eq!(coordinator.snapshot().talker, Some(1));
    }

    #[tokio::test]
    async fn test_interrupt_clears_queue_entry() {
        let coordinator = Arc::new(PriorityCoordinator::new(2, [1, 1]).unwrap());
        coordinator.pick_up(1).await.unwrap();

        let blocked = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.pick_up(2).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(coordinator.snapshot().admission_queue, vec![2]);

        coordinator.interrupt();
        let result = tokio::time::timeout(Duration::from_secs(1), blocked).await.unwrap().unwrap();
        assert_eq!(result, Err(CoordinatorError::Interrupted));
        assert!(coordinator.snapshot().admission_queue.is_empty());
    }

    #[tokio::test]
    async fn test_talk_and_sleep_protocol_shared() {
        let coordinator = PriorityCoordinator::new(3, [1, 2, 3]).unwrap();
        coordinator.request_talk(3).await.unwrap();
        assert_eq!(coordinator.snapshot().talker, Some(3));
        coordinator.end_talk(3).unwrap();

        coordinator.request_sleep(1).await.unwrap();
        assert_eq!(coordinator.snapshot().sleeping, 1);
        coordinator.end_sleep(1).unwrap();
        assert!(coordinator.snapshot().is_at_rest());
    }
}
