//! Table state shared by both coordinators
//!
//! Chopstick ownership, the talking gate and the sleeping count live here,
//! together with the talking/sleeping/put-down protocol that both
//! coordinators run unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{CoordinatorError, CoordinatorResult};
use super::monitor::Monitor;

/// What a philosopher is doing, as last recorded by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhilosopherState {
    Eating,
    #[default]
    Thinking,
    Talking,
    Waiting,
    Hungry,
    Sleeping,
}

impl std::fmt::Display for PhilosopherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eating => write!(f, "eating"),
            Self::Thinking => write!(f, "thinking"),
            Self::Talking => write!(f, "talking"),
            Self::Waiting => write!(f, "waiting"),
            Self::Hungry => write!(f, "hungry"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// Counters kept by a coordinator
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub meals: u64,
    pub talks: u64,
    pub naps: u64,
    pub pepper_uses: u64,
    pub peak_hungry: usize,
}

/// Chopsticks, talking gate and sleepers for one table
#[derive(Debug, Clone)]
pub(crate) struct TableState {
    states: Vec<PhilosopherState>,
    /// Holder seat for each chopstick; seat `i` uses chopsticks `i` and `(i + 1) % N`
    chopsticks: Vec<Option<usize>>,
    talker: Option<usize>,
    asleep: Vec<bool>,
    sleeping: usize,
    pub(crate) stats: TableStats,
}

impl TableState {
    pub(crate) fn new(seats: usize) -> CoordinatorResult<Self> {
        if seats == 0 {
            return Err(CoordinatorError::EmptyTable);
        }
        Ok(Self {
            states: vec![PhilosopherState::Thinking; seats],
            chopsticks: vec![None; seats],
            talker: None,
            asleep: vec![false; seats],
            sleeping: 0,
            stats: TableStats::default(),
        })
    }

    pub(crate) fn seats(&self) -> usize {
        self.states.len()
    }

    /// Map a 1-based philosopher ID to its seat index
    pub(crate) fn seat(&self, id: usize) -> CoordinatorResult<usize> {
        if id == 0 || id > self.seats() {
            return Err(CoordinatorError::UnknownPhilosopher { id, seats: self.seats() });
        }
        Ok(id - 1)
    }

    fn right(&self, seat: usize) -> usize {
        (seat + 1) % self.seats()
    }

    pub(crate) fn state(&self, seat: usize) -> PhilosopherState {
        self.states[seat]
    }

    pub(crate) fn set_state(&mut self, seat: usize, state: PhilosopherState) {
        self.states[seat] = state;
    }

    pub(crate) fn mark_hungry(&mut self, seat: usize) {
        self.states[seat] = PhilosopherState::Hungry;
        let hungry = self.states.iter().filter(|s| **s == PhilosopherState::Hungry).count();
        self.stats.peak_hungry = self.stats.peak_hungry.max(hungry);
    }

    /// Both chopsticks next to `seat` are on the table
    pub(crate) fn chopsticks_free(&self, seat: usize) -> bool {
        self.chopsticks[seat].is_none() && self.chopsticks[self.right(seat)].is_none()
    }

    /// Take both chopsticks at once and start eating
    pub(crate) fn take_chopsticks(&mut self, seat: usize) {
        let right = self.right(seat);
        self.chopsticks[seat] = Some(seat);
        self.chopsticks[right] = Some(seat);
        self.states[seat] = PhilosopherState::Eating;
        self.stats.meals += 1;
    }

    /// Put back whichever of the two chopsticks `seat` holds
    pub(crate) fn release_chopsticks(&mut self, seat: usize) -> bool {
        let mut released = false;
        for stick in [seat, self.right(seat)] {
            if self.chopsticks[stick] == Some(seat) {
                self.chopsticks[stick] = None;
                released = true;
            }
        }
        self.states[seat] = PhilosopherState::Thinking;
        released
    }

    pub(crate) fn can_talk(&self) -> bool {
        self.talker.is_none() && self.sleeping == 0
    }

    pub(crate) fn start_talk(&mut self, seat: usize) {
        self.talker = Some(seat);
        self.states[seat] = PhilosopherState::Talking;
        self.stats.talks += 1;
    }

    pub(crate) fn end_talk(&mut self, seat: usize) -> bool {
        self.states[seat] = PhilosopherState::Thinking;
        if self.talker == Some(seat) {
            self.talker = None;
            return true;
        }
        false
    }

    pub(crate) fn can_sleep(&self) -> bool {
        self.talker.is_none()
    }

    pub(crate) fn start_sleep(&mut self, seat: usize) {
        if !self.asleep[seat] {
            self.asleep[seat] = true;
            self.sleeping += 1;
            self.stats.naps += 1;
        }
        self.states[seat] = PhilosopherState::Sleeping;
    }

    pub(crate) fn end_sleep(&mut self, seat: usize) -> bool {
        self.states[seat] = PhilosopherState::Thinking;
        if self.asleep[seat] {
            self.asleep[seat] = false;
            self.sleeping -= 1;
            return true;
        }
        false
    }

    pub(crate) fn states(&self) -> &[PhilosopherState] {
        &self.states
    }

    pub(crate) fn talker(&self) -> Option<usize> {
        self.talker
    }

    pub(crate) fn sleeping(&self) -> usize {
        self.sleeping
    }

    /// Chopstick holders as 1-based philosopher IDs
    pub(crate) fn holders(&self) -> Vec<Option<usize>> {
        self.chopsticks.iter().map(|h| h.map(|seat| seat + 1)).collect()
    }
}

/// Coordinator state that carries a table
pub(crate) trait Seated {
    fn table(&self) -> &TableState;
    fn table_mut(&mut self) -> &mut TableState;
}

/// Label set by a blocked call, reset to Thinking if the call never completes
///
/// Dropping the pending future (cancellation) or failing the wait (interrupt)
/// leaves the philosopher idle instead of stuck as Hungry or Waiting.
pub(crate) struct PendingWait<'a, S: Seated> {
    monitor: &'a Monitor<S>,
    seat: usize,
    label: PhilosopherState,
    completed: bool,
}

impl<'a, S: Seated> PendingWait<'a, S> {
    pub(crate) fn new(monitor: &'a Monitor<S>, seat: usize, label: PhilosopherState) -> Self {
        Self {
            monitor,
            seat,
            label,
            completed: false,
        }
    }

    pub(crate) fn complete(mut self) {
        self.completed = true;
    }
}

impl<S: Seated> Drop for PendingWait<'_, S> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        debug!(seat = self.seat, label = %self.label, "PendingWait::drop: wait abandoned");
        let seat = self.seat;
        let label = self.label;
        self.monitor.update(|s| {
            let table = s.table_mut();
            if table.state(seat) == label {
                table.set_state(seat, PhilosopherState::Thinking);
            }
        });
    }
}

/// The protocol both coordinators share
impl<S: Seated> Monitor<S> {
    pub(crate) fn seat(&self, id: usize) -> CoordinatorResult<usize> {
        self.read(|s| s.table().seat(id))
    }

    pub(crate) fn put_down(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Monitor::put_down: called");
        let seat = self.seat(id)?;
        let released = self.update(|s| s.table_mut().release_chopsticks(seat));
        if !released {
            warn!(id, "put_down without holding chopsticks, nothing released");
        }
        Ok(())
    }

    pub(crate) async fn request_talk(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Monitor::request_talk: called");
        let seat = self.seat(id)?;
        let pending = PendingWait::new(self, seat, PhilosopherState::Waiting);
        self.wait_until(
            |s| s.table_mut().set_state(seat, PhilosopherState::Waiting),
            |s| {
                let table = s.table_mut();
                if table.can_talk() {
                    table.start_talk(seat);
                    Some(())
                } else {
                    None
                }
            },
        )
        .await?;
        pending.complete();
        Ok(())
    }

    pub(crate) fn end_talk(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Monitor::end_talk: called");
        let seat = self.seat(id)?;
        if !self.update(|s| s.table_mut().end_talk(seat)) {
            warn!(id, "end_talk by a philosopher who was not talking");
        }
        Ok(())
    }

    pub(crate) async fn request_sleep(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Monitor::request_sleep: called");
        let seat = self.seat(id)?;
        self.wait_until(
            |_| {},
            |s| {
                let table = s.table_mut();
                if table.can_sleep() {
                    table.start_sleep(seat);
                    Some(())
                } else {
                    None
                }
            },
        )
        .await
    }

    pub(crate) fn end_sleep(&self, id: usize) -> CoordinatorResult<()> {
        debug!(id, "Monitor::end_sleep: called");
        let seat = self.seat(id)?;
        if !self.update(|s| s.table_mut().end_sleep(seat)) {
            warn!(id, "end_sleep by a philosopher who was not sleeping");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_table() {
        assert_eq!(TableState::new(0).unwrap_err(), CoordinatorError::EmptyTable);
    }

    #[test]
    fn test_seat_validation() {
        let table = TableState::new(5).unwrap();
        assert_eq!(table.seat(1).unwrap(), 0);
        assert_eq!(table.seat(5).unwrap(), 4);
        assert_eq!(
            table.seat(0).unwrap_err(),
            CoordinatorError::UnknownPhilosopher { id: 0, seats: 5 }
        );
        assert_eq!(
            table.seat(6).unwrap_err(),
            CoordinatorError::UnknownPhilosopher { id: 6, seats: 5 }
        );
    }

    #[test]
    fn test_neighbours_share_a_chopstick() {
        let mut table = TableState::new(5).unwrap();
        table.take_chopsticks(0);
        assert!(!table.chopsticks_free(1));
        assert!(!table.chopsticks_free(4));
        assert!(table.chopsticks_free(2));
        assert_eq!(table.holders(), vec![Some(1), Some(1), None, None, None]);
    }

    #[test]
    fn test_last_seat_wraps_to_first_chopstick() {
        let mut table = TableState::new(3).unwrap();
        table.take_chopsticks(2);
        assert_eq!(table.holders(), vec![Some(3), None, Some(3)]);
        assert!(!table.chopsticks_free(0));
    }

    #[test]
    fn test_release_only_own_chopsticks() {
        let mut table = TableState::new(5).unwrap();
        table.take_chopsticks(1);

        // Seat 0 shares chopstick 1 with seat 1 but does not hold it
        assert!(!table.release_chopsticks(0));
        assert_eq!(table.holders(), vec![None, Some(2), Some(2), None, None]);

        assert!(table.release_chopsticks(1));
        assert!(!table.release_chopsticks(1));
        assert_eq!(table.holders(), vec![None; 5]);
    }

    #[test]
    fn test_single_seat_uses_one_chopstick() {
        let mut table = TableState::new(1).unwrap();
        assert!(table.chopsticks_free(0));
        table.take_chopsticks(0);
        assert!(!table.chopsticks_free(0));
        assert!(table.release_chopsticks(0));
        assert!(table.chopsticks_free(0));
    }

    #[test]
    fn test_talking_blocks_on_sleepers() {
        let mut table = TableState::new(3).unwrap();
        table.start_sleep(0);
        assert!(!table.can_talk());
        assert!(table.can_sleep());

        table.end_sleep(0);
        assert!(table.can_talk());

        table.start_talk(1);
        assert!(!table.can_sleep());
        assert!(!table.can_talk());
    }

    #[test]
    fn test_end_talk_only_by_talker() {
        let mut table = TableState::new(3).unwrap();
        table.start_talk(1);
        assert!(!table.end_talk(2));
        assert_eq!(table.talker(), Some(1));
        assert!(table.end_talk(1));
        assert_eq!(table.talker(), None);
    }

    #[test]
    fn test_end_sleep_never_underflows() {
        let mut table = TableState::new(2).unwrap();
        assert!(!table.end_sleep(0));
        assert_eq!(table.sleeping(), 0);

        table.start_sleep(0);
        table.start_sleep(0);
        assert_eq!(table.sleeping(), 1);
        assert!(table.end_sleep(0));
        assert_eq!(table.sleeping(), 0);
    }

    #[test]
    fn test_peak_hungry() {
        let mut table = TableState::new(4).unwrap();
        table.mark_hungry(0);
        table.mark_hungry(1);
        table.take_chopsticks(0);
        table.mark_hungry(2);
        assert_eq!(table.stats.peak_hungry, 2);
    }
}
