//! Point-in-time view of a coordinator

use serde::{Deserialize, Serialize};

use super::state::{PhilosopherState, TableState, TableStats};

/// Pepper shaker pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PepperSnapshot {
    pub available: usize,
    pub capacity: usize,
}

/// Consistent copy of a coordinator's state, taken under its lock
///
/// Philosopher IDs are 1-based throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub states: Vec<PhilosopherState>,
    /// Holder of each chopstick; philosopher `k` uses chopsticks `k - 1` and `k % N`
    pub chopsticks: Vec<Option<usize>>,
    pub talking: bool,
    pub talker: Option<usize>,
    pub sleeping: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pepper: Option<PepperSnapshot>,
    /// Waiting philosophers in admission order (priority table only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admission_queue: Vec<usize>,
    pub interrupted: bool,
    pub stats: TableStats,
}

impl TableSnapshot {
    pub(crate) fn from_table(table: &TableState, interrupted: bool) -> Self {
        let talker = table.talker().map(|seat| seat + 1);
        Self {
            states: table.states().to_vec(),
            chopsticks: table.holders(),
            talking: talker.is_some(),
            talker,
            sleeping: table.sleeping(),
            pepper: None,
            admission_queue: Vec::new(),
            interrupted,
            stats: table.stats.clone(),
        }
    }

    pub fn seats(&self) -> usize {
        self.states.len()
    }

    /// Same resource picture as a freshly built table
    pub fn is_at_rest(&self) -> bool {
        self.chopsticks.iter().all(Option::is_none)
            && !self.talking
            && self.sleeping == 0
            && self.pepper.is_none_or(|p| p.available == p.capacity)
            && self.admission_queue.is_empty()
    }

    /// Check the coordinator invariants, describing the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        let seats = self.seats();
        for (stick, holder) in self.chopsticks.iter().enumerate() {
            let Some(id) = *holder else { continue };
            // Chopstick i is used by seat i (its left) and seat i - 1 (its right)
            let left = stick + 1;
            let right = if stick == 0 { seats } else { stick };
            if id != left && id != right {
                return Err(format!("chopstick {} held by non-adjacent philosopher {}", stick, id));
            }
            // A holder may nap mid-meal but never waits or talks
            let state = self.states.get(id - 1).copied();
            if matches!(
                state,
                Some(PhilosopherState::Hungry | PhilosopherState::Waiting | PhilosopherState::Talking)
            ) {
                return Err(format!("chopstick {} held by philosopher {} while {:?}", stick, id, state));
            }
        }

        let talkers = self.states.iter().filter(|s| **s == PhilosopherState::Talking).count();
        if talkers > 1 {
            return Err(format!("{} philosophers talking at once", talkers));
        }
        if self.talking != self.talker.is_some() {
            return Err("talking flag disagrees with talker".to_string());
        }
        if self.talking && self.sleeping > 0 {
            return Err(format!("talking while {} philosophers sleep", self.sleeping));
        }

        if let Some(pepper) = self.pepper {
            if pepper.available > pepper.capacity {
                return Err(format!(
                    "{} pepper shakers available with capacity {}",
                    pepper.available, pepper.capacity
                ));
            }
        }

        for id in &self.admission_queue {
            let state = self.states.get(id - 1).copied();
            if state != Some(PhilosopherState::Hungry) {
                return Err(format!("queued philosopher {} is {:?}", id, state));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(seats: usize) -> TableSnapshot {
        TableSnapshot::from_table(&TableState::new(seats).unwrap(), false)
    }

    #[test]
    fn test_fresh_table_at_rest() {
        let snapshot = fresh(5);
        assert!(snapshot.is_at_rest());
        assert!(snapshot.check_invariants().is_ok());
        assert_eq!(snapshot.states, vec![PhilosopherState::Thinking; 5]);
    }

    #[test]
    fn test_held_chopstick_not_at_rest() {
        let mut table = TableState::new(5).unwrap();
        table.take_chopsticks(4);
        let snapshot = TableSnapshot::from_table(&table, false);
        assert!(!snapshot.is_at_rest());
        assert!(snapshot.check_invariants().is_ok());
        assert_eq!(snapshot.chopsticks, vec![Some(5), None, None, None, Some(5)]);
    }

    #[test]
    fn test_detects_non_adjacent_holder() {
        let mut snapshot = fresh(5);
        snapshot.chopsticks[2] = Some(1);
        assert!(snapshot.check_invariants().is_err());
    }

    #[test]
    fn test_detects_holder_not_eating() {
        let mut table = TableState::new(5).unwrap();
        table.take_chopsticks(1);
        table.start_sleep(1);
        assert!(TableSnapshot::from_table(&table, false).check_invariants().is_ok());

        for state in [PhilosopherState::Hungry, PhilosopherState::Waiting, PhilosopherState::Talking] {
            table.set_state(1, state);
            let err = TableSnapshot::from_table(&table, false).check_invariants().unwrap_err();
            assert!(err.contains("held by philosopher 2"), "{}", err);
        }
    }

    #[test]
    fn test_detects_talking_while_sleeping() {
        let mut snapshot = fresh(3);
        snapshot.talking = true;
        snapshot.talker = Some(1);
        snapshot.sleeping = 1;
        assert!(snapshot.check_invariants().is_err());
    }

    #[test]
    fn test_detects_pepper_overflow() {
        let mut snapshot = fresh(3);
        snapshot.pepper = Some(PepperSnapshot {
            available: 3,
            capacity: 2,
        });
        assert!(snapshot.check_invariants().is_err());
    }

    #[test]
    fn test_serializes_lowercase_states() {
        let json = serde_json::to_value(fresh(2)).unwrap();
        assert_eq!(json["states"][0], "thinking");
        assert!(json.get("pepper").is_none());
    }
}
