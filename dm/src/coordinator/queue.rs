//! Admission queue for the priority coordinator

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Eating priority; lower values are served first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| format!("Invalid priority: {}", s))
    }
}

/// Handle for one queued `pick_up` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

/// A queued philosopher
#[derive(Debug, Clone, Copy)]
struct Admission {
    priority: Priority,
    seq: u64,
    seat: usize,
}

impl Eq for Admission {}

impl PartialEq for Admission {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Ord for Admission {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Lower priority value first, then earlier arrival
        self.priority.cmp(&other.priority).then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Admission {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Philosophers waiting to eat, ordered by (priority, arrival)
#[derive(Debug, Clone, Default)]
pub(crate) struct AdmissionQueue {
    entries: BTreeSet<Admission>,
    next_seq: u64,
}

impl AdmissionQueue {
    pub(crate) fn push(&mut self, seat: usize, priority: Priority) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(Admission { priority, seq, seat });
        Ticket(seq)
    }

    /// Ticket at the head of the ordering
    pub(crate) fn head(&self) -> Option<Ticket> {
        self.entries.first().map(|a| Ticket(a.seq))
    }

    pub(crate) fn remove(&mut self, ticket: Ticket) -> Option<usize> {
        let entry = self.entries.iter().find(|a| a.seq == ticket.0).copied()?;
        self.entries.remove(&entry);
        Some(entry.seat)
    }

    /// Queued seats in admission order
    pub(crate) fn seats(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|a| a.seat)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
