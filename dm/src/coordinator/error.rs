//! Coordinator errors

use thiserror::Error;

/// Errors from coordinator construction and operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("Philosopher {id} is not seated at a table of {seats}")]
    UnknownPhilosopher { id: usize, seats: usize },

    #[error("Wait interrupted")]
    Interrupted,

    #[error("A table needs at least one philosopher")]
    EmptyTable,

    #[error("Expected {expected} priorities, got {actual}")]
    PriorityCountMismatch { expected: usize, actual: usize },

    #[error("Pepper shaker pool needs at least one shaker")]
    NoPepperShakers,
}

/// Result of coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
