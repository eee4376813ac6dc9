//! Pepper shaker pool - a counting semaphore over a fixed number of shakers

/// Default number of pepper shakers on the table
pub const DEFAULT_PEPPER_SHAKERS: usize = 2;

#[derive(Debug, Clone)]
pub(crate) struct PepperPool {
    available: usize,
    capacity: usize,
    holders: Vec<bool>,
}

impl PepperPool {
    pub(crate) fn new(capacity: usize, seats: usize) -> Self {
        Self {
            available: capacity,
            capacity,
            holders: vec![false; seats],
        }
    }

    pub(crate) fn available(&self) -> usize {
        self.available
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn holds(&self, seat: usize) -> bool {
        self.holders[seat]
    }

    /// Take a shaker if one is free; a seat already holding one keeps it
    pub(crate) fn try_take(&mut self, seat: usize) -> bool {
        if self.holders[seat] {
            return true;
        }
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        self.holders[seat] = true;
        true
    }

    /// Return the shaker held by `seat`, if any
    pub(crate) fn put_back(&mut self, seat: usize) -> bool {
        if !self.holders[seat] {
            return false;
        }
        self.holders[seat] = false;
        self.available += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_until_empty() {
        let mut pool = PepperPool::new(2, 4);
        assert!(pool.try_take(0));
        assert!(pool.try_take(1));
        assert_eq!(pool.available(), 0);
        assert!(!pool.try_take(2));

        assert!(pool.put_back(0));
        assert!(pool.try_take(2));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_holder_keeps_single_shaker() {
        let mut pool = PepperPool::new(2, 3);
        assert!(pool.try_take(0));
        assert!(pool.try_take(0));
        assert_eq!(pool.available(), 1);
        assert!(pool.holds(0));
    }

    #[test]
    fn test_put_back_never_exceeds_capacity() {
        let mut pool = PepperPool::new(2, 3);
        assert!(!pool.put_back(1));
        assert_eq!(pool.available(), pool.capacity());

        pool.try_take(1);
        assert!(pool.put_back(1));
        assert!(!pool.put_back(1));
        assert_eq!(pool.available(), 2);
    }
}
