//! Monitor - a single exclusive section with a broadcast wakeup channel
//!
//! Every coordinator wraps its state in one `Monitor`. Operations run their
//! whole body under the lock; blocking operations release it while suspended
//! and re-check their predicate after every broadcast.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

use super::error::{CoordinatorError, CoordinatorResult};

/// Internal state protected by mutex
struct MonitorInner<S> {
    state: S,
    interrupted: bool,
}

/// Mutex-guarded state plus the coordinator-wide wait/notify channel
pub(crate) struct Monitor<S> {
    inner: Mutex<MonitorInner<S>>,
    notify: Notify,
}

impl<S> Monitor<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            inner: Mutex::new(MonitorInner {
                state,
                interrupted: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorInner<S>> {
        // A panic inside a critical section leaves the state as the panicking
        // operation wrote it; later operations keep using it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the state under the lock
    pub(crate) fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let inner = self.lock();
        f(&inner.state)
    }

    /// Mutate the state under the lock without waking anyone
    pub(crate) fn access<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut inner = self.lock();
        f(&mut inner.state)
    }

    /// Mutate the state under the lock, then wake every waiter
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut inner = self.lock();
            f(&mut inner.state)
        };
        self.notify.notify_waiters();
        result
    }

    /// Suspend until `ready` yields a value
    ///
    /// `ready` is evaluated under the lock; when it returns `Some` the
    /// acquisition it performed is complete and all waiters are woken.
    /// Otherwise `blocked` runs (still under the lock) and the caller
    /// suspends until the next broadcast.
    pub(crate) async fn wait_until<R>(
        &self,
        mut blocked: impl FnMut(&mut S) + Send,
        mut ready: impl FnMut(&mut S) -> Option<R> + Send,
    ) -> CoordinatorResult<R> {
        loop {
            // Registered before the check so a broadcast after it is not lost
            let notified = self.notify.notified();
            {
                let mut inner = self.lock();
                if inner.interrupted {
                    debug!("Monitor::wait_until: interrupted");
                    return Err(CoordinatorError::Interrupted);
                }
                if let Some(result) = ready(&mut inner.state) {
                    drop(inner);
                    self.notify.notify_waiters();
                    return Ok(result);
                }
                blocked(&mut inner.state);
            }
            notified.await;
        }
    }

    /// Fail every current and future wait with `Interrupted`
    pub(crate) fn interrupt(&self) {
        debug!("Monitor::interrupt: called");
        self.lock().interrupted = true;
        self.notify.notify_waiters();
    }

    /// Read the state and the interrupted flag together
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&S, bool) -> R) -> R {
        let inner = self.lock();
        f(&inner.state, inner.interrupted)
    }
}
