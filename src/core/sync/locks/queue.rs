/*!
 * Queue Lock
 * FIFO-fair async mutex with direct handoff to the head waiter
 */

use crate::core::errors::{LockError, LockFacet, Result};
use crate::core::sync::config::LockConfig;
use crate::core::sync::stats::{LockStats, StatsCell};
use crate::core::sync::traits::LockAdapter;
use crate::core::sync::wait::{Abandoned, Acquire, ParkingSite, WaitQueue, WaiterId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Point-in-time view of a mutex for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MutexSnapshot {
    pub held: bool,
    pub waiters: usize,
}

#[derive(Debug)]
struct MutexState {
    held: bool,
    waiters: WaitQueue,
    stats: StatsCell,
}

impl MutexState {
    fn release(&mut self) -> Result<()> {
        if !self.held {
            self.stats.record(|s| s.unbalanced_unlocks += 1);
            return Err(LockError::not_held(LockFacet::Mutex));
        }

        // Ownership moves to the head waiter; `held` stays set across the handoff
        if self.waiters.grant_next() {
            self.stats.record(|s| s.handoffs += 1);
        } else {
            self.held = false;
        }
        Ok(())
    }
}

/// FIFO-fair mutex built on a wait queue
///
/// # Guarantees
///
/// - **Mutual exclusion**: at most one holder between a completed `lock()`
///   and its matching `unlock()`
/// - **FIFO**: parked callers are granted in the order `lock()` was called
/// - **Direct handoff**: `unlock()` with waiters keeps the mutex held and
///   transfers it, so a newcomer can never barge in
///
/// # Example
///
/// ```
/// use fairlock::QueueLockAdapter;
///
/// # tokio_test::block_on(async {
/// let mutex = QueueLockAdapter::new();
/// mutex.lock().await;
/// assert!(mutex.is_held());
/// mutex.unlock().unwrap();
/// assert!(!mutex.is_held());
/// # });
/// ```
#[derive(Debug)]
pub struct QueueLockAdapter {
    label: &'static str,
    state: Mutex<MutexState>,
}

impl QueueLockAdapter {
    /// Create an unheld mutex with the default configuration
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self {
            label: config.label,
            state: Mutex::new(MutexState {
                held: false,
                waiters: WaitQueue::with_capacity(config.waiter_capacity),
                stats: StatsCell::new(config.stats),
            }),
        }
    }

    /// Request the mutex
    ///
    /// Returns an already-completed future if the mutex was free. Otherwise
    /// the caller is queued now and the future completes when an `unlock()`
    /// hands the mutex over.
    pub fn lock(&self) -> Acquire<'_> {
        let mut state = self.state.lock();
        if !state.held {
            state.held = true;
            state.stats.record(|s| s.immediate += 1);
            trace!(lock = self.label, "mutex acquired");
            return Acquire::ready();
        }

        let (id, parked) = state.waiters.park();
        state.stats.record(|s| s.contended += 1);
        trace!(
            lock = self.label,
            waiter = id,
            queued = state.waiters.len(),
            "mutex busy, parking"
        );
        drop(state);

        Acquire::parked(self, id, parked)
    }

    /// Release the mutex
    ///
    /// # Errors
    ///
    /// `LockError::NotHeld` if the mutex is free. The state is left unchanged.
    pub fn unlock(&self) -> Result<()> {
        let result = self.state.lock().release();
        match &result {
            Ok(()) => trace!(lock = self.label, "mutex released"),
            Err(e) => debug!(lock = self.label, error = %e, "unbalanced unlock rejected"),
        }
        result
    }

    /// Acquire without waiting
    pub fn try_lock(&self) -> bool {
        let mut state = self.state.lock();
        if state.held {
            return false;
        }
        state.held = true;
        state.stats.record(|s| s.immediate += 1);
        true
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.state.lock().held
    }

    /// Number of callers parked in `lock()`
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    pub fn snapshot(&self) -> MutexSnapshot {
        let state = self.state.lock();
        MutexSnapshot {
            held: state.held,
            waiters: state.waiters.len(),
        }
    }

    pub fn stats(&self) -> LockStats {
        self.state.lock().stats.get()
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Default for QueueLockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ParkingSite for QueueLockAdapter {
    fn abandon(&self, id: WaiterId, parked: &mut oneshot::Receiver<()>) {
        let mut state = self.state.lock();
        let outcome = state.waiters.abandon(id, parked);
        if outcome.is_some() {
            state.stats.record(|s| s.abandoned += 1);
        }
        if outcome == Some(Abandoned::Granted) {
            // Granted but never observed: pass ownership on
            if let Err(e) = state.release() {
                warn!(lock = self.label, waiter = id, error = %e, "abandoned grant release failed");
            }
        }
        trace!(lock = self.label, waiter = id, outcome = ?outcome, "mutex wait abandoned");
    }
}

impl LockAdapter for QueueLockAdapter {
    fn lock(&self) -> Acquire<'_> {
        QueueLockAdapter::lock(self)
    }

    fn unlock(&self) -> Result<()> {
        QueueLockAdapter::unlock(self)
    }

    fn try_lock(&self) -> bool {
        QueueLockAdapter::try_lock(self)
    }

    fn is_held(&self) -> bool {
        QueueLockAdapter::is_held(self)
    }
}
