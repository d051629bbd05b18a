/*!
 * Queue Read-Write Lock
 *
 * Fair reader/writer arbitration over one shared state block.
 *
 * # Design: Writer Priority
 *
 * - A reader is admitted only while no writer holds the lock AND no writer
 *   is queued, so a steady stream of readers cannot starve a writer
 * - The last reader out promotes the head writer
 * - A releasing writer hands off to the next writer first; only when no
 *   writer is queued does it release every queued reader in one step
 */

use crate::core::errors::{LockError, LockFacet, Result};
use crate::core::sync::config::LockConfig;
use crate::core::sync::stats::{RwLockStats, StatsCell};
use crate::core::sync::traits::{LockAdapter, RwLockAdapter};
use crate::core::sync::wait::{Abandoned, Acquire, ParkingSite, WaitQueue, WaiterId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Point-in-time view of a read-write lock for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RwLockSnapshot {
    pub active_readers: usize,
    pub has_writer: bool,
    pub read_waiters: usize,
    pub write_waiters: usize,
}

#[derive(Debug)]
struct RwState {
    active_readers: usize,
    has_writer: bool,
    read_waiters: WaitQueue,
    write_waiters: WaitQueue,
    read_stats: StatsCell,
    write_stats: StatsCell,
}

impl RwState {
    #[inline]
    fn can_read(&self) -> bool {
        !self.has_writer && self.write_waiters.is_empty()
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.active_readers == 0 && !self.has_writer
    }

    fn release_read(&mut self) -> Result<()> {
        if self.active_readers == 0 {
            self.read_stats.record(|s| s.unbalanced_unlocks += 1);
            return Err(LockError::not_held(LockFacet::Read));
        }

        self.active_readers -= 1;
        if self.active_readers == 0 {
            self.promote();
        }
        Ok(())
    }

    fn release_write(&mut self) -> Result<()> {
        if !self.has_writer {
            self.write_stats.record(|s| s.unbalanced_unlocks += 1);
            return Err(LockError::not_held(LockFacet::Write));
        }

        self.has_writer = false;
        self.promote();
        Ok(())
    }

    /// Hand a free lock to the head writer, or failing that to every queued reader
    fn promote(&mut self) {
        debug_assert!(self.can_write());

        if self.write_waiters.grant_next() {
            self.has_writer = true;
            self.write_stats.record(|s| s.handoffs += 1);
            return;
        }

        self.release_readers();
    }

    /// Admit every queued reader at once
    fn release_readers(&mut self) -> usize {
        let granted = self.read_waiters.grant_all();
        if granted > 0 {
            self.active_readers += granted;
            self.read_stats.record(|s| s.handoffs += granted as u64);
            debug!(readers = granted, "released queued readers");
        }
        granted
    }

    fn snapshot(&self) -> RwLockSnapshot {
        RwLockSnapshot {
            active_readers: self.active_readers,
            has_writer: self.has_writer,
            read_waiters: self.read_waiters.len(),
            write_waiters: self.write_waiters.len(),
        }
    }
}

#[derive(Debug)]
struct RwShared {
    label: &'static str,
    state: Mutex<RwState>,
}

/// Shared facet of a [`QueueRwLockAdapter`]
#[derive(Debug, Clone)]
pub struct QueueReadLock {
    shared: Arc<RwShared>,
}

/// Exclusive facet of a [`QueueRwLockAdapter`]
#[derive(Debug, Clone)]
pub struct QueueWriteLock {
    shared: Arc<RwShared>,
}

impl QueueReadLock {
    pub fn lock(&self) -> Acquire<'_> {
        let mut state = self.shared.state.lock();
        if state.can_read() {
            state.active_readers += 1;
            state.read_stats.record(|s| s.immediate += 1);
            trace!(
                lock = self.shared.label,
                readers = state.active_readers,
                "read lock acquired"
            );
            return Acquire::ready();
        }

        let (id, parked) = state.read_waiters.park();
        state.read_stats.record(|s| s.contended += 1);
        trace!(
            lock = self.shared.label,
            waiter = id,
            writer_active = state.has_writer,
            writers_queued = state.write_waiters.len(),
            "read lock busy, parking"
        );
        drop(state);

        Acquire::parked(self, id, parked)
    }

    /// Release one shared hold
    ///
    /// # Errors
    ///
    /// `LockError::NotHeld` if there are no active readers.
    pub fn unlock(&self) -> Result<()> {
        let result = self.shared.state.lock().release_read();
        match &result {
            Ok(()) => trace!(lock = self.shared.label, "read lock released"),
            Err(e) => debug!(lock = self.shared.label, error = %e, "unbalanced unlock rejected"),
        }
        result
    }

    pub fn try_lock(&self) -> bool {
        let mut state = self.shared.state.lock();
        if !state.can_read() {
            return false;
        }
        state.active_readers += 1;
        state.read_stats.record(|s| s.immediate += 1);
        true
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.shared.state.lock().active_readers > 0
    }
}

impl QueueWriteLock {
    pub fn lock(&self) -> Acquire<'_> {
        let mut state = self.shared.state.lock();
        if state.can_write() {
            state.has_writer = true;
            state.write_stats.record(|s| s.immediate += 1);
            trace!(lock = self.shared.label, "write lock acquired");
            return Acquire::ready();
        }

        let (id, parked) = state.write_waiters.park();
        state.write_stats.record(|s| s.contended += 1);
        trace!(
            lock = self.shared.label,
            waiter = id,
            readers = state.active_readers,
            writer_active = state.has_writer,
            "write lock busy, parking"
        );
        drop(state);

        Acquire::parked(self, id, parked)
    }

    /// Release the exclusive hold
    ///
    /// # Errors
    ///
    /// `LockError::NotHeld` if no writer holds the lock.
    pub fn unlock(&self) -> Result<()> {
        let result = self.shared.state.lock().release_write();
        match &result {
            Ok(()) => trace!(lock = self.shared.label, "write lock released"),
            Err(e) => debug!(lock = self.shared.label, error = %e, "unbalanced unlock rejected"),
        }
        result
    }

    pub fn try_lock(&self) -> bool {
        let mut state = self.shared.state.lock();
        if !state.can_write() {
            return false;
        }
        state.has_writer = true;
        state.write_stats.record(|s| s.immediate += 1);
        true
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.shared.state.lock().has_writer
    }
}

impl ParkingSite for QueueReadLock {
    fn abandon(&self, id: WaiterId, parked: &mut oneshot::Receiver<()>) {
        let mut state = self.shared.state.lock();
        let outcome = state.read_waiters.abandon(id, parked);
        if outcome.is_some() {
            state.read_stats.record(|s| s.abandoned += 1);
        }
        if outcome == Some(Abandoned::Granted) {
            if let Err(e) = state.release_read() {
                warn!(lock = self.shared.label, waiter = id, error = %e, "abandoned grant release failed");
            }
        }
        trace!(lock = self.shared.label, waiter = id, outcome = ?outcome, "read wait abandoned");
    }
}

impl ParkingSite for QueueWriteLock {
    fn abandon(&self, id: WaiterId, parked: &mut oneshot::Receiver<()>) {
        let mut state = self.shared.state.lock();
        let outcome = state.write_waiters.abandon(id, parked);
        match outcome {
            Some(Abandoned::Queued) => {
                state.write_stats.record(|s| s.abandoned += 1);
                // Readers queued only behind this writer may proceed now
                if !state.has_writer && state.write_waiters.is_empty() {
                    state.release_readers();
                }
            }
            Some(Abandoned::Granted) => {
                state.write_stats.record(|s| s.abandoned += 1);
                if let Err(e) = state.release_write() {
                    warn!(lock = self.shared.label, waiter = id, error = %e, "abandoned grant release failed");
                }
            }
            None => {}
        }
        trace!(lock = self.shared.label, waiter = id, outcome = ?outcome, "write wait abandoned");
    }
}

impl LockAdapter for QueueReadLock {
    fn lock(&self) -> Acquire<'_> {
        QueueReadLock::lock(self)
    }

    fn unlock(&self) -> Result<()> {
        QueueReadLock::unlock(self)
    }

    fn try_lock(&self) -> bool {
        QueueReadLock::try_lock(self)
    }

    fn is_held(&self) -> bool {
        QueueReadLock::is_held(self)
    }
}

impl LockAdapter for QueueWriteLock {
    fn lock(&self) -> Acquire<'_> {
        QueueWriteLock::lock(self)
    }

    fn unlock(&self) -> Result<()> {
        QueueWriteLock::unlock(self)
    }

    fn try_lock(&self) -> bool {
        QueueWriteLock::try_lock(self)
    }

    fn is_held(&self) -> bool {
        QueueWriteLock::is_held(self)
    }
}

/// Fair read-write lock built on two wait queues
///
/// # Guarantees
///
/// - **Exclusion**: active readers and an active writer never coexist
/// - **Writer priority**: once a writer is queued, newly arriving readers
///   queue behind it
/// - **FIFO** within the read queue and within the write queue
/// - **Batch release**: a writer leaving with no writer queued admits every
///   reader queued at that moment
///
/// # Example
///
/// ```
/// use fairlock::QueueRwLockAdapter;
///
/// # tokio_test::block_on(async {
/// let rw = QueueRwLockAdapter::new();
/// rw.read_lock().lock().await;
/// rw.read_lock().lock().await;
/// assert_eq!(rw.active_reader_count(), 2);
///
/// rw.read_lock().unlock().unwrap();
/// rw.read_lock().unlock().unwrap();
/// rw.write_lock().lock().await;
/// assert!(rw.has_active_writer());
/// # });
/// ```
#[derive(Debug)]
pub struct QueueRwLockAdapter {
    read: QueueReadLock,
    write: QueueWriteLock,
}

impl QueueRwLockAdapter {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        let shared = Arc::new(RwShared {
            label: config.label,
            state: Mutex::new(RwState {
                active_readers: 0,
                has_writer: false,
                read_waiters: WaitQueue::with_capacity(config.waiter_capacity),
                write_waiters: WaitQueue::with_capacity(config.waiter_capacity),
                read_stats: StatsCell::new(config.stats),
                write_stats: StatsCell::new(config.stats),
            }),
        });

        Self {
            read: QueueReadLock {
                shared: Arc::clone(&shared),
            },
            write: QueueWriteLock { shared },
        }
    }

    #[inline]
    pub fn read_lock(&self) -> &QueueReadLock {
        &self.read
    }

    #[inline]
    pub fn write_lock(&self) -> &QueueWriteLock {
        &self.write
    }

    #[inline]
    fn state(&self) -> parking_lot::MutexGuard<'_, RwState> {
        self.read.shared.state.lock()
    }

    pub fn has_active_readers(&self) -> bool {
        self.state().active_readers > 0
    }

    pub fn has_active_writer(&self) -> bool {
        self.state().has_writer
    }

    pub fn active_reader_count(&self) -> usize {
        self.state().active_readers
    }

    pub fn read_waiter_count(&self) -> usize {
        self.state().read_waiters.len()
    }

    pub fn write_waiter_count(&self) -> usize {
        self.state().write_waiters.len()
    }

    pub fn snapshot(&self) -> RwLockSnapshot {
        self.state().snapshot()
    }

    pub fn stats(&self) -> RwLockStats {
        let state = self.state();
        RwLockStats {
            read: state.read_stats.get(),
            write: state.write_stats.get(),
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.read.shared.label
    }
}

impl Default for QueueRwLockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLockAdapter for QueueRwLockAdapter {
    fn read_lock(&self) -> &dyn LockAdapter {
        &self.read
    }

    fn write_lock(&self) -> &dyn LockAdapter {
        &self.write
    }
}
