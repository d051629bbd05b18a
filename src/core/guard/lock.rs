/*!
 * Lock Guards
 *
 * Ownership of one acquired facet, released on drop
 */

use super::traits::{Guard, GuardDrop};
use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::errors::{LockFacet, Result};
use crate::core::sync::LockAdapter;
use std::fmt;
use tracing::{trace, warn};

/// Holds an acquired facet until released or dropped
///
/// Created by `Lock::acquire`, `RwLock::read` and `RwLock::write`; the facet
/// has already been acquired when the guard exists.
///
/// # Example
///
/// ```
/// use fairlock::RwLock;
///
/// # tokio_test::block_on(async {
/// let rw = RwLock::new();
/// let guard = rw.write().await;
/// assert!(rw.adapter().has_active_writer());
/// guard.unlock().unwrap();
/// assert!(!rw.adapter().has_active_writer());
/// # });
/// ```
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a, L: ?Sized + LockAdapter + 'a> {
    lock: &'a L,
    facet: LockFacet,
    metadata: GuardMetadata,
    active: bool,
}

impl<'a, L> LockGuard<'a, L>
where
    L: ?Sized + LockAdapter,
{
    /// Wrap a facet the caller has already acquired
    pub(crate) fn new(lock: &'a L, facet: LockFacet) -> Self {
        Self {
            lock,
            facet,
            metadata: GuardMetadata::new(resource_name(facet)),
            active: true,
        }
    }

    #[inline]
    pub fn facet(&self) -> LockFacet {
        self.facet
    }

    /// Release the facet, reporting the adapter's result
    pub fn unlock(mut self) -> Result<()> {
        self.active = false;
        self.trace_release();
        self.lock.unlock()
    }

    fn trace_release(&self) {
        trace!(
            facet = %self.facet,
            held_us = self.metadata.lifetime_micros(),
            "guard released"
        );
    }
}

fn resource_name(facet: LockFacet) -> &'static str {
    match facet {
        LockFacet::Mutex => "mutex_guard",
        LockFacet::Read => "read_guard",
        LockFacet::Write => "write_guard",
    }
}

impl<L> Guard for LockGuard<'_, L>
where
    L: ?Sized + LockAdapter,
{
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.active = false;
        self.trace_release();
        self.lock.unlock().map_err(GuardError::from)
    }
}

impl<L> GuardDrop for LockGuard<'_, L>
where
    L: ?Sized + LockAdapter,
{
    fn on_drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.release() {
            warn!(facet = %self.facet, error = %e, "lock release on drop failed");
        }
    }
}

impl<'a, L: ?Sized + LockAdapter + 'a> Drop for LockGuard<'a, L> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

impl<L> fmt::Debug for LockGuard<'_, L>
where
    L: ?Sized + LockAdapter,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("facet", &self.facet)
            .field("active", &self.active)
            .finish()
    }
}
