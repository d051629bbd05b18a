/*!
 * Lock Adapter Traits
 *
 * Raw acquire/release contracts the scoped wrappers are layered on.
 *
 * # Design: Object-Safe Adapters
 *
 * Both traits are object safe so a lock can be built once and handed around
 * as `Arc<dyn LockAdapter>` / `Arc<dyn RwLockAdapter>`. `lock()` returns the
 * concrete `Acquire` future instead of a boxed one, keeping the queue-based
 * adapters allocation free on the fast path.
 */

use super::wait::Acquire;
use crate::core::errors::Result;

/// Acquire/release pair for a single exclusive (or shared) facet
///
/// Implementations must be:
/// - **Thread-safe**: callable from any task on any worker thread
/// - **Strict**: `unlock()` on a facet that is not held fails with
///   `LockError::NotHeld` and leaves the state untouched
pub trait LockAdapter: Send + Sync {
    /// Request the lock
    ///
    /// Completes once the caller owns the facet. Never fails.
    fn lock(&self) -> Acquire<'_>;

    /// Release the lock, handing it to the next eligible waiter if any
    fn unlock(&self) -> Result<()>;

    /// Acquire without waiting
    ///
    /// Returns `true` if the facet was granted.
    fn try_lock(&self) -> bool;

    /// Whether the facet currently has at least one holder
    fn is_held(&self) -> bool;
}

/// Shared (read) and exclusive (write) facets over one state block
pub trait RwLockAdapter: Send + Sync {
    fn read_lock(&self) -> &dyn LockAdapter;

    fn write_lock(&self) -> &dyn LockAdapter;
}
