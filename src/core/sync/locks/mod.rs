/*!
 * Queue-Based Lock Adapters
 *
 * Fair lock primitives built on FIFO wait queues:
 * - Queue lock (exclusive, direct handoff)
 * - Queue read-write lock (shared/exclusive, writer priority)
 */

mod queue;
mod rwlock;

// Re-export public API
pub use queue::{MutexSnapshot, QueueLockAdapter};
pub use rwlock::{QueueReadLock, QueueRwLockAdapter, QueueWriteLock, RwLockSnapshot};
