/*!
 * Synchronization Primitives
 *
 * Async mutual-exclusion core with queue-based fairness:
 * - Queue lock: FIFO mutex with direct handoff
 * - Queue read-write lock: shared readers, exclusive writer, writer priority
 * - Scoped wrappers: run a closure under a lock, release on every exit path
 *
 * # Architecture
 *
 * Adapters (`LockAdapter`, `RwLockAdapter`) expose the raw acquire/release
 * pair. Each keeps its flags, counters and wait queues in one state block
 * behind a `parking_lot::Mutex` that is never held across an `.await`, so
 * every operation is a single atomic step with respect to other callers.
 * The wrappers (`Lock`, `RwLock`) layer guards and closures on top.
 *
 * # Cancellation
 *
 * Dropping a pending `lock()` future withdraws the waiter. If the drop races
 * with a release that already granted it, ownership is passed on as if the
 * dropped caller had unlocked.
 */

mod config;
mod locks;
mod scoped;
mod stats;
mod traits;
mod wait;

pub use config::LockConfig;
pub use locks::{
    MutexSnapshot, QueueLockAdapter, QueueReadLock, QueueRwLockAdapter, QueueWriteLock,
    RwLockSnapshot,
};
pub use scoped::{Lock, RwLock};
pub use stats::{LockStats, RwLockStats};
pub use traits::{LockAdapter, RwLockAdapter};
pub use wait::Acquire;
