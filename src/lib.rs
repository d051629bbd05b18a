/*!
 * Fairlock
 * Queue-fair async mutex and read-write lock with scoped execution helpers
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{LockError, LockFacet, Result, SerializableError};
pub use crate::core::guard::{Guard, GuardError, LockGuard};
pub use crate::core::sync::{
    Acquire, Lock, LockAdapter, LockConfig, LockStats, MutexSnapshot, QueueLockAdapter,
    QueueReadLock, QueueRwLockAdapter, QueueWriteLock, RwLock, RwLockAdapter, RwLockSnapshot,
    RwLockStats,
};
pub use monitoring::{init_tracing, try_init_tracing};
