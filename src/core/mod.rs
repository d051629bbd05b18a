/*!
 * Core Module
 * Lock primitives, guards and error handling
 */

pub mod errors;
pub mod guard;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult, LockGuard};
pub use sync::{
    Acquire, Lock, LockAdapter, LockConfig, LockStats, MutexSnapshot, QueueLockAdapter,
    QueueReadLock, QueueRwLockAdapter, QueueWriteLock, RwLock, RwLockAdapter, RwLockSnapshot,
    RwLockStats,
};
