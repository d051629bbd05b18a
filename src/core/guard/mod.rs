/*!
 * RAII Lock Guards
 *
 * Scoped ownership of a lock facet with automatic release.
 *
 * ## Design Principles
 *
 * 1. **Release on every exit path**: drop releases if the guard is still active
 * 2. **Explicit release reports errors**: `unlock()` surfaces the adapter result
 * 3. **Observable**: guards record acquisition time for hold-time tracing
 *
 * ## Example
 *
 * ```
 * use fairlock::Lock;
 *
 * # tokio_test::block_on(async {
 * let lock = Lock::new();
 * {
 *     let _guard = lock.acquire().await;
 *     assert!(lock.is_held());
 * } // Released here
 * assert!(!lock.is_held());
 * # });
 * ```
 */

mod lock;
mod traits;

pub use lock::LockGuard;
pub use traits::{Guard, GuardDrop};

use crate::core::errors::LockError;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
