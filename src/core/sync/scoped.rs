/*!
 * Scoped Locks
 *
 * Ergonomic wrappers that run a closure under a lock and release it on
 * every exit path: normal return, error return, panic, or the wrapping
 * future being dropped.
 *
 * # Failure Precedence
 *
 * The closure's result is returned unchanged after the release, unless the
 * release itself fails; an inconsistent lock outranks the caller's error.
 */

use super::config::LockConfig;
use super::locks::{QueueLockAdapter, QueueRwLockAdapter};
use super::traits::{LockAdapter, RwLockAdapter};
use super::wait::Acquire;
use crate::core::errors::{LockError, LockFacet, Result};
use crate::core::guard::LockGuard;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Run `f` while holding an already-acquired facet
async fn run_scoped<L, F, Fut, T, E>(lock: &L, facet: LockFacet, f: F) -> std::result::Result<T, E>
where
    L: ?Sized + LockAdapter,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<LockError>,
{
    lock.lock().await;
    let guard = LockGuard::new(lock, facet);
    let outcome = f().await;
    guard.unlock()?;
    outcome
}

/// Exclusive lock with scoped execution
///
/// Cheap to clone; clones share one adapter.
///
/// # Example
///
/// ```
/// use fairlock::{Lock, LockError};
///
/// # tokio_test::block_on(async {
/// let lock = Lock::new();
/// let total = lock
///     .with_lock(|| async { Ok::<_, LockError>(2 + 2) })
///     .await
///     .unwrap();
/// assert_eq!(total, 4);
/// assert!(!lock.is_held());
/// # });
/// ```
pub struct Lock<A = QueueLockAdapter>
where
    A: ?Sized + LockAdapter,
{
    adapter: Arc<A>,
}

impl Lock<QueueLockAdapter> {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self::from_adapter(Arc::new(QueueLockAdapter::with_config(config)))
    }
}

impl<A> Lock<A>
where
    A: ?Sized + LockAdapter,
{
    /// Build a lock over an explicitly constructed adapter
    pub fn from_adapter(adapter: Arc<A>) -> Self {
        Self { adapter }
    }

    #[inline]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn lock(&self) -> Acquire<'_> {
        self.adapter.lock()
    }

    pub fn unlock(&self) -> Result<()> {
        self.adapter.unlock()
    }

    pub fn try_lock(&self) -> bool {
        self.adapter.try_lock()
    }

    pub fn is_held(&self) -> bool {
        self.adapter.is_held()
    }

    /// Acquire and return a guard that releases on drop
    pub async fn acquire(&self) -> LockGuard<'_, A> {
        self.adapter.lock().await;
        LockGuard::new(&*self.adapter, LockFacet::Mutex)
    }

    pub fn try_acquire(&self) -> Result<LockGuard<'_, A>> {
        if self.adapter.try_lock() {
            Ok(LockGuard::new(&*self.adapter, LockFacet::Mutex))
        } else {
            Err(LockError::would_block(LockFacet::Mutex))
        }
    }

    /// Run `f` under the lock and return its result
    ///
    /// The returned future joins the wait queue when it is first polled,
    /// not when `with_lock` is called. Use `lock()` or `acquire()` where the
    /// place in line must be fixed at call time.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or the release failure if unlocking fails.
    pub async fn with_lock<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<LockError>,
    {
        run_scoped(&*self.adapter, LockFacet::Mutex, f).await
    }
}

impl Default for Lock<QueueLockAdapter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Lock<A>
where
    A: ?Sized + LockAdapter,
{
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

impl<A> fmt::Debug for Lock<A>
where
    A: ?Sized + LockAdapter,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("held", &self.adapter.is_held())
            .finish()
    }
}

/// Read-write lock with scoped execution
///
/// # Example
///
/// ```
/// use fairlock::{LockError, RwLock};
///
/// # tokio_test::block_on(async {
/// let rw = RwLock::new();
/// let seen = rw
///     .with_read_lock(|| async { Ok::<_, LockError>("cards") })
///     .await
///     .unwrap();
/// assert_eq!(seen, "cards");
/// # });
/// ```
pub struct RwLock<A = QueueRwLockAdapter>
where
    A: ?Sized + RwLockAdapter,
{
    adapter: Arc<A>,
}

impl RwLock<QueueRwLockAdapter> {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self::from_adapter(Arc::new(QueueRwLockAdapter::with_config(config)))
    }
}

impl<A> RwLock<A>
where
    A: ?Sized + RwLockAdapter,
{
    pub fn from_adapter(adapter: Arc<A>) -> Self {
        Self { adapter }
    }

    #[inline]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[inline]
    pub fn read_lock(&self) -> &dyn LockAdapter {
        self.adapter.read_lock()
    }

    #[inline]
    pub fn write_lock(&self) -> &dyn LockAdapter {
        self.adapter.write_lock()
    }

    /// Acquire shared access and return a guard that releases on drop
    pub async fn read(&self) -> LockGuard<'_, dyn LockAdapter> {
        let facet = self.adapter.read_lock();
        facet.lock().await;
        LockGuard::new(facet, LockFacet::Read)
    }

    /// Acquire exclusive access and return a guard that releases on drop
    pub async fn write(&self) -> LockGuard<'_, dyn LockAdapter> {
        let facet = self.adapter.write_lock();
        facet.lock().await;
        LockGuard::new(facet, LockFacet::Write)
    }

    pub fn try_read(&self) -> Result<LockGuard<'_, dyn LockAdapter>> {
        let facet = self.adapter.read_lock();
        if facet.try_lock() {
            Ok(LockGuard::new(facet, LockFacet::Read))
        } else {
            Err(LockError::would_block(LockFacet::Read))
        }
    }

    pub fn try_write(&self) -> Result<LockGuard<'_, dyn LockAdapter>> {
        let facet = self.adapter.write_lock();
        if facet.try_lock() {
            Ok(LockGuard::new(facet, LockFacet::Write))
        } else {
            Err(LockError::would_block(LockFacet::Write))
        }
    }

    /// Run `f` with shared access
    ///
    /// Queues on first poll, like `Lock::with_lock`.
    pub async fn with_read_lock<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<LockError>,
    {
        run_scoped(self.adapter.read_lock(), LockFacet::Read, f).await
    }

    /// Run `f` with exclusive access
    ///
    /// Queues on first poll, like `Lock::with_lock`.
    pub async fn with_write_lock<F, Fut, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<LockError>,
    {
        run_scoped(self.adapter.write_lock(), LockFacet::Write, f).await
    }
}

impl Default for RwLock<QueueRwLockAdapter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for RwLock<A>
where
    A: ?Sized + RwLockAdapter,
{
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

impl<A> fmt::Debug for RwLock<A>
where
    A: ?Sized + RwLockAdapter,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock")
            .field("read_held", &self.adapter.read_lock().is_held())
            .field("write_held", &self.adapter.write_lock().is_held())
            .finish()
    }
}
