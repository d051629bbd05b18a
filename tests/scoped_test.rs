/*!
 * Scoped Lock Integration Tests
 *
 * Release on every exit path of `with_lock`, `with_read_lock` and
 * `with_write_lock`, and serialization of the closures they run
 */

mod common;

use common::{init_test_tracing, PROMPT};
use fairlock::{Guard, GuardError, Lock, LockAdapter, LockError, LockFacet, RwLock};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
enum LedgerError {
    #[error("insufficient balance")]
    Insufficient,
    #[error(transparent)]
    Lock(#[from] LockError),
}

#[tokio::test]
async fn test_panic_in_scope_releases_lock() {
    init_test_tracing();
    let lock = Lock::new();

    let task = {
        let lock = lock.clone();
        tokio::spawn(async move {
            lock.with_lock(|| async {
                if std::hint::black_box(true) {
                    panic!("closure failed");
                }
                Ok::<_, LedgerError>(())
            })
            .await
        })
    };

    let err = task.await.unwrap_err();
    assert!(err.is_panic());
    assert!(!lock.is_held());
    assert!(lock.try_lock());
}

#[tokio::test]
async fn test_cancelled_scope_releases_lock() {
    let lock = Lock::new();
    let result = tokio::time::timeout(
        Duration::from_millis(20),
        lock.with_lock(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, LedgerError>(())
        }),
    )
    .await;

    assert!(result.is_err());
    assert!(!lock.is_held());
    assert_eq!(lock.adapter().waiter_count(), 0);
}

#[tokio::test]
async fn test_cancelled_queued_scope_never_runs() {
    let lock = Lock::new();
    let holder = lock.acquire().await;
    let ran = AtomicU64::new(0);

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        lock.with_lock(|| async {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LedgerError>(())
        }),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(lock.adapter().waiter_count(), 0);

    holder.unlock().unwrap();
    assert!(!lock.is_held());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_closure_error_is_returned_after_release() {
    let lock = Lock::new();
    let balance = AtomicU64::new(10);

    let withdraw = |amount: u64| {
        let balance = &balance;
        lock.with_lock(move || async move {
            let current = balance.load(Ordering::SeqCst);
            if current < amount {
                return Err(LedgerError::Insufficient);
            }
            balance.store(current - amount, Ordering::SeqCst);
            Ok(current - amount)
        })
    };

    assert_eq!(withdraw(4).await, Ok(6));
    assert_eq!(withdraw(7).await, Err(LedgerError::Insufficient));
    assert!(!lock.is_held());
    assert_eq!(withdraw(6).await, Ok(0));
}

#[tokio::test]
async fn test_release_failure_outranks_success() {
    let lock = Lock::new();
    let inner = lock.clone();

    let result = lock
        .with_lock(|| async move {
            assert!(inner.unlock().is_ok());
            Ok::<_, LedgerError>(42)
        })
        .await;

    assert_eq!(
        result,
        Err(LedgerError::Lock(LockError::not_held(LockFacet::Mutex)))
    );
    assert_eq!(lock.adapter().stats().unbalanced_unlocks, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scopes_serialize_read_modify_write() {
    let lock = Lock::new();
    let counter = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lock = lock.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    lock.with_lock(|| async {
                        // Split load and store so unserialized scopes lose updates
                        let seen = counter.load(Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        counter.store(seen + 1, Ordering::SeqCst);
                        Ok::<_, LockError>(())
                    })
                    .await
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        tokio::time::timeout(PROMPT, handle)
            .await
            .expect("scope stalled")
            .unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 800);
    assert!(!lock.is_held());
}

#[tokio::test]
async fn test_write_scope_waits_for_read_guard() {
    let rw = RwLock::new();
    let reader = rw.read().await;

    let writer = {
        let rw = rw.clone();
        tokio::spawn(async move {
            rw.with_write_lock(|| async { Ok::<_, LedgerError>("written") })
                .await
        })
    };

    common::wait_until(|| rw.adapter().write_waiter_count() == 1).await;
    assert!(rw.try_read().is_err());
    assert_eq!(
        rw.try_write().unwrap_err(),
        LockError::would_block(LockFacet::Write)
    );

    reader.unlock().unwrap();
    assert_eq!(writer.await.unwrap(), Ok("written"));
    assert!(!rw.adapter().has_active_writer());
    assert!(!rw.adapter().has_active_readers());
}

#[tokio::test]
async fn test_read_scopes_run_together() {
    let rw = RwLock::new();
    let both_inside = tokio::sync::Barrier::new(2);

    let scope = || async {
        both_inside.wait().await;
        Ok::<_, LedgerError>(())
    };
    let (a, b) = tokio::join!(rw.with_read_lock(scope), rw.with_read_lock(scope));

    assert_eq!(a, Ok(()));
    assert_eq!(b, Ok(()));
    assert_eq!(rw.adapter().active_reader_count(), 0);
}

#[tokio::test]
async fn test_guard_release_through_trait() {
    let lock = Lock::new();
    let mut guard = lock.acquire().await;
    assert_eq!(guard.resource_type(), "mutex_guard");

    guard.release().unwrap();
    assert!(!lock.is_held());
    assert_eq!(guard.release(), Err(GuardError::AlreadyReleased));
    drop(guard);
    assert_eq!(lock.adapter().stats().unbalanced_unlocks, 0);
}

#[tokio::test]
async fn test_lock_over_write_facet() {
    let rw = RwLock::new();
    let exclusive: Arc<dyn LockAdapter> = Arc::new(rw.adapter().write_lock().clone());
    let lock = Lock::from_adapter(exclusive);

    let value = lock
        .with_lock(|| async {
            assert!(rw.adapter().has_active_writer());
            Ok::<_, LockError>(3)
        })
        .await
        .unwrap();
    assert_eq!(value, 3);
    assert!(!rw.adapter().has_active_writer());
}
