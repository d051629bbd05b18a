/*!
 * Waiter Queues
 *
 * FIFO queues of resume handles and the future a parked caller awaits.
 *
 * # Design: One-Shot Resume Handles
 *
 * A parked caller owns the receiving half of a `oneshot` channel; the queue
 * owns the sending half. A release dequeues the head entry and sends on it
 * while the adapter's state lock is held, so ownership moves straight from
 * the releaser to the waiter. The waiter only observes a grant that was
 * already recorded in the state block.
 *
 * Entries carry monotonically increasing ids, which keeps the queue sorted
 * and lets a dropped waiter withdraw itself with a binary search.
 */

use super::config::LockConfig;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) type WaiterId = u64;

struct Waiter {
    id: WaiterId,
    resume: oneshot::Sender<()>,
}

/// Ordered queue of parked callers
pub(crate) struct WaitQueue {
    waiters: VecDeque<Waiter>,
    next_id: WaiterId,
}

/// Outcome of settling a wait that was dropped before it completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abandoned {
    /// Still queued; the entry has been removed
    Queued,
    /// A release already handed ownership to this waiter
    Granted,
}

impl WaitQueue {
    /// Capacity is capped at `LockConfig::MAX_WAITER_CAPACITY`
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            waiters: VecDeque::with_capacity(capacity.min(LockConfig::MAX_WAITER_CAPACITY)),
            next_id: 0,
        }
    }

    /// Enqueue a new waiter at the tail
    pub(crate) fn park(&mut self) -> (WaiterId, oneshot::Receiver<()>) {
        let (resume, parked) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;
        self.waiters.push_back(Waiter { id, resume });
        (id, parked)
    }

    /// Resume the head waiter
    ///
    /// Returns `false` if nobody was waiting.
    pub(crate) fn grant_next(&mut self) -> bool {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.resume.send(()).is_ok() {
                return true;
            }
        }
        false
    }

    /// Resume every queued waiter, returning how many were granted
    pub(crate) fn grant_all(&mut self) -> usize {
        let mut granted = 0;
        for waiter in self.waiters.drain(..) {
            if waiter.resume.send(()).is_ok() {
                granted += 1;
            }
        }
        granted
    }

    /// Remove a queued waiter
    ///
    /// Returns `false` if the waiter is no longer queued.
    pub(crate) fn withdraw(&mut self, id: WaiterId) -> bool {
        match self.waiters.binary_search_by_key(&id, |waiter| waiter.id) {
            Ok(index) => {
                self.waiters.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Settle a dropped wait
    ///
    /// Must be called with the owning state lock held, which orders this
    /// against any concurrent grant.
    pub(crate) fn abandon(
        &mut self,
        id: WaiterId,
        parked: &mut oneshot::Receiver<()>,
    ) -> Option<Abandoned> {
        if self.withdraw(id) {
            return Some(Abandoned::Queued);
        }

        // Off the queue, so any grant was sent before this lock was taken
        parked.close();
        match parked.try_recv() {
            Ok(()) => Some(Abandoned::Granted),
            Err(_) => None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

impl fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitQueue")
            .field("len", &self.waiters.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Owner of a wait queue that can settle a dropped waiter
pub(crate) trait ParkingSite: Send + Sync {
    /// Called when a parked acquisition is dropped before completing
    fn abandon(&self, id: WaiterId, parked: &mut oneshot::Receiver<()>);
}

/// A caller parked on a wait queue
struct Parked<'a> {
    site: &'a dyn ParkingSite,
    id: WaiterId,
    resume: oneshot::Receiver<()>,
    granted: bool,
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        if !self.granted {
            self.site.abandon(self.id, &mut self.resume);
        }
    }
}

enum AcquireState<'a> {
    Ready,
    Parked(Parked<'a>),
    Boxed(BoxFuture<'a, ()>),
}

/// Future returned by `lock()`
///
/// The caller's place in line is taken when `lock()` is called, not when
/// this future is first polled. Dropping a pending `Acquire` withdraws it
/// from the queue, or passes ownership on if it had already been granted.
#[must_use = "dropping an Acquire abandons the wait for the lock"]
pub struct Acquire<'a> {
    state: AcquireState<'a>,
}

impl<'a> Acquire<'a> {
    /// An acquisition that completed on the fast path
    #[inline]
    pub fn ready() -> Self {
        Self {
            state: AcquireState::Ready,
        }
    }

    /// Wrap an arbitrary acquisition future, for adapters not built on a wait queue
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'a,
    {
        Self {
            state: AcquireState::Boxed(Box::pin(future)),
        }
    }

    pub(crate) fn parked(
        site: &'a dyn ParkingSite,
        id: WaiterId,
        resume: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            state: AcquireState::Parked(Parked {
                site,
                id,
                resume,
                granted: false,
            }),
        }
    }

    /// True if the lock was acquired without parking
    #[inline]
    pub fn is_immediate(&self) -> bool {
        matches!(self.state, AcquireState::Ready)
    }
}

impl Future for Acquire<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match &mut self.get_mut().state {
            AcquireState::Ready => Poll::Ready(()),
            AcquireState::Boxed(future) => future.as_mut().poll(cx),
            AcquireState::Parked(parked) => {
                if parked.granted {
                    return Poll::Ready(());
                }
                match Pin::new(&mut parked.resume).poll(cx) {
                    Poll::Ready(Ok(())) => {
                        parked.granted = true;
                        Poll::Ready(())
                    }
                    Poll::Ready(Err(_)) => {
                        unreachable!("waiter left the queue without a grant")
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }
}

impl fmt::Debug for Acquire<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            AcquireState::Ready => "ready",
            AcquireState::Parked(p) if p.granted => "granted",
            AcquireState::Parked(_) => "parked",
            AcquireState::Boxed(_) => "boxed",
        };
        f.debug_struct("Acquire").field("state", &state).finish()
    }
}
