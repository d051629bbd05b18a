/*!
 * Lock Statistics
 * Counters maintained inside each adapter's state block
 */

use serde::{Deserialize, Serialize};

/// Counters for one lock facet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LockStats {
    /// Acquisitions granted on the fast path
    pub immediate: u64,
    /// Acquisitions that had to park
    pub contended: u64,
    /// Grants delivered to a parked waiter by a release
    pub handoffs: u64,
    /// Parked waits dropped before or after being granted
    pub abandoned: u64,
    /// `unlock()` calls rejected because the facet was not held
    pub unbalanced_unlocks: u64,
}

impl LockStats {
    /// Total successful acquisitions requested so far (granted or still parked)
    #[inline]
    pub fn requests(&self) -> u64 {
        self.immediate + self.contended
    }

    /// Share of requests that had to wait, in `[0.0, 1.0]`
    pub fn contention_ratio(&self) -> f64 {
        let total = self.requests();
        if total == 0 {
            return 0.0;
        }
        self.contended as f64 / total as f64
    }
}

/// Read- and write-side counters of a read-write lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RwLockStats {
    pub read: LockStats,
    pub write: LockStats,
}

/// Counter storage that can be switched off by configuration
#[derive(Debug, Clone, Copy)]
pub(crate) struct StatsCell {
    enabled: bool,
    stats: LockStats,
}

impl StatsCell {
    pub(crate) const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: LockStats {
                immediate: 0,
                contended: 0,
                handoffs: 0,
                abandoned: 0,
                unbalanced_unlocks: 0,
            },
        }
    }

    #[inline]
    pub(crate) fn record<F>(&mut self, f: F)
    where
        F: FnOnce(&mut LockStats),
    {
        if self.enabled {
            f(&mut self.stats);
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> LockStats {
        self.stats
    }
}
