/*!
 * Lock Configuration
 *
 * Construction-time settings shared by every queue-based adapter
 */

use tracing::warn;

const ENV_WAITER_CAPACITY: &str = "FAIRLOCK_WAITER_CAPACITY";
const ENV_STATS: &str = "FAIRLOCK_STATS";

/// Lock configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Name recorded on every trace event emitted by the lock
    pub label: &'static str,
    /// Initial capacity of each wait queue
    pub waiter_capacity: usize,
    /// Maintain acquisition/handoff counters
    pub stats: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            label: "lock",
            waiter_capacity: 4,
            stats: true,
        }
    }
}

impl LockConfig {
    /// Upper bound on the preallocated wait queue capacity
    pub const MAX_WAITER_CAPACITY: usize = 4096;

    /// Configuration for locks that are rarely contended
    pub const fn low_contention() -> Self {
        Self {
            label: "lock",
            waiter_capacity: 0,
            stats: false,
        }
    }

    /// Configuration for locks expected to carry long wait queues
    pub const fn high_contention() -> Self {
        Self {
            label: "lock",
            waiter_capacity: 64,
            stats: true,
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Set the initial wait queue capacity, capped at `MAX_WAITER_CAPACITY`
    pub fn with_waiter_capacity(mut self, capacity: usize) -> Self {
        self.waiter_capacity = clamp_capacity(capacity);
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats = enabled;
        self
    }

    /// Build a configuration from the environment
    ///
    /// Environment variables:
    /// - FAIRLOCK_WAITER_CAPACITY: initial wait queue capacity (default: 4)
    /// - FAIRLOCK_STATS: enable counters, `1`/`true` or `0`/`false` (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_WAITER_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) => config.waiter_capacity = clamp_capacity(capacity),
                Err(e) => warn!(
                    var = ENV_WAITER_CAPACITY,
                    value = %raw,
                    error = %e,
                    "Ignoring invalid waiter capacity"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_STATS) {
            match raw.trim() {
                "1" | "true" => config.stats = true,
                "0" | "false" => config.stats = false,
                other => warn!(var = ENV_STATS, value = %other, "Ignoring invalid stats flag"),
            }
        }

        config
    }
}

fn clamp_capacity(capacity: usize) -> usize {
    if capacity > LockConfig::MAX_WAITER_CAPACITY {
        warn!(
            requested = capacity,
            max = LockConfig::MAX_WAITER_CAPACITY,
            "Clamping oversized waiter capacity"
        );
        return LockConfig::MAX_WAITER_CAPACITY;
    }
    capacity
}
