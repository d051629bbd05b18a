/*!
 * Shared test helpers
 */

#![allow(dead_code)]

use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Generous upper bound for anything that should complete promptly
pub const PROMPT: Duration = Duration::from_secs(5);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("fairlock=trace"))
        .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
        .try_init();
}

/// Yield until `condition` holds, panicking after `PROMPT`
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + PROMPT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::task::yield_now().await;
    }
}
