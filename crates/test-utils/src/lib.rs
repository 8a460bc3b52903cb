//! Shared helpers for devloop's integration tests.

pub mod builders;
pub mod fake_runner;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-captured tracing subscriber (once per test binary).
///
/// Output only shows for failing tests unless run with `--nocapture`;
/// `RUST_LOG=debug` raises the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `cond` every few milliseconds until it holds (or the test times out).
pub async fn wait_until<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    with_timeout(async {
        while !cond() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
}
