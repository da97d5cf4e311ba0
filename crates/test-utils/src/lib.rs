//! Shared helpers for sitedag's integration tests.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use sitedag::logging::{LOG_ENV_VAR, filter_from_env};
use tracing_subscriber::fmt;

/// Upper bound for any single async test body.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and shown for failing tests only.
/// `SITEDAG_LOG=debug` raises the level, same as for the binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = filter_from_env(std::env::var(LOG_ENV_VAR).ok().as_deref());
        // Another subscriber may already be installed by the test itself.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `fut`, panicking if it outlives [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
