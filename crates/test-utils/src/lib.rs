//! Shared test support for `assetrun`: recording collaborators, a task
//! journal, and builders that wire them into an engine.

pub mod builders;
pub mod doubles;
pub mod journal;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{Harness, HarnessBuilder, RegistryBuilder};
pub use doubles::{
    CountingReload, PipelineCall, RecordingBackend, RecordingDevServer, RecordingPipeline,
};
pub use journal::{Journal, JournalEvent};

/// Upper bound for any single awaited operation in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and only shown for failing tests. Set
/// `RUST_LOG=assetrun=debug` to see engine and watch decisions.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `fut`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(value) => value,
        Err(_) => panic!("test operation timed out after {TEST_TIMEOUT:?}"),
    }
}
