//! Test utilities for the updater
//!
//! Helpers shared by unit tests and the integration test target (through the
//! `test-utils` feature):
//!
//! - [`fixtures`] - release JSON builders and executable-looking byte buffers
//! - [`environment`] - a fake install in a temporary directory
//! - [`process`] - a recording [`ProcessControl`](crate::utils::ProcessControl)
//!   so handoff tests never start real processes
//!
//! # Example
//!
//! ```rust,no_run
//! use binity_updater::test_utils::{RecordingProcessControl, handoff_plan_in};
//! use binity_updater::upgrade::handoff::run_handoff;
//!
//! # async fn example() {
//! let temp = tempfile::TempDir::new().unwrap();
//! let plan = handoff_plan_in(temp.path());
//! let process = RecordingProcessControl::new();
//! let outcome = run_handoff(&plan, &process).await;
//! # }
//! ```

pub mod environment;
pub mod fixtures;
pub mod process;

pub use environment::{TEST_PID, handoff_plan_in, test_runtime, test_runtime_with_version};
pub use fixtures::{AssetFixture, ReleaseFixture, native_executable_bytes, non_executable_bytes};
pub use process::{RecordingProcessControl, SpawnRecord};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without logging.
///
/// ```bash
/// RUST_LOG=binity_updater=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
