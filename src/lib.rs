//! Binity updater - self-update orchestration for a desktop executable
//!
//! Keeps an installed Binity executable current from a GitHub-style release
//! feed. A running executable cannot safely overwrite itself, so replacement
//! is handed to a helper process that waits for the old process to exit,
//! swaps the file in, and starts the new build.
//!
//! # Architecture Overview
//!
//! ```text
//! check ──▶ download ──▶ apply ──▶ helper (__handoff) ──▶ next startup
//!  │          │            │          │                      │
//!  gates      stage +      plan +     wait/kill, copy with   consume flag and
//!  + feed     verify       spawn      retries or fall back   launch-info, sweep
//! ```
//!
//! ## Key Features
//!
//! - **Safe replacement**: copy-to-temp-then-rename with bounded retries, and a
//!   fallback launch from the staged file when the install path stays locked
//! - **Verified downloads**: exact size, a size floor, native executable magic
//!   bytes and a published SHA-256 when there is one
//! - **Quiet background checks**: a cooldown, a user toggle, skipped versions and
//!   no check right after an update
//! - **One operation at a time**: the session rejects overlapping calls
//!
//! # Core Modules
//!
//! - [`upgrade`] - Release checks, download, handoff, startup bookkeeping, session
//! - [`config`] - Application data layout and the settings store
//! - [`core`] - Error taxonomy and user-facing error formatting
//! - [`version`] - Lenient numeric version comparison
//! - [`utils`] - File, platform, process and progress helpers
//! - [`cli`] - Command-line front end
//!
//! # Command-Line Usage
//!
//! ```bash
//! binity-updater                  # startup notices, versions, background check
//! binity-updater check --force    # manual check
//! binity-updater download         # stage and verify the release asset
//! binity-updater apply            # install and restart
//! binity-updater skip             # stop offering the found release
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod upgrade;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
