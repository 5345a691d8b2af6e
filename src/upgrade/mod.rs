//! Self-update for an installed Binity executable.
//!
//! The update lifecycle checks a release feed, stages and verifies the new
//! executable, then hands off to a helper process that swaps it in after the
//! running process exits.
//!
//! # Architecture Overview
//!
//! - **[`UpdateSession`]**: the façade the UI talks to (check, download,
//!   apply, skip) with one-operation-at-a-time semantics
//! - **[`release::ReleaseClient`]**: fetches the latest release and turns it
//!   into an [`UpdateInfo`] offer
//! - **[`download::Downloader`]**: streams the asset to its staging path and
//!   verifies it
//! - **[`handoff::ReplacementOrchestrator`]**: prepares the handoff plan and
//!   starts the helper
//! - **[`startup`]**: consumes the handoff markers on the next start and
//!   sweeps leftovers
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Check
//!    ├── Gates: just updated, dev build, auto-check off, 12h cooldown
//!    ├── Fetch latest release
//!    └── Version newer? not skipped? suitable asset?
//!
//! 2. Download
//!    ├── Stage beside the executable (or updates/next-<asset>)
//!    ├── Stream in 256 KiB chunks with percent progress
//!    └── Verify size, floor, magic bytes, published checksum
//!
//! 3. Apply
//!    ├── Copy the running exe to updates/handoff-<pid>
//!    ├── Write updates/update-handoff.json
//!    └── Start the helper; caller exits
//!
//! 4. Helper (`__handoff`)
//!    ├── Wait for the old pid, terminate if stuck
//!    ├── Copy staged -> final with retries, else fall back to staged
//!    └── Launch new build, write readiness flag, clean up
//!
//! 5. Next startup
//!    ├── Consume readiness flag -> just updated
//!    ├── Consume launch-info -> running from fallback?
//!    └── Sweep next-*, *.tmp, *.old, handoff-*
//! ```
//!
//! # Security Considerations
//!
//! Downloads are trusted on TLS plus the size, signature and (when the release
//! publishes one) SHA-256 checks. There is no signature verification.
//!
//! # Example
//!
//! ```rust,no_run
//! use binity_updater::config::{AppPaths, JsonSettingsStore};
//! use binity_updater::upgrade::{RuntimeContext, UpdateSession, UpdaterConfig};
//! use binity_updater::upgrade::startup::{StartupSwitches, run_startup};
//! use binity_updater::utils::SystemProcessControl;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let paths = AppPaths::discover()?;
//! let config = Arc::new(UpdaterConfig::load(&paths).await?);
//! let runtime = RuntimeContext::detect(paths.clone())?;
//! let startup =
//!     run_startup(&paths, &runtime.current_exe, &StartupSwitches::default(), &config).await;
//!
//! let session = UpdateSession::new(
//!     config,
//!     Arc::new(JsonSettingsStore::open(&paths.settings_file)),
//!     runtime,
//!     startup,
//!     Arc::new(SystemProcessControl),
//! )?;
//!
//! if session.check_for_update(false).await.is_some() {
//!     if let Some(staged) = session.download_update(|_| {}).await {
//!         if session.apply_update(&staged).await {
//!             std::process::exit(0);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod config;
pub mod download;
pub mod handoff;
pub mod release;
pub mod runtime;
pub mod session;
pub mod startup;
pub mod verification;
pub mod version_check;

pub use config::UpdaterConfig;
pub use release::{Release, ReleaseAsset, UpdateInfo};
pub use runtime::RuntimeContext;
pub use session::{Activity, UpdateSession};
pub use startup::{StartupReport, StartupSwitches};
pub use verification::ChecksumVerifier;
