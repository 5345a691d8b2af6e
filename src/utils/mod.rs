//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes and best-effort removal
//! - [`platform`] - Executable signatures, path identity, quarantine, environment
//! - [`process`] - Detached spawning and process liveness behind a trait
//! - [`progress`] - Progress bars and spinners for checks and downloads
//! - [`backoff`] - Capped exponential backoff for polling loops

pub mod backoff;
pub mod fs;
pub mod platform;
pub mod process;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, remove_file_best_effort, remove_file_if_exists};
pub use platform::{EXE_SUFFIX, is_windows, same_file};
pub use process::{ProcessControl, SystemProcessControl};
pub use progress::ProgressBar;
