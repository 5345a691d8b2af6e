//! Command-line interface for the Binity updater.
//!
//! The CLI stands in for the tray application: it runs the startup
//! bookkeeping, then drives an [`UpdateSession`](crate::upgrade::UpdateSession)
//! through one of the user-facing operations.
//!
//! # Available Commands
//!
//! - `status` (default) - startup notices, versions and a background check
//! - `check [--force]` - look for a newer release
//! - `download [--force]` - check, then stage and verify the release asset
//! - `apply [--force]` - check, download and hand off to the new build, then exit
//! - `skip [--force]` - check, then stop offering that release
//!
//! The hidden `__handoff --plan <file>` command is what the helper copy of
//! the executable runs; it is never typed by a user.
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only report errors
//! - `--no-progress` - Disable progress bars and spinners
//!
//! # Startup Switches
//!
//! `--show-after-update` and `--update-ready-flag <path>` are passed by the
//! handoff helper to the new process. They are stripped with
//! [`strip_startup_switches`](crate::upgrade::startup::strip_startup_switches)
//! before clap sees the arguments.
//!
//! # Example
//!
//! ```bash
//! binity-updater                 # status + background check
//! binity-updater check --force   # manual check, ignores cooldown and skip
//! binity-updater --no-progress apply
//! ```

mod handoff;
mod upgrade;

pub use handoff::HandoffArgs;
pub use upgrade::UpdateArgs;

use crate::upgrade::StartupSwitches;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable read by [`ProgressBar`](crate::utils::ProgressBar).
const NO_PROGRESS_ENV: &str = "BINITY_NO_PROGRESS";

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one without parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Hide progress bars and spinners.
    pub no_progress: bool,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            no_progress: false,
        }
    }

    /// Apply this configuration to the process environment.
    ///
    /// Must be called before any other thread is started.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: runs before any command spawns a task or thread that
            // reads the environment.
            unsafe {
                std::env::set_var(NO_PROGRESS_ENV, "1");
            }
        }
    }

    /// Install the global `tracing` subscriber.
    ///
    /// `RUST_LOG` wins over the flag-derived level. A second call is a no-op.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Binity updater command line.
#[derive(Parser, Debug)]
#[command(
    name = "binity-updater",
    about = "Check for, download and install Binity updates",
    version,
    long_about = "Keeps an installed Binity executable up to date from its release feed. \
                  Replacement happens in a helper process after this one exits."
)]
pub struct Cli {
    /// The operation to run. Defaults to `status`.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show startup notices and versions, then run a background check
    Status,

    /// Check for a newer release
    Check(UpdateArgs),

    /// Check, then download and verify the release asset
    Download(UpdateArgs),

    /// Check, download and install the update, then exit
    Apply(UpdateArgs),

    /// Check, then stop offering the found release
    Skip(UpdateArgs),

    /// Replace the executable (run by the helper copy)
    #[command(name = "__handoff", hide = true)]
    Handoff(HandoffArgs),
}

impl Cli {
    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
        }
    }

    /// Whether this invocation is the handoff helper.
    #[must_use]
    pub fn is_handoff(&self) -> bool {
        matches!(self.command, Some(Commands::Handoff(_)))
    }

    /// Run the selected command.
    ///
    /// `switches` are the post-update switches stripped from the command line
    /// before parsing.
    pub async fn execute(self, switches: StartupSwitches) -> Result<()> {
        let config = self.build_config();
        config.apply_to_env();
        // The helper runs detached with null stdio.
        if !self.is_handoff() {
            config.init_logging();
        }

        match self.command.unwrap_or(Commands::Status) {
            Commands::Status => upgrade::status(&switches).await,
            Commands::Check(args) => upgrade::check(&switches, args).await,
            Commands::Download(args) => upgrade::download(&switches, args).await,
            Commands::Apply(args) => upgrade::apply(&switches, args).await,
            Commands::Skip(args) => upgrade::skip(&switches, args).await,
            Commands::Handoff(args) => handoff::execute(args).await,
        }
    }
}
