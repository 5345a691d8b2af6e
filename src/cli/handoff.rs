//! The hidden `__handoff` command run by the helper copy of the executable.

use crate::upgrade::handoff::{HandoffOutcome, HandoffPlan, run_handoff};
use crate::utils::SystemProcessControl;
use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Arguments for `__handoff`.
#[derive(Args, Debug)]
pub struct HandoffArgs {
    /// Handoff plan written by the process being replaced.
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,
}

/// Read the plan and run the handoff routine.
///
/// A fallback launch counts as success; only "nothing was started" is an
/// error.
pub async fn execute(args: HandoffArgs) -> Result<()> {
    let plan = HandoffPlan::read(&args.plan)
        .with_context(|| format!("Failed to load handoff plan {}", args.plan.display()))?;

    match run_handoff(&plan, &SystemProcessControl).await {
        HandoffOutcome::Replaced { pid } | HandoffOutcome::FallbackLaunched { pid } => {
            info!("Handoff complete, new process {pid}");
            Ok(())
        }
        HandoffOutcome::LaunchFailed { run_target, reason } => {
            bail!("Failed to start {}: {}", run_target.display(), reason)
        }
        HandoffOutcome::Aborted { reason } => bail!("Handoff aborted: {reason}"),
    }
}
