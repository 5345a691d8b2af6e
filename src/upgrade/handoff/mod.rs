//! Replacing the running executable.
//!
//! A running executable cannot reliably overwrite itself, so replacement is
//! split across two processes that talk through files in `updates/`:
//!
//! ```text
//! old process                         helper (copy of old exe)          new process
//! ───────────                         ────────────────────────          ───────────
//! apply(staged)
//!   copy exe -> handoff-<pid>
//!   write update-handoff.json  ──────▶ __handoff --plan <file>
//!   spawn helper, return               wait for old pid / kill
//! caller exits                         copy staged -> final (retries)
//!                                      on failure: launch-info.txt
//!                                      spawn target ──────────────────▶ --show-after-update
//!                                      write update-ready.flag           --update-ready-flag <flag>
//!                                      delete plan + itself             consume flag / launch-info
//! ```
//!
//! [`orchestrator`] is the old-process side, [`routine`] the helper side and
//! [`record`] the launch-info marker read by the new process.

pub mod orchestrator;
pub mod plan;
pub mod record;
pub mod routine;

pub use orchestrator::ReplacementOrchestrator;
pub use plan::HandoffPlan;
pub use record::LaunchRecord;
pub use routine::{HandoffOutcome, run_handoff};
