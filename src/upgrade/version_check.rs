//! Gates deciding whether a check contacts the release server.
//!
//! A forced (manual) check always goes to the network. A background check is
//! suppressed when any of these hold, in this order:
//!
//! 1. this run was started by an update handoff (the user just updated);
//! 2. the process is a development build, which can never install the result;
//! 3. the user turned automatic checks off;
//! 4. the last successful check is younger than the cooldown window.
//!
//! A missing or malformed `last_update_check` never suppresses a check.

use crate::config::UpdateSettings;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Why a background check was not performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    JustUpdated,
    NotPackaged,
    AutoCheckDisabled,
    /// The previous check is recent; holds the time left in the window.
    Cooldown { remaining: Duration },
}

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckDecision {
    Proceed,
    Skip(SkipReason),
}

impl CheckDecision {
    pub const fn should_check(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Inputs for [`CheckPolicy::decide`] that come from the running process.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext {
    pub force: bool,
    pub just_updated: bool,
    pub packaged: bool,
}

/// Cooldown-based check policy.
#[derive(Debug, Clone, Copy)]
pub struct CheckPolicy {
    interval: Duration,
}

impl CheckPolicy {
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Decide whether a check should reach the network at `now`.
    pub fn decide(
        &self,
        context: CheckContext,
        settings: &UpdateSettings<'_>,
        now: DateTime<Utc>,
    ) -> CheckDecision {
        if context.force {
            return CheckDecision::Proceed;
        }
        if context.just_updated {
            return CheckDecision::Skip(SkipReason::JustUpdated);
        }
        if !context.packaged {
            return CheckDecision::Skip(SkipReason::NotPackaged);
        }
        if !settings.auto_check_enabled() {
            return CheckDecision::Skip(SkipReason::AutoCheckDisabled);
        }

        let Some(last) = settings.last_check() else {
            return CheckDecision::Proceed;
        };

        // A timestamp in the future counts as "just checked" until it passes.
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        if elapsed < self.interval {
            let remaining = self.interval - elapsed;
            debug!("Last check {}s ago, cooldown has {}s left", elapsed.as_secs(), remaining.as_secs());
            return CheckDecision::Skip(SkipReason::Cooldown { remaining });
        }

        CheckDecision::Proceed
    }
}

/// Format version information for status display.
pub fn format_version_info(current: &str, latest: Option<&str>) -> String {
    match latest {
        Some(v) if crate::version::VersionComparator::is_newer(v, current) => {
            format!("Current version: {current}\nLatest version:  {v} (update available)")
        }
        _ => format!("Current version: {current} (up to date)"),
    }
}
