//! Progress indicators for checks and downloads.
//!
//! Thin wrappers over `indicatif` with the updater's styling. Set
//! `BINITY_NO_PROGRESS` to any value to hide every indicator (useful for CI
//! and when output is piped).

use indicatif::{ProgressBar as IndicatifBar, ProgressDrawTarget, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Checks if progress bars should be disabled.
fn is_progress_disabled() -> bool {
    std::env::var("BINITY_NO_PROGRESS").is_ok()
}

/// A progress bar with consistent styling.
///
/// Downloads report whole percentages, so bars created with
/// [`ProgressBar::percent`] run from 0 to 100.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a bar tracking a percentage.
    pub fn percent() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::with_draw_target(Some(100), ProgressDrawTarget::hidden())
        } else {
            let bar = IndicatifBar::new(100);
            bar.set_style(percent_style());
            bar
        };
        Self { inner: bar }
    }

    /// Creates a spinner for work of unknown length, such as a release check.
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    /// Sets the message displayed alongside the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Sets the prefix displayed before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Sets the absolute position. Percentages above 100 are clamped.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos.min(self.inner.length().unwrap_or(u64::MAX)));
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Finish and leave a final message on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Finish and remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn percent_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{prefix:.bold} {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}
