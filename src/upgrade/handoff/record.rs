//! The launch-info marker left behind by a fallback launch.
//!
//! Plain `KEY=value` lines:
//!
//! ```text
//! RUN_TARGET=C:\Users\me\AppData\Local\Binity\updates\next-Binity.exe
//! FINAL_TARGET=C:\Program Files\Binity\Binity.exe
//! ```

use std::path::{Path, PathBuf};

const RUN_TARGET_KEY: &str = "RUN_TARGET";
const FINAL_TARGET_KEY: &str = "FINAL_TARGET";

/// What the helper launched versus where it meant to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    /// Executable that was actually started.
    pub run_target: PathBuf,
    /// Intended install location.
    pub final_target: PathBuf,
}

impl LaunchRecord {
    pub fn new(run_target: impl Into<PathBuf>, final_target: impl Into<PathBuf>) -> Self {
        Self {
            run_target: run_target.into(),
            final_target: final_target.into(),
        }
    }

    /// `true` when the process runs from somewhere other than its install path.
    pub fn is_fallback(&self) -> bool {
        !paths_match(&self.run_target, &self.final_target)
    }

    pub fn to_text(&self) -> String {
        format!(
            "{RUN_TARGET_KEY}={}\n{FINAL_TARGET_KEY}={}\n",
            self.run_target.display(),
            self.final_target.display()
        )
    }

    /// Parse the marker. Unknown keys are ignored; both keys are required.
    pub fn parse(text: &str) -> Option<Self> {
        let mut run_target = None;
        let mut final_target = None;
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                RUN_TARGET_KEY => run_target = Some(PathBuf::from(value)),
                FINAL_TARGET_KEY => final_target = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        Some(Self {
            run_target: run_target?,
            final_target: final_target?,
        })
    }
}

fn paths_match(a: &Path, b: &Path) -> bool {
    crate::utils::platform::paths_equal(a, b) || crate::utils::same_file(a, b)
}
