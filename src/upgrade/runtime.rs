//! Facts about the running process that the update steps depend on.

use crate::config::AppPaths;
use crate::core::{Result, UpdateError};
use crate::utils::platform::{is_packaged_build, parent_dir};
use crate::version::CURRENT_VERSION;
use std::path::PathBuf;

/// Identity of the running executable and where its data lives.
///
/// Built once at startup with [`RuntimeContext::detect`]; tests construct it
/// directly to point at a temporary install.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Path of the executable that is running now.
    pub current_exe: PathBuf,
    pub pid: u32,
    /// `false` for development runs, which never self-replace.
    pub packaged: bool,
    /// Version of the running build.
    pub current_version: String,
    pub paths: AppPaths,
}

impl RuntimeContext {
    /// Describe the current process.
    pub fn detect(paths: AppPaths) -> Result<Self> {
        let current_exe = std::env::current_exe()
            .map_err(|e| UpdateError::io("locate current executable", PathBuf::from("."), e))?;
        let packaged = is_packaged_build(&current_exe);

        Ok(Self {
            current_exe,
            pid: std::process::id(),
            packaged,
            current_version: CURRENT_VERSION.to_string(),
            paths,
        })
    }

    /// Directory containing the running executable.
    pub fn exe_dir(&self) -> PathBuf {
        parent_dir(&self.current_exe)
    }
}
