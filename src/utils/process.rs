//! Process control used by the handoff.
//!
//! [`ProcessControl`] is the seam between the handoff logic and the operating
//! system: starting a detached process, asking whether a pid is still alive and
//! forcibly terminating it. [`SystemProcessControl`] is the real
//! implementation (std `Command` plus `sysinfo`); tests substitute a recording
//! fake so no real processes are started.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Operating-system process operations needed to hand off to a new binary.
pub trait ProcessControl: Send + Sync {
    /// Start `program` with `args`, detached from the current process.
    ///
    /// Variables named in `env_remove` are removed from the child's
    /// environment. Returns the child's pid.
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        env_remove: &[OsString],
    ) -> std::io::Result<u32>;

    /// Whether a process with this pid is alive.
    fn is_running(&self, pid: u32) -> bool;

    /// Forcibly terminate the process. Returns `true` if a signal was sent.
    fn terminate(&self, pid: u32) -> bool;
}

/// [`ProcessControl`] backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    fn refreshed(pid: u32) -> System {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
        system
    }
}

impl ProcessControl for SystemProcessControl {
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        env_remove: &[OsString],
    ) -> std::io::Result<u32> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        if let Some(dir) = program.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }
        for name in env_remove {
            command.env_remove(name);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn()?;
        let pid = child.id();
        debug!("Spawned {} as pid {}", program.display(), pid);
        Ok(pid)
    }

    fn is_running(&self, pid: u32) -> bool {
        let system = Self::refreshed(pid);
        match system.process(Pid::from_u32(pid)) {
            Some(process) => !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
            None => false,
        }
    }

    fn terminate(&self, pid: u32) -> bool {
        let system = Self::refreshed(pid);
        match system.process(Pid::from_u32(pid)) {
            Some(process) => {
                let sent = process.kill();
                if !sent {
                    warn!("Failed to terminate pid {}", pid);
                }
                sent
            }
            None => false,
        }
    }
}
