//! A [`ProcessControl`] that records calls instead of touching real processes.

use crate::utils::process::ProcessControl;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// One recorded `spawn_detached` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRecord {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env_remove: Vec<OsString>,
}

/// Fake process control for handoff tests.
///
/// Every pid is reported as exited unless registered with
/// [`keep_running`](Self::keep_running); such a pid stays alive until it is
/// terminated.
#[derive(Debug)]
pub struct RecordingProcessControl {
    spawned: Mutex<Vec<SpawnRecord>>,
    running: Mutex<HashSet<u32>>,
    terminated: Mutex<Vec<u32>>,
    fail_spawns: AtomicBool,
    next_pid: AtomicU32,
}

impl Default for RecordingProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingProcessControl {
    pub fn new() -> Self {
        Self {
            spawned: Mutex::new(Vec::new()),
            running: Mutex::new(HashSet::new()),
            terminated: Mutex::new(Vec::new()),
            fail_spawns: AtomicBool::new(false),
            next_pid: AtomicU32::new(50_000),
        }
    }

    /// Report `pid` as running until it is terminated.
    pub fn keep_running(&self, pid: u32) {
        self.running.lock().unwrap().insert(pid);
    }

    /// Make every later spawn fail with `NotFound`.
    pub fn fail_spawns(&self) {
        self.fail_spawns.store(true, Ordering::SeqCst);
    }

    pub fn spawned(&self) -> Vec<SpawnRecord> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl ProcessControl for RecordingProcessControl {
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        env_remove: &[OsString],
    ) -> std::io::Result<u32> {
        if self.fail_spawns.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("refusing to start {}", program.display()),
            ));
        }

        self.spawned.lock().unwrap().push(SpawnRecord {
            program: program.to_path_buf(),
            args: args.to_vec(),
            env_remove: env_remove.to_vec(),
        });
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }

    fn is_running(&self, pid: u32) -> bool {
        self.running.lock().unwrap().contains(&pid)
    }

    fn terminate(&self, pid: u32) -> bool {
        self.terminated.lock().unwrap().push(pid);
        self.running.lock().unwrap().remove(&pid)
    }
}
