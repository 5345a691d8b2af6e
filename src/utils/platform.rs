//! Platform-specific helpers for the update subsystem.
//!
//! Covers the places where Windows, macOS and Linux disagree: which executable
//! suffix and magic signature to expect, how to tell whether two paths name
//! the same file, how to lift the "downloaded from the internet" quarantine,
//! and which inherited environment variables must not leak into a relaunched
//! process.
//!
//! The quarantine and permission helpers are advisory: they log failures and
//! never return errors.

use crate::constants::PACKAGED_ENV;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Platform executable suffix (`.exe` on Windows, empty elsewhere).
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// Environment variables set by packaging loaders (AppImage and friends).
///
/// A relaunched binary that inherits them believes it still runs inside the
/// old image's mount.
pub const PACKAGING_LOADER_VARS: &[&str] = &["APPIMAGE", "APPDIR", "ARGV0", "OWD"];

/// Prefix of variables cargo injects into processes it starts.
const CARGO_VAR_PREFIX: &str = "CARGO_";

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Magic signatures accepted as a native executable on this platform.
///
/// - Windows: `MZ` (PE/COFF)
/// - macOS: Mach-O 64-bit in both byte orders, and universal binaries
/// - Other Unix: `\x7fELF`
#[must_use]
pub fn native_executable_signatures() -> &'static [&'static [u8]] {
    if cfg!(windows) {
        &[b"MZ"]
    } else if cfg!(target_os = "macos") {
        &[
            &[0xCF, 0xFA, 0xED, 0xFE],
            &[0xFE, 0xED, 0xFA, 0xCF],
            &[0xCA, 0xFE, 0xBA, 0xBE],
        ]
    } else {
        &[b"\x7fELF"]
    }
}

/// Whether `header` starts with one of the native executable signatures.
#[must_use]
pub fn has_native_signature(header: &[u8]) -> bool {
    native_executable_signatures().iter().any(|magic| header.starts_with(magic))
}

/// Decide whether the executable at `current_exe` is an installed build.
///
/// `BINITY_PACKAGED=1|0` wins when set. Otherwise a run counts as a
/// development run when cargo started it (`CARGO_MANIFEST_DIR` is set) or the
/// executable sits inside a cargo `target/` directory.
#[must_use]
pub fn is_packaged_build(current_exe: &Path) -> bool {
    if let Ok(value) = std::env::var(PACKAGED_ENV) {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => return true,
            "0" | "false" | "no" => return false,
            other => warn!("Ignoring unrecognised {PACKAGED_ENV}={other}"),
        }
    }

    if std::env::var_os("CARGO_MANIFEST_DIR").is_some() {
        return false;
    }

    !current_exe
        .components()
        .any(|component| matches!(component, Component::Normal(name) if name == "target"))
}

/// Compares two paths as strings using the platform's case rules.
///
/// Windows compares case-insensitively; trailing separators are ignored on
/// every platform. This does not touch the filesystem.
#[must_use]
pub fn paths_equal(path1: &Path, path2: &Path) -> bool {
    let p1_str = path1.to_string_lossy();
    let p2_str = path2.to_string_lossy();
    if is_windows() {
        let p1 = p1_str.trim_end_matches(['/', '\\']).to_lowercase();
        let p2 = p2_str.trim_end_matches(['/', '\\']).to_lowercase();
        p1 == p2
    } else {
        p1_str.trim_end_matches('/') == p2_str.trim_end_matches('/')
    }
}

/// Whether two paths refer to the same file on disk.
///
/// Both paths are canonicalized so symlinks and `..` segments resolve. When
/// either side cannot be canonicalized (usually because it does not exist
/// yet) the raw paths are compared case-insensitively, which is the safe
/// direction: a false "same file" only costs a `next-` prefix.
#[must_use]
pub fn same_file(path1: &Path, path2: &Path) -> bool {
    match (path1.canonicalize(), path2.canonicalize()) {
        (Ok(a), Ok(b)) => a == b || paths_equal(&a, &b),
        _ => {
            let a = path1.to_string_lossy().to_lowercase();
            let b = path2.to_string_lossy().to_lowercase();
            a.trim_end_matches(['/', '\\']) == b.trim_end_matches(['/', '\\'])
        }
    }
}

/// Directory containing `path`, or `.` for bare file names.
#[must_use]
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Remove the host's "downloaded from the internet" marker from a file.
///
/// Windows keeps it in the `Zone.Identifier` alternate data stream; macOS in
/// the `com.apple.quarantine` extended attribute. Failure is logged only.
pub fn unblock_downloaded_file(path: &Path) {
    #[cfg(windows)]
    {
        let mut stream = path.as_os_str().to_os_string();
        stream.push(":Zone.Identifier");
        match std::fs::remove_file(&stream) {
            Ok(()) => debug!("Removed Zone.Identifier from {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not unblock {}: {}", path.display(), e),
        }
    }

    #[cfg(target_os = "macos")]
    {
        let result = std::process::Command::new("xattr")
            .arg("-d")
            .arg("com.apple.quarantine")
            .arg(path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
        match result {
            Ok(status) if status.success() => debug!("Cleared quarantine on {}", path.display()),
            Ok(_) => debug!("No quarantine attribute on {}", path.display()),
            Err(e) => warn!("Could not run xattr for {}: {}", path.display(), e),
        }
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    {
        debug!("No quarantine mechanism for {}", path.display());
    }
}

/// Mark a file executable for its owner, group and others (`0o755`).
///
/// No-op on Windows. Failure is logged only.
pub fn set_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
            warn!("Could not make {} executable: {}", path.display(), e);
        }
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Names of inherited environment variables to strip before relaunching.
///
/// Includes the packaging loader variables and every `CARGO_*` variable
/// present in the current environment.
#[must_use]
pub fn inherited_vars_to_strip() -> Vec<OsString> {
    let mut names: Vec<OsString> = PACKAGING_LOADER_VARS.iter().map(OsString::from).collect();
    names.extend(
        std::env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| key.to_string_lossy().starts_with(CARGO_VAR_PREFIX)),
    );
    names
}
