//! Error handling for the updater
//!
//! Every failure the update subsystem can hit falls into one of four
//! categories, and the category decides how the caller reacts:
//!
//! - **Transport** ([`ErrorKind::Transport`]): DNS, connect, timeout or HTTP
//!   status failures. Always non-fatal; checks and downloads report "no result".
//! - **Integrity** ([`ErrorKind::Integrity`]): the downloaded file failed a
//!   size, magic-byte or checksum check. Terminal for that attempt; the
//!   partial file is deleted and the caller has to retry explicitly.
//! - **Environment** ([`ErrorKind::Environment`]): development build, missing
//!   metadata, missing files, permission problems. Terminal and never retried.
//! - **Replacement** ([`ErrorKind::Replacement`]): the staged binary could not
//!   be copied over the installed one. The handoff routine downgrades this to
//!   a fallback launch instead of surfacing it.
//!
//! [`ErrorContext`] wraps an [`UpdateError`] with a suggestion for display in
//! the terminal, mirroring how the public session operations expose a
//! human-readable "last error" string to the UI.
//!
//! # Examples
//!
//! ```rust,no_run
//! use binity_updater::core::{ErrorKind, UpdateError};
//!
//! let error = UpdateError::NotPackaged;
//! assert_eq!(error.kind(), ErrorKind::Environment);
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Category of an [`UpdateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout or HTTP status failure.
    Transport,
    /// Downloaded file failed validation.
    Integrity,
    /// The environment does not allow the operation.
    Environment,
    /// Copying the new executable into place failed.
    Replacement,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Integrity => write!(f, "integrity"),
            Self::Environment => write!(f, "environment"),
            Self::Replacement => write!(f, "replacement"),
        }
    }
}

/// The main error type for update operations.
///
/// Variants carry the paths, sizes and URLs needed to explain the failure to
/// a user without a debugger. Use [`UpdateError::kind`] to decide whether a
/// failure is worth retrying.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The HTTP request could not be completed.
    #[error("Network error during {operation}: {reason}")]
    Network {
        /// What was being fetched (e.g. "release check").
        operation: String,
        /// Underlying transport error text.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} during {operation}")]
    HttpStatus {
        /// What was being fetched.
        operation: String,
        /// HTTP status code.
        status: u16,
    },

    /// The release payload could not be decoded.
    #[error("Invalid release metadata: {reason}")]
    InvalidRelease {
        /// Decoder error text.
        reason: String,
    },

    /// The download finished but the file is gone.
    #[error("Downloaded file not found: {}", path.display())]
    DownloadMissing {
        /// Expected location of the staged file.
        path: PathBuf,
    },

    /// The download size differs from the advertised size.
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Size advertised by the release or the server.
        expected: u64,
        /// Size found on disk.
        actual: u64,
    },

    /// The download is below the sanity floor.
    #[error("Downloaded file too small ({actual} bytes, minimum {minimum})")]
    TooSmall {
        /// Size found on disk.
        actual: u64,
        /// Configured floor.
        minimum: u64,
    },

    /// The download does not start with a native executable signature.
    #[error("Downloaded file is not a valid executable")]
    InvalidExecutable,

    /// The published checksum does not match the download.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum published with the release.
        expected: String,
        /// Checksum of the downloaded file.
        actual: String,
    },

    /// Self-replacement was requested from a development build.
    #[error("Auto-update is available only in packaged builds")]
    NotPackaged,

    /// A download was requested before a successful check.
    #[error("No update metadata available")]
    NoUpdateMetadata,

    /// The staged executable handed to `apply` does not exist.
    #[error("Update file not found: {}", path.display())]
    StagedFileMissing {
        /// Path that was passed in.
        path: PathBuf,
    },

    /// Another check, download or apply is already running.
    #[error("Another update operation is already in progress")]
    Busy,

    /// A file system operation failed.
    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        /// What was attempted (e.g. "create staging directory").
        operation: String,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the settings store failed.
    #[error("Settings error: {message}")]
    Settings {
        /// Description of the failure.
        message: String,
    },

    /// The helper process could not be started.
    #[error("Failed to start {what}: {reason}")]
    Spawn {
        /// Which process was being started.
        what: String,
        /// Underlying error text.
        reason: String,
    },

    /// Copying the new executable over the installed one failed.
    #[error("Failed to replace {} after {attempts} attempts: {reason}", target.display())]
    ReplaceFailed {
        /// Final executable path.
        target: PathBuf,
        /// Number of attempts made.
        attempts: usize,
        /// Last error text.
        reason: String,
    },
}

impl UpdateError {
    /// Convenience constructor for [`UpdateError::Io`].
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } | Self::InvalidRelease { .. } => {
                ErrorKind::Transport
            }
            Self::DownloadMissing { .. }
            | Self::SizeMismatch { .. }
            | Self::TooSmall { .. }
            | Self::InvalidExecutable
            | Self::ChecksumMismatch { .. } => ErrorKind::Integrity,
            Self::ReplaceFailed { .. } => ErrorKind::Replacement,
            Self::NotPackaged
            | Self::NoUpdateMetadata
            | Self::StagedFileMissing { .. }
            | Self::Busy
            | Self::Io { .. }
            | Self::Settings { .. }
            | Self::Spawn { .. } => ErrorKind::Environment,
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(error: reqwest::Error) -> Self {
        let operation = if error.is_timeout() {
            "request (timed out)"
        } else if error.is_connect() {
            "connect"
        } else if error.is_decode() {
            "decode"
        } else {
            "request"
        };
        if let Some(status) = error.status() {
            return Self::HttpStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            };
        }
        Self::Network {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result alias used across the update subsystem.
pub type Result<T, E = UpdateError> = std::result::Result<T, E>;

/// User-facing wrapper around an [`UpdateError`].
///
/// Adds an optional suggestion and details line. The CLI prints it with
/// colors; `Display` renders plain text for logs and dialogs.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: UpdateError,
    /// Optional suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Optional additional details.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without suggestion or details.
    #[must_use]
    pub const fn new(error: UpdateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl From<UpdateError> for ErrorContext {
    fn from(error: UpdateError) -> Self {
        user_friendly_error(error)
    }
}

/// Attach a kind-specific suggestion to an [`UpdateError`].
pub fn user_friendly_error(error: UpdateError) -> ErrorContext {
    match &error {
        UpdateError::NotPackaged => ErrorContext::new(error)
            .with_details("Development runs cannot replace their own executable")
            .with_suggestion("Install a release build to use automatic updates"),
        UpdateError::NoUpdateMetadata => {
            ErrorContext::new(error).with_suggestion("Check for updates before downloading")
        }
        UpdateError::Busy => {
            ErrorContext::new(error).with_suggestion("Wait for the running operation to finish")
        }
        _ => match error.kind() {
            ErrorKind::Transport => ErrorContext::new(error)
                .with_suggestion("Check your internet connection and try again later"),
            ErrorKind::Integrity => ErrorContext::new(error)
                .with_details("The partial download was deleted")
                .with_suggestion("Retry the download; if it keeps failing, download the release manually"),
            ErrorKind::Replacement => ErrorContext::new(error)
                .with_suggestion("Close other programs that may lock the executable and retry"),
            ErrorKind::Environment => ErrorContext::new(error)
                .with_suggestion("Check file permissions in the application data directory"),
        },
    }
}
