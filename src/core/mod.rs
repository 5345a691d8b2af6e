//! Core types shared by every update component.
//!
//! Currently this is the error taxonomy: [`UpdateError`] for precise handling
//! in code and [`ErrorContext`] for user-facing messages with suggestions.

pub mod error;

pub use error::{ErrorContext, ErrorKind, Result, UpdateError, user_friendly_error};
