//! Version handling for release tags.
//!
//! See [`comparison`] for the lenient parser used to decide whether a remote
//! release is newer than the running build.

pub mod comparison;

pub use comparison::{ParsedVersion, VersionComparator};

/// Version of the running build, taken from the crate version at compile time.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
