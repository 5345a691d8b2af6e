//! Lenient dotted-version parsing and comparison.
//!
//! Release tags are written by people, so parsing never fails: a leading
//! `v`/`V` is stripped, the rest is split on `.`, and every segment that is
//! not a non-negative integer counts as `0`. Empty input parses as `(0)`.
//! Versions are compared component by component with missing trailing
//! components treated as `0`, so `1.2` and `1.2.0` are equal and `3.2` is
//! older than `3.2.1`.
//!
//! # Examples
//!
//! ```rust
//! use binity_updater::version::comparison::VersionComparator;
//! use std::cmp::Ordering;
//!
//! assert_eq!(VersionComparator::parse("v3.3.2").components(), &[3, 3, 2]);
//! assert_eq!(VersionComparator::compare("1.10", "1.2"), Ordering::Greater);
//! assert!(VersionComparator::is_newer("v3.3.2", "3.3.1"));
//! assert!(!VersionComparator::is_newer("1.0.0", "1.0"));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// A parsed version: an ordered tuple of non-negative integers.
///
/// Equality and ordering ignore trailing zero components.
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    components: Vec<u64>,
}

impl ParsedVersion {
    /// The numeric components, always at least one.
    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for index in 0..len {
            let left = self.components.get(index).copied().unwrap_or(0);
            let right = other.components.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Version parsing and comparison for release tags.
pub struct VersionComparator;

impl VersionComparator {
    /// Strip surrounding whitespace and any leading `v`/`V` prefix letters.
    pub fn strip_prefix(text: &str) -> &str {
        text.trim().trim_start_matches(['v', 'V']).trim()
    }

    /// Parse a version string. Never fails.
    pub fn parse(text: &str) -> ParsedVersion {
        let clean = Self::strip_prefix(text);
        if clean.is_empty() {
            return ParsedVersion {
                components: vec![0],
            };
        }

        let components = clean
            .split('.')
            .map(|segment| segment.trim().parse::<u64>().unwrap_or(0))
            .collect();

        ParsedVersion { components }
    }

    /// Compare two version strings.
    pub fn compare(left: &str, right: &str) -> Ordering {
        Self::parse(left).cmp(&Self::parse(right))
    }

    /// `true` when `candidate` is strictly newer than `current`.
    pub fn is_newer(candidate: &str, current: &str) -> bool {
        Self::compare(candidate, current) == Ordering::Greater
    }
}
