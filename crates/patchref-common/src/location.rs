//! Source locations of analyzed invocations.
//!
//! The host supplies one location per call site. Locations double as the key
//! of the per-pass consumed set, so they are cheap to clone, hash and order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A byte range inside a source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File containing the invocation. Shared between all sites of a file.
    pub file: Arc<str>,
    /// Start offset (inclusive).
    pub start: u32,
    /// Length in bytes.
    pub length: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, start: u32, length: u32) -> Self {
        Self {
            file: file.into(),
            start,
            length,
        }
    }

    /// End offset (exclusive).
    #[inline]
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.length)
    }

    /// Returns true if `other` lies entirely inside this location.
    pub fn contains(&self, other: &SourceLocation) -> bool {
        self.file == other.file && self.start <= other.start && other.end() <= self.end()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.file, self.start, self.end())
    }
}

#[cfg(test)]
#[path = "../tests/location_tests.rs"]
mod tests;
