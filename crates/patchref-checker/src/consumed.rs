//! Call sites already evaluated during one analysis pass.
//!
//! A coalesce chain claims all of its sites under one write lock, so no other
//! thread can observe a partially claimed chain. Standalone sites only read.

use patchref_common::SourceLocation;
use rustc_hash::FxHashSet;
use std::sync::{PoisonError, RwLock};
use tracing::trace;

#[derive(Debug, Default)]
pub struct ConsumedLocations {
    locations: RwLock<FxHashSet<SourceLocation>>,
}

impl ConsumedLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consumed(&self, location: &SourceLocation) -> bool {
        self.locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(location)
    }

    /// Marks every location as consumed in one atomic step. Returns, in input
    /// order, whether each location was newly claimed by this call.
    pub fn claim_all<'a>(&self, locations: impl IntoIterator<Item = &'a SourceLocation>) -> Vec<bool> {
        let mut set = self
            .locations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        locations
            .into_iter()
            .map(|location| {
                let claimed = set.insert(location.clone());
                if !claimed {
                    trace!(%location, "already consumed");
                }
                claimed
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/consumed_tests.rs"]
mod tests;
