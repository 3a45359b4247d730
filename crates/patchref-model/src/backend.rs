//! The seam between the query dispatcher and the two resolution backends.
//!
//! Both backends answer the same two questions: where is this owner type, and
//! does it (or one of its bases) declare the member. A backend that cannot
//! follow a base link hands the rest of the walk back to the dispatcher.

use crate::outcome::{Inconclusive, ResolutionOutcome};
use crate::query::{MemberQuery, OwnerRef};

/// Result of locating an owner type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeLookup<H> {
    Found(H),
    /// No definition with this name is visible to the backend.
    NotFound,
    /// The type is referenced from an assembly that cannot be located.
    AssemblyNotFound { assembly: String },
}

impl<H> TypeLookup<H> {
    pub fn found(self) -> Option<H> {
        match self {
            TypeLookup::Found(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Result of a member search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Search {
    Done(ResolutionOutcome),
    /// The walk reached a base type this backend cannot open. The search
    /// continues on `base`, with `depth` base links already followed.
    Continue { base: OwnerRef, depth: u32 },
}

pub trait ResolutionBackend {
    type Handle;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn find_type(&self, owner: &OwnerRef) -> Result<TypeLookup<Self::Handle>, Inconclusive>;

    /// Searches `ty` (and its bases when the query walks them) for the member.
    ///
    /// `depth` is the number of base links already followed by earlier
    /// backends for this query.
    fn find_member(
        &self,
        ty: &Self::Handle,
        query: &MemberQuery,
        depth: u32,
    ) -> Result<Search, Inconclusive>;
}
