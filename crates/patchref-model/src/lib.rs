//! Backend-agnostic data model of the patchref engine.
//!
//! - `descriptor`: the Signature Type Model and its canonical strings
//! - `query`: member queries, owners, parameter signatures and passing modes
//! - `outcome`: resolution outcomes and inconclusive results
//! - `backend`: the `ResolutionBackend` trait both backends implement

pub mod backend;
pub mod descriptor;
pub mod outcome;
pub mod query;

pub use backend::{ResolutionBackend, Search, TypeLookup};
pub use descriptor::{
    ArrayShape, DescriptorParseError, GenericParamOwner, PrimitiveType, ReflectionName,
    TypeDescriptor, strip_generic_arity,
};
pub use outcome::{Inconclusive, InconclusiveReason, Resolution, ResolutionOutcome};
pub use query::{
    Accessor, ByRefKind, CandidateParam, MemberKind, MemberQuery, OwnerRef, ParamSignature,
    ParamSpec, PassingMode, TypeIdentity,
};
