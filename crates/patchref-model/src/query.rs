//! Member queries.
//!
//! A `MemberQuery` is the fully shaped question "does this member exist on
//! one of these owner types", independent of which backend answers it.

use crate::descriptor::{ReflectionName, TypeDescriptor};
use crate::outcome::ResolutionOutcome;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    StaticConstructor,
}

impl MemberKind {
    /// Reserved metadata name of constructor kinds.
    pub fn reserved_name(self) -> Option<&'static str> {
        match self {
            MemberKind::Constructor => Some(".ctor"),
            MemberKind::StaticConstructor => Some(".cctor"),
            _ => None,
        }
    }

    pub fn is_constructor(self) -> bool {
        matches!(self, MemberKind::Constructor | MemberKind::StaticConstructor)
    }

    pub fn is_method_like(self) -> bool {
        matches!(
            self,
            MemberKind::Method | MemberKind::Constructor | MemberKind::StaticConstructor
        )
    }
}

/// How an argument is passed to a parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassingMode {
    #[default]
    Normal,
    Ref,
    Out,
    Pointer,
}

/// Property accessor a query requires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessor {
    Getter,
    Setter,
}

/// What a backend knows about a by-reference parameter.
///
/// Binary signatures collapse `ref`, `out` and `in` into one byref marker;
/// compiler symbols keep them apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ByRefKind {
    Unknown,
    Ref,
    Out,
    ReadOnly,
}

/// A parameter of a candidate overload, as seen by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateParam {
    /// Full parameter type, including the byref wrapper for by-reference
    /// parameters.
    pub ty: TypeDescriptor,
    /// Present only for by-reference parameters.
    pub by_ref: Option<ByRefKind>,
}

impl CandidateParam {
    /// Parameter decoded from a binary signature.
    pub fn from_signature(ty: TypeDescriptor) -> Self {
        let by_ref = ty.is_by_ref().then_some(ByRefKind::Unknown);
        Self { ty, by_ref }
    }
}

// =============================================================================
// Owners
// =============================================================================

/// A type identity bound by the host: the assembly that declares it plus its
/// descriptor (possibly a generic instantiation).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeIdentity {
    pub assembly: String,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
}

impl TypeIdentity {
    pub fn new(assembly: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            assembly: assembly.into(),
            descriptor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    /// Type bound by the host compiler.
    Bound(TypeIdentity),
    /// Reflection name written in a string, e.g. `Ns.Type` of `"Ns.Type:Member"`.
    Name(String),
}

impl OwnerRef {
    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            OwnerRef::Bound(identity) => identity.descriptor.canonical_string(),
            OwnerRef::Name(name) => name.clone(),
        }
    }

    pub fn reflection_name(&self) -> Option<ReflectionName> {
        match self {
            OwnerRef::Bound(identity) => ReflectionName::from_descriptor(&identity.descriptor),
            OwnerRef::Name(name) => ReflectionName::parse(name),
        }
    }

    pub fn assembly(&self) -> Option<&str> {
        match self {
            OwnerRef::Bound(identity) => Some(&identity.assembly),
            OwnerRef::Name(_) => None,
        }
    }

    /// Generic arguments of an instantiated owner.
    pub fn type_arguments(&self) -> &[TypeDescriptor] {
        match self {
            OwnerRef::Bound(identity) => identity.descriptor.generic_arguments(),
            OwnerRef::Name(_) => &[],
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

// =============================================================================
// Parameter Signatures
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamSpec {
    pub ty: TypeDescriptor,
    pub mode: PassingMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamSignature {
    pub params: Vec<ParamSpec>,
    /// True when the caller supplied passing modes explicitly. Without modes
    /// parameter types compare as written (`ref int` must be spelled `int&`).
    pub modes_specified: bool,
}

impl ParamSignature {
    pub fn from_types(types: Vec<TypeDescriptor>) -> Self {
        Self {
            params: types
                .into_iter()
                .map(|ty| ParamSpec {
                    ty,
                    mode: PassingMode::Normal,
                })
                .collect(),
            modes_specified: false,
        }
    }

    /// Pairs types with modes. `None` when the lengths disagree.
    pub fn with_modes(types: Vec<TypeDescriptor>, modes: Vec<PassingMode>) -> Option<Self> {
        if types.len() != modes.len() {
            return None;
        }
        Some(Self {
            params: types
                .into_iter()
                .zip(modes)
                .map(|(ty, mode)| ParamSpec { ty, mode })
                .collect(),
            modes_specified: true,
        })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Structural match against one overload's parameters.
    pub fn matches(&self, candidate: &[CandidateParam]) -> bool {
        self.params.len() == candidate.len()
            && self
                .params
                .iter()
                .zip(candidate)
                .all(|(spec, param)| self.param_matches(spec, param))
    }

    fn param_matches(&self, spec: &ParamSpec, param: &CandidateParam) -> bool {
        if !self.modes_specified {
            return param.ty.same_type(&spec.ty);
        }
        match spec.mode {
            PassingMode::Normal => {
                param.by_ref.is_none() && !param.ty.is_pointer() && param.ty.same_type(&spec.ty)
            }
            PassingMode::Ref => {
                matches!(
                    param.by_ref,
                    Some(ByRefKind::Unknown | ByRefKind::Ref | ByRefKind::ReadOnly)
                ) && param
                    .ty
                    .without_by_ref()
                    .same_type(spec.ty.without_by_ref())
            }
            PassingMode::Out => {
                matches!(param.by_ref, Some(ByRefKind::Unknown | ByRefKind::Out))
                    && param
                        .ty
                        .without_by_ref()
                        .same_type(spec.ty.without_by_ref())
            }
            PassingMode::Pointer => {
                param.by_ref.is_none()
                    && param.ty.is_pointer()
                    && param
                        .ty
                        .without_pointer()
                        .same_type(spec.ty.without_pointer())
            }
        }
    }
}

// =============================================================================
// MemberQuery
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberQuery {
    /// Alternatives for the owner type; one success suffices.
    pub owner_candidates: SmallVec<[OwnerRef; 1]>,
    pub kind: MemberKind,
    pub member_name: String,
    pub search_base: bool,
    pub param_signature: Option<ParamSignature>,
    pub accessor: Option<Accessor>,
    /// Required declared type of a field (field-ref-access family).
    pub field_type: Option<TypeDescriptor>,
}

impl MemberQuery {
    pub fn new(owner: OwnerRef, kind: MemberKind, member_name: impl Into<String>) -> Self {
        let member_name = match kind.reserved_name() {
            Some(reserved) => reserved.to_string(),
            None => member_name.into(),
        };
        Self {
            owner_candidates: SmallVec::from_elem(owner, 1),
            kind,
            member_name,
            search_base: !kind.is_constructor(),
            param_signature: None,
            accessor: None,
            field_type: None,
        }
    }

    pub fn field(owner: OwnerRef, name: impl Into<String>) -> Self {
        Self::new(owner, MemberKind::Field, name)
    }

    pub fn property(owner: OwnerRef, name: impl Into<String>) -> Self {
        Self::new(owner, MemberKind::Property, name)
    }

    pub fn method(owner: OwnerRef, name: impl Into<String>) -> Self {
        Self::new(owner, MemberKind::Method, name)
    }

    pub fn constructor(owner: OwnerRef, is_static: bool) -> Self {
        let kind = if is_static {
            MemberKind::StaticConstructor
        } else {
            MemberKind::Constructor
        };
        Self::new(owner, kind, "")
    }

    /// Only members declared on the owner itself.
    pub fn declared(mut self) -> Self {
        self.search_base = false;
        self
    }

    pub fn with_owner_candidates(mut self, owners: impl IntoIterator<Item = OwnerRef>) -> Self {
        self.owner_candidates = owners.into_iter().collect();
        self
    }

    pub fn with_params(mut self, signature: ParamSignature) -> Self {
        self.param_signature = Some(signature);
        self
    }

    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_field_type(mut self, field_type: TypeDescriptor) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Same query against a single owner; used when fanning out candidates.
    pub fn for_owner(&self, owner: OwnerRef) -> Self {
        let mut query = self.clone();
        query.owner_candidates = SmallVec::from_elem(owner, 1);
        query
    }

    /// Same query with a different member kind (kind fan-out).
    pub fn with_kind(&self, kind: MemberKind) -> Self {
        let mut query = self.clone();
        query.kind = kind;
        if !kind.is_method_like() {
            query.param_signature = None;
        }
        if kind != MemberKind::Property {
            query.accessor = None;
        }
        query
    }

    /// Base-type search applies to fields, properties and methods only.
    pub fn walks_base_types(&self) -> bool {
        self.search_base && !self.kind.is_constructor()
    }

    /// Outcome of a search that found nothing on `owner_name`.
    pub fn not_found(&self, owner_name: &str) -> ResolutionOutcome {
        match self.kind {
            MemberKind::Constructor => ResolutionOutcome::MissingConstructor {
                type_name: owner_name.to_string(),
            },
            MemberKind::StaticConstructor => ResolutionOutcome::MissingStaticConstructor {
                type_name: owner_name.to_string(),
            },
            _ => ResolutionOutcome::member_not_found(owner_name, &self.member_name),
        }
    }
}

#[cfg(test)]
#[path = "../tests/query_tests.rs"]
mod tests;
