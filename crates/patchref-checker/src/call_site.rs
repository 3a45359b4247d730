//! Call sites as the host hands them over.
//!
//! The host has already bound every `typeof(...)` argument and evaluated
//! constants; anything it could not evaluate arrives as `NonConstant`.

use patchref_common::SourceLocation;
use patchref_model::{OwnerRef, PassingMode, TypeDescriptor, TypeIdentity};
use serde::{Deserialize, Serialize};

/// A type-valued argument or generic argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeArg {
    Bound(TypeIdentity),
    /// An open generic type parameter with its constraint types.
    Parameter {
        parameter: String,
        #[serde(default)]
        constraints: Vec<TypeIdentity>,
    },
}

impl TypeArg {
    pub fn bound(assembly: &str, descriptor: TypeDescriptor) -> Self {
        TypeArg::Bound(TypeIdentity::new(assembly, descriptor))
    }

    /// Owner candidates: the type itself, or one per constraint.
    pub fn owner_candidates(&self) -> Vec<OwnerRef> {
        match self {
            TypeArg::Bound(identity) => vec![OwnerRef::Bound(identity.clone())],
            TypeArg::Parameter { constraints, .. } => {
                constraints.iter().cloned().map(OwnerRef::Bound).collect()
            }
        }
    }

    /// Descriptor usable in a parameter or field type position.
    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeArg::Bound(identity) => Some(&identity.descriptor),
            TypeArg::Parameter { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Argument {
    Type(TypeArg),
    String(String),
    TypeArray(Vec<TypeArg>),
    Bool(bool),
    Null,
    /// An expression the host could not evaluate.
    NonConstant,
    /// Any other constant or expression (e.g. a `MethodInfo`).
    Other,
}

/// Kind of method a patch attribute targets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodType {
    #[default]
    Normal,
    Getter,
    Setter,
    Constructor,
    StaticConstructor,
    Enumerator,
    Async,
}

/// Target of a patch attribute, merged from class- and method-level
/// attributes by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTarget {
    #[serde(default)]
    pub owner: Option<Argument>,
    #[serde(default)]
    pub member: Option<Argument>,
    #[serde(default)]
    pub method_type: MethodType,
    #[serde(default)]
    pub argument_types: Option<Argument>,
    #[serde(default)]
    pub argument_modes: Option<Vec<PassingMode>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum Call {
    Invocation {
        method: String,
        #[serde(default)]
        generic_args: Vec<TypeArg>,
        #[serde(default)]
        args: Vec<Argument>,
    },
    PatchAttribute(PatchTarget),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub location: SourceLocation,
    #[serde(flatten)]
    pub call: Call,
}

impl CallSite {
    pub fn invocation(
        location: SourceLocation,
        method: &str,
        generic_args: Vec<TypeArg>,
        args: Vec<Argument>,
    ) -> Self {
        Self {
            location,
            call: Call::Invocation {
                method: method.to_string(),
                generic_args,
                args,
            },
        }
    }

    pub fn patch_attribute(location: SourceLocation, target: PatchTarget) -> Self {
        Self {
            location,
            call: Call::PatchAttribute(target),
        }
    }
}
