//! Call sites to member queries.
//!
//! `shape` returns `Ok(None)` for calls that are not member lookups, and
//! `Err(Inconclusive)` for lookups whose inputs cannot be evaluated. The
//! queries of `Ok(Some(..))` are alternatives: one success satisfies the
//! call site.

use crate::call_site::{Argument, Call, CallSite, MethodType, PatchTarget, TypeArg};
use crate::decompose::{LookupFlags, decompose};
use patchref_model::{
    Accessor, Inconclusive, InconclusiveReason, MemberKind, MemberQuery, OwnerRef, ParamSignature,
    TypeDescriptor,
};
use tracing::trace;

type Shaped = Result<Option<Vec<MemberQuery>>, Inconclusive>;

const FIELD_REF_ACCESS: [&str; 3] = ["FieldRefAccess", "StaticFieldRefAccess", "StructFieldRefAccess"];

fn inconclusive(reason: InconclusiveReason, detail: impl Into<String>) -> Inconclusive {
    Inconclusive::new(reason, detail)
}

pub fn shape(site: &CallSite) -> Shaped {
    let shaped = match &site.call {
        Call::Invocation {
            method,
            generic_args,
            args,
        } => shape_invocation(method, generic_args, args),
        Call::PatchAttribute(target) => shape_patch_target(target),
    };
    trace!(location = %site.location, ?shaped, "shaped call site");
    shaped
}

fn shape_invocation(method: &str, generic_args: &[TypeArg], args: &[Argument]) -> Shaped {
    if FIELD_REF_ACCESS.contains(&method) {
        return field_ref_access(generic_args, args);
    }
    let Some(flags) = decompose(method) else {
        return Ok(None);
    };
    if flags.contains(LookupFlags::CONSTRUCTOR) {
        return constructor_lookup(args);
    }

    let Some((owners, member, rest)) = owner_and_member(args)? else {
        return Ok(None);
    };
    let mut query = MemberQuery::new(owners[0].clone(), flags.member_kind(), member)
        .with_owner_candidates(owners);
    if !flags.searches_base() {
        query = query.declared();
    }
    if let Some(accessor) = flags.accessor() {
        query = query.with_accessor(accessor);
    }
    if query.kind == MemberKind::Method {
        if let Some(types) = rest.first().map(param_types).transpose()?.flatten() {
            query = query.with_params(ParamSignature::from_types(types));
        }
    }
    Ok(Some(vec![query]))
}

// =============================================================================
// Argument Shapes
// =============================================================================

/// `(Type, "name", ..)` or `("Type:name", ..)`. Returns the owner candidates,
/// the member name and the remaining arguments.
fn owner_and_member(args: &[Argument]) -> Result<Option<(Vec<OwnerRef>, String, &[Argument])>, Inconclusive> {
    match args {
        [Argument::Type(owner), name, rest @ ..] => {
            let name = match name {
                Argument::String(name) => name.clone(),
                Argument::NonConstant => {
                    return Err(inconclusive(InconclusiveReason::NonConstantArgument, "member name"));
                }
                _ => return Ok(None),
            };
            Ok(Some((owners(owner)?, name, rest)))
        }
        [Argument::String(qualified), rest @ ..] => {
            let (owner, member) = split_qualified(qualified)?;
            Ok(Some((vec![OwnerRef::Name(owner)], member, rest)))
        }
        [Argument::NonConstant, ..] => Err(inconclusive(InconclusiveReason::NonConstantArgument, "owner")),
        _ => Ok(None),
    }
}

fn owners(owner: &TypeArg) -> Result<Vec<OwnerRef>, Inconclusive> {
    let candidates = owner.owner_candidates();
    if candidates.is_empty() {
        let TypeArg::Parameter { parameter, .. } = owner else {
            return Ok(candidates);
        };
        return Err(inconclusive(
            InconclusiveReason::UnconstrainedTypeParameter,
            parameter.clone(),
        ));
    }
    Ok(candidates)
}

/// Splits `Ns.Type:member`.
fn split_qualified(text: &str) -> Result<(String, String), Inconclusive> {
    match text.split_once(':') {
        Some((owner, member)) if !owner.trim().is_empty() && !member.trim().is_empty() && !member.contains(':') => {
            Ok((owner.trim().to_string(), member.trim().to_string()))
        }
        _ => Err(inconclusive(
            InconclusiveReason::UnrecognizedShape,
            format!("malformed member reference `{text}`"),
        )),
    }
}

/// Parameter types of a `Type[]` argument; `None` when the argument is
/// `null` (no filtering).
fn param_types(arg: &Argument) -> Result<Option<Vec<TypeDescriptor>>, Inconclusive> {
    match arg {
        Argument::Null => Ok(None),
        Argument::TypeArray(types) => types
            .iter()
            .map(|ty| {
                ty.descriptor().cloned().ok_or_else(|| {
                    inconclusive(InconclusiveReason::NonConstantArgument, "open type parameter in parameter list")
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        _ => Err(inconclusive(InconclusiveReason::NonConstantArgument, "parameter types")),
    }
}

/// `(Type | "Type", [Type[] params], [bool searchForStatic])`.
fn constructor_lookup(args: &[Argument]) -> Shaped {
    let (owners, rest) = match args {
        [Argument::Type(owner), rest @ ..] => (owners(owner)?, rest),
        [Argument::String(name), rest @ ..] => {
            if name.trim().is_empty() || name.contains(':') {
                return Err(inconclusive(
                    InconclusiveReason::UnrecognizedShape,
                    format!("malformed type name `{name}`"),
                ));
            }
            (vec![OwnerRef::Name(name.trim().to_string())], rest)
        }
        [Argument::NonConstant, ..] => {
            return Err(inconclusive(InconclusiveReason::NonConstantArgument, "constructor owner"));
        }
        _ => return Ok(None),
    };
    let params = rest.first().map(param_types).transpose()?.flatten();
    let is_static = match rest.get(1) {
        None | Some(Argument::Null) => false,
        Some(Argument::Bool(value)) => *value,
        Some(_) => {
            return Err(inconclusive(InconclusiveReason::NonConstantArgument, "searchForStatic"));
        }
    };
    let mut query = MemberQuery::constructor(owners[0].clone(), is_static).with_owner_candidates(owners);
    if let Some(params) = params {
        query = query.with_params(ParamSignature::from_types(params));
    }
    Ok(Some(vec![query]))
}

/// `FieldRefAccess<TOwner, TField>("name")`, `FieldRefAccess<TField>(Type,
/// "name")` and `FieldRefAccess<TField>("Type:name")`.
fn field_ref_access(generic_args: &[TypeArg], args: &[Argument]) -> Shaped {
    let Some(field_type) = generic_args.last() else {
        return Ok(None);
    };
    let field_type = field_type.descriptor().cloned().ok_or_else(|| {
        inconclusive(InconclusiveReason::UnconstrainedTypeParameter, "field type")
    })?;
    let (owners, member) = match (generic_args, args) {
        ([owner, _], [name, ..]) => match name {
            Argument::String(name) => (owners(owner)?, name.clone()),
            Argument::NonConstant => {
                return Err(inconclusive(InconclusiveReason::NonConstantArgument, "field name"));
            }
            _ => return Ok(None),
        },
        ([_], args) => match owner_and_member(args)? {
            Some((owners, member, _)) => (owners, member),
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    let query = MemberQuery::field(owners[0].clone(), member)
        .with_owner_candidates(owners)
        .with_field_type(field_type);
    Ok(Some(vec![query]))
}

// =============================================================================
// Patch Attributes
// =============================================================================

fn shape_patch_target(target: &PatchTarget) -> Shaped {
    let owners = match &target.owner {
        Some(Argument::Type(owner)) => owners(owner)?,
        Some(Argument::String(name)) if !name.trim().is_empty() => vec![OwnerRef::Name(name.trim().to_string())],
        Some(Argument::NonConstant) => {
            return Err(inconclusive(InconclusiveReason::NonConstantArgument, "patch owner"));
        }
        _ => return Ok(None),
    };
    let member = match &target.member {
        Some(Argument::String(name)) => Some(name.clone()),
        Some(Argument::NonConstant) => {
            return Err(inconclusive(InconclusiveReason::NonConstantArgument, "patch member"));
        }
        _ => None,
    };
    let params = patch_params(target)?;
    let owner = owners[0].clone();
    let with_owners = |query: MemberQuery| query.with_owner_candidates(owners.clone());
    let with_params = |query: MemberQuery| match &params {
        Some(params) => query.with_params(params.clone()),
        None => query,
    };

    let queries = match (target.method_type, member) {
        (MethodType::Constructor, _) => vec![with_params(with_owners(MemberQuery::constructor(owner, false)))],
        (MethodType::StaticConstructor, _) => vec![with_owners(MemberQuery::constructor(owner, true))],
        (_, None) => return Ok(None),
        (MethodType::Normal, Some(member)) => {
            let method = with_params(with_owners(MemberQuery::method(owner, member)));
            vec![
                method.with_kind(MemberKind::Field),
                method.with_kind(MemberKind::Property),
                method,
            ]
        }
        (MethodType::Getter | MethodType::Setter, Some(member)) => {
            let accessor = if target.method_type == MethodType::Getter {
                Accessor::Getter
            } else {
                Accessor::Setter
            };
            vec![with_owners(MemberQuery::property(owner, member)).with_accessor(accessor)]
        }
        (MethodType::Enumerator | MethodType::Async, Some(member)) => {
            vec![with_params(with_owners(MemberQuery::method(owner, member)))]
        }
    };
    Ok(Some(queries))
}

fn patch_params(target: &PatchTarget) -> Result<Option<ParamSignature>, Inconclusive> {
    let Some(types) = target.argument_types.as_ref().map(param_types).transpose()?.flatten() else {
        return Ok(None);
    };
    match &target.argument_modes {
        None => Ok(Some(ParamSignature::from_types(types))),
        Some(modes) => ParamSignature::with_modes(types, modes.clone())
            .map(Some)
            .ok_or_else(|| {
                inconclusive(
                    InconclusiveReason::UnrecognizedShape,
                    "argument types and modes differ in length",
                )
            }),
    }
}

#[cfg(test)]
#[path = "../tests/shape_tests.rs"]
mod tests;
