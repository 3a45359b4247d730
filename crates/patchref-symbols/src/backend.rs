//! Symbol resolution backend.
//!
//! Answers queries from the symbols the host compiler bound. A base type that
//! lives outside the table (`SymbolType::External`) ends the walk with
//! `Search::Continue` so the dispatcher can read it from binary metadata.

use crate::table::{MemberSymbol, MethodKind, SymbolTable, SymbolType, TypeId};
use patchref_common::limits::DEFAULT_MAX_BASE_DEPTH;
use patchref_model::{
    Accessor, CandidateParam, Inconclusive, MemberKind, MemberQuery, OwnerRef, ResolutionBackend,
    ResolutionOutcome, Search, TypeDescriptor, TypeIdentity, TypeLookup,
};
use tracing::trace;

/// A declared type instantiated with `type_args`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolHandle {
    pub id: TypeId,
    pub type_args: Vec<TypeDescriptor>,
}

pub struct SymbolBackend<'a> {
    table: &'a SymbolTable,
    max_base_depth: u32,
}

impl<'a> SymbolBackend<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            max_base_depth: DEFAULT_MAX_BASE_DEPTH,
        }
    }

    pub fn with_max_base_depth(mut self, depth: u32) -> Self {
        self.max_base_depth = depth;
        self
    }

    pub fn table(&self) -> &SymbolTable {
        self.table
    }

    fn descriptor(&self, handle: &SymbolHandle) -> TypeDescriptor {
        self.table.descriptor(handle.id).with_generic(handle.type_args.clone())
    }

    fn search_declared(
        &self,
        handle: &SymbolHandle,
        query: &MemberQuery,
        owner_name: &str,
    ) -> Option<ResolutionOutcome> {
        let symbol = self.table.get(handle.id)?;
        let args = handle.type_args.as_slice();
        for member in symbol.members_named(&query.member_name) {
            match (query.kind, member) {
                (MemberKind::Field, MemberSymbol::Field { ty, .. }) => {
                    if let Some(expected) = &query.field_type {
                        let actual = self.table.to_descriptor(ty).substitute(args, &[]);
                        if !actual.same_type(expected) {
                            return Some(ResolutionOutcome::WrongFieldType {
                                owner: owner_name.to_string(),
                                expected: expected.canonical_string(),
                                actual: actual.canonical_string(),
                            });
                        }
                    }
                    return Some(ResolutionOutcome::Found);
                }
                (
                    MemberKind::Property,
                    MemberSymbol::Property {
                        has_getter,
                        has_setter,
                        ..
                    },
                ) => {
                    let member_name = query.member_name.clone();
                    return Some(match query.accessor {
                        Some(Accessor::Getter) if !has_getter => {
                            ResolutionOutcome::MissingGetter { member_name }
                        }
                        Some(Accessor::Setter) if !has_setter => {
                            ResolutionOutcome::MissingSetter { member_name }
                        }
                        _ => ResolutionOutcome::Found,
                    });
                }
                (kind, MemberSymbol::Method { kind: method_kind, params, .. })
                    if method_kind_matches(kind, *method_kind) =>
                {
                    let Some(signature) = &query.param_signature else {
                        return Some(ResolutionOutcome::Found);
                    };
                    let candidate: Vec<CandidateParam> = params
                        .iter()
                        .map(|param| self.table.candidate_param(param, args))
                        .collect();
                    if signature.matches(&candidate) {
                        return Some(ResolutionOutcome::Found);
                    }
                    trace!(member = %query.member_name, "overload rejected by signature");
                }
                _ => {}
            }
        }
        if query.kind == MemberKind::Method {
            return self.accessor_method(handle, query);
        }
        None
    }

    /// Compiled property accessors (`get_X`, `set_X`) are methods in
    /// metadata; symbols keep them on the property.
    fn accessor_method(&self, handle: &SymbolHandle, query: &MemberQuery) -> Option<ResolutionOutcome> {
        let symbol = self.table.get(handle.id)?;
        let (property, is_getter) = match query.member_name.split_once('_')? {
            ("get", property) => (property, true),
            ("set", property) => (property, false),
            _ => return None,
        };
        symbol.members_named(property).find_map(|member| {
            let MemberSymbol::Property {
                ty,
                has_getter,
                has_setter,
                ..
            } = member
            else {
                return None;
            };
            let params = match (is_getter, *has_getter, *has_setter) {
                (true, true, _) => Vec::new(),
                (false, _, true) => vec![CandidateParam::from_signature(
                    self.table.to_descriptor(ty).substitute(&handle.type_args, &[]),
                )],
                _ => return None,
            };
            match &query.param_signature {
                Some(signature) if !signature.matches(&params) => None,
                _ => Some(ResolutionOutcome::Found),
            }
        })
    }
}

fn method_kind_matches(query: MemberKind, symbol: MethodKind) -> bool {
    matches!(
        (query, symbol),
        (MemberKind::Method, MethodKind::Ordinary)
            | (MemberKind::Constructor, MethodKind::Constructor)
            | (MemberKind::StaticConstructor, MethodKind::StaticConstructor)
    )
}

enum Base {
    None,
    Declared(SymbolHandle),
    External(OwnerRef),
}

impl SymbolBackend<'_> {
    fn base_type(&self, handle: &SymbolHandle) -> Base {
        let Some(base) = self.table.get(handle.id).and_then(|symbol| symbol.base_type.as_ref()) else {
            return Base::None;
        };
        match base {
            SymbolType::Named { id, args } => Base::Declared(SymbolHandle {
                id: *id,
                type_args: args
                    .iter()
                    .map(|arg| self.table.to_descriptor(arg).substitute(&handle.type_args, &[]))
                    .collect(),
            }),
            SymbolType::External {
                assembly,
                descriptor,
            } => {
                let descriptor = descriptor.substitute(&handle.type_args, &[]);
                Base::External(match assembly {
                    Some(assembly) => OwnerRef::Bound(TypeIdentity::new(assembly.clone(), descriptor)),
                    None => OwnerRef::Name(descriptor.to_string_with(false)),
                })
            }
            _ => Base::None,
        }
    }
}

impl ResolutionBackend for SymbolBackend<'_> {
    type Handle = SymbolHandle;

    fn name(&self) -> &'static str {
        "symbols"
    }

    fn find_type(&self, owner: &OwnerRef) -> Result<TypeLookup<SymbolHandle>, Inconclusive> {
        let found = match owner {
            OwnerRef::Bound(identity) => {
                let Some(name) = owner.reflection_name() else {
                    return Ok(TypeLookup::NotFound);
                };
                match self.table.get_type_in_assembly(&identity.assembly, &name) {
                    Some(id) => id,
                    None if self.table.knows_assembly(&identity.assembly) => {
                        return Ok(TypeLookup::NotFound);
                    }
                    None => {
                        return Ok(TypeLookup::AssemblyNotFound {
                            assembly: identity.assembly.clone(),
                        });
                    }
                }
            }
            OwnerRef::Name(name) => match self.table.get_type_by_metadata_name(name) {
                Some(id) => id,
                None => return Ok(TypeLookup::NotFound),
            },
        };
        Ok(TypeLookup::Found(SymbolHandle {
            id: found,
            type_args: owner.type_arguments().to_vec(),
        }))
    }

    fn find_member(
        &self,
        ty: &SymbolHandle,
        query: &MemberQuery,
        depth: u32,
    ) -> Result<Search, Inconclusive> {
        let owner_name = self.descriptor(ty).canonical_string();
        let mut current = ty.clone();
        let mut depth = depth;
        loop {
            if let Some(outcome) = self.search_declared(&current, query, &owner_name) {
                return Ok(Search::Done(outcome));
            }
            if !query.walks_base_types() || depth >= self.max_base_depth {
                break;
            }
            match self.base_type(&current) {
                Base::None => break,
                Base::Declared(base) => current = base,
                Base::External(base) => {
                    trace!(%base, "base type outside the symbol table");
                    return Ok(Search::Continue {
                        base,
                        depth: depth + 1,
                    });
                }
            }
            depth += 1;
        }
        Ok(Search::Done(query.not_found(&owner_name)))
    }
}

#[cfg(test)]
#[path = "../tests/backend_tests.rs"]
mod tests;
