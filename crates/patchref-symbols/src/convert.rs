//! Conversion between symbol types and the Signature Type Model.
//!
//! Symbol descriptors must render exactly like the descriptors the metadata
//! decoder produces for the same type, since outcomes from both backends are
//! compared by canonical string.

use crate::table::{ParameterSymbol, RefKind, SymbolTable, SymbolType, TypeId};
use patchref_model::{ByRefKind, CandidateParam, ReflectionName, TypeDescriptor};

impl SymbolTable {
    pub fn to_descriptor(&self, ty: &SymbolType) -> TypeDescriptor {
        match ty {
            SymbolType::Primitive(primitive) => TypeDescriptor::from_primitive(*primitive),
            SymbolType::Named { id, args } => self
                .descriptor(*id)
                .with_generic(args.iter().map(|arg| self.to_descriptor(arg)).collect()),
            SymbolType::External { descriptor, .. } => descriptor.clone(),
            SymbolType::Array { element, shape } => self.to_descriptor(element).with_array(shape.clone()),
            SymbolType::Pointer(element) => self.to_descriptor(element).with_pointer(),
            SymbolType::TypeParameter { owner, index } => TypeDescriptor::GenericParameter {
                owner: *owner,
                index: *index,
            },
            SymbolType::FunctionPointer {
                return_type,
                params,
                required_count,
            } => TypeDescriptor::function_pointer(
                self.to_descriptor(return_type),
                params.iter().map(|param| self.to_descriptor(param)).collect(),
                *required_count,
            ),
        }
    }

    /// Binds a descriptor against the declared types. Names not declared here
    /// become `External`; `assembly` is recorded for them.
    pub fn bind_descriptor(&self, descriptor: &TypeDescriptor, assembly: Option<&str>) -> SymbolType {
        let external = || SymbolType::External {
            assembly: assembly.map(str::to_string),
            descriptor: descriptor.clone(),
        };
        match descriptor {
            TypeDescriptor::Primitive(primitive) => SymbolType::Primitive(*primitive),
            TypeDescriptor::Named(_) | TypeDescriptor::Nested { .. } => {
                match self.find_declared(descriptor, assembly) {
                    Some(id) => SymbolType::named(id),
                    None => external(),
                }
            }
            TypeDescriptor::Generic { open, args } => match self.find_declared(open, assembly) {
                Some(id) => SymbolType::generic(
                    id,
                    args.iter().map(|arg| self.bind_descriptor(arg, None)).collect(),
                ),
                None => external(),
            },
            TypeDescriptor::Array { element, shape } => SymbolType::Array {
                element: Box::new(self.bind_descriptor(element, None)),
                shape: shape.clone(),
            },
            TypeDescriptor::Pointer(element) => self.bind_descriptor(element, None).pointer(),
            TypeDescriptor::GenericParameter { owner, index } => SymbolType::TypeParameter {
                owner: *owner,
                index: *index,
            },
            TypeDescriptor::FunctionPointer {
                return_type,
                params,
                required_count,
            } => SymbolType::FunctionPointer {
                return_type: Box::new(self.bind_descriptor(return_type, None)),
                params: params.iter().map(|param| self.bind_descriptor(param, None)).collect(),
                required_count: *required_count,
            },
            TypeDescriptor::ByRef(_) | TypeDescriptor::Pinned(_) => external(),
        }
    }

    fn find_declared(&self, descriptor: &TypeDescriptor, assembly: Option<&str>) -> Option<TypeId> {
        let name = ReflectionName::from_descriptor(descriptor)?;
        match assembly {
            Some(assembly) => self.get_type_in_assembly(assembly, &name),
            None => self.get_type_by_metadata_name(&name.to_string()),
        }
    }

    /// Parameter as the overload matcher sees it, with `type_args`
    /// substituted. By-reference parameters carry the byref wrapper.
    pub fn candidate_param(&self, param: &ParameterSymbol, type_args: &[TypeDescriptor]) -> CandidateParam {
        let ty = self.to_descriptor(&param.ty).substitute(type_args, &[]);
        let by_ref = match param.ref_kind {
            RefKind::None => None,
            RefKind::Ref => Some(ByRefKind::Ref),
            RefKind::Out => Some(ByRefKind::Out),
            RefKind::In | RefKind::RefReadOnlyParameter => Some(ByRefKind::ReadOnly),
        };
        CandidateParam {
            ty: if by_ref.is_some() { ty.with_by_ref() } else { ty },
            by_ref,
        }
    }
}

#[cfg(test)]
#[path = "../tests/convert_tests.rs"]
mod tests;
