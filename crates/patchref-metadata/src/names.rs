//! Metadata name formatter.
//!
//! Turns handles of one image into descriptors and `Owner:member` strings.
//! References into other assemblies are named only; opening the target image
//! is the backend's job.

use crate::error::{MetadataError, Result};
use crate::image::MetadataImage;
use crate::signature::{MethodSignature, SignatureDecoder, TypeHandleProvider};
use crate::tables::{CodedIndex, MetadataToken, TableId, col};
use patchref_common::limits::{MAX_NESTING_DEPTH, MAX_SIGNATURE_DEPTH};
use patchref_model::TypeDescriptor;

/// Where a TypeRef points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRefScope {
    /// Defined in this module.
    Module,
    /// Defined in another module of this assembly.
    ModuleRef(String),
    /// Defined in another assembly.
    Assembly(String),
}

pub struct NameFormatter<'a> {
    image: &'a MetadataImage,
}

impl<'a> NameFormatter<'a> {
    pub fn new(image: &'a MetadataImage) -> Self {
        Self { image }
    }

    pub fn decoder(&self) -> SignatureDecoder<'_, Self> {
        SignatureDecoder::new(self)
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn type_def(&self, row: u32) -> Result<TypeDescriptor> {
        self.type_def_nested(row, 0)
    }

    fn type_def_nested(&self, row: u32, depth: u32) -> Result<TypeDescriptor> {
        if depth > MAX_NESTING_DEPTH {
            return Err(MetadataError::Malformed(format!(
                "nesting of TypeDef {row} exceeds {MAX_NESTING_DEPTH}"
            )));
        }
        let image = self.image;
        let name = image.read_string(TableId::TypeDef, row, col::TYPEDEF_NAME)?;
        match image.enclosing_type(row)? {
            Some(enclosing) => Ok(TypeDescriptor::nested(
                self.type_def_nested(enclosing, depth + 1)?,
                name,
            )),
            None => {
                let namespace = image.read_string(TableId::TypeDef, row, col::TYPEDEF_NAMESPACE)?;
                Ok(TypeDescriptor::qualified(namespace, name))
            }
        }
    }

    pub fn type_ref(&self, row: u32) -> Result<TypeDescriptor> {
        self.type_ref_nested(row, 0)
    }

    fn type_ref_nested(&self, row: u32, depth: u32) -> Result<TypeDescriptor> {
        if depth > MAX_NESTING_DEPTH {
            return Err(MetadataError::Malformed(format!(
                "nesting of TypeRef {row} exceeds {MAX_NESTING_DEPTH}"
            )));
        }
        let image = self.image;
        let name = image.read_string(TableId::TypeRef, row, col::TYPEREF_NAME)?;
        let scope = image.read_coded(
            TableId::TypeRef,
            row,
            col::TYPEREF_SCOPE,
            CodedIndex::ResolutionScope,
        )?;
        if scope.table == TableId::TypeRef && !scope.is_null() {
            return Ok(TypeDescriptor::nested(
                self.type_ref_nested(scope.row, depth + 1)?,
                name,
            ));
        }
        let namespace = image.read_string(TableId::TypeRef, row, col::TYPEREF_NAMESPACE)?;
        Ok(TypeDescriptor::qualified(namespace, name))
    }

    /// Scope of a TypeRef, following enclosing TypeRefs to the outermost one.
    pub fn type_ref_scope(&self, row: u32) -> Result<TypeRefScope> {
        let mut row = row;
        for _ in 0..=MAX_NESTING_DEPTH {
            let scope = self.image.read_coded(
                TableId::TypeRef,
                row,
                col::TYPEREF_SCOPE,
                CodedIndex::ResolutionScope,
            )?;
            if scope.is_null() {
                return Ok(TypeRefScope::Module);
            }
            match scope.table {
                TableId::TypeRef => row = scope.row,
                TableId::Module => return Ok(TypeRefScope::Module),
                TableId::ModuleRef => {
                    let name =
                        self.image
                            .read_string(TableId::ModuleRef, scope.row, col::MODULEREF_NAME)?;
                    return Ok(TypeRefScope::ModuleRef(name.to_string()));
                }
                TableId::AssemblyRef => return self.assembly_ref(scope.row).map(TypeRefScope::Assembly),
                other => {
                    return Err(MetadataError::Malformed(format!(
                        "invalid resolution scope {other:?}"
                    )));
                }
            }
        }
        Err(MetadataError::Malformed(format!(
            "TypeRef {row} scope chain exceeds {MAX_NESTING_DEPTH}"
        )))
    }

    pub fn assembly_ref(&self, row: u32) -> Result<String> {
        self.image
            .read_string(TableId::AssemblyRef, row, col::ASSEMBLYREF_NAME)
            .map(str::to_string)
    }

    pub fn type_spec(&self, row: u32, depth: u32) -> Result<TypeDescriptor> {
        let blob = self
            .image
            .read_blob(TableId::TypeSpec, row, col::TYPESPEC_SIGNATURE)?;
        self.decoder().type_spec(blob, depth)
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// `Owner:name` of a MethodDef.
    pub fn method_def(&self, row: u32) -> Result<String> {
        let name = self
            .image
            .read_string(TableId::MethodDef, row, col::METHOD_NAME)?;
        self.declared_member(MetadataToken::new(TableId::MethodDef, row), name)
    }

    /// `Owner:name` of a Field.
    pub fn field_def(&self, row: u32) -> Result<String> {
        let name = self.image.read_string(TableId::Field, row, col::FIELD_NAME)?;
        self.declared_member(MetadataToken::new(TableId::Field, row), name)
    }

    fn declared_member(&self, member: MetadataToken, name: &str) -> Result<String> {
        match self.image.declaring_type(member)? {
            Some(owner) => Ok(format!("{}:{name}", self.type_def(owner)?)),
            None => Ok(name.to_string()),
        }
    }

    /// `Owner:name` of a MemberRef.
    pub fn member_ref(&self, row: u32) -> Result<String> {
        let image = self.image;
        let name = image.read_string(TableId::MemberRef, row, col::MEMBERREF_NAME)?;
        let parent = image.read_coded(
            TableId::MemberRef,
            row,
            col::MEMBERREF_PARENT,
            CodedIndex::MemberRefParent,
        )?;
        let owner = match parent.table {
            TableId::TypeDef | TableId::TypeRef | TableId::TypeSpec => {
                self.type_from_token(parent, 0)?.to_string()
            }
            TableId::MethodDef => return self.method_def(parent.row),
            TableId::ModuleRef => image
                .read_string(TableId::ModuleRef, parent.row, col::MODULEREF_NAME)?
                .to_string(),
            other => {
                return Err(MetadataError::Malformed(format!(
                    "invalid MemberRef parent {other:?}"
                )));
            }
        };
        Ok(format!("{owner}:{name}"))
    }

    /// `Owner:name<A,B>` of a MethodSpec.
    pub fn method_spec(&self, row: u32) -> Result<String> {
        let image = self.image;
        let method = image.read_coded(
            TableId::MethodSpec,
            row,
            col::METHODSPEC_METHOD,
            CodedIndex::MethodDefOrRef,
        )?;
        let base = match method.table {
            TableId::MethodDef => self.method_def(method.row)?,
            _ => self.member_ref(method.row)?,
        };
        let blob = image.read_blob(TableId::MethodSpec, row, col::METHODSPEC_INSTANTIATION)?;
        let args = self.decoder().method_instantiation(blob)?;
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        Ok(format!("{base}<{}>", args.join(",")))
    }

    pub fn field_type(&self, row: u32) -> Result<TypeDescriptor> {
        let blob = self
            .image
            .read_blob(TableId::Field, row, col::FIELD_SIGNATURE)?;
        self.decoder().field(blob)
    }

    pub fn method_signature(&self, row: u32) -> Result<MethodSignature> {
        let blob = self
            .image
            .read_blob(TableId::MethodDef, row, col::METHOD_SIGNATURE)?;
        self.decoder().method(blob)
    }

    pub fn property_signature(&self, row: u32) -> Result<MethodSignature> {
        let blob = self
            .image
            .read_blob(TableId::Property, row, col::PROPERTY_SIGNATURE)?;
        self.decoder().property(blob)
    }
}

impl TypeHandleProvider for NameFormatter<'_> {
    fn type_from_token(&self, token: MetadataToken, depth: u32) -> Result<TypeDescriptor> {
        if depth > MAX_SIGNATURE_DEPTH {
            return Err(MetadataError::SignatureTooDeep(MAX_SIGNATURE_DEPTH));
        }
        match token.table {
            TableId::TypeDef => self.type_def(token.row),
            TableId::TypeRef => self.type_ref(token.row),
            TableId::TypeSpec => self.type_spec(token.row, depth),
            other => Err(MetadataError::Malformed(format!(
                "{other:?} token used as a type"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../tests/names_tests.rs"]
mod tests;
