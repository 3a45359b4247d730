//! Serialized form of bound symbols.
//!
//! Hosts describe the types their compiler bound as a list of
//! `TypeDeclaration`s; `SymbolTable::from_declarations` links them into an
//! arena. Type references are written as descriptor strings
//! (`Game.Box<System.Int32>`, `System.String[]`, `!0`).

use crate::table::{MemberSymbol, MethodKind, ParameterSymbol, RefKind, SymbolTable, TypeId, TypeSymbol};
use patchref_model::{ReflectionName, TypeDescriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("invalid type name `{0}`")]
    InvalidTypeName(String),
    #[error("type `{name}` is declared twice in assembly `{assembly}`")]
    DuplicateType { assembly: String, name: String },
    #[error("containing type of `{0}` is not declared before it")]
    MissingContainingType(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    pub assembly: String,
    /// Metadata name, e.g. `Game.Player`, `Game.Box`1` or `Game.Player+Inventory`.
    pub name: String,
    #[serde(default)]
    pub base: Option<BaseDeclaration>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDeclaration>,
    #[serde(default)]
    pub static_constructor: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseDeclaration {
    /// Assembly declaring the base; defaults to the derived type's assembly.
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default = "yes")]
    pub getter: bool,
    #[serde(default = "yes")]
    pub setter: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParameterDeclaration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDeclaration {
    #[serde(default)]
    pub params: Vec<ParameterDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDeclaration {
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub ref_kind: RefKind,
}

impl SymbolTable {
    /// Links declarations into a table. Types are registered first so members
    /// and bases may reference types declared later in the list.
    pub fn from_declarations(declarations: &[TypeDeclaration]) -> Result<Self, SymbolError> {
        let mut table = SymbolTable::new();
        let mut ids = Vec::with_capacity(declarations.len());
        for decl in declarations {
            let name = ReflectionName::parse(&decl.name)
                .ok_or_else(|| SymbolError::InvalidTypeName(decl.name.clone()))?;
            if table.get_type_in_assembly(&decl.assembly, &name).is_some_and(|id| {
                table.full_metadata_name(id) == name.to_string()
            }) {
                return Err(SymbolError::DuplicateType {
                    assembly: decl.assembly.clone(),
                    name: decl.name.clone(),
                });
            }
            ids.push(register(&mut table, &decl.assembly, &name)?);
        }

        for (decl, id) in declarations.iter().zip(ids) {
            let assembly = decl.assembly.as_str();
            let base = decl.base.as_ref().map(|base| {
                let base_assembly = base.assembly.as_deref().unwrap_or(assembly);
                table.bind_descriptor(&base.ty, Some(base_assembly))
            });
            let members = declared_members(&table, decl);
            if let Some(symbol) = table.get_mut(id) {
                symbol.base_type = base;
                symbol.members = members;
            }
        }
        debug!(types = table.len(), "symbol table linked");
        Ok(table)
    }
}

fn split_arity(name: &str) -> (String, u32) {
    match name.rsplit_once('`') {
        Some((plain, arity)) => match arity.parse() {
            Ok(arity) => (plain.to_string(), arity),
            Err(_) => (name.to_string(), 0),
        },
        None => (name.to_string(), 0),
    }
}

fn register(
    table: &mut SymbolTable,
    assembly: &str,
    name: &ReflectionName,
) -> Result<TypeId, SymbolError> {
    let Some((local, enclosing)) = name.nested.split_last() else {
        let (plain, arity) = split_arity(&name.name);
        return Ok(table.add_type(TypeSymbol::new(assembly, name.namespace.clone(), plain).with_arity(arity)));
    };
    let outer = ReflectionName {
        namespace: name.namespace.clone(),
        name: name.name.clone(),
        nested: enclosing.to_vec(),
    };
    let containing = table
        .get_type_in_assembly(assembly, &outer)
        .ok_or_else(|| SymbolError::MissingContainingType(name.to_string()))?;
    let (plain, arity) = split_arity(local);
    Ok(table.add_nested(containing, TypeSymbol::new(assembly, "", plain).with_arity(arity)))
}

fn parameters(table: &SymbolTable, params: &[ParameterDeclaration]) -> Vec<ParameterSymbol> {
    params
        .iter()
        .map(|param| {
            // `T&` without an explicit kind is a plain `ref`.
            let (ty, ref_kind) = match (&param.ty, param.ref_kind) {
                (TypeDescriptor::ByRef(inner), RefKind::None) => (inner.as_ref(), RefKind::Ref),
                (TypeDescriptor::ByRef(inner), kind) => (inner.as_ref(), kind),
                (ty, kind) => (ty, kind),
            };
            ParameterSymbol::by_ref(table.bind_descriptor(ty, None), ref_kind)
        })
        .collect()
}

fn declared_members(table: &SymbolTable, decl: &TypeDeclaration) -> Vec<MemberSymbol> {
    let mut members = Vec::new();
    for field in &decl.fields {
        members.push(MemberSymbol::Field {
            name: field.name.clone(),
            ty: table.bind_descriptor(&field.ty, None),
        });
    }
    for property in &decl.properties {
        members.push(MemberSymbol::Property {
            name: property.name.clone(),
            ty: table.bind_descriptor(&property.ty, None),
            has_getter: property.getter,
            has_setter: property.setter,
        });
    }
    for method in &decl.methods {
        members.push(MemberSymbol::Method {
            name: method.name.clone(),
            kind: MethodKind::Ordinary,
            params: parameters(table, &method.params),
        });
    }
    for ctor in &decl.constructors {
        members.push(MemberSymbol::Method {
            name: ".ctor".to_string(),
            kind: MethodKind::Constructor,
            params: parameters(table, &ctor.params),
        });
    }
    if decl.static_constructor {
        members.push(MemberSymbol::Method {
            name: ".cctor".to_string(),
            kind: MethodKind::StaticConstructor,
            params: Vec::new(),
        });
    }
    members
}

#[cfg(test)]
#[path = "../tests/decl_tests.rs"]
mod tests;
