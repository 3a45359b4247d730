//! Symbol arena.
//!
//! `SymbolTable` owns every type symbol the host compiler bound for the
//! analyzed solution. Types reference each other by `TypeId`; types that live
//! only in referenced binaries appear as `SymbolType::External`.

use patchref_model::{ArrayShape, GenericParamOwner, PrimitiveType, ReflectionName, TypeDescriptor};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// TypeId
// =============================================================================

/// Index of a type symbol in its `SymbolTable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Symbol Types
// =============================================================================

/// A type as it occurs in a member signature or base list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolType {
    Primitive(PrimitiveType),
    /// A type declared in this table, possibly instantiated.
    Named { id: TypeId, args: Vec<SymbolType> },
    /// A type known only by name. `assembly` is set for base types so the
    /// walk can continue in binary metadata.
    External {
        assembly: Option<String>,
        descriptor: TypeDescriptor,
    },
    Array {
        element: Box<SymbolType>,
        shape: ArrayShape,
    },
    Pointer(Box<SymbolType>),
    TypeParameter { owner: GenericParamOwner, index: u32 },
    FunctionPointer {
        return_type: Box<SymbolType>,
        params: Vec<SymbolType>,
        required_count: u32,
    },
}

impl SymbolType {
    pub fn named(id: TypeId) -> Self {
        SymbolType::Named { id, args: Vec::new() }
    }

    pub fn generic(id: TypeId, args: Vec<SymbolType>) -> Self {
        SymbolType::Named { id, args }
    }

    pub fn external(assembly: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        SymbolType::External {
            assembly: Some(assembly.into()),
            descriptor,
        }
    }

    pub fn type_parameter(index: u32) -> Self {
        SymbolType::TypeParameter {
            owner: GenericParamOwner::Type,
            index,
        }
    }

    pub fn method_parameter(index: u32) -> Self {
        SymbolType::TypeParameter {
            owner: GenericParamOwner::Method,
            index,
        }
    }

    pub fn sz_array(self) -> Self {
        SymbolType::Array {
            element: Box::new(self),
            shape: ArrayShape::Vector,
        }
    }

    pub fn pointer(self) -> Self {
        SymbolType::Pointer(Box::new(self))
    }
}

impl From<PrimitiveType> for SymbolType {
    fn from(value: PrimitiveType) -> Self {
        SymbolType::Primitive(value)
    }
}

/// How a parameter is passed, as the compiler binds it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
    RefReadOnlyParameter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    StaticConstructor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSymbol {
    pub ty: SymbolType,
    pub ref_kind: RefKind,
}

impl ParameterSymbol {
    pub fn new(ty: impl Into<SymbolType>) -> Self {
        Self {
            ty: ty.into(),
            ref_kind: RefKind::None,
        }
    }

    pub fn by_ref(ty: impl Into<SymbolType>, ref_kind: RefKind) -> Self {
        Self {
            ty: ty.into(),
            ref_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberSymbol {
    Field {
        name: String,
        ty: SymbolType,
    },
    Property {
        name: String,
        ty: SymbolType,
        has_getter: bool,
        has_setter: bool,
    },
    Method {
        name: String,
        kind: MethodKind,
        params: Vec<ParameterSymbol>,
    },
}

impl MemberSymbol {
    pub fn name(&self) -> &str {
        match self {
            MemberSymbol::Field { name, .. }
            | MemberSymbol::Property { name, .. }
            | MemberSymbol::Method { name, .. } => name,
        }
    }
}

// =============================================================================
// Type Symbols
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSymbol {
    pub assembly: String,
    /// Empty for nested types.
    pub namespace: String,
    /// Name without the arity marker.
    pub name: String,
    pub arity: u32,
    pub containing_type: Option<TypeId>,
    pub base_type: Option<SymbolType>,
    pub members: Vec<MemberSymbol>,
}

impl TypeSymbol {
    pub fn new(assembly: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            namespace: namespace.into(),
            name: name.into(),
            arity: 0,
            containing_type: None,
            base_type: None,
            members: Vec::new(),
        }
    }

    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_base(mut self, base: SymbolType) -> Self {
        self.base_type = Some(base);
        self
    }

    pub fn with_field(mut self, name: &str, ty: impl Into<SymbolType>) -> Self {
        self.members.push(MemberSymbol::Field {
            name: name.to_string(),
            ty: ty.into(),
        });
        self
    }

    pub fn with_property(mut self, name: &str, ty: impl Into<SymbolType>, getter: bool, setter: bool) -> Self {
        self.members.push(MemberSymbol::Property {
            name: name.to_string(),
            ty: ty.into(),
            has_getter: getter,
            has_setter: setter,
        });
        self
    }

    pub fn with_method(mut self, name: &str, params: Vec<ParameterSymbol>) -> Self {
        self.members.push(MemberSymbol::Method {
            name: name.to_string(),
            kind: MethodKind::Ordinary,
            params,
        });
        self
    }

    pub fn with_constructor(mut self, params: Vec<ParameterSymbol>) -> Self {
        self.members.push(MemberSymbol::Method {
            name: ".ctor".to_string(),
            kind: MethodKind::Constructor,
            params,
        });
        self
    }

    pub fn with_static_constructor(mut self) -> Self {
        self.members.push(MemberSymbol::Method {
            name: ".cctor".to_string(),
            kind: MethodKind::StaticConstructor,
            params: Vec::new(),
        });
        self
    }

    /// Name with its arity marker, as written in metadata.
    pub fn metadata_name(&self) -> String {
        if self.arity == 0 {
            self.name.clone()
        } else {
            format!("{}`{}", self.name, self.arity)
        }
    }

    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MemberSymbol> + 'a {
        self.members.iter().filter(move |member| member.name() == name)
    }
}

// =============================================================================
// SymbolTable
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeSymbol>,
    /// Full metadata name (`Ns.Outer+Inner`) to ids, in declaration order.
    by_name: FxHashMap<String, Vec<TypeId>>,
    /// Same, keyed by the arity-stripped name.
    by_plain_name: FxHashMap<String, Vec<TypeId>>,
    /// Lowercase assembly names with at least one declared type.
    assemblies: FxHashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type symbol. A nested type must be added after its containing
    /// type.
    pub fn add_type(&mut self, symbol: TypeSymbol) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let assembly_key = symbol.assembly.to_ascii_lowercase();
        self.types.push(symbol);
        let full_name = self.full_metadata_name(id);
        let plain = patchref_model::strip_generic_arity(&full_name);
        self.by_name.entry(full_name).or_default().push(id);
        self.by_plain_name.entry(plain).or_default().push(id);
        *self.assemblies.entry(assembly_key).or_default() += 1;
        id
    }

    /// Adds `symbol` nested inside `containing`.
    pub fn add_nested(&mut self, containing: TypeId, mut symbol: TypeSymbol) -> TypeId {
        symbol.containing_type = Some(containing);
        symbol.namespace.clear();
        self.add_type(symbol)
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeSymbol> {
        self.types.get(id.index())
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut TypeSymbol> {
        self.types.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// True if any declared type belongs to `assembly`.
    pub fn knows_assembly(&self, assembly: &str) -> bool {
        self.assemblies.contains_key(&assembly.to_ascii_lowercase())
    }

    /// `Ns.Outer+Inner` with arity markers.
    pub fn full_metadata_name(&self, id: TypeId) -> String {
        let Some(symbol) = self.get(id) else {
            return String::new();
        };
        match symbol.containing_type {
            Some(outer) => format!("{}+{}", self.full_metadata_name(outer), symbol.metadata_name()),
            None if symbol.namespace.is_empty() => symbol.metadata_name(),
            None => format!("{}.{}", symbol.namespace, symbol.metadata_name()),
        }
    }

    /// Open descriptor of a declared type.
    pub fn descriptor(&self, id: TypeId) -> TypeDescriptor {
        let Some(symbol) = self.get(id) else {
            return TypeDescriptor::named(String::new());
        };
        match symbol.containing_type {
            Some(outer) => TypeDescriptor::nested(self.descriptor(outer), symbol.metadata_name()),
            None => TypeDescriptor::qualified(&symbol.namespace, &symbol.metadata_name()),
        }
    }

    /// Looks a type up by its metadata name. A name without arity marker also
    /// matches a generic type when no exact match exists. The first declared
    /// type wins when several assemblies declare the same name.
    pub fn get_type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        let name = ReflectionName::parse(name)?;
        self.lookup(&name, |_| true)
    }

    pub fn get_type_in_assembly(&self, assembly: &str, name: &ReflectionName) -> Option<TypeId> {
        self.lookup(name, |symbol| symbol.assembly.eq_ignore_ascii_case(assembly))
    }

    fn lookup(&self, name: &ReflectionName, accept: impl Fn(&TypeSymbol) -> bool) -> Option<TypeId> {
        let full = name.to_string();
        let accepted = |ids: Option<&Vec<TypeId>>| {
            ids.into_iter()
                .flatten()
                .copied()
                .find(|&id| self.get(id).is_some_and(&accept))
        };
        if let Some(id) = accepted(self.by_name.get(&full)) {
            return Some(id);
        }
        if full.contains('`') {
            return None;
        }
        accepted(self.by_plain_name.get(&full))
    }
}

#[cfg(test)]
#[path = "../tests/table_tests.rs"]
mod tests;
