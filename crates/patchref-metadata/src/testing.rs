//! In-memory assembly writer.
//!
//! Produces minimal but well-formed PE files (or bare metadata roots) from a
//! list of types and members, using the same table layout as the reader.
//! Method bodies, parameters rows and custom attributes are not emitted.

use crate::heaps::{write_compressed_i32, write_compressed_u32};
use crate::signature::{calling_convention, element};
use crate::tables::{CodedIndex, MetadataToken, TABLE_COUNT, TableId, TableLayout};
use patchref_model::PrimitiveType;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Handles
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeDefId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssemblyRefId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberRefId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDefId {
    owner: TypeDefId,
    index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDefId {
    owner: TypeDefId,
    index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeHandle {
    Def(u32),
    Ref(u32),
    Spec(u32),
}

impl TypeHandle {
    fn token(self) -> MetadataToken {
        match self {
            TypeHandle::Def(row) => MetadataToken::new(TableId::TypeDef, row),
            TypeHandle::Ref(row) => MetadataToken::new(TableId::TypeRef, row),
            TypeHandle::Spec(row) => MetadataToken::new(TableId::TypeSpec, row),
        }
    }
}

impl From<TypeDefId> for TypeHandle {
    fn from(id: TypeDefId) -> Self {
        TypeHandle::Def(id.0)
    }
}

// =============================================================================
// Signature Types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sig {
    Primitive(PrimitiveType),
    Class(TypeHandle),
    ValueType(TypeHandle),
    Generic {
        open: TypeHandle,
        value_type: bool,
        args: Vec<Sig>,
    },
    SzArray(Box<Sig>),
    Array {
        element: Box<Sig>,
        rank: u32,
        sizes: Vec<u32>,
        lower_bounds: Vec<i32>,
    },
    Pointer(Box<Sig>),
    ByRef(Box<Sig>),
    Var(u32),
    MVar(u32),
    FnPtr {
        return_type: Box<Sig>,
        params: Vec<Sig>,
    },
    /// Optional custom modifier wrapping a type.
    Modified {
        modifier: TypeHandle,
        inner: Box<Sig>,
    },
}

impl Sig {
    pub fn void() -> Self {
        Sig::Primitive(PrimitiveType::Void)
    }

    pub fn int32() -> Self {
        Sig::Primitive(PrimitiveType::Int32)
    }

    pub fn boolean() -> Self {
        Sig::Primitive(PrimitiveType::Boolean)
    }

    pub fn string() -> Self {
        Sig::Primitive(PrimitiveType::String)
    }

    pub fn object() -> Self {
        Sig::Primitive(PrimitiveType::Object)
    }

    pub fn class(handle: impl Into<TypeHandle>) -> Self {
        Sig::Class(handle.into())
    }

    pub fn value_type(handle: impl Into<TypeHandle>) -> Self {
        Sig::ValueType(handle.into())
    }

    pub fn generic(open: impl Into<TypeHandle>, args: Vec<Sig>) -> Self {
        Sig::Generic {
            open: open.into(),
            value_type: false,
            args,
        }
    }

    pub fn by_ref(self) -> Self {
        Sig::ByRef(Box::new(self))
    }

    pub fn pointer(self) -> Self {
        Sig::Pointer(Box::new(self))
    }

    pub fn sz_array(self) -> Self {
        Sig::SzArray(Box::new(self))
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Sig::Primitive(primitive) => out.push(element_code(*primitive)),
            Sig::Class(handle) => {
                out.push(element::CLASS);
                encode_type_token(out, *handle);
            }
            Sig::ValueType(handle) => {
                out.push(element::VALUETYPE);
                encode_type_token(out, *handle);
            }
            Sig::Generic {
                open,
                value_type,
                args,
            } => {
                out.push(element::GENERICINST);
                out.push(if *value_type {
                    element::VALUETYPE
                } else {
                    element::CLASS
                });
                encode_type_token(out, *open);
                write_compressed_u32(out, args.len() as u32);
                for arg in args {
                    arg.encode(out);
                }
            }
            Sig::SzArray(inner) => {
                out.push(element::SZARRAY);
                inner.encode(out);
            }
            Sig::Array {
                element: inner,
                rank,
                sizes,
                lower_bounds,
            } => {
                out.push(element::ARRAY);
                inner.encode(out);
                write_compressed_u32(out, *rank);
                write_compressed_u32(out, sizes.len() as u32);
                for size in sizes {
                    write_compressed_u32(out, *size);
                }
                write_compressed_u32(out, lower_bounds.len() as u32);
                for bound in lower_bounds {
                    write_compressed_i32(out, *bound);
                }
            }
            Sig::Pointer(inner) => {
                out.push(element::PTR);
                inner.encode(out);
            }
            Sig::ByRef(inner) => {
                out.push(element::BYREF);
                inner.encode(out);
            }
            Sig::Var(index) => {
                out.push(element::VAR);
                write_compressed_u32(out, *index);
            }
            Sig::MVar(index) => {
                out.push(element::MVAR);
                write_compressed_u32(out, *index);
            }
            Sig::FnPtr {
                return_type,
                params,
            } => {
                out.push(element::FNPTR);
                encode_method(out, calling_convention::DEFAULT, 0, return_type, params);
            }
            Sig::Modified { modifier, inner } => {
                out.push(element::CMOD_OPT);
                encode_type_token(out, *modifier);
                inner.encode(out);
            }
        }
    }
}

impl From<PrimitiveType> for Sig {
    fn from(primitive: PrimitiveType) -> Self {
        Sig::Primitive(primitive)
    }
}

fn element_code(primitive: PrimitiveType) -> u8 {
    match primitive {
        PrimitiveType::Void => 0x01,
        PrimitiveType::Boolean => 0x02,
        PrimitiveType::Char => 0x03,
        PrimitiveType::SByte => 0x04,
        PrimitiveType::Byte => 0x05,
        PrimitiveType::Int16 => 0x06,
        PrimitiveType::UInt16 => 0x07,
        PrimitiveType::Int32 => 0x08,
        PrimitiveType::UInt32 => 0x09,
        PrimitiveType::Int64 => 0x0a,
        PrimitiveType::UInt64 => 0x0b,
        PrimitiveType::Single => 0x0c,
        PrimitiveType::Double => 0x0d,
        PrimitiveType::String => 0x0e,
        PrimitiveType::TypedReference => 0x16,
        PrimitiveType::IntPtr => 0x18,
        PrimitiveType::UIntPtr => 0x19,
        PrimitiveType::Object => 0x1c,
    }
}

fn encode_type_token(out: &mut Vec<u8>, handle: TypeHandle) {
    let coded = CodedIndex::TypeDefOrRef
        .encode(handle.token())
        .unwrap_or_default();
    write_compressed_u32(out, coded);
}

fn encode_method(out: &mut Vec<u8>, header: u8, generic_count: u32, return_type: &Sig, params: &[Sig]) {
    out.push(header);
    if header & calling_convention::GENERIC != 0 {
        write_compressed_u32(out, generic_count);
    }
    write_compressed_u32(out, params.len() as u32);
    return_type.encode(out);
    for param in params {
        param.encode(out);
    }
}

/// Raw signature blob of a field.
pub fn field_signature(ty: &Sig) -> Vec<u8> {
    let mut out = vec![calling_convention::FIELD];
    ty.encode(&mut out);
    out
}

/// Raw signature blob of a method.
pub fn method_signature(has_this: bool, return_type: &Sig, params: &[Sig]) -> Vec<u8> {
    let header = if has_this {
        calling_convention::HAS_THIS
    } else {
        calling_convention::DEFAULT
    };
    let mut out = Vec::new();
    encode_method(&mut out, header, 0, return_type, params);
    out
}

/// Raw signature blob of a type (as stored in TypeSpec).
pub fn type_signature(ty: &Sig) -> Vec<u8> {
    let mut out = Vec::new();
    ty.encode(&mut out);
    out
}

// =============================================================================
// Builder
// =============================================================================

const TYPE_PUBLIC: u32 = 0x0000_0001;
const TYPE_NESTED_PUBLIC: u32 = 0x0000_0002;
const FIELD_PUBLIC: u32 = 0x0006;
const METHOD_PUBLIC: u32 = 0x0006;
const METHOD_STATIC: u32 = 0x0010;
const METHOD_SPECIAL_NAME: u32 = 0x0800;
const METHOD_RT_SPECIAL_NAME: u32 = 0x1000;
const SEMANTICS_SETTER: u32 = 0x1;
const SEMANTICS_GETTER: u32 = 0x2;
const EXPORTED_FORWARDER: u32 = 0x0020_0000;

struct TypeEntry {
    flags: u32,
    namespace: String,
    name: String,
    extends: Option<TypeHandle>,
    enclosing: Option<u32>,
    fields: Vec<(String, Vec<u8>)>,
    methods: Vec<(String, u32, Vec<u8>)>,
    properties: Vec<PropertyEntry>,
}

struct PropertyEntry {
    name: String,
    signature: Vec<u8>,
    getter: Option<usize>,
    setter: Option<usize>,
}

enum RefScope {
    Assembly(u32),
    Type(TypeHandle),
}

/// Collects types and members, then serializes them as an assembly.
pub struct AssemblyBuilder {
    name: String,
    assembly_refs: Vec<String>,
    type_refs: Vec<(RefScope, String, String)>,
    types: Vec<TypeEntry>,
    type_specs: Vec<Vec<u8>>,
    member_refs: Vec<(TypeHandle, String, Vec<u8>)>,
    method_specs: Vec<(u32, Vec<u8>)>,
    forwarders: Vec<(String, String, u32)>,
}

impl AssemblyBuilder {
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            name: name.to_string(),
            assembly_refs: Vec::new(),
            type_refs: Vec::new(),
            types: Vec::new(),
            type_specs: Vec::new(),
            member_refs: Vec::new(),
            method_specs: Vec::new(),
            forwarders: Vec::new(),
        };
        builder.push_type(0, "", "<Module>", None);
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assembly_ref(&mut self, name: &str) -> AssemblyRefId {
        self.assembly_refs.push(name.to_string());
        AssemblyRefId(self.assembly_refs.len() as u32)
    }

    pub fn type_ref(&mut self, assembly: AssemblyRefId, namespace: &str, name: &str) -> TypeHandle {
        self.type_refs.push((
            RefScope::Assembly(assembly.0),
            namespace.to_string(),
            name.to_string(),
        ));
        TypeHandle::Ref(self.type_refs.len() as u32)
    }

    /// TypeRef to a type nested in another referenced type.
    pub fn nested_type_ref(&mut self, enclosing: TypeHandle, name: &str) -> TypeHandle {
        self.type_refs
            .push((RefScope::Type(enclosing), String::new(), name.to_string()));
        TypeHandle::Ref(self.type_refs.len() as u32)
    }

    fn push_type(&mut self, flags: u32, namespace: &str, name: &str, enclosing: Option<u32>) -> TypeDefId {
        self.types.push(TypeEntry {
            flags,
            namespace: namespace.to_string(),
            name: name.to_string(),
            extends: None,
            enclosing,
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
        });
        TypeDefId(self.types.len() as u32)
    }

    pub fn type_def(&mut self, namespace: &str, name: &str) -> TypeDefId {
        self.push_type(TYPE_PUBLIC, namespace, name, None)
    }

    pub fn nested_type(&mut self, enclosing: TypeDefId, name: &str) -> TypeDefId {
        self.push_type(TYPE_NESTED_PUBLIC, "", name, Some(enclosing.0))
    }

    pub fn set_base(&mut self, ty: TypeDefId, base: impl Into<TypeHandle>) {
        self.entry(ty).extends = Some(base.into());
    }

    pub fn type_spec(&mut self, ty: &Sig) -> TypeHandle {
        self.type_specs.push(type_signature(ty));
        TypeHandle::Spec(self.type_specs.len() as u32)
    }

    /// Forwards `namespace.name` to another assembly (ExportedType).
    pub fn forward_type(&mut self, namespace: &str, name: &str, target: AssemblyRefId) {
        self.forwarders
            .push((namespace.to_string(), name.to_string(), target.0));
    }

    fn entry(&mut self, ty: TypeDefId) -> &mut TypeEntry {
        &mut self.types[ty.0 as usize - 1]
    }

    pub fn field(&mut self, owner: TypeDefId, name: &str, ty: Sig) -> FieldDefId {
        let fields = &mut self.entry(owner).fields;
        fields.push((name.to_string(), field_signature(&ty)));
        FieldDefId {
            owner,
            index: fields.len() - 1,
        }
    }

    fn push_method(&mut self, owner: TypeDefId, name: &str, flags: u32, signature: Vec<u8>) -> MethodDefId {
        let methods = &mut self.entry(owner).methods;
        methods.push((name.to_string(), flags | METHOD_PUBLIC, signature));
        MethodDefId {
            owner,
            index: methods.len() - 1,
        }
    }

    pub fn method(&mut self, owner: TypeDefId, name: &str, return_type: Sig, params: Vec<Sig>) -> MethodDefId {
        self.push_method(owner, name, 0, method_signature(true, &return_type, &params))
    }

    pub fn static_method(
        &mut self,
        owner: TypeDefId,
        name: &str,
        return_type: Sig,
        params: Vec<Sig>,
    ) -> MethodDefId {
        self.push_method(
            owner,
            name,
            METHOD_STATIC,
            method_signature(false, &return_type, &params),
        )
    }

    pub fn constructor(&mut self, owner: TypeDefId, params: Vec<Sig>) -> MethodDefId {
        self.push_method(
            owner,
            ".ctor",
            METHOD_SPECIAL_NAME | METHOD_RT_SPECIAL_NAME,
            method_signature(true, &Sig::void(), &params),
        )
    }

    pub fn static_constructor(&mut self, owner: TypeDefId) -> MethodDefId {
        self.push_method(
            owner,
            ".cctor",
            METHOD_STATIC | METHOD_SPECIAL_NAME | METHOD_RT_SPECIAL_NAME,
            method_signature(false, &Sig::void(), &[]),
        )
    }

    /// Property with optional `get_`/`set_` accessor methods.
    pub fn property(&mut self, owner: TypeDefId, name: &str, ty: Sig, getter: bool, setter: bool) {
        let getter = getter.then(|| {
            self.push_method(
                owner,
                &format!("get_{name}"),
                METHOD_SPECIAL_NAME,
                method_signature(true, &ty, &[]),
            )
            .index
        });
        let setter = setter.then(|| {
            self.push_method(
                owner,
                &format!("set_{name}"),
                METHOD_SPECIAL_NAME,
                method_signature(true, &Sig::void(), std::slice::from_ref(&ty)),
            )
            .index
        });
        let mut signature = vec![calling_convention::PROPERTY | calling_convention::HAS_THIS, 0];
        ty.encode(&mut signature);
        self.entry(owner).properties.push(PropertyEntry {
            name: name.to_string(),
            signature,
            getter,
            setter,
        });
    }

    pub fn member_ref(&mut self, parent: impl Into<TypeHandle>, name: &str, signature: Vec<u8>) -> MemberRefId {
        self.member_refs
            .push((parent.into(), name.to_string(), signature));
        MemberRefId(self.member_refs.len() as u32)
    }

    /// Generic instantiation of a referenced method; returns the MethodSpec row.
    pub fn method_spec(&mut self, method: MemberRefId, args: &[Sig]) -> u32 {
        let mut blob = vec![0x0A];
        write_compressed_u32(&mut blob, args.len() as u32);
        for arg in args {
            arg.encode(&mut blob);
        }
        self.method_specs.push((method.0, blob));
        self.method_specs.len() as u32
    }

    /// Final MethodDef row of a method.
    pub fn method_row(&self, method: MethodDefId) -> u32 {
        let before: usize = self.types[..method.owner.0 as usize - 1]
            .iter()
            .map(|t| t.methods.len())
            .sum();
        (before + method.index + 1) as u32
    }

    /// Final Field row of a field.
    pub fn field_row(&self, field: FieldDefId) -> u32 {
        let before: usize = self.types[..field.owner.0 as usize - 1]
            .iter()
            .map(|t| t.fields.len())
            .sum();
        (before + field.index + 1) as u32
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Bare metadata root (`BSJB`).
    pub fn build_metadata(&self) -> Vec<u8> {
        let mut strings = HeapWriter::strings();
        let mut blobs = HeapWriter::blobs();
        let tables = self.table_stream(&mut strings, &mut blobs);

        let mut guid = vec![0u8; 16];
        guid[0] = 1;
        let streams: [(&str, Vec<u8>); 5] = [
            ("#~", tables),
            ("#Strings", strings.finish()),
            ("#US", vec![0, 0, 0, 0]),
            ("#GUID", guid),
            ("#Blob", blobs.finish()),
        ];

        let version = b"v4.0.30319\0\0";
        let headers_len: usize = streams
            .iter()
            .map(|(name, _)| 8 + padded(name.len() + 1))
            .sum();
        let mut offset = 16 + version.len() + 4 + headers_len;

        let mut out = Writer::default();
        out.u32(0x424A_5342);
        out.u16(1);
        out.u16(1);
        out.u32(0);
        out.u32(version.len() as u32);
        out.bytes(version);
        out.u16(0);
        out.u16(streams.len() as u16);
        for (name, data) in &streams {
            out.u32(offset as u32);
            out.u32(data.len() as u32);
            out.bytes(name.as_bytes());
            out.u8(0);
            out.align(4);
            offset += data.len();
        }
        for (_, data) in &streams {
            out.bytes(data);
        }
        out.data
    }

    /// PE32 DLL with a single `.text` section holding the CLI header and
    /// metadata.
    pub fn build(&self) -> Vec<u8> {
        const FILE_ALIGNMENT: usize = 0x200;
        const TEXT_RVA: u32 = 0x2000;
        const CLI_HEADER_SIZE: u32 = 72;

        let metadata = self.build_metadata();
        let text_len = CLI_HEADER_SIZE as usize + metadata.len();
        let raw_len = padded_to(text_len, FILE_ALIGNMENT);

        let mut out = Writer::default();
        // DOS header; only e_magic and e_lfanew matter.
        out.bytes(b"MZ");
        out.pad_to(0x3C);
        out.u32(0x80);
        out.pad_to(0x80);

        out.bytes(b"PE\0\0");
        out.u16(0x014C);
        out.u16(1);
        out.u32(0);
        out.u32(0);
        out.u32(0);
        out.u16(0xE0);
        out.u16(0x2102);

        let optional = out.data.len();
        out.u16(0x010B);
        out.pad_to(optional + 32);
        out.u32(TEXT_RVA);
        out.u32(FILE_ALIGNMENT as u32);
        out.pad_to(optional + 56);
        out.u32(TEXT_RVA + padded_to(text_len, 0x2000) as u32);
        out.u32(FILE_ALIGNMENT as u32);
        out.pad_to(optional + 68);
        out.u16(3);
        out.pad_to(optional + 92);
        out.u32(16);
        for directory in 0..16 {
            if directory == 14 {
                out.u32(TEXT_RVA);
                out.u32(CLI_HEADER_SIZE);
            } else {
                out.u64(0);
            }
        }

        out.bytes(b".text\0\0\0");
        out.u32(text_len as u32);
        out.u32(TEXT_RVA);
        out.u32(raw_len as u32);
        out.u32(FILE_ALIGNMENT as u32);
        out.u32(0);
        out.u32(0);
        out.u16(0);
        out.u16(0);
        out.u32(0x6000_0020);
        out.pad_to(FILE_ALIGNMENT);

        let cli = out.data.len();
        out.u32(CLI_HEADER_SIZE);
        out.u16(2);
        out.u16(5);
        out.u32(TEXT_RVA + CLI_HEADER_SIZE);
        out.u32(metadata.len() as u32);
        out.u32(1);
        out.pad_to(cli + CLI_HEADER_SIZE as usize);
        out.bytes(&metadata);
        out.pad_to(FILE_ALIGNMENT + raw_len);
        out.data
    }

    /// Writes `<name>.dll` into `dir`.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{}.dll", self.name));
        std::fs::write(&path, self.build())?;
        Ok(path)
    }

    fn table_stream(&self, strings: &mut HeapWriter, blobs: &mut HeapWriter) -> Vec<u8> {
        let mut rows: FxHashMap<TableId, Vec<Vec<u32>>> = FxHashMap::default();
        let mut push = |table: TableId, row: Vec<u32>| rows.entry(table).or_default().push(row);
        let coded = |index: CodedIndex, token: MetadataToken| index.encode(token).unwrap_or_default();

        let module_name = format!("{}.dll", self.name);
        push(TableId::Module, vec![0, strings.string(&module_name), 1, 0, 0]);

        for (scope, namespace, name) in &self.type_refs {
            let scope = match scope {
                RefScope::Assembly(row) => MetadataToken::new(TableId::AssemblyRef, *row),
                RefScope::Type(handle) => handle.token(),
            };
            push(
                TableId::TypeRef,
                vec![
                    coded(CodedIndex::ResolutionScope, scope),
                    strings.string(name),
                    strings.string(namespace),
                ],
            );
        }

        let mut field_list = 1u32;
        let mut method_list = 1u32;
        let mut property_list = 1u32;
        for (index, ty) in self.types.iter().enumerate() {
            let type_row = index as u32 + 1;
            let extends = ty
                .extends
                .map(|base| coded(CodedIndex::TypeDefOrRef, base.token()))
                .unwrap_or(0);
            push(
                TableId::TypeDef,
                vec![
                    ty.flags,
                    strings.string(&ty.name),
                    strings.string(&ty.namespace),
                    extends,
                    field_list,
                    method_list,
                ],
            );
            for (name, signature) in &ty.fields {
                push(
                    TableId::Field,
                    vec![FIELD_PUBLIC, strings.string(name), blobs.blob(signature)],
                );
            }
            for (name, flags, signature) in &ty.methods {
                push(
                    TableId::MethodDef,
                    vec![0, 0, *flags, strings.string(name), blobs.blob(signature), 1],
                );
            }
            if !ty.properties.is_empty() {
                push(TableId::PropertyMap, vec![type_row, property_list]);
            }
            for property in &ty.properties {
                push(
                    TableId::Property,
                    vec![0, strings.string(&property.name), blobs.blob(&property.signature)],
                );
                let association = coded(
                    CodedIndex::HasSemantics,
                    MetadataToken::new(TableId::Property, property_list),
                );
                for (semantics, method) in [
                    (SEMANTICS_GETTER, property.getter),
                    (SEMANTICS_SETTER, property.setter),
                ] {
                    if let Some(method) = method {
                        push(
                            TableId::MethodSemantics,
                            vec![semantics, method_list + method as u32, association],
                        );
                    }
                }
                property_list += 1;
            }
            if let Some(enclosing) = ty.enclosing {
                push(TableId::NestedClass, vec![type_row, enclosing]);
            }
            field_list += ty.fields.len() as u32;
            method_list += ty.methods.len() as u32;
        }

        for (parent, name, signature) in &self.member_refs {
            push(
                TableId::MemberRef,
                vec![
                    coded(CodedIndex::MemberRefParent, parent.token()),
                    strings.string(name),
                    blobs.blob(signature),
                ],
            );
        }
        for signature in &self.type_specs {
            push(TableId::TypeSpec, vec![blobs.blob(signature)]);
        }
        push(
            TableId::Assembly,
            vec![0x8004, 1, 0, 0, 0, 0, 0, strings.string(&self.name), 0],
        );
        for name in &self.assembly_refs {
            push(
                TableId::AssemblyRef,
                vec![1, 0, 0, 0, 0, 0, strings.string(name), 0, 0],
            );
        }
        for (namespace, name, target) in &self.forwarders {
            push(
                TableId::ExportedType,
                vec![
                    EXPORTED_FORWARDER,
                    0,
                    strings.string(name),
                    strings.string(namespace),
                    coded(
                        CodedIndex::Implementation,
                        MetadataToken::new(TableId::AssemblyRef, *target),
                    ),
                ],
            );
        }
        for (method, signature) in &self.method_specs {
            push(
                TableId::MethodSpec,
                vec![
                    coded(
                        CodedIndex::MethodDefOrRef,
                        MetadataToken::new(TableId::MemberRef, *method),
                    ),
                    blobs.blob(signature),
                ],
            );
        }

        let mut counts = [0u32; TABLE_COUNT];
        let mut valid = 0u64;
        for (table, table_rows) in &rows {
            counts[table.index()] = table_rows.len() as u32;
            valid |= 1u64 << table.index();
        }
        let mut heap_sizes = 0;
        if strings.len() > 0xFFFF {
            heap_sizes |= crate::tables::HEAP_STRINGS_WIDE;
        }
        if blobs.len() > 0xFFFF {
            heap_sizes |= crate::tables::HEAP_BLOB_WIDE;
        }
        let layout = TableLayout::new(&counts, heap_sizes);

        let mut out = Writer::default();
        out.u32(0);
        out.u8(2);
        out.u8(0);
        out.u8(heap_sizes);
        out.u8(1);
        out.u64(valid);
        out.u64(0);
        for table in TableId::ALL {
            if counts[table.index()] > 0 {
                out.u32(counts[table.index()]);
            }
        }
        for table in TableId::ALL {
            for row in rows.get(&table).into_iter().flatten() {
                for (column, value) in row.iter().enumerate() {
                    if layout.column_width(table, column) == 2 {
                        out.u16(*value as u16);
                    } else {
                        out.u32(*value);
                    }
                }
            }
        }
        out.align(4);
        out.data
    }
}

// =============================================================================
// Byte Writers
// =============================================================================

fn padded(len: usize) -> usize {
    padded_to(len, 4)
}

fn padded_to(len: usize, alignment: usize) -> usize {
    len.div_ceil(alignment) * alignment
}

#[derive(Default)]
struct Writer {
    data: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, value: u8) {
        self.data.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn pad_to(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize(len, 0);
        }
    }

    fn align(&mut self, alignment: usize) {
        let len = padded_to(self.data.len(), alignment);
        self.pad_to(len);
    }
}

/// Deduplicating `#Strings` / `#Blob` heap writer.
struct HeapWriter {
    data: Vec<u8>,
    offsets: FxHashMap<Vec<u8>, u32>,
    length_prefixed: bool,
}

impl HeapWriter {
    fn strings() -> Self {
        Self {
            data: vec![0],
            offsets: FxHashMap::default(),
            length_prefixed: false,
        }
    }

    fn blobs() -> Self {
        Self {
            data: vec![0],
            offsets: FxHashMap::default(),
            length_prefixed: true,
        }
    }

    fn insert(&mut self, bytes: &[u8]) -> u32 {
        if bytes.is_empty() {
            return 0;
        }
        if let Some(offset) = self.offsets.get(bytes) {
            return *offset;
        }
        let offset = self.data.len() as u32;
        if self.length_prefixed {
            write_compressed_u32(&mut self.data, bytes.len() as u32);
            self.data.extend_from_slice(bytes);
        } else {
            self.data.extend_from_slice(bytes);
            self.data.push(0);
        }
        self.offsets.insert(bytes.to_vec(), offset);
        offset
    }

    fn string(&mut self, value: &str) -> u32 {
        self.insert(value.as_bytes())
    }

    fn blob(&mut self, value: &[u8]) -> u32 {
        self.insert(value)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn finish(mut self) -> Vec<u8> {
        let len = padded(self.data.len());
        self.data.resize(len, 0);
        self.data
    }
}
