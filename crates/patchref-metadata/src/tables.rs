//! Table stream schema (ECMA-335 II.22).
//!
//! Every table 0x00..=0x2C has a fixed column list. Column widths depend on
//! the heap-size flags and on row counts, so a `TableLayout` is computed once
//! per image and shared by the reader and the test writer.

use crate::error::{MetadataError, Result};

// =============================================================================
// Table Identifiers
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRva = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOs = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOs = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

pub const TABLE_COUNT: usize = 0x2D;

impl TableId {
    pub const ALL: [TableId; TABLE_COUNT] = [
        TableId::Module,
        TableId::TypeRef,
        TableId::TypeDef,
        TableId::FieldPtr,
        TableId::Field,
        TableId::MethodPtr,
        TableId::MethodDef,
        TableId::ParamPtr,
        TableId::Param,
        TableId::InterfaceImpl,
        TableId::MemberRef,
        TableId::Constant,
        TableId::CustomAttribute,
        TableId::FieldMarshal,
        TableId::DeclSecurity,
        TableId::ClassLayout,
        TableId::FieldLayout,
        TableId::StandAloneSig,
        TableId::EventMap,
        TableId::EventPtr,
        TableId::Event,
        TableId::PropertyMap,
        TableId::PropertyPtr,
        TableId::Property,
        TableId::MethodSemantics,
        TableId::MethodImpl,
        TableId::ModuleRef,
        TableId::TypeSpec,
        TableId::ImplMap,
        TableId::FieldRva,
        TableId::EncLog,
        TableId::EncMap,
        TableId::Assembly,
        TableId::AssemblyProcessor,
        TableId::AssemblyOs,
        TableId::AssemblyRef,
        TableId::AssemblyRefProcessor,
        TableId::AssemblyRefOs,
        TableId::File,
        TableId::ExportedType,
        TableId::ManifestResource,
        TableId::NestedClass,
        TableId::GenericParam,
        TableId::MethodSpec,
        TableId::GenericParamConstraint,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// Coded Indexes
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodedIndex {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl CodedIndex {
    /// Tables addressed by each tag value; `None` marks unused tags.
    pub fn tables(self) -> &'static [Option<TableId>] {
        use TableId::*;
        match self {
            CodedIndex::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec)],
            CodedIndex::HasConstant => &[Some(Field), Some(Param), Some(Property)],
            CodedIndex::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                Some(DeclSecurity),
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            CodedIndex::HasFieldMarshal => &[Some(Field), Some(Param)],
            CodedIndex::HasDeclSecurity => &[Some(TypeDef), Some(MethodDef), Some(Assembly)],
            CodedIndex::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            CodedIndex::HasSemantics => &[Some(Event), Some(Property)],
            CodedIndex::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            CodedIndex::MemberForwarded => &[Some(Field), Some(MethodDef)],
            CodedIndex::Implementation => &[Some(File), Some(AssemblyRef), Some(ExportedType)],
            CodedIndex::CustomAttributeType => &[None, None, Some(MethodDef), Some(MemberRef), None],
            CodedIndex::ResolutionScope => {
                &[Some(Module), Some(ModuleRef), Some(AssemblyRef), Some(TypeRef)]
            }
            CodedIndex::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
        }
    }

    pub fn tag_bits(self) -> u32 {
        match self {
            CodedIndex::HasCustomAttribute => 5,
            CodedIndex::MemberRefParent | CodedIndex::CustomAttributeType => 3,
            CodedIndex::TypeDefOrRef
            | CodedIndex::HasConstant
            | CodedIndex::HasDeclSecurity
            | CodedIndex::Implementation
            | CodedIndex::ResolutionScope => 2,
            CodedIndex::HasFieldMarshal
            | CodedIndex::HasSemantics
            | CodedIndex::MethodDefOrRef
            | CodedIndex::MemberForwarded
            | CodedIndex::TypeOrMethodDef => 1,
        }
    }

    /// Splits a raw coded value into table and row. Row 0 is the null token.
    pub fn decode(self, raw: u32) -> Result<MetadataToken> {
        let bits = self.tag_bits();
        let tag = (raw & ((1 << bits) - 1)) as usize;
        let row = raw >> bits;
        match self.tables().get(tag).copied().flatten() {
            Some(table) => Ok(MetadataToken::new(table, row)),
            None => Err(MetadataError::Malformed(format!(
                "invalid {self:?} tag {tag}"
            ))),
        }
    }

    /// Inverse of `decode`.
    pub fn encode(self, token: MetadataToken) -> Option<u32> {
        let tag = self
            .tables()
            .iter()
            .position(|t| *t == Some(token.table))?;
        Some((token.row << self.tag_bits()) | tag as u32)
    }
}

/// A table row reference. Row numbers are 1-based; row 0 is null.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataToken {
    pub table: TableId,
    pub row: u32,
}

impl MetadataToken {
    pub fn new(table: TableId, row: u32) -> Self {
        Self { table, row }
    }

    pub fn is_null(&self) -> bool {
        self.row == 0
    }
}

// =============================================================================
// Column Schema
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Column {
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Table(TableId),
    Coded(CodedIndex),
}

/// Column list of a table, in stored order.
pub fn columns(table: TableId) -> &'static [Column] {
    use Column::*;
    use CodedIndex as C;
    use TableId as T;
    match table {
        T::Module => &[U16, Str, Guid, Guid, Guid],
        T::TypeRef => &[Coded(C::ResolutionScope), Str, Str],
        T::TypeDef => &[
            U32,
            Str,
            Str,
            Coded(C::TypeDefOrRef),
            Table(T::Field),
            Table(T::MethodDef),
        ],
        T::FieldPtr => &[Table(T::Field)],
        T::Field => &[U16, Str, Blob],
        T::MethodPtr => &[Table(T::MethodDef)],
        T::MethodDef => &[U32, U16, U16, Str, Blob, Table(T::Param)],
        T::ParamPtr => &[Table(T::Param)],
        T::Param => &[U16, U16, Str],
        T::InterfaceImpl => &[Table(T::TypeDef), Coded(C::TypeDefOrRef)],
        T::MemberRef => &[Coded(C::MemberRefParent), Str, Blob],
        // Type is one byte followed by a padding byte.
        T::Constant => &[U16, Coded(C::HasConstant), Blob],
        T::CustomAttribute => &[
            Coded(C::HasCustomAttribute),
            Coded(C::CustomAttributeType),
            Blob,
        ],
        T::FieldMarshal => &[Coded(C::HasFieldMarshal), Blob],
        T::DeclSecurity => &[U16, Coded(C::HasDeclSecurity), Blob],
        T::ClassLayout => &[U16, U32, Table(T::TypeDef)],
        T::FieldLayout => &[U32, Table(T::Field)],
        T::StandAloneSig => &[Blob],
        T::EventMap => &[Table(T::TypeDef), Table(T::Event)],
        T::EventPtr => &[Table(T::Event)],
        T::Event => &[U16, Str, Coded(C::TypeDefOrRef)],
        T::PropertyMap => &[Table(T::TypeDef), Table(T::Property)],
        T::PropertyPtr => &[Table(T::Property)],
        T::Property => &[U16, Str, Blob],
        T::MethodSemantics => &[U16, Table(T::MethodDef), Coded(C::HasSemantics)],
        T::MethodImpl => &[
            Table(T::TypeDef),
            Coded(C::MethodDefOrRef),
            Coded(C::MethodDefOrRef),
        ],
        T::ModuleRef => &[Str],
        T::TypeSpec => &[Blob],
        T::ImplMap => &[U16, Coded(C::MemberForwarded), Str, Table(T::ModuleRef)],
        T::FieldRva => &[U32, Table(T::Field)],
        T::EncLog => &[U32, U32],
        T::EncMap => &[U32],
        T::Assembly => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
        T::AssemblyProcessor => &[U32],
        T::AssemblyOs => &[U32, U32, U32],
        T::AssemblyRef => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
        T::AssemblyRefProcessor => &[U32, Table(T::AssemblyRef)],
        T::AssemblyRefOs => &[U32, U32, U32, Table(T::AssemblyRef)],
        T::File => &[U32, Str, Blob],
        T::ExportedType => &[U32, U32, Str, Str, Coded(C::Implementation)],
        T::ManifestResource => &[U32, U32, Str, Coded(C::Implementation)],
        T::NestedClass => &[Table(T::TypeDef), Table(T::TypeDef)],
        T::GenericParam => &[U16, U16, Coded(C::TypeOrMethodDef), Str],
        T::MethodSpec => &[Coded(C::MethodDefOrRef), Blob],
        T::GenericParamConstraint => &[Table(T::GenericParam), Coded(C::TypeDefOrRef)],
    }
}

/// Column positions of the tables the resolver reads.
pub mod col {
    pub const TYPEREF_SCOPE: usize = 0;
    pub const TYPEREF_NAME: usize = 1;
    pub const TYPEREF_NAMESPACE: usize = 2;

    pub const TYPEDEF_FLAGS: usize = 0;
    pub const TYPEDEF_NAME: usize = 1;
    pub const TYPEDEF_NAMESPACE: usize = 2;
    pub const TYPEDEF_EXTENDS: usize = 3;
    pub const TYPEDEF_FIELD_LIST: usize = 4;
    pub const TYPEDEF_METHOD_LIST: usize = 5;

    pub const PTR_TARGET: usize = 0;

    pub const FIELD_NAME: usize = 1;
    pub const FIELD_SIGNATURE: usize = 2;

    pub const METHOD_FLAGS: usize = 2;
    pub const METHOD_NAME: usize = 3;
    pub const METHOD_SIGNATURE: usize = 4;

    pub const MEMBERREF_PARENT: usize = 0;
    pub const MEMBERREF_NAME: usize = 1;
    pub const MEMBERREF_SIGNATURE: usize = 2;

    pub const PROPERTYMAP_PARENT: usize = 0;
    pub const PROPERTYMAP_LIST: usize = 1;

    pub const PROPERTY_NAME: usize = 1;
    pub const PROPERTY_SIGNATURE: usize = 2;

    pub const SEMANTICS_FLAGS: usize = 0;
    pub const SEMANTICS_ASSOCIATION: usize = 2;

    pub const TYPESPEC_SIGNATURE: usize = 0;

    pub const ASSEMBLY_NAME: usize = 7;
    pub const ASSEMBLYREF_NAME: usize = 6;
    pub const MODULE_NAME: usize = 1;
    pub const MODULEREF_NAME: usize = 0;

    pub const EXPORTED_NAME: usize = 2;
    pub const EXPORTED_NAMESPACE: usize = 3;
    pub const EXPORTED_IMPLEMENTATION: usize = 4;

    pub const NESTED_NESTED: usize = 0;
    pub const NESTED_ENCLOSING: usize = 1;

    pub const METHODSPEC_METHOD: usize = 0;
    pub const METHODSPEC_INSTANTIATION: usize = 1;
}

// =============================================================================
// Layout
// =============================================================================

pub const HEAP_STRINGS_WIDE: u8 = 0x01;
pub const HEAP_GUID_WIDE: u8 = 0x02;
pub const HEAP_BLOB_WIDE: u8 = 0x04;

#[derive(Clone, Debug, Default)]
struct TableInfo {
    rows: u32,
    row_size: usize,
    /// Offset of the table relative to the start of table data.
    offset: usize,
    /// `(offset within row, width)` per column.
    columns: Vec<(usize, usize)>,
}

/// Row counts and physical layout of every table.
#[derive(Clone, Debug)]
pub struct TableLayout {
    heap_sizes: u8,
    tables: Vec<TableInfo>,
    data_size: usize,
}

impl TableLayout {
    pub fn new(rows: &[u32; TABLE_COUNT], heap_sizes: u8) -> Self {
        let index_width = |table: TableId| if rows[table.index()] > 0xFFFF { 4 } else { 2 };
        let coded_width = |coded: CodedIndex| {
            let max_rows = coded
                .tables()
                .iter()
                .flatten()
                .map(|t| rows[t.index()])
                .max()
                .unwrap_or(0);
            if max_rows < (1u32 << (16 - coded.tag_bits())) {
                2
            } else {
                4
            }
        };
        let heap_width = |flag: u8| if heap_sizes & flag != 0 { 4 } else { 2 };

        let mut tables = Vec::with_capacity(TABLE_COUNT);
        let mut offset = 0;
        for table in TableId::ALL {
            let mut row_size = 0;
            let columns = columns(table)
                .iter()
                .map(|column| {
                    let width = match column {
                        Column::U16 => 2,
                        Column::U32 => 4,
                        Column::Str => heap_width(HEAP_STRINGS_WIDE),
                        Column::Guid => heap_width(HEAP_GUID_WIDE),
                        Column::Blob => heap_width(HEAP_BLOB_WIDE),
                        Column::Table(target) => index_width(*target),
                        Column::Coded(coded) => coded_width(*coded),
                    };
                    let at = row_size;
                    row_size += width;
                    (at, width)
                })
                .collect();
            let count = rows[table.index()];
            tables.push(TableInfo {
                rows: count,
                row_size,
                offset,
                columns,
            });
            offset += row_size * count as usize;
        }

        Self {
            heap_sizes,
            tables,
            data_size: offset,
        }
    }

    pub fn heap_sizes(&self) -> u8 {
        self.heap_sizes
    }

    pub fn row_count(&self, table: TableId) -> u32 {
        self.tables[table.index()].rows
    }

    pub fn row_size(&self, table: TableId) -> usize {
        self.tables[table.index()].row_size
    }

    /// Total size of all table rows.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Width in bytes of one column.
    pub fn column_width(&self, table: TableId, column: usize) -> usize {
        self.tables[table.index()].columns[column].1
    }

    /// Offset (relative to table data) and width of a cell. Fails for rows
    /// outside `1..=rows`.
    pub fn cell(&self, table: TableId, row: u32, column: usize) -> Result<(usize, usize)> {
        let info = &self.tables[table.index()];
        if row == 0 || row > info.rows {
            return Err(MetadataError::InvalidRow { table, row });
        }
        let (at, width) = *info
            .columns
            .get(column)
            .ok_or_else(|| MetadataError::Malformed(format!("{table:?} has no column {column}")))?;
        Ok((info.offset + (row as usize - 1) * info.row_size + at, width))
    }
}

#[cfg(test)]
#[path = "../tests/tables_tests.rs"]
mod tests;
