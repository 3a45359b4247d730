//! Loaded assembly image: PE container, metadata root, heaps and tables.

use crate::error::{MetadataError, Result};
use crate::heaps;
use crate::tables::{CodedIndex, MetadataToken, TABLE_COUNT, TableId, TableLayout, col};
use scroll::{LE, Pread};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const METADATA_SIGNATURE: u32 = 0x424A_5342;
const CLI_HEADER_DIRECTORY: usize = 14;
const SECTION_HEADER_SIZE: usize = 40;
const EXTRA_DATA_FLAG: u8 = 0x40;

const SEMANTICS_SETTER: u32 = 0x1;
const SEMANTICS_GETTER: u32 = 0x2;

/// Accessors attached to a property through MethodSemantics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Accessors {
    pub getter: bool,
    pub setter: bool,
}

pub struct MetadataImage {
    path: Option<PathBuf>,
    data: Vec<u8>,
    version: String,
    strings: Range<usize>,
    blobs: Range<usize>,
    tables_offset: usize,
    layout: TableLayout,
}

impl std::fmt::Debug for MetadataImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataImage")
            .field("path", &self.path)
            .field("version", &self.version)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl MetadataImage {
    /// Reads and parses an assembly file. The file is closed before
    /// returning.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut image = Self::parse(data)?;
        debug!(path = %path.display(), version = %image.version, "opened metadata image");
        image.path = Some(path.to_path_buf());
        Ok(image)
    }

    /// Parses a PE file (`MZ`) or a bare metadata root (`BSJB`).
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let root = if data.starts_with(b"MZ") {
            locate_metadata_root(&data)?
        } else if data.starts_with(b"BSJB") {
            0
        } else {
            return Err(MetadataError::NotManaged("missing MZ or BSJB signature"));
        };
        parse_root(data, root)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runtime version string of the metadata root.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn row_count(&self, table: TableId) -> u32 {
        self.layout.row_count(table)
    }

    // =========================================================================
    // Cells
    // =========================================================================

    pub fn read(&self, table: TableId, row: u32, column: usize) -> Result<u32> {
        let (offset, width) = self.layout.cell(table, row, column)?;
        let at = self.tables_offset + offset;
        Ok(if width == 2 {
            u32::from(self.data.pread_with::<u16>(at, LE)?)
        } else {
            self.data.pread_with::<u32>(at, LE)?
        })
    }

    pub fn read_coded(
        &self,
        table: TableId,
        row: u32,
        column: usize,
        coded: CodedIndex,
    ) -> Result<MetadataToken> {
        coded.decode(self.read(table, row, column)?)
    }

    pub fn string(&self, index: u32) -> Result<&str> {
        heaps::string_at(&self.data[self.strings.clone()], index)
    }

    pub fn read_string(&self, table: TableId, row: u32, column: usize) -> Result<&str> {
        self.string(self.read(table, row, column)?)
    }

    pub fn blob(&self, index: u32) -> Result<&[u8]> {
        heaps::blob_at(&self.data[self.blobs.clone()], index)
    }

    pub fn read_blob(&self, table: TableId, row: u32, column: usize) -> Result<&[u8]> {
        self.blob(self.read(table, row, column)?)
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// Name of the assembly defined by this image, if it has a manifest.
    pub fn assembly_name(&self) -> Result<Option<&str>> {
        if self.row_count(TableId::Assembly) == 0 {
            return Ok(None);
        }
        self.read_string(TableId::Assembly, 1, col::ASSEMBLY_NAME)
            .map(Some)
    }

    pub fn fields(&self, type_def: u32) -> Result<Vec<u32>> {
        self.member_list(
            TableId::TypeDef,
            type_def,
            col::TYPEDEF_FIELD_LIST,
            TableId::Field,
            TableId::FieldPtr,
        )
    }

    pub fn methods(&self, type_def: u32) -> Result<Vec<u32>> {
        self.member_list(
            TableId::TypeDef,
            type_def,
            col::TYPEDEF_METHOD_LIST,
            TableId::MethodDef,
            TableId::MethodPtr,
        )
    }

    pub fn properties(&self, type_def: u32) -> Result<Vec<u32>> {
        for map in 1..=self.row_count(TableId::PropertyMap) {
            if self.read(TableId::PropertyMap, map, col::PROPERTYMAP_PARENT)? == type_def {
                return self.member_list(
                    TableId::PropertyMap,
                    map,
                    col::PROPERTYMAP_LIST,
                    TableId::Property,
                    TableId::PropertyPtr,
                );
            }
        }
        Ok(Vec::new())
    }

    /// Rows of `member` owned by `owner_row`: from its list column up to the
    /// next owner's list column, through the `*Ptr` table when present.
    fn member_list(
        &self,
        owner: TableId,
        owner_row: u32,
        list_column: usize,
        member: TableId,
        indirection: TableId,
    ) -> Result<Vec<u32>> {
        let indirect = self.row_count(indirection) > 0;
        let list_table = if indirect { indirection } else { member };
        let limit = self.row_count(list_table) + 1;

        let start = self.read(owner, owner_row, list_column)?.max(1);
        let end = if owner_row < self.row_count(owner) {
            self.read(owner, owner_row + 1, list_column)?
        } else {
            limit
        };
        let end = end.min(limit);
        if start >= end {
            return Ok(Vec::new());
        }

        if indirect {
            (start..end)
                .map(|row| self.read(indirection, row, col::PTR_TARGET))
                .collect()
        } else {
            Ok((start..end).collect())
        }
    }

    pub fn property_accessors(&self, property: u32) -> Result<Accessors> {
        let association = CodedIndex::HasSemantics
            .encode(MetadataToken::new(TableId::Property, property))
            .ok_or_else(|| MetadataError::Malformed("unencodable property token".into()))?;
        let mut accessors = Accessors::default();
        for row in 1..=self.row_count(TableId::MethodSemantics) {
            if self.read(TableId::MethodSemantics, row, col::SEMANTICS_ASSOCIATION)? != association {
                continue;
            }
            let flags = self.read(TableId::MethodSemantics, row, col::SEMANTICS_FLAGS)?;
            accessors.getter |= flags & SEMANTICS_GETTER != 0;
            accessors.setter |= flags & SEMANTICS_SETTER != 0;
        }
        trace!(property, ?accessors, "property accessors");
        Ok(accessors)
    }

    /// Enclosing type of a nested TypeDef.
    pub fn enclosing_type(&self, type_def: u32) -> Result<Option<u32>> {
        for row in 1..=self.row_count(TableId::NestedClass) {
            if self.read(TableId::NestedClass, row, col::NESTED_NESTED)? == type_def {
                return self
                    .read(TableId::NestedClass, row, col::NESTED_ENCLOSING)
                    .map(Some);
            }
        }
        Ok(None)
    }

    pub fn nested_types(&self, enclosing: u32) -> Result<Vec<u32>> {
        let mut nested = Vec::new();
        for row in 1..=self.row_count(TableId::NestedClass) {
            if self.read(TableId::NestedClass, row, col::NESTED_ENCLOSING)? == enclosing {
                nested.push(self.read(TableId::NestedClass, row, col::NESTED_NESTED)?);
            }
        }
        Ok(nested)
    }

    /// TypeDef owning a Field or MethodDef row.
    pub fn declaring_type(&self, member: MetadataToken) -> Result<Option<u32>> {
        for type_def in 1..=self.row_count(TableId::TypeDef) {
            let members = match member.table {
                TableId::Field => self.fields(type_def)?,
                TableId::MethodDef => self.methods(type_def)?,
                _ => return Ok(None),
            };
            if members.contains(&member.row) {
                return Ok(Some(type_def));
            }
        }
        Ok(None)
    }
}

// =============================================================================
// Container Parsing
// =============================================================================

/// Follows the PE headers to the file offset of the metadata root.
fn locate_metadata_root(data: &[u8]) -> Result<usize> {
    let pe = data.pread_with::<u32>(0x3C, LE)? as usize;
    if data.get(pe..pe + 4) != Some(b"PE\0\0".as_slice()) {
        return Err(MetadataError::NotManaged("missing PE signature"));
    }
    let coff = pe + 4;
    let section_count = data.pread_with::<u16>(coff + 2, LE)? as usize;
    let optional_size = data.pread_with::<u16>(coff + 16, LE)? as usize;
    let optional = coff + 20;

    let (count_at, directories_at) = match data.pread_with::<u16>(optional, LE)? {
        0x10B => (92, 96),
        0x20B => (108, 112),
        magic => {
            return Err(MetadataError::Malformed(format!(
                "unknown optional header magic 0x{magic:x}"
            )));
        }
    };
    let directory_count = data.pread_with::<u32>(optional + count_at, LE)? as usize;
    if directory_count <= CLI_HEADER_DIRECTORY {
        return Err(MetadataError::NotManaged("no CLI header directory"));
    }
    let cli_rva =
        data.pread_with::<u32>(optional + directories_at + CLI_HEADER_DIRECTORY * 8, LE)?;
    if cli_rva == 0 {
        return Err(MetadataError::NotManaged("empty CLI header directory"));
    }

    let sections = optional + optional_size;
    let cli = rva_to_offset(data, sections, section_count, cli_rva)?;
    let metadata_rva = data.pread_with::<u32>(cli + 8, LE)?;
    rva_to_offset(data, sections, section_count, metadata_rva)
}

fn rva_to_offset(data: &[u8], sections: usize, count: usize, rva: u32) -> Result<usize> {
    for index in 0..count {
        let header = sections + index * SECTION_HEADER_SIZE;
        let virtual_size = data.pread_with::<u32>(header + 8, LE)?;
        let virtual_address = data.pread_with::<u32>(header + 12, LE)?;
        let raw_size = data.pread_with::<u32>(header + 16, LE)?;
        let raw_pointer = data.pread_with::<u32>(header + 20, LE)?;
        let span = virtual_size.max(raw_size);
        if rva >= virtual_address && rva - virtual_address < span {
            return raw_pointer
                .checked_add(rva - virtual_address)
                .map(|offset| offset as usize)
                .filter(|&offset| offset < data.len())
                .ok_or_else(|| {
                    MetadataError::Malformed(format!(
                        "RVA 0x{rva:x} maps outside the file through section {index}"
                    ))
                });
        }
    }
    Err(MetadataError::Malformed(format!(
        "RVA 0x{rva:x} is not inside any section"
    )))
}

fn parse_root(data: Vec<u8>, root: usize) -> Result<MetadataImage> {
    if data.pread_with::<u32>(root, LE)? != METADATA_SIGNATURE {
        return Err(MetadataError::NotManaged("missing BSJB metadata signature"));
    }
    let version_len = data.pread_with::<u32>(root + 12, LE)? as usize;
    let version_bytes = data
        .get(root + 16..root + 16 + version_len)
        .ok_or_else(|| MetadataError::Malformed("truncated version string".into()))?;
    let version = String::from_utf8_lossy(version_bytes)
        .trim_end_matches('\0')
        .to_string();

    let mut at = root + 16 + version_len;
    let stream_count = data.pread_with::<u16>(at + 2, LE)?;
    at += 4;

    let mut tables = None;
    let mut strings = 0..0;
    let mut blobs = 0..0;
    for _ in 0..stream_count {
        let offset = data.pread_with::<u32>(at, LE)? as usize;
        let size = data.pread_with::<u32>(at + 4, LE)? as usize;
        let name_start = at + 8;
        let name_len = data
            .get(name_start..)
            .and_then(|tail| tail.iter().take(32).position(|b| *b == 0))
            .ok_or_else(|| MetadataError::Malformed("unterminated stream name".into()))?;
        let name = &data[name_start..name_start + name_len];
        at = name_start + (name_len + 4) / 4 * 4;

        let range = root + offset..root + offset + size;
        if range.end > data.len() {
            return Err(MetadataError::Malformed(format!(
                "stream {} exceeds image",
                String::from_utf8_lossy(name)
            )));
        }
        match name {
            b"#~" | b"#-" => tables = Some(range),
            b"#Strings" => strings = range,
            b"#Blob" => blobs = range,
            other => trace!(stream = %String::from_utf8_lossy(other), "skipping stream"),
        }
    }

    let tables = tables.ok_or_else(|| MetadataError::Malformed("no table stream".into()))?;
    let (layout, tables_offset) = parse_table_header(&data, tables.clone())?;
    if tables_offset + layout.data_size() > tables.end {
        return Err(MetadataError::Malformed("table rows exceed table stream".into()));
    }

    Ok(MetadataImage {
        path: None,
        data,
        version,
        strings,
        blobs,
        tables_offset,
        layout,
    })
}

fn parse_table_header(data: &[u8], stream: Range<usize>) -> Result<(TableLayout, usize)> {
    let heap_sizes = data.pread::<u8>(stream.start + 6)?;
    let valid = data.pread_with::<u64>(stream.start + 8, LE)?;
    if let Some(unknown) = (TABLE_COUNT..64).find(|bit| valid & (1u64 << bit) != 0) {
        return Err(MetadataError::UnsupportedTable(unknown as u8));
    }

    let mut rows = [0u32; TABLE_COUNT];
    let mut at = stream.start + 24;
    for (index, count) in rows.iter_mut().enumerate() {
        if valid & (1u64 << index) != 0 {
            *count = data.gread_with::<u32>(&mut at, LE)?;
        }
    }
    if heap_sizes & EXTRA_DATA_FLAG != 0 {
        at += 4;
    }
    Ok((TableLayout::new(&rows, heap_sizes), at))
}

#[cfg(test)]
#[path = "../tests/image_tests.rs"]
mod tests;
