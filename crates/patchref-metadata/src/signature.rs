//! Signature blob decoding (ECMA-335 II.23.2).
//!
//! The decoder turns blobs into `TypeDescriptor`s. Type tokens embedded in a
//! blob are handed to a `TypeHandleProvider`, which for a real image is the
//! name formatter.

use crate::error::{MetadataError, Result};
use crate::heaps;
use crate::tables::{CodedIndex, MetadataToken};
use patchref_common::limits::{MAX_ARRAY_RANK, MAX_SIGNATURE_DEPTH};
use patchref_model::{ArrayShape, PrimitiveType, TypeDescriptor};
use scroll::Pread;

pub mod element {
    pub const PTR: u8 = 0x0F;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const FNPTR: u8 = 0x1B;
    pub const SZARRAY: u8 = 0x1D;
    pub const MVAR: u8 = 0x1E;
    pub const CMOD_REQD: u8 = 0x1F;
    pub const CMOD_OPT: u8 = 0x20;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

pub mod calling_convention {
    pub const DEFAULT: u8 = 0x00;
    pub const VARARG: u8 = 0x05;
    pub const FIELD: u8 = 0x06;
    pub const PROPERTY: u8 = 0x08;
    pub const GENERIC: u8 = 0x10;
    pub const HAS_THIS: u8 = 0x20;
    pub const EXPLICIT_THIS: u8 = 0x40;
    pub const KIND_MASK: u8 = 0x0F;
}

// =============================================================================
// Blob Reader
// =============================================================================

pub struct BlobReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn peek_u8(&self) -> Result<u8> {
        Ok(self.data.pread::<u8>(self.offset)?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.data.gread::<u8>(&mut self.offset)?)
    }

    pub fn read_compressed_u32(&mut self) -> Result<u32> {
        heaps::read_compressed_u32(self.data, &mut self.offset)
    }

    pub fn read_compressed_i32(&mut self) -> Result<i32> {
        heaps::read_compressed_i32(self.data, &mut self.offset)
    }

    /// Element count of a list in which every element takes at least one
    /// byte; a count the blob cannot hold is malformed.
    pub fn read_count(&mut self, what: &str) -> Result<u32> {
        let count = self.read_compressed_u32()?;
        if count as usize > self.remaining() {
            return Err(MetadataError::Malformed(format!(
                "{what} count {count} exceeds the {} bytes left in the blob",
                self.remaining()
            )));
        }
        Ok(count)
    }

    /// `TypeDefOrRefOrSpecEncoded` token.
    pub fn read_type_token(&mut self) -> Result<MetadataToken> {
        let raw = self.read_compressed_u32()?;
        CodedIndex::TypeDefOrRef.decode(raw)
    }
}

// =============================================================================
// Decoded Signatures
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub has_this: bool,
    pub generic_param_count: u32,
    pub return_type: TypeDescriptor,
    pub params: Vec<TypeDescriptor>,
    /// Parameters before the vararg sentinel; equals `params.len()` without
    /// one.
    pub required_count: u32,
}

/// Resolves type tokens found inside signatures.
pub trait TypeHandleProvider {
    /// Descriptor of a TypeDef, TypeRef or TypeSpec token. `depth` is the
    /// current signature nesting, forwarded when a TypeSpec blob is decoded.
    fn type_from_token(&self, token: MetadataToken, depth: u32) -> Result<TypeDescriptor>;
}

pub struct SignatureDecoder<'p, P: ?Sized> {
    provider: &'p P,
}

impl<'p, P: TypeHandleProvider + ?Sized> SignatureDecoder<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    pub fn field(&self, blob: &[u8]) -> Result<TypeDescriptor> {
        let mut reader = BlobReader::new(blob);
        let header = reader.read_u8()?;
        if header & calling_convention::KIND_MASK != calling_convention::FIELD {
            return Err(MetadataError::Malformed(format!(
                "expected field signature, found 0x{header:02x}"
            )));
        }
        self.decode_type(&mut reader, 0)
    }

    pub fn property(&self, blob: &[u8]) -> Result<MethodSignature> {
        let mut reader = BlobReader::new(blob);
        let header = reader.read_u8()?;
        if header & calling_convention::KIND_MASK != calling_convention::PROPERTY {
            return Err(MetadataError::Malformed(format!(
                "expected property signature, found 0x{header:02x}"
            )));
        }
        self.method_body(&mut reader, header, 0)
    }

    pub fn method(&self, blob: &[u8]) -> Result<MethodSignature> {
        let mut reader = BlobReader::new(blob);
        let header = reader.read_u8()?;
        self.method_body(&mut reader, header, 0)
    }

    /// Type arguments of a MethodSpec instantiation blob.
    pub fn method_instantiation(&self, blob: &[u8]) -> Result<Vec<TypeDescriptor>> {
        let mut reader = BlobReader::new(blob);
        let header = reader.read_u8()?;
        if header != 0x0A {
            return Err(MetadataError::Malformed(format!(
                "expected method instantiation, found 0x{header:02x}"
            )));
        }
        let count = reader.read_count("type argument")?;
        (0..count)
            .map(|_| self.decode_type(&mut reader, 0))
            .collect()
    }

    /// A TypeSpec blob.
    pub fn type_spec(&self, blob: &[u8], depth: u32) -> Result<TypeDescriptor> {
        self.decode_type(&mut BlobReader::new(blob), depth)
    }

    /// Splits a `GENERICINST` TypeSpec into its open type token and decoded
    /// arguments. `None` for any other TypeSpec.
    pub fn generic_instance(
        &self,
        blob: &[u8],
    ) -> Result<Option<(MetadataToken, Vec<TypeDescriptor>)>> {
        let mut reader = BlobReader::new(blob);
        if reader.read_u8()? != element::GENERICINST {
            return Ok(None);
        }
        let _class_or_value = reader.read_u8()?;
        let open = reader.read_type_token()?;
        let count = reader.read_count("type argument")?;
        let args = (0..count)
            .map(|_| self.decode_type(&mut reader, 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some((open, args)))
    }

    fn method_body(
        &self,
        reader: &mut BlobReader<'_>,
        header: u8,
        depth: u32,
    ) -> Result<MethodSignature> {
        let generic_param_count = if header & calling_convention::GENERIC != 0 {
            reader.read_compressed_u32()?
        } else {
            0
        };
        let count = reader.read_count("parameter")?;
        let return_type = self.decode_type(reader, depth)?;

        let mut params = Vec::with_capacity(count as usize);
        let mut required_count = None;
        while params.len() < count as usize {
            if reader.peek_u8()? == element::SENTINEL {
                reader.read_u8()?;
                required_count = Some(params.len() as u32);
                continue;
            }
            params.push(self.decode_type(reader, depth)?);
        }

        Ok(MethodSignature {
            has_this: header & calling_convention::HAS_THIS != 0,
            generic_param_count,
            return_type,
            required_count: required_count.unwrap_or(count),
            params,
        })
    }

    pub fn decode_type(&self, reader: &mut BlobReader<'_>, depth: u32) -> Result<TypeDescriptor> {
        if depth > MAX_SIGNATURE_DEPTH {
            return Err(MetadataError::SignatureTooDeep(MAX_SIGNATURE_DEPTH));
        }
        let code = reader.read_u8()?;
        if let Some(primitive) = PrimitiveType::from_element_type(code) {
            return Ok(TypeDescriptor::from_primitive(primitive));
        }
        let next = depth + 1;
        Ok(match code {
            element::CMOD_REQD | element::CMOD_OPT => {
                reader.read_type_token()?;
                return self.decode_type(reader, next);
            }
            element::PTR => self.decode_type(reader, next)?.with_pointer(),
            element::BYREF => self.decode_type(reader, next)?.with_by_ref(),
            element::PINNED => self.decode_type(reader, next)?.pinned(),
            element::VALUETYPE | element::CLASS => {
                let token = reader.read_type_token()?;
                self.provider.type_from_token(token, next)?
            }
            element::VAR => TypeDescriptor::type_parameter(reader.read_compressed_u32()?),
            element::MVAR => TypeDescriptor::method_parameter(reader.read_compressed_u32()?),
            element::SZARRAY => self
                .decode_type(reader, next)?
                .with_array(ArrayShape::Vector),
            element::ARRAY => {
                let element_type = self.decode_type(reader, next)?;
                let shape = decode_array_shape(reader)?;
                element_type.with_array(shape)
            }
            element::GENERICINST => {
                let _class_or_value = reader.read_u8()?;
                let token = reader.read_type_token()?;
                let open = self.provider.type_from_token(token, next)?;
                let count = reader.read_count("type argument")?;
                let args = (0..count)
                    .map(|_| self.decode_type(reader, next))
                    .collect::<Result<Vec<_>>>()?;
                TypeDescriptor::Generic {
                    open: Box::new(open),
                    args,
                }
            }
            element::FNPTR => {
                let header = reader.read_u8()?;
                let signature = self.method_body(reader, header, next)?;
                TypeDescriptor::function_pointer(
                    signature.return_type,
                    signature.params,
                    signature.required_count,
                )
            }
            other => {
                return Err(MetadataError::Malformed(format!(
                    "unknown element type 0x{other:02x}"
                )));
            }
        })
    }
}

fn decode_array_shape(reader: &mut BlobReader<'_>) -> Result<ArrayShape> {
    let rank = reader.read_compressed_u32()?;
    if rank == 0 || rank > MAX_ARRAY_RANK {
        return Err(MetadataError::Malformed(format!("array rank {rank}")));
    }
    let size_count = reader.read_count("array size")?;
    if size_count > rank {
        return Err(MetadataError::Malformed(format!(
            "{size_count} sizes for an array of rank {rank}"
        )));
    }
    let sizes = (0..size_count)
        .map(|_| reader.read_compressed_u32())
        .collect::<Result<Vec<_>>>()?;
    let bound_count = reader.read_count("array bound")?;
    if bound_count > rank {
        return Err(MetadataError::Malformed(format!(
            "{bound_count} lower bounds for an array of rank {rank}"
        )));
    }
    let lower_bounds = (0..bound_count)
        .map(|_| reader.read_compressed_i32())
        .collect::<Result<Vec<_>>>()?;
    Ok(ArrayShape::Shaped {
        rank,
        sizes,
        lower_bounds,
    })
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
