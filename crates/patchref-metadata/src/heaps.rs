//! `#Strings` and `#Blob` heap access plus compressed integers (II.23.2).

use crate::error::{MetadataError, Result};
use scroll::{BE, Pread};

/// Reads the null-terminated UTF-8 string at `index`. Index 0 is "".
pub fn string_at(heap: &[u8], index: u32) -> Result<&str> {
    let start = index as usize;
    let tail = heap
        .get(start..)
        .ok_or_else(|| MetadataError::Malformed(format!("string index {index} outside heap")))?;
    let len = tail
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| MetadataError::Malformed(format!("unterminated string at {index}")))?;
    std::str::from_utf8(&tail[..len])
        .map_err(|_| MetadataError::Malformed(format!("invalid UTF-8 in string at {index}")))
}

/// Reads the length-prefixed blob at `index`.
pub fn blob_at(heap: &[u8], index: u32) -> Result<&[u8]> {
    let mut offset = index as usize;
    let len = read_compressed_u32(heap, &mut offset)? as usize;
    heap.get(offset..offset + len)
        .ok_or_else(|| MetadataError::Malformed(format!("blob at {index} exceeds heap")))
}

/// Decodes an unsigned compressed integer and advances `offset`.
pub fn read_compressed_u32(data: &[u8], offset: &mut usize) -> Result<u32> {
    let first: u8 = data.pread(*offset)?;
    if first & 0x80 == 0 {
        *offset += 1;
        Ok(first as u32)
    } else if first & 0xC0 == 0x80 {
        let value: u16 = data.gread_with(offset, BE)?;
        Ok((value & 0x3FFF) as u32)
    } else if first & 0xE0 == 0xC0 {
        let value: u32 = data.gread_with(offset, BE)?;
        Ok(value & 0x1FFF_FFFF)
    } else {
        Err(MetadataError::Malformed(format!(
            "invalid compressed integer lead byte 0x{first:02x}"
        )))
    }
}

/// Decodes a signed compressed integer (rotated sign bit) and advances
/// `offset`.
pub fn read_compressed_i32(data: &[u8], offset: &mut usize) -> Result<i32> {
    let start = *offset;
    let raw = read_compressed_u32(data, offset)?;
    let sign_extend = match *offset - start {
        1 => 0xFFFF_FFC0u32,
        2 => 0xFFFF_E000u32,
        _ => 0xF000_0000u32,
    };
    let value = if raw & 1 == 0 {
        raw >> 1
    } else {
        (raw >> 1) | sign_extend
    };
    Ok(value as i32)
}

/// Appends `value` in compressed form. Values above 0x1FFF_FFFF are not
/// representable.
pub fn write_compressed_u32(out: &mut Vec<u8>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.extend_from_slice(&((value as u16) | 0x8000).to_be_bytes());
    } else {
        out.extend_from_slice(&(value | 0xC000_0000).to_be_bytes());
    }
}

/// Appends a signed compressed integer. The width is chosen from the
/// signed range, not from the rotated value.
pub fn write_compressed_i32(out: &mut Vec<u8>, value: i32) {
    let rotate = |mask: u32| (((value as u32) << 1) & mask) | u32::from(value < 0);
    if (-0x40..0x40).contains(&value) {
        out.push(rotate(0x7F) as u8);
    } else if (-0x2000..0x2000).contains(&value) {
        out.extend_from_slice(&((rotate(0x3FFF) as u16) | 0x8000).to_be_bytes());
    } else {
        out.extend_from_slice(&(rotate(0x1FFF_FFFF) | 0xC000_0000).to_be_bytes());
    }
}

#[cfg(test)]
#[path = "../tests/heaps_tests.rs"]
mod tests;
