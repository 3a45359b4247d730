//! Errors raised while opening or decoding an image.

use crate::tables::TableId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a managed image: {0}")]
    NotManaged(&'static str),
    #[error("malformed metadata: {0}")]
    Malformed(String),
    #[error("read outside of image bounds: {0}")]
    OutOfBounds(#[from] scroll::Error),
    #[error("row {row} out of range for table {table:?}")]
    InvalidRow { table: TableId, row: u32 },
    #[error("unsupported metadata table 0x{0:02x}")]
    UnsupportedTable(u8),
    #[error("signature nesting deeper than {0} levels")]
    SignatureTooDeep(u32),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
