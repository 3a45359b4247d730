//! ECMA-335 metadata reader and the binary metadata resolution backend.
//!
//! - `image`: PE container, metadata root, streams and table access
//! - `tables`: table schema, coded indexes and row layout
//! - `heaps`: string/blob heaps and compressed integers
//! - `signature`: signature blob decoding into `TypeDescriptor`s
//! - `names`: the metadata name formatter
//! - `locator`: assembly name to file mapping
//! - `cache`: per-pass image cache
//! - `backend`: `MetadataBackend`, the `ResolutionBackend` over metadata

pub mod backend;
pub mod cache;
pub mod error;
pub mod heaps;
pub mod image;
pub mod locator;
pub mod names;
pub mod signature;
pub mod tables;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use backend::{MetadataBackend, MetadataType};
pub use cache::ImageCache;
pub use error::{MetadataError, Result};
pub use image::{Accessors, MetadataImage};
pub use locator::AssemblyLocator;
pub use names::{NameFormatter, TypeRefScope};
pub use signature::{MethodSignature, SignatureDecoder, TypeHandleProvider};
pub use tables::{CodedIndex, MetadataToken, TableId, TableLayout};
