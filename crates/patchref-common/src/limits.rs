//! Centralized limits for the resolution engine.
//!
//! Metadata read from disk is untrusted: signatures may nest arbitrarily and
//! base-type links may form cycles in a corrupt image. These limits bound the
//! recursive and iterative algorithms that walk them.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth while decoding a signature blob.
///
/// `List<List<List<...>>>`, pointer-to-pointer chains and function pointer
/// parameters each add one level. Decoding beyond this depth is treated as
/// corrupt metadata.
pub const MAX_SIGNATURE_DEPTH: u32 = 64;

/// Maximum rank of a multi-dimensional array, as enforced by the runtime.
pub const MAX_ARRAY_RANK: u32 = 32;

/// Maximum depth of enclosing types followed when naming a nested type.
pub const MAX_NESTING_DEPTH: u32 = 32;

// =============================================================================
// Iteration Limits
// =============================================================================

/// Default maximum number of base types followed by one member search.
///
/// Real hierarchies are rarely deeper than ten levels; the limit exists to
/// stop walks over cyclic `Extends` chains.
pub const DEFAULT_MAX_BASE_DEPTH: u32 = 64;

/// Maximum number of type-reference hops followed while locating a type
/// (forwarded references across assemblies).
pub const MAX_TYPE_REFERENCE_HOPS: u32 = 16;

/// Maximum directory depth scanned below each probe directory.
pub const MAX_PROBE_DEPTH: usize = 4;
