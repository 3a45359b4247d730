//! patchref: static verification of reflection member references.
//!
//! Runtime patching frameworks look members up by name (`Field("Game.Player:health")`,
//! patch attributes naming a method and its parameter types). A typo or an
//! upstream rename turns such a lookup into a runtime failure. patchref checks
//! every lookup a host hands over against the referenced assemblies' metadata
//! and against the symbols the host compiler bound, and reports the lookups
//! that can never succeed.
//!
//! The engine lives in the workspace crates, re-exported here:
//!
//! - [`common`]: source locations and diagnostics
//! - [`model`]: type descriptors, member queries and resolution outcomes
//! - [`metadata`]: the ECMA-335 metadata reader and its backend
//! - [`symbols`]: the compiler-symbol table and its backend
//! - [`checker`]: call-site shaping, dispatch, coalesce chains and the engine
//!
//! This crate adds the analysis manifest, tracing setup and the CLI.

pub use patchref_checker as checker;
pub use patchref_common as common;
pub use patchref_metadata as metadata;
pub use patchref_model as model;
pub use patchref_symbols as symbols;

pub use patchref_checker::{CallSite, Compilation, Engine, EngineOptions, FallbackExpr, Verdict};
pub use patchref_common::{Diagnostic, DiagnosticCode, SourceLocation};

pub mod manifest;
pub use manifest::Manifest;

// Tracing configuration (PATCHREF_LOG / PATCHREF_LOG_FORMAT)
pub mod tracing_config;

#[cfg(feature = "cli")]
pub mod cli;
