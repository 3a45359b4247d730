//! Common types and utilities for the patchref engine.
//!
//! This crate provides foundational types used across all patchref crates:
//! - Source locations of analyzed call sites (`SourceLocation`)
//! - Diagnostic codes, messages and the `Diagnostic` record
//! - Centralized limits for recursive decoding and base-type walks

// Source location tracking for call sites
pub mod location;
pub use location::SourceLocation;

// Diagnostic codes and message templates
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCode};

// Centralized limits and thresholds
pub mod limits;
