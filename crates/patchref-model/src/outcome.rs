//! Resolution outcomes.
//!
//! Failures are data. A query that cannot be decided (non-constant input,
//! unreadable image, broken base link) is `Inconclusive` and never reported.

use patchref_common::diagnostics::{DiagnosticMessage, messages};
use patchref_common::{Diagnostic, DiagnosticCode, SourceLocation};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionOutcome {
    Found,
    AssemblyNotFound {
        assembly: String,
        type_name: String,
    },
    TypeNotFound {
        type_name: String,
    },
    MemberNotFound {
        type_name: String,
        member_name: String,
    },
    MissingGetter {
        member_name: String,
    },
    MissingSetter {
        member_name: String,
    },
    WrongFieldType {
        owner: String,
        expected: String,
        actual: String,
    },
    MissingConstructor {
        type_name: String,
    },
    MissingStaticConstructor {
        type_name: String,
    },
}

impl ResolutionOutcome {
    pub fn member_not_found(type_name: impl Into<String>, member_name: impl Into<String>) -> Self {
        ResolutionOutcome::MemberNotFound {
            type_name: type_name.into(),
            member_name: member_name.into(),
        }
    }

    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        ResolutionOutcome::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_found()
    }

    /// Replaces the owner type name of owner-scoped failures. Used when a
    /// search started on one type and finished on a base type resolved by a
    /// different backend.
    pub fn with_owner_name(self, name: &str) -> Self {
        match self {
            ResolutionOutcome::MemberNotFound { member_name, .. } => {
                ResolutionOutcome::MemberNotFound {
                    type_name: name.to_string(),
                    member_name,
                }
            }
            ResolutionOutcome::WrongFieldType {
                expected, actual, ..
            } => ResolutionOutcome::WrongFieldType {
                owner: name.to_string(),
                expected,
                actual,
            },
            ResolutionOutcome::MissingConstructor { .. } => ResolutionOutcome::MissingConstructor {
                type_name: name.to_string(),
            },
            ResolutionOutcome::MissingStaticConstructor { .. } => {
                ResolutionOutcome::MissingStaticConstructor {
                    type_name: name.to_string(),
                }
            }
            other => other,
        }
    }

    pub fn diagnostic_code(&self) -> Option<DiagnosticCode> {
        self.message().map(|m| m.code)
    }

    fn message(&self) -> Option<&'static DiagnosticMessage> {
        Some(match self {
            ResolutionOutcome::Found => return None,
            ResolutionOutcome::AssemblyNotFound { .. } => &messages::ASSEMBLY_NOT_FOUND,
            ResolutionOutcome::TypeNotFound { .. } => &messages::TYPE_NOT_FOUND,
            ResolutionOutcome::MemberNotFound { .. } => &messages::MEMBER_NOT_FOUND,
            ResolutionOutcome::MissingGetter { .. } => &messages::MISSING_GETTER,
            ResolutionOutcome::MissingSetter { .. } => &messages::MISSING_SETTER,
            ResolutionOutcome::WrongFieldType { .. } => &messages::WRONG_FIELD_TYPE,
            ResolutionOutcome::MissingConstructor { .. } => &messages::MISSING_CONSTRUCTOR,
            ResolutionOutcome::MissingStaticConstructor { .. } => {
                &messages::MISSING_STATIC_CONSTRUCTOR
            }
        })
    }

    fn message_args(&self) -> Vec<&str> {
        match self {
            ResolutionOutcome::Found => Vec::new(),
            ResolutionOutcome::AssemblyNotFound {
                assembly,
                type_name,
            } => vec![assembly.as_str(), type_name.as_str()],
            ResolutionOutcome::TypeNotFound { type_name }
            | ResolutionOutcome::MissingConstructor { type_name }
            | ResolutionOutcome::MissingStaticConstructor { type_name } => vec![type_name.as_str()],
            ResolutionOutcome::MemberNotFound {
                type_name,
                member_name,
            } => vec![type_name.as_str(), member_name.as_str()],
            ResolutionOutcome::MissingGetter { member_name }
            | ResolutionOutcome::MissingSetter { member_name } => vec![member_name.as_str()],
            ResolutionOutcome::WrongFieldType {
                owner,
                expected,
                actual,
            } => vec![owner.as_str(), expected.as_str(), actual.as_str()],
        }
    }

    /// Diagnostic for a failed outcome; `None` for `Found`.
    pub fn to_diagnostic(&self, location: SourceLocation) -> Option<Diagnostic> {
        let message = self.message()?;
        Some(Diagnostic::new(message, location, &self.message_args()))
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            None => f.write_str("found"),
            Some(message) => f.write_str(&patchref_common::diagnostics::format_message(
                message.message,
                &self.message_args(),
            )),
        }
    }
}

// =============================================================================
// Inconclusive
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InconclusiveReason {
    /// An argument could not be evaluated statically.
    NonConstantArgument,
    /// The call shape is not one of the recognized lookups.
    UnrecognizedShape,
    /// A type parameter without constraints was used as owner.
    UnconstrainedTypeParameter,
    /// An assembly image could not be opened or parsed.
    UnreadableImage,
    /// A base type link could not be followed by any backend.
    BrokenBaseLink,
    /// The analysis pass was cancelled.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Inconclusive {
    pub reason: InconclusiveReason,
    pub detail: String,
}

impl Inconclusive {
    pub fn new(reason: InconclusiveReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Inconclusive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.reason, self.detail)
    }
}

/// Result of resolving one query against one owner.
pub type Resolution = Result<ResolutionOutcome, Inconclusive>;

#[cfg(test)]
#[path = "../tests/outcome_tests.rs"]
mod tests;
