//! Diagnostic codes and message lookup.
//!
//! The engine reports seven kinds of failures. Each kind owns one numeric
//! code; static and instance constructor failures share a code but use
//! different message templates.

use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCode {
    MemberNotFound,
    AssemblyNotFound,
    TypeNotFound,
    MissingGetter,
    MissingSetter,
    WrongFieldType,
    MissingConstructor,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 7] = [
        DiagnosticCode::MemberNotFound,
        DiagnosticCode::AssemblyNotFound,
        DiagnosticCode::TypeNotFound,
        DiagnosticCode::MissingGetter,
        DiagnosticCode::MissingSetter,
        DiagnosticCode::WrongFieldType,
        DiagnosticCode::MissingConstructor,
    ];

    /// Numeric code, stable across releases.
    pub fn code(self) -> u32 {
        match self {
            DiagnosticCode::MemberNotFound => 1,
            DiagnosticCode::AssemblyNotFound => 2,
            DiagnosticCode::TypeNotFound => 3,
            DiagnosticCode::MissingGetter => 4,
            DiagnosticCode::MissingSetter => 5,
            DiagnosticCode::WrongFieldType => 6,
            DiagnosticCode::MissingConstructor => 7,
        }
    }

    /// Display identifier, e.g. `PR0001`.
    pub fn id(self) -> String {
        format!("PR{:04}", self.code())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: DiagnosticCode,
    pub key: &'static str,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod messages {
    use super::{DiagnosticCategory, DiagnosticCode, DiagnosticMessage};

    pub const MEMBER_NOT_FOUND: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::MemberNotFound,
        key: "member_not_found",
        category: DiagnosticCategory::Error,
        message: "Member '{1}' does not exist on type '{0}'.",
    };
    pub const ASSEMBLY_NOT_FOUND: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::AssemblyNotFound,
        key: "assembly_not_found",
        category: DiagnosticCategory::Error,
        message: "Assembly '{0}' declaring type '{1}' could not be found.",
    };
    pub const TYPE_NOT_FOUND: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::TypeNotFound,
        key: "type_not_found",
        category: DiagnosticCategory::Error,
        message: "Type '{0}' could not be found.",
    };
    pub const MISSING_GETTER: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::MissingGetter,
        key: "missing_getter",
        category: DiagnosticCategory::Error,
        message: "Property '{0}' does not have a getter.",
    };
    pub const MISSING_SETTER: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::MissingSetter,
        key: "missing_setter",
        category: DiagnosticCategory::Error,
        message: "Property '{0}' does not have a setter.",
    };
    pub const WRONG_FIELD_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::WrongFieldType,
        key: "wrong_field_type",
        category: DiagnosticCategory::Error,
        message: "Field on type '{0}' is declared as '{2}', not '{1}'.",
    };
    pub const MISSING_CONSTRUCTOR: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::MissingConstructor,
        key: "missing_constructor",
        category: DiagnosticCategory::Error,
        message: "Type '{0}' has no constructor matching the given parameters.",
    };
    pub const MISSING_STATIC_CONSTRUCTOR: DiagnosticMessage = DiagnosticMessage {
        code: DiagnosticCode::MissingConstructor,
        key: "missing_static_constructor",
        category: DiagnosticCategory::Error,
        message: "Type '{0}' has no static constructor.",
    };

    pub const ALL: [DiagnosticMessage; 8] = [
        MEMBER_NOT_FOUND,
        ASSEMBLY_NOT_FOUND,
        TYPE_NOT_FOUND,
        MISSING_GETTER,
        MISSING_SETTER,
        WRONG_FIELD_TYPE,
        MISSING_CONSTRUCTOR,
        MISSING_STATIC_CONSTRUCTOR,
    ];
}

pub fn get_message_template(key: &str) -> Option<&'static str> {
    messages::ALL
        .iter()
        .find(|m| m.key == key)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

// =============================================================================
// Diagnostic
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub category: DiagnosticCategory,
    pub location: SourceLocation,
    pub message_text: String,
}

impl Diagnostic {
    pub fn new(message: &DiagnosticMessage, location: SourceLocation, args: &[&str]) -> Self {
        Self {
            code: message.code,
            category: message.category,
            location,
            message_text: format_message(message.message, args),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.location,
            match self.category {
                DiagnosticCategory::Error => "error",
                DiagnosticCategory::Warning => "warning",
            },
            self.code,
            self.message_text
        )
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
