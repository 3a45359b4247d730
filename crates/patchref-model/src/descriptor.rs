//! Signature Type Model.
//!
//! `TypeDescriptor` is the backend-agnostic shape of a CLR type as it occurs
//! in a signature. The metadata backend builds descriptors by decoding blobs,
//! the symbol backend by converting compiler symbols. The two never compare
//! descriptors structurally: the canonical string is the only contract.
//!
//! ## Canonical form
//!
//! | Shape | Rendering |
//! |---|---|
//! | primitive / named | `System.Int32`, `Ns.Type` |
//! | nested | `Ns.Outer+Inner` |
//! | generic instantiation | `Ns.List<System.Int32>` |
//! | vector | `T[]` |
//! | array with shape | `T[0...3,0...]` |
//! | pointer / byref / pinned | `T*`, `T&`, `T pinned` |
//! | function pointer | `method R *(A, ..., B)` |
//! | generic parameter | `!0` (type), `!!0` (method) |
//!
//! Arity markers (`` List`1 ``) are stripped in the canonical form.

use patchref_common::limits::MAX_ARRAY_RANK;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use thiserror::Error;

// =============================================================================
// Primitive Types
// =============================================================================

/// Element types with a dedicated encoding in signatures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    String,
    IntPtr,
    UIntPtr,
    Object,
    TypedReference,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 18] = [
        PrimitiveType::Void,
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::SByte,
        PrimitiveType::Byte,
        PrimitiveType::Int16,
        PrimitiveType::UInt16,
        PrimitiveType::Int32,
        PrimitiveType::UInt32,
        PrimitiveType::Int64,
        PrimitiveType::UInt64,
        PrimitiveType::Single,
        PrimitiveType::Double,
        PrimitiveType::String,
        PrimitiveType::IntPtr,
        PrimitiveType::UIntPtr,
        PrimitiveType::Object,
        PrimitiveType::TypedReference,
    ];

    /// Namespace-qualified name of the primitive.
    pub fn full_name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "System.Void",
            PrimitiveType::Boolean => "System.Boolean",
            PrimitiveType::Char => "System.Char",
            PrimitiveType::SByte => "System.SByte",
            PrimitiveType::Byte => "System.Byte",
            PrimitiveType::Int16 => "System.Int16",
            PrimitiveType::UInt16 => "System.UInt16",
            PrimitiveType::Int32 => "System.Int32",
            PrimitiveType::UInt32 => "System.UInt32",
            PrimitiveType::Int64 => "System.Int64",
            PrimitiveType::UInt64 => "System.UInt64",
            PrimitiveType::Single => "System.Single",
            PrimitiveType::Double => "System.Double",
            PrimitiveType::String => "System.String",
            PrimitiveType::IntPtr => "System.IntPtr",
            PrimitiveType::UIntPtr => "System.UIntPtr",
            PrimitiveType::Object => "System.Object",
            PrimitiveType::TypedReference => "System.TypedReference",
        }
    }

    /// Maps an ECMA-335 element type code (II.23.1.16) to a primitive.
    pub fn from_element_type(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => PrimitiveType::Void,
            0x02 => PrimitiveType::Boolean,
            0x03 => PrimitiveType::Char,
            0x04 => PrimitiveType::SByte,
            0x05 => PrimitiveType::Byte,
            0x06 => PrimitiveType::Int16,
            0x07 => PrimitiveType::UInt16,
            0x08 => PrimitiveType::Int32,
            0x09 => PrimitiveType::UInt32,
            0x0a => PrimitiveType::Int64,
            0x0b => PrimitiveType::UInt64,
            0x0c => PrimitiveType::Single,
            0x0d => PrimitiveType::Double,
            0x0e => PrimitiveType::String,
            0x16 => PrimitiveType::TypedReference,
            0x18 => PrimitiveType::IntPtr,
            0x19 => PrimitiveType::UIntPtr,
            0x1c => PrimitiveType::Object,
            _ => return None,
        })
    }

    pub fn from_full_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.full_name() == name)
    }
}

// =============================================================================
// Array Shapes
// =============================================================================

/// Shape of an array type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayShape {
    /// Single-dimensional, zero-based array (`T[]`).
    Vector,
    /// General array; `sizes` and `lower_bounds` may be shorter than `rank`.
    Shaped {
        rank: u32,
        sizes: Vec<u32>,
        lower_bounds: Vec<i32>,
    },
}

impl ArrayShape {
    pub fn rank(&self) -> u32 {
        match self {
            ArrayShape::Vector => 1,
            ArrayShape::Shaped { rank, .. } => *rank,
        }
    }

    /// Multi-dimensional shape without declared sizes or bounds, as emitted by
    /// C# compilers for `T[,]`.
    pub fn multi(rank: u32) -> Self {
        ArrayShape::Shaped {
            rank,
            sizes: Vec::new(),
            lower_bounds: Vec::new(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            ArrayShape::Vector => out.push_str("[]"),
            ArrayShape::Shaped {
                rank,
                sizes,
                lower_bounds,
            } => {
                out.push('[');
                for i in 0..*rank as usize {
                    let lower = lower_bounds.get(i).copied().unwrap_or(0);
                    let _ = write!(out, "{lower}...");
                    if let Some(size) = sizes.get(i) {
                        let upper = i64::from(lower) + i64::from(*size) - 1;
                        let _ = write!(out, "{upper}");
                    }
                    if i + 1 < *rank as usize {
                        out.push(',');
                    }
                }
                out.push(']');
            }
        }
    }
}

/// Which generic declaration a generic parameter belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GenericParamOwner {
    Type,
    Method,
}

// =============================================================================
// TypeDescriptor
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    Primitive(PrimitiveType),
    /// Namespace-qualified top-level type name; may carry an arity marker.
    Named(String),
    Generic {
        open: Box<TypeDescriptor>,
        args: Vec<TypeDescriptor>,
    },
    Array {
        element: Box<TypeDescriptor>,
        shape: ArrayShape,
    },
    Pointer(Box<TypeDescriptor>),
    ByRef(Box<TypeDescriptor>),
    Pinned(Box<TypeDescriptor>),
    FunctionPointer {
        return_type: Box<TypeDescriptor>,
        params: Vec<TypeDescriptor>,
        required_count: u32,
    },
    Nested {
        enclosing: Box<TypeDescriptor>,
        name: String,
    },
    GenericParameter {
        owner: GenericParamOwner,
        index: u32,
    },
}

impl TypeDescriptor {
    pub fn from_primitive(code: PrimitiveType) -> Self {
        TypeDescriptor::Primitive(code)
    }

    /// Named type. Primitive names normalize to `Primitive`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        match PrimitiveType::from_full_name(&name) {
            Some(primitive) => TypeDescriptor::Primitive(primitive),
            None => TypeDescriptor::Named(name),
        }
    }

    /// Named type from separate namespace and name.
    pub fn qualified(namespace: &str, name: &str) -> Self {
        if namespace.is_empty() {
            Self::named(name)
        } else {
            Self::named(format!("{namespace}.{name}"))
        }
    }

    pub fn nested(enclosing: TypeDescriptor, name: impl Into<String>) -> Self {
        TypeDescriptor::Nested {
            enclosing: Box::new(enclosing),
            name: name.into(),
        }
    }

    pub fn type_parameter(index: u32) -> Self {
        TypeDescriptor::GenericParameter {
            owner: GenericParamOwner::Type,
            index,
        }
    }

    pub fn method_parameter(index: u32) -> Self {
        TypeDescriptor::GenericParameter {
            owner: GenericParamOwner::Method,
            index,
        }
    }

    pub fn function_pointer(
        return_type: TypeDescriptor,
        params: Vec<TypeDescriptor>,
        required_count: u32,
    ) -> Self {
        TypeDescriptor::FunctionPointer {
            return_type: Box::new(return_type),
            params,
            required_count,
        }
    }

    pub fn with_generic(self, args: Vec<TypeDescriptor>) -> Self {
        if args.is_empty() {
            return self;
        }
        TypeDescriptor::Generic {
            open: Box::new(self),
            args,
        }
    }

    pub fn with_array(self, shape: ArrayShape) -> Self {
        TypeDescriptor::Array {
            element: Box::new(self),
            shape,
        }
    }

    pub fn with_pointer(self) -> Self {
        TypeDescriptor::Pointer(Box::new(self))
    }

    pub fn with_by_ref(self) -> Self {
        TypeDescriptor::ByRef(Box::new(self))
    }

    pub fn pinned(self) -> Self {
        TypeDescriptor::Pinned(Box::new(self))
    }

    /// Same wrapper, different element. Non-wrapper descriptors are returned
    /// unchanged.
    pub fn with_element(&self, element: TypeDescriptor) -> Self {
        match self {
            TypeDescriptor::Array { shape, .. } => element.with_array(shape.clone()),
            TypeDescriptor::Pointer(_) => element.with_pointer(),
            TypeDescriptor::ByRef(_) => element.with_by_ref(),
            TypeDescriptor::Pinned(_) => element.pinned(),
            other => other.clone(),
        }
    }

    /// Element of an array, pointer, byref or pinned descriptor.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array { element, .. }
            | TypeDescriptor::Pointer(element)
            | TypeDescriptor::ByRef(element)
            | TypeDescriptor::Pinned(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeDescriptor::ByRef(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeDescriptor::Pointer(_))
    }

    /// Strips one byref wrapper, if any.
    pub fn without_by_ref(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::ByRef(inner) => inner,
            other => other,
        }
    }

    /// Strips one pointer wrapper, if any.
    pub fn without_pointer(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Pointer(inner) => inner,
            other => other,
        }
    }

    /// The generic type definition of an instantiation (or `self`).
    pub fn open_definition(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Generic { open, .. } => open,
            other => other,
        }
    }

    pub fn generic_arguments(&self) -> &[TypeDescriptor] {
        match self {
            TypeDescriptor::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// Replaces generic parameters with the given arguments. Parameters
    /// without a corresponding argument are kept.
    pub fn substitute(&self, type_args: &[TypeDescriptor], method_args: &[TypeDescriptor]) -> Self {
        if type_args.is_empty() && method_args.is_empty() {
            return self.clone();
        }
        match self {
            TypeDescriptor::GenericParameter { owner, index } => {
                let args = match owner {
                    GenericParamOwner::Type => type_args,
                    GenericParamOwner::Method => method_args,
                };
                args.get(*index as usize)
                    .cloned()
                    .unwrap_or_else(|| self.clone())
            }
            TypeDescriptor::Generic { open, args } => TypeDescriptor::Generic {
                open: open.clone(),
                args: args
                    .iter()
                    .map(|a| a.substitute(type_args, method_args))
                    .collect(),
            },
            TypeDescriptor::Array { element, .. }
            | TypeDescriptor::Pointer(element)
            | TypeDescriptor::ByRef(element)
            | TypeDescriptor::Pinned(element) => {
                self.with_element(element.substitute(type_args, method_args))
            }
            TypeDescriptor::FunctionPointer {
                return_type,
                params,
                required_count,
            } => TypeDescriptor::FunctionPointer {
                return_type: Box::new(return_type.substitute(type_args, method_args)),
                params: params
                    .iter()
                    .map(|p| p.substitute(type_args, method_args))
                    .collect(),
                required_count: *required_count,
            },
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Named(_)
            | TypeDescriptor::Nested { .. } => self.clone(),
        }
    }

    /// Canonical comparison key: arity markers stripped.
    pub fn canonical_string(&self) -> String {
        self.to_string_with(true)
    }

    pub fn to_string_with(&self, strip_generic_arity: bool) -> String {
        let mut out = String::new();
        self.render(&mut out, strip_generic_arity);
        out
    }

    /// Two descriptors denote the same type when their canonical strings agree.
    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        self == other || self.canonical_string() == other.canonical_string()
    }

    fn render(&self, out: &mut String, strip: bool) {
        match self {
            TypeDescriptor::Primitive(p) => out.push_str(p.full_name()),
            TypeDescriptor::Named(name) => push_name(out, name, strip),
            TypeDescriptor::Nested { enclosing, name } => {
                enclosing.render(out, strip);
                out.push('+');
                push_name(out, name, strip);
            }
            TypeDescriptor::Generic { open, args } => {
                open.render(out, strip);
                out.push('<');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    arg.render(out, strip);
                }
                out.push('>');
            }
            TypeDescriptor::Array { element, shape } => {
                element.render(out, strip);
                shape.render(out);
            }
            TypeDescriptor::Pointer(element) => {
                element.render(out, strip);
                out.push('*');
            }
            TypeDescriptor::ByRef(element) => {
                element.render(out, strip);
                out.push('&');
            }
            TypeDescriptor::Pinned(element) => {
                element.render(out, strip);
                out.push_str(" pinned");
            }
            TypeDescriptor::FunctionPointer {
                return_type,
                params,
                required_count,
            } => {
                out.push_str("method ");
                return_type.render(out, strip);
                out.push_str(" *(");
                let required = *required_count as usize;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if i == required && required < params.len() {
                        out.push_str("..., ");
                    }
                    param.render(out, strip);
                }
                out.push(')');
            }
            TypeDescriptor::GenericParameter { owner, index } => {
                out.push_str(match owner {
                    GenericParamOwner::Type => "!",
                    GenericParamOwner::Method => "!!",
                });
                let _ = write!(out, "{index}");
            }
        }
    }
}

/// Removes `` `N `` arity markers from every segment of a name.
pub fn strip_generic_arity(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    push_name(&mut out, name, true);
    out
}

fn push_name(out: &mut String, name: &str, strip: bool) {
    if !strip || !name.contains('`') {
        out.push_str(name);
        return;
    }
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '`' && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
            while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl From<PrimitiveType> for TypeDescriptor {
    fn from(value: PrimitiveType) -> Self {
        TypeDescriptor::Primitive(value)
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string_with(false)
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = DescriptorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeDescriptor::parse(&value)
    }
}

impl std::str::FromStr for TypeDescriptor {
    type Err = DescriptorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeDescriptor::parse(s)
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorParseError {
    #[error("empty type name")]
    Empty,
    #[error("unexpected '{found}' at offset {offset} in '{text}'")]
    Unexpected {
        text: String,
        offset: usize,
        found: char,
    },
    #[error("unexpected end of '{0}'")]
    UnexpectedEnd(String),
    #[error("function pointer types cannot be written as text: '{0}'")]
    FunctionPointer(String),
    #[error("number at offset {offset} out of range in '{text}'")]
    OutOfRange { text: String, offset: usize },
    #[error("array rank exceeds the maximum in '{0}'")]
    RankTooLarge(String),
}

impl TypeDescriptor {
    /// Parses the textual form produced by [`TypeDescriptor::to_string_with`].
    ///
    /// Function pointers are not accepted.
    pub fn parse(text: &str) -> Result<Self, DescriptorParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DescriptorParseError::Empty);
        }
        if trimmed.starts_with("method ") {
            return Err(DescriptorParseError::FunctionPointer(trimmed.to_string()));
        }
        let mut parser = DescriptorParser {
            text: trimmed,
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_spaces();
        match parser.peek() {
            None => Ok(ty),
            Some(found) => Err(parser.unexpected(found)),
        }
    }
}

struct DescriptorParser<'a> {
    text: &'a str,
    pos: usize,
}

impl DescriptorParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn unexpected(&self, found: char) -> DescriptorParseError {
        DescriptorParseError::Unexpected {
            text: self.text.to_string(),
            offset: self.pos,
            found,
        }
    }

    fn end(&self) -> DescriptorParseError {
        DescriptorParseError::UnexpectedEnd(self.text.to_string())
    }

    /// Narrows a parsed number; `offset` is where its text starts.
    fn in_range<T: TryFrom<i64>>(&self, value: i64, offset: usize) -> Result<T, DescriptorParseError> {
        T::try_from(value).map_err(|_| DescriptorParseError::OutOfRange {
            text: self.text.to_string(),
            offset,
        })
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, DescriptorParseError> {
        self.skip_spaces();
        let mut ty = if self.eat('!') {
            let owner = if self.eat('!') {
                GenericParamOwner::Method
            } else {
                GenericParamOwner::Type
            };
            let start = self.pos;
            let index = self.parse_number()?;
            TypeDescriptor::GenericParameter {
                owner,
                index: self.in_range(index, start)?,
            }
        } else {
            self.parse_named()?
        };
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    ty = ty.with_pointer();
                }
                Some('&') => {
                    self.bump();
                    ty = ty.with_by_ref();
                }
                Some('[') => {
                    self.bump();
                    let shape = self.parse_array_shape()?;
                    ty = ty.with_array(shape);
                }
                Some(' ') if self.text[self.pos..].starts_with(" pinned") => {
                    self.pos += " pinned".len();
                    ty = ty.pinned();
                }
                _ => return Ok(ty),
            }
        }
    }

    fn parse_named(&mut self) -> Result<TypeDescriptor, DescriptorParseError> {
        let first = self.parse_identifier()?;
        let mut ty = TypeDescriptor::named(first);
        while self.eat('+') {
            let nested = self.parse_identifier()?;
            ty = TypeDescriptor::nested(ty, nested);
        }
        if self.eat('<') {
            let mut args = Vec::new();
            loop {
                args.push(self.parse_type()?);
                self.skip_spaces();
                match self.bump() {
                    Some(',') => continue,
                    Some('>') => break,
                    Some(found) => {
                        self.pos -= found.len_utf8();
                        return Err(self.unexpected(found));
                    }
                    None => return Err(self.end()),
                }
            }
            ty = ty.with_generic(args);
        }
        Ok(ty)
    }

    fn parse_identifier(&mut self) -> Result<String, DescriptorParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '+' | '<' | '>' | ',' | '[' | ']' | '*' | '&' | ' ' | '!') {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(found) => self.unexpected(found),
                None => self.end(),
            });
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn parse_number(&mut self) -> Result<i64, DescriptorParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.text[start..self.pos].parse::<i64>().map_err(|_| match self.peek() {
            Some(found) => self.unexpected(found),
            None => self.end(),
        })
    }

    fn parse_array_shape(&mut self) -> Result<ArrayShape, DescriptorParseError> {
        if self.eat(']') {
            return Ok(ArrayShape::Vector);
        }
        let mut rank = 0u32;
        let mut sizes = Vec::new();
        let mut lower_bounds = Vec::new();
        let mut sizes_open = true;
        loop {
            rank += 1;
            if rank > MAX_ARRAY_RANK {
                return Err(DescriptorParseError::RankTooLarge(self.text.to_string()));
            }
            let start = self.pos;
            let lower = self.parse_number()?;
            let lower: i32 = self.in_range(lower, start)?;
            lower_bounds.push(lower);
            for _ in 0..3 {
                if !self.eat('.') {
                    return Err(match self.peek() {
                        Some(found) => self.unexpected(found),
                        None => self.end(),
                    });
                }
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit() || c == '-') {
                let start = self.pos;
                let upper = self.parse_number()?;
                if sizes_open {
                    let size = upper
                        .checked_sub(i64::from(lower))
                        .and_then(|span| span.checked_add(1))
                        .map(|size| size.max(0))
                        .ok_or_else(|| DescriptorParseError::OutOfRange {
                            text: self.text.to_string(),
                            offset: start,
                        })?;
                    sizes.push(self.in_range(size, start)?);
                }
            } else {
                sizes_open = false;
            }
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(found) => {
                    self.pos -= found.len_utf8();
                    return Err(self.unexpected(found));
                }
                None => return Err(self.end()),
            }
        }
        Ok(ArrayShape::Shaped {
            rank,
            sizes,
            lower_bounds,
        })
    }
}

// =============================================================================
// Reflection Names
// =============================================================================

/// Path of a type definition: namespace, outermost name and nested names.
///
/// Names keep their arity markers as written; matching against metadata
/// tolerates a missing marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReflectionName {
    pub namespace: String,
    pub name: String,
    pub nested: Vec<String>,
}

impl ReflectionName {
    /// Parses `Ns.Outer+Inner`. Generic arguments, if written, are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let descriptor = TypeDescriptor::parse(text).ok()?;
        Self::from_descriptor(&descriptor)
    }

    /// Definition path of a named, nested or generic descriptor.
    pub fn from_descriptor(descriptor: &TypeDescriptor) -> Option<Self> {
        match descriptor {
            TypeDescriptor::Primitive(p) => Some(Self::split_top_level(p.full_name())),
            TypeDescriptor::Named(name) => Some(Self::split_top_level(name)),
            TypeDescriptor::Nested { enclosing, name } => {
                let mut outer = Self::from_descriptor(enclosing)?;
                outer.nested.push(name.clone());
                Some(outer)
            }
            TypeDescriptor::Generic { open, .. } => Self::from_descriptor(open),
            _ => None,
        }
    }

    fn split_top_level(full: &str) -> Self {
        match full.rfind('.') {
            Some(dot) => Self {
                namespace: full[..dot].to_string(),
                name: full[dot + 1..].to_string(),
                nested: Vec::new(),
            },
            None => Self {
                namespace: String::new(),
                name: full.to_string(),
                nested: Vec::new(),
            },
        }
    }

    /// Descriptor of the open definition.
    pub fn to_descriptor(&self) -> TypeDescriptor {
        let mut ty = TypeDescriptor::qualified(&self.namespace, &self.name);
        for nested in &self.nested {
            ty = TypeDescriptor::nested(ty, nested.clone());
        }
        ty
    }

    /// True if a definition named `candidate` satisfies `requested`: exact,
    /// or equal after stripping the arity marker when `requested` has none.
    pub fn name_matches(requested: &str, candidate: &str) -> bool {
        requested == candidate
            || (!requested.contains('`') && strip_generic_arity(candidate) == requested)
    }
}

impl fmt::Display for ReflectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}.", self.namespace)?;
        }
        f.write_str(&self.name)?;
        for nested in &self.nested {
            write!(f, "+{nested}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/descriptor_tests.rs"]
mod tests;
