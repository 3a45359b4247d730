//! Compiler-bound symbols and the symbol resolution backend.
//!
//! - `table`: arena of type symbols with their members (`SymbolTable`)
//! - `decl`: serde declarations a host uses to describe bound symbols
//! - `convert`: symbol types to `TypeDescriptor`s
//! - `backend`: the `ResolutionBackend` implementation over a `SymbolTable`

pub mod backend;
pub mod convert;
pub mod decl;
pub mod table;

pub use backend::{SymbolBackend, SymbolHandle};
pub use decl::{
    BaseDeclaration, ConstructorDeclaration, FieldDeclaration, MethodDeclaration,
    ParameterDeclaration, PropertyDeclaration, SymbolError, TypeDeclaration,
};
pub use table::{
    MemberSymbol, MethodKind, ParameterSymbol, RefKind, SymbolTable, SymbolType, TypeId,
    TypeSymbol,
};
