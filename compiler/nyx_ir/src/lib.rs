//! Core data structures for the Nyx front-end.
//!
//! This crate contains the types every other compiler crate builds on:
//! - Source locations and ranges ([`SourceLocation`], [`SourceRange`])
//! - Interned identifiers ([`Name`], [`StringInterner`])
//! - Tokens ([`Token`], [`TokenKind`], [`TokenList`])
//! - The AST: declarations, statements, expressions and types, stored in
//!   flat arenas inside [`AstContext`] and addressed by u32 ids
//!
//! # Design
//!
//! - **Intern everything**: identifiers and literal spellings become
//!   [`Name`]s, structural types become [`TypeId`]s. Equality on interned
//!   ids is O(1) and canonical.
//! - **Flatten everything**: AST nodes refer to each other through
//!   [`DeclId`] / [`StmtId`] / [`ExprId`] indices, never through owning
//!   pointers. Parent links are plain ids, which keeps ownership with the
//!   arena and sidesteps reference cycles.
//! - **Tag, don't dispatch**: every hierarchy is a tagged enum matched
//!   explicitly; there is no virtual dispatch anywhere in the AST.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod builtin;
mod context;
mod name;
mod span;
mod token;
mod types;

pub use ast::{
    AliasTarget, BinaryOp, CastKind, Decl, DeclId, DeclKind, Expr, ExprId, ExprKind, IdentNamespace,
    Stmt, StmtId, StmtKind, StorageClass, TypeTraitKind, UnaryOp, ValueCategory, Visibility,
};
pub use builtin::BuiltinType;
pub use context::{AstContext, ClassLayout, TargetInfo, TypeSizeInfo};
pub use name::{Name, SharedInterner, StringInterner};
pub use span::{FileId, SourceLocation, SourceRange};
pub use token::{Token, TokenKind, TokenList, TokenTag};
pub use types::{TypeData, TypeId};
