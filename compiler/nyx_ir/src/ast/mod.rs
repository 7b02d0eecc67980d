//! AST node definitions.
//!
//! Nodes are stored in flat arenas owned by [`AstContext`](crate::AstContext)
//! and addressed by the u32 ids defined here. Four disjoint hierarchies
//! exist: declarations, statements, expressions (typed, with a value
//! category), and types (see [`crate::TypeData`]).

mod decl;
mod expr;
mod stmt;
pub mod walk;

pub use decl::{AliasTarget, Decl, DeclKind, IdentNamespace, StorageClass, Visibility};
pub use expr::{BinaryOp, CastKind, Expr, ExprKind, TypeTraitKind, UnaryOp, ValueCategory};
pub use stmt::{Stmt, StmtKind};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id! {
    /// Index of a declaration in the declaration arena.
    ///
    /// Id 0 is always the translation unit.
    DeclId, "decl"
}

define_id! {
    /// Index of a statement in the statement arena.
    StmtId, "stmt"
}

define_id! {
    /// Index of an expression in the expression arena.
    ExprId, "expr"
}

impl DeclId {
    /// The translation unit declaration.
    pub const TRANSLATION_UNIT: DeclId = DeclId(0);
}
