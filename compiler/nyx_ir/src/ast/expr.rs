//! Expression nodes.
//!
//! Every expression carries its result type (a canonical [`TypeId`]) and a
//! value category. Expressions rejected by Sema become [`ExprKind::Error`]
//! nodes with [`TypeId::ERROR`]; a diagnostic has always been emitted by the
//! time one is created.

use super::{DeclId, ExprId, StmtId};
use crate::{Name, SourceRange, TypeId};

/// Whether an expression designates a storage location.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueCategory {
    LValue,
    RValue,
}

/// Unary operators, prefix and postfix.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `~x`
    BitNot,
    /// `!x`
    LogicalNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    /// `*p`
    Deref,
    /// `&x`
    AddrOf,
}

impl UnaryOp {
    pub const fn is_increment_or_decrement(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }

    pub const fn spelling(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogicalNot => "!",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        }
    }
}

/// Binary operators, including assignment forms.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
    Assign,
    MulAssign,
    DivAssign,
    RemAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
}

impl BinaryOp {
    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::RemAssign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
                | BinaryOp::AndAssign
                | BinaryOp::XorAssign
                | BinaryOp::OrAssign
        )
    }

    /// The arithmetic operation underlying a compound assignment.
    pub const fn compound_operation(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::MulAssign => Some(BinaryOp::Mul),
            BinaryOp::DivAssign => Some(BinaryOp::Div),
            BinaryOp::RemAssign => Some(BinaryOp::Rem),
            BinaryOp::AddAssign => Some(BinaryOp::Add),
            BinaryOp::SubAssign => Some(BinaryOp::Sub),
            BinaryOp::ShlAssign => Some(BinaryOp::Shl),
            BinaryOp::ShrAssign => Some(BinaryOp::Shr),
            BinaryOp::AndAssign => Some(BinaryOp::BitAnd),
            BinaryOp::XorAssign => Some(BinaryOp::BitXor),
            BinaryOp::OrAssign => Some(BinaryOp::BitOr),
            _ => None,
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    pub const fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr)
    }

    pub const fn spelling(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Assign => "=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::OrAssign => "|=",
        }
    }
}

/// How a cast converts its operand.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CastKind {
    /// Identical types; no conversion.
    NoOp,
    IntegralCast,
    IntegralToBoolean,
    IntegralToFloating,
    FloatingToIntegral,
    FloatingToBoolean,
    FloatingCast,
    /// No conversion exists between the types; a diagnostic follows.
    Invalid,
}

/// The trait queried by `$SizeOf` / `$AlignOf`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeTraitKind {
    SizeOf,
    AlignOf,
}

/// An expression.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    /// Result type; always a member of the canonical type pool.
    pub ty: TypeId,
    pub category: ValueCategory,
    pub range: SourceRange,
}

/// Expression kind and payload.
#[derive(Clone, Debug)]
pub enum ExprKind {
    IntegerLiteral {
        value: u64,
    },
    FloatingLiteral {
        value: f64,
    },
    /// Decoded code point.
    CharLiteral {
        value: u32,
    },
    /// Decoded contents, interned.
    StringLiteral {
        value: Name,
    },
    BooleanLiteral {
        value: bool,
    },
    NullPointerLiteral,
    /// Reference to a declaration; borrows into the declaration tree.
    DeclRef {
        decl: DeclId,
    },
    This {
        param: Option<DeclId>,
    },
    Paren {
        inner: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Conditional {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    ArraySubscript {
        base: ExprId,
        index: ExprId,
    },
    Call {
        callee: ExprId,
        args: Box<[ExprId]>,
    },
    /// A call whose callee is a member reference.
    MemberCall {
        callee: ExprId,
        args: Box<[ExprId]>,
    },
    Member {
        base: ExprId,
        member: DeclId,
        name: Name,
    },
    /// Implicit conversion synthesized by Sema.
    Cast {
        cast: CastKind,
        operand: ExprId,
    },
    /// User-written `expr as type`; the target type is `Expr::ty`.
    AsType {
        cast: CastKind,
        operand: ExprId,
    },
    /// Construction of a class value from arguments.
    Construct {
        args: Box<[ExprId]>,
    },
    New {
        args: Box<[ExprId]>,
    },
    Delete {
        operand: ExprId,
    },
    Throw {
        operand: Option<ExprId>,
    },
    /// `{ ... }` in expression position.
    StmtExpr {
        stmt: StmtId,
    },
    /// `$SizeOf(T)` / `$AlignOf(T)` before folding.
    TypeTrait {
        trait_kind: TypeTraitKind,
        operand: TypeId,
    },
    /// Sentinel for a rejected expression.
    Error,
}

impl Expr {
    #[inline]
    pub fn is_lvalue(&self) -> bool {
        self.category == ValueCategory::LValue
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_assignment_decomposes() {
        assert_eq!(BinaryOp::AddAssign.compound_operation(), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::ShrAssign.compound_operation(), Some(BinaryOp::Shr));
        assert_eq!(BinaryOp::Assign.compound_operation(), None);
        assert!(BinaryOp::Assign.is_assignment());
        assert!(!BinaryOp::Add.is_assignment());
    }

    #[test]
    fn operator_classification() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(BinaryOp::Shl.is_shift());
        assert!(BinaryOp::LogicalOr.is_logical());
        assert!(BinaryOp::BitXor.is_bitwise());
        assert!(!BinaryOp::Add.is_comparison());
    }

    #[test]
    fn unary_increment_classification() {
        assert!(UnaryOp::PreInc.is_increment_or_decrement());
        assert!(UnaryOp::PostDec.is_increment_or_decrement());
        assert!(!UnaryOp::Deref.is_increment_or_decrement());
    }
}
