//! Statement nodes.

use super::{DeclId, ExprId, StmtId};
use crate::{Name, SourceRange};

/// A statement.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: SourceRange,
}

/// Statement kind and payload.
#[derive(Clone, Debug)]
pub enum StmtKind {
    /// `;`
    Null,
    /// `{ ... }`
    Compound { stmts: Box<[StmtId]> },
    /// A `def`/`alias` in statement position.
    Decl { decl: DeclId },
    /// `@name : stmt`
    Label {
        name: Name,
        decl: DeclId,
        sub: StmtId,
    },
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    },
    Do {
        body: StmtId,
        cond: ExprId,
    },
    Continue,
    Break,
    Return {
        value: Option<ExprId>,
    },
    Goto {
        label: Name,
    },
    /// `case value:`; `folded` is the constant-evaluated discriminant.
    Case {
        value: ExprId,
        folded: i64,
        sub: Option<StmtId>,
    },
    Default {
        sub: Option<StmtId>,
    },
    Switch {
        cond: ExprId,
        body: StmtId,
    },
    Try {
        body: StmtId,
        handlers: Box<[StmtId]>,
    },
    Catch {
        param: Option<DeclId>,
        body: StmtId,
    },
    /// An expression in statement position.
    Expr {
        expr: ExprId,
    },
}

impl Stmt {
    /// The expression, if this is an expression statement.
    pub fn as_expr(&self) -> Option<ExprId> {
        match self.kind {
            StmtKind::Expr { expr } => Some(expr),
            _ => None,
        }
    }
}
