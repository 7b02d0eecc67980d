//! AST traversal by pattern match.
//!
//! There is no virtual dispatch in the AST; a "visitor" here is a
//! match-and-recurse function handing each node to a callback. The
//! children functions enumerate direct sub-nodes, the `walk_*` functions
//! drive a pre-order traversal.

use super::{DeclId, DeclKind, ExprId, ExprKind, StmtId, StmtKind};
use crate::AstContext;

/// Direct sub-expressions of an expression.
pub fn expr_children(context: &AstContext, expr: ExprId) -> Vec<ExprId> {
    match &context.expr(expr).kind {
        ExprKind::IntegerLiteral { .. }
        | ExprKind::FloatingLiteral { .. }
        | ExprKind::CharLiteral { .. }
        | ExprKind::StringLiteral { .. }
        | ExprKind::BooleanLiteral { .. }
        | ExprKind::NullPointerLiteral
        | ExprKind::DeclRef { .. }
        | ExprKind::This { .. }
        | ExprKind::TypeTrait { .. }
        | ExprKind::StmtExpr { .. }
        | ExprKind::Error => Vec::new(),
        ExprKind::Paren { inner } => vec![*inner],
        ExprKind::Unary { operand, .. }
        | ExprKind::Cast { operand, .. }
        | ExprKind::AsType { operand, .. }
        | ExprKind::Delete { operand } => vec![*operand],
        ExprKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => vec![*cond, *then_expr, *else_expr],
        ExprKind::ArraySubscript { base, index } => vec![*base, *index],
        ExprKind::Call { callee, args } | ExprKind::MemberCall { callee, args } => {
            let mut children = Vec::with_capacity(args.len() + 1);
            children.push(*callee);
            children.extend(args.iter().copied());
            children
        }
        ExprKind::Member { base, .. } => vec![*base],
        ExprKind::Construct { args } | ExprKind::New { args } => args.to_vec(),
        ExprKind::Throw { operand } => operand.iter().copied().collect(),
    }
}

/// Direct sub-statements and sub-expressions of a statement.
pub fn stmt_children(context: &AstContext, stmt: StmtId) -> (Vec<StmtId>, Vec<ExprId>) {
    match &context.stmt(stmt).kind {
        StmtKind::Null | StmtKind::Continue | StmtKind::Break | StmtKind::Goto { .. } => {
            (Vec::new(), Vec::new())
        }
        StmtKind::Compound { stmts } => (stmts.to_vec(), Vec::new()),
        StmtKind::Decl { decl } => {
            // A declaration statement exposes its initializer expression.
            let exprs = match &context.decl(*decl).kind {
                DeclKind::Var { init: Some(init), .. } => vec![*init],
                _ => Vec::new(),
            };
            (Vec::new(), exprs)
        }
        StmtKind::Label { sub, .. } => (vec![*sub], Vec::new()),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let mut stmts = vec![*then_branch];
            stmts.extend(else_branch.iter().copied());
            (stmts, vec![*cond])
        }
        StmtKind::While { cond, body } => (vec![*body], vec![*cond]),
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            let mut stmts = Vec::new();
            stmts.extend(init.iter().copied());
            stmts.push(*body);
            let mut exprs = Vec::new();
            exprs.extend(cond.iter().copied());
            exprs.extend(step.iter().copied());
            (stmts, exprs)
        }
        StmtKind::Do { body, cond } => (vec![*body], vec![*cond]),
        StmtKind::Return { value } => (Vec::new(), value.iter().copied().collect()),
        StmtKind::Case { value, sub, .. } => {
            (sub.iter().copied().collect(), vec![*value])
        }
        StmtKind::Default { sub } => (sub.iter().copied().collect(), Vec::new()),
        StmtKind::Switch { cond, body } => (vec![*body], vec![*cond]),
        StmtKind::Try { body, handlers } => {
            let mut stmts = vec![*body];
            stmts.extend(handlers.iter().copied());
            (stmts, Vec::new())
        }
        StmtKind::Catch { body, .. } => (vec![*body], Vec::new()),
        StmtKind::Expr { expr } => (Vec::new(), vec![*expr]),
    }
}

/// Pre-order walk over an expression tree.
pub fn walk_expr(context: &AstContext, expr: ExprId, f: &mut impl FnMut(ExprId)) {
    f(expr);
    for child in expr_children(context, expr) {
        walk_expr(context, child, f);
    }
}

/// Pre-order walk over a statement tree, visiting every contained
/// expression too.
pub fn walk_stmt(
    context: &AstContext,
    stmt: StmtId,
    on_stmt: &mut impl FnMut(StmtId),
    on_expr: &mut impl FnMut(ExprId),
) {
    on_stmt(stmt);
    let (stmts, exprs) = stmt_children(context, stmt);
    for expr in exprs {
        walk_expr(context, expr, on_expr);
    }
    for child in stmts {
        walk_stmt(context, child, on_stmt, on_expr);
    }
}

/// Pre-order walk over a declaration subtree: the declaration itself, its
/// context children, bodies and initializers.
pub fn walk_decl(
    context: &AstContext,
    decl: DeclId,
    on_decl: &mut impl FnMut(DeclId),
    on_stmt: &mut impl FnMut(StmtId),
    on_expr: &mut impl FnMut(ExprId),
) {
    on_decl(decl);
    match &context.decl(decl).kind {
        DeclKind::Var { init: Some(init), .. } => walk_expr(context, *init, on_expr),
        DeclKind::Function { body: Some(body), .. }
        | DeclKind::Method { body: Some(body), .. }
        | DeclKind::Constructor { body: Some(body), .. }
        | DeclKind::Destructor { body: Some(body), .. } => {
            walk_stmt(context, *body, on_stmt, on_expr);
        }
        DeclKind::EnumConstant { init: Some(init), .. } => walk_expr(context, *init, on_expr),
        _ => {}
    }
    for &child in context.context_children(decl) {
        walk_decl(context, child, on_decl, on_stmt, on_expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, SourceRange, Stmt, TypeId, ValueCategory};

    fn int_lit(context: &mut AstContext, value: u64) -> ExprId {
        context.alloc_expr(Expr {
            kind: ExprKind::IntegerLiteral { value },
            ty: TypeId::INT,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        })
    }

    #[test]
    fn walk_expr_visits_pre_order() {
        let mut context = AstContext::default();
        let one = int_lit(&mut context, 1);
        let two = int_lit(&mut context, 2);
        let sum = context.alloc_expr(Expr {
            kind: ExprKind::Binary {
                op: crate::BinaryOp::Add,
                lhs: one,
                rhs: two,
            },
            ty: TypeId::INT,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        });
        let mut seen = Vec::new();
        walk_expr(&context, sum, &mut |e| seen.push(e));
        assert_eq!(seen, vec![sum, one, two]);
    }

    #[test]
    fn walk_stmt_reaches_nested_expressions() {
        let mut context = AstContext::default();
        let cond = int_lit(&mut context, 1);
        let value = int_lit(&mut context, 2);
        let ret = context.alloc_stmt(Stmt {
            kind: StmtKind::Return { value: Some(value) },
            range: SourceRange::DUMMY,
        });
        let body = context.alloc_stmt(Stmt {
            kind: StmtKind::While { cond, body: ret },
            range: SourceRange::DUMMY,
        });
        let mut stmts = Vec::new();
        let mut exprs = Vec::new();
        walk_stmt(&context, body, &mut |s| stmts.push(s), &mut |e| exprs.push(e));
        assert_eq!(stmts, vec![body, ret]);
        assert_eq!(exprs, vec![cond, value]);
    }
}
