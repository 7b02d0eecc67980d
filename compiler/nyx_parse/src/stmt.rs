//! Statement parsing.
//!
//! Statements dispatch on their leading token. Control-flow statements
//! introduce the matching scopes (`while`/`for` are breakable and
//! continuable, `switch` is breakable); `return` is checked against the
//! enclosing function's return type.

use nyx_diagnostic::DiagId;
use nyx_ir::{AstContext, ExprId, ExprKind, SourceRange, Stmt, StmtId, StmtKind, TokenKind};
use nyx_sema::{ActionArg, DeclaratorContext, ScopeFlags};

use crate::recovery::STMT_BOUNDARY;
use crate::Parser;

impl Parser<'_> {
    fn alloc_stmt(&mut self, kind: StmtKind, range: SourceRange) -> StmtId {
        self.sema_mut().context_mut().alloc_stmt(Stmt { kind, range })
    }

    /// `{ stmt-seq }` with a fresh compound scope. Failed statements skip
    /// to the next anchor and parsing continues.
    pub(crate) fn parse_compound_statement(&mut self) -> Option<StmtId> {
        self.parse_compound_statement_with(ScopeFlags::NONE)
    }

    pub(crate) fn parse_compound_statement_with(&mut self, extra: ScopeFlags) -> Option<StmtId> {
        let open = self.location();
        if !self.expect_and_consume(TokenKind::LBrace) {
            return None;
        }
        let flags = ScopeFlags::COMPOUND
            .union(ScopeFlags::BLOCK)
            .union(ScopeFlags::DECLARABLE)
            .union(extra);
        let stmts = self.with_scope(flags, None, |parser| {
            let mut stmts = Vec::new();
            while !parser.check(TokenKind::RBrace) && !parser.at_eof() {
                match parser.parse_statement() {
                    Some(stmt) => stmts.push(stmt),
                    None => {
                        // Resume at the next statement boundary.
                        parser.skip_until(STMT_BOUNDARY, true);
                        if parser.check(TokenKind::Semi) {
                            parser.consume();
                        }
                    }
                }
            }
            stmts
        });
        let close = self.location();
        self.expect_and_consume(TokenKind::RBrace);
        let range = SourceRange::at(open, 1).extend_to(close.offset + 1);
        Some(self.alloc_stmt(
            StmtKind::Compound {
                stmts: stmts.into_boxed_slice(),
            },
            range,
        ))
    }

    /// statement: dispatch on the leading token.
    pub(crate) fn parse_statement(&mut self) -> Option<StmtId> {
        match *self.kind() {
            TokenKind::Semi => {
                let token = self.consume();
                Some(self.alloc_stmt(StmtKind::Null, token.range()))
            }
            TokenKind::LBrace => self.parse_compound_statement(),
            TokenKind::KwDef | TokenKind::KwAlias => self.parse_declaration_statement(false),
            TokenKind::KwUnsafe => self.parse_unsafe_statement(),
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwWhile => self.parse_while_statement(),
            TokenKind::KwDo => self.parse_do_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwReturn => self.parse_return_statement(),
            TokenKind::KwContinue => self.parse_continue_statement(),
            TokenKind::KwBreak => self.parse_break_statement(),
            TokenKind::KwGoto => self.parse_goto_statement(),
            TokenKind::KwSwitch => self.parse_switch_statement(),
            TokenKind::KwCase => self.parse_case_statement(),
            TokenKind::KwDefault => self.parse_default_statement(),
            TokenKind::KwTry => self.parse_try_statement(),
            TokenKind::At => self.parse_labeled_statement(),
            TokenKind::Dollar => self.parse_action_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// A `def`/`alias` in statement position wraps one declaration.
    fn parse_declaration_statement(&mut self, unsafe_prefix: bool) -> Option<StmtId> {
        let start = self.location();
        let decl = self.parse_def_declaration(DeclaratorContext::Block, unsafe_prefix)?;
        let range = SourceRange::at(start, 0).merge(self.sema().context().decl(decl).range);
        Some(self.alloc_stmt(StmtKind::Decl { decl }, range))
    }

    /// `unsafe { … }` or `unsafe def …` in statement position.
    fn parse_unsafe_statement(&mut self) -> Option<StmtId> {
        self.consume();
        if self.check(TokenKind::LBrace) {
            return self.parse_compound_statement_with(ScopeFlags::UNSAFE);
        }
        if matches!(self.kind(), TokenKind::KwDef | TokenKind::KwAlias) {
            return self.parse_declaration_statement(true);
        }
        self.diag()
            .report(DiagId::ErrExpectedStatement, self.location());
        None
    }

    /// `( condition )`, converted to bool.
    fn parse_paren_condition(&mut self) -> Option<ExprId> {
        if !self.expect_and_consume(TokenKind::LParen) {
            return None;
        }
        let location = self.location();
        let cond = self.parse_expression()?;
        self.expect_and_consume(TokenKind::RParen);
        Some(self.sema_mut().check_condition(cond, location))
    }

    fn parse_if_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        let cond = self.parse_paren_condition()?;
        let (then_branch, else_branch) =
            self.with_scope(ScopeFlags::CONTROL.union(ScopeFlags::DECLARABLE), None, |parser| {
                let then_branch = parser.parse_statement()?;
                let else_branch = if parser.check(TokenKind::KwElse) {
                    parser.consume();
                    Some(parser.parse_statement()?)
                } else {
                    None
                };
                Some((then_branch, else_branch))
            })?;
        let end = else_branch.unwrap_or(then_branch);
        let range = SourceRange::at(keyword.location, keyword.length)
            .merge(self.sema().context().stmt(end).range);
        Some(self.alloc_stmt(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            range,
        ))
    }

    fn parse_while_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        let cond = self.parse_paren_condition()?;
        let flags = ScopeFlags::CONTROL
            .union(ScopeFlags::BREAKABLE)
            .union(ScopeFlags::CONTINUABLE)
            .union(ScopeFlags::DECLARABLE);
        let body = self.with_scope(flags, None, |parser| parser.parse_statement())?;
        let range = SourceRange::at(keyword.location, keyword.length)
            .merge(self.sema().context().stmt(body).range);
        Some(self.alloc_stmt(StmtKind::While { cond, body }, range))
    }

    /// `do body while ( cond ) ;`
    fn parse_do_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        let flags = ScopeFlags::CONTROL
            .union(ScopeFlags::BREAKABLE)
            .union(ScopeFlags::CONTINUABLE)
            .union(ScopeFlags::DECLARABLE);
        let body = self.with_scope(flags, None, |parser| parser.parse_statement())?;
        if !self.expect_and_consume(TokenKind::KwWhile) {
            return None;
        }
        let cond = self.parse_paren_condition()?;
        let end = self.location();
        self.expect_and_consume(TokenKind::Semi);
        let range = SourceRange::at(keyword.location, keyword.length).extend_to(end.offset);
        Some(self.alloc_stmt(StmtKind::Do { body, cond }, range))
    }

    /// `for ( init ; cond ; step ) body` — the init slot is a full
    /// statement, condition and step are optional.
    fn parse_for_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if !self.expect_and_consume(TokenKind::LParen) {
            return None;
        }
        let flags = ScopeFlags::CONTROL
            .union(ScopeFlags::BREAKABLE)
            .union(ScopeFlags::CONTINUABLE)
            .union(ScopeFlags::DECLARABLE);
        self.with_scope(flags, None, |parser| {
            let init = if parser.check(TokenKind::Semi) {
                parser.consume();
                None
            } else {
                Some(parser.parse_statement()?)
            };
            let cond = if parser.check(TokenKind::Semi) {
                None
            } else {
                let location = parser.location();
                let cond = parser.parse_expression()?;
                Some(parser.sema_mut().check_condition(cond, location))
            };
            parser.expect_and_consume(TokenKind::Semi);
            let step = if parser.check(TokenKind::RParen) {
                None
            } else {
                Some(parser.parse_expression()?)
            };
            parser.expect_and_consume(TokenKind::RParen);
            let body = parser.parse_statement()?;
            let range = SourceRange::at(keyword.location, keyword.length)
                .merge(parser.sema().context().stmt(body).range);
            Some(parser.alloc_stmt(
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                },
                range,
            ))
        })
    }

    /// `return [expr] ;` — checked against the enclosing function's
    /// return type.
    fn parse_return_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        let mut value = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self.location();
        self.expect_and_consume(TokenKind::Semi);

        let return_type = self
            .sema()
            .current_function()
            .and_then(|function| self.sema().function_return_type(function));
        if let Some(return_type) = return_type {
            let returns_void = self.sema().context().is_void_type(return_type);
            match (&value, returns_void) {
                (Some(_), true) => {
                    self.diag()
                        .report(DiagId::ErrReturnValueInVoidFunction, keyword.location);
                    value = None;
                }
                (None, false) if !return_type.is_error() => {
                    self.diag()
                        .report(DiagId::ErrMissingReturnValue, keyword.location);
                }
                (Some(expr), false) => {
                    value = Some(self.sema_mut().perform_implicit_conversion(
                        *expr,
                        return_type,
                        keyword.location,
                    ));
                }
                _ => {}
            }
        }

        let range = SourceRange::at(keyword.location, keyword.length).extend_to(end.offset);
        Some(self.alloc_stmt(StmtKind::Return { value }, range))
    }

    fn parse_continue_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if !self.sema().in_continuable_scope() {
            self.diag()
                .report(DiagId::ErrContinueOutsideContinuable, keyword.location);
        }
        self.expect_and_consume(TokenKind::Semi);
        Some(self.alloc_stmt(StmtKind::Continue, keyword.range()))
    }

    fn parse_break_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if !self.sema().in_breakable_scope() {
            self.diag()
                .report(DiagId::ErrBreakOutsideBreakable, keyword.location);
        }
        self.expect_and_consume(TokenKind::Semi);
        Some(self.alloc_stmt(StmtKind::Break, keyword.range()))
    }

    /// `goto [@]label ;` — the target must name a label of the enclosing
    /// function; it may be declared later in the body.
    fn parse_goto_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if self.check(TokenKind::At) {
            self.consume();
        }
        let (label, label_location) = self.expect_identifier()?;
        self.expect_and_consume(TokenKind::Semi);
        self.record_goto(label, label_location);
        Some(self.alloc_stmt(StmtKind::Goto { label }, keyword.range()))
    }

    fn parse_switch_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if !self.expect_and_consume(TokenKind::LParen) {
            return None;
        }
        let cond_location = self.location();
        let cond = self.parse_expression()?;
        self.expect_and_consume(TokenKind::RParen);
        let cond_ty = self.sema().context().expr(cond).ty;
        if !self.sema().context().is_integer_type(cond_ty) && !cond_ty.is_error() {
            let rendered = self.sema().type_string(cond_ty);
            self.diag()
                .report(DiagId::ErrTypeMismatch, cond_location)
                .arg_str(rendered)
                .arg_str("int");
        }

        self.switch_depth += 1;
        let flags = ScopeFlags::CONTROL
            .union(ScopeFlags::BREAKABLE)
            .union(ScopeFlags::DECLARABLE);
        let body = self.with_scope(flags, None, |parser| parser.parse_statement());
        self.switch_depth -= 1;
        let body = body?;

        let range = SourceRange::at(keyword.location, keyword.length)
            .merge(self.sema().context().stmt(body).range);
        Some(self.alloc_stmt(StmtKind::Switch { cond, body }, range))
    }

    /// `case const-expr : [stmt]`
    fn parse_case_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if self.switch_depth == 0 {
            self.diag()
                .report(DiagId::ErrCaseOutsideSwitch, keyword.location)
                .arg_token(TokenKind::KwCase);
        }
        let value_location = self.location();
        let value = self.parse_assignment_expression()?;
        let folded = match nyx_sema::eval::evaluate_as_int(
            self.sema_mut().context_mut(),
            value,
        ) {
            Some(folded) => folded as i64,
            None => {
                self.diag()
                    .report(DiagId::ErrNonConstantExpression, value_location);
                0
            }
        };
        self.expect_and_consume(TokenKind::Colon);
        let sub = self.parse_case_sub_statement()?;
        Some(self.alloc_stmt(
            StmtKind::Case { value, folded, sub },
            keyword.range(),
        ))
    }

    fn parse_default_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        if self.switch_depth == 0 {
            self.diag()
                .report(DiagId::ErrCaseOutsideSwitch, keyword.location)
                .arg_token(TokenKind::KwDefault);
        }
        self.expect_and_consume(TokenKind::Colon);
        let sub = self.parse_case_sub_statement()?;
        Some(self.alloc_stmt(StmtKind::Default { sub }, keyword.range()))
    }

    /// The statement after a `case`/`default` label, absent when the next
    /// label or the end of the switch body follows directly.
    fn parse_case_sub_statement(&mut self) -> Option<Option<StmtId>> {
        if matches!(
            self.kind(),
            TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace
        ) {
            return Some(None);
        }
        Some(Some(self.parse_statement()?))
    }

    /// `try stmt ( catch [( declarator )] stmt )+`
    fn parse_try_statement(&mut self) -> Option<StmtId> {
        let keyword = self.consume();
        let body = self.parse_statement()?;
        let mut handlers = Vec::new();
        while self.check(TokenKind::KwCatch) {
            let catch_keyword = self.consume();
            let param = if self.check(TokenKind::LParen) {
                self.consume();
                let context = self.sema().current_decl_context();
                let mut declarator =
                    nyx_sema::Declarator::new(DeclaratorContext::Prototype, context);
                declarator.range = SourceRange::at(self.location(), 0);
                self.parse_declarator_header(&mut declarator)?;
                if self.check(TokenKind::Colon) {
                    self.consume();
                    self.parse_type_into(&mut declarator)?;
                }
                let param = self.sema_mut().act_on_param_declarator(&declarator);
                self.expect_and_consume(TokenKind::RParen);
                Some(param)
            } else {
                None
            };
            let handler_body = self.with_scope(
                ScopeFlags::CONTROL.union(ScopeFlags::DECLARABLE),
                None,
                |parser| parser.parse_statement(),
            )?;
            let range = SourceRange::at(catch_keyword.location, catch_keyword.length)
                .merge(self.sema().context().stmt(handler_body).range);
            handlers.push(self.alloc_stmt(
                StmtKind::Catch {
                    param,
                    body: handler_body,
                },
                range,
            ));
        }
        if handlers.is_empty() {
            self.diag()
                .report(DiagId::ErrExpectedGot, self.location())
                .arg_token(TokenKind::KwCatch)
                .arg_token(*self.kind());
        }
        let range = SourceRange::at(keyword.location, keyword.length)
            .merge(self.sema().context().stmt(body).range);
        Some(self.alloc_stmt(
            StmtKind::Try {
                body,
                handlers: handlers.into_boxed_slice(),
            },
            range,
        ))
    }

    /// `@label : stmt`
    fn parse_labeled_statement(&mut self) -> Option<StmtId> {
        let at = self.consume();
        let (name, location) = self.expect_identifier()?;
        self.expect_and_consume(TokenKind::Colon);
        let decl = self
            .sema_mut()
            .act_on_label_decl(name, SourceRange::at(location, 0));
        let sub = self.parse_statement()?;
        let range =
            SourceRange::at(at.location, at.length).merge(self.sema().context().stmt(sub).range);
        Some(self.alloc_stmt(StmtKind::Label { name, decl, sub }, range))
    }

    /// `$action` in statement position: the produced nodes become the
    /// statement.
    fn parse_action_statement(&mut self) -> Option<StmtId> {
        let start = self.location();
        let produced = self.parse_compiler_action()?;
        let mut stmts: Vec<StmtId> = Vec::new();
        for arg in produced {
            match arg {
                ActionArg::Stmt(stmt) => stmts.push(stmt),
                ActionArg::Expr(expr) => {
                    let range = self.sema().context().expr(expr).range;
                    stmts.push(self.alloc_stmt(StmtKind::Expr { expr }, range));
                }
                ActionArg::Decl(decl) => {
                    let context = self.sema().current_decl_context();
                    self.sema_mut().register_decl(context, decl);
                    let range = self.sema().context().decl(decl).range;
                    stmts.push(self.alloc_stmt(StmtKind::Decl { decl }, range));
                }
                ActionArg::Type(_) | ActionArg::Ident(_) => {}
            }
        }
        let range = SourceRange::at(start, 1);
        match stmts.len() {
            0 => Some(self.alloc_stmt(StmtKind::Null, range)),
            1 => Some(stmts[0]),
            _ => Some(self.alloc_stmt(
                StmtKind::Compound {
                    stmts: stmts.into_boxed_slice(),
                },
                range,
            )),
        }
    }

    /// expression-statement: `expr ;`
    ///
    /// A statement that computes a value and neither assigns, calls nor
    /// otherwise acts on anything discards its result; that is worth a
    /// warning.
    fn parse_expression_statement(&mut self) -> Option<StmtId> {
        if self.at_eof() {
            self.diag()
                .report(DiagId::ErrExpectedStatement, self.location());
            return None;
        }
        let expr = self.parse_expression()?;
        self.expect_and_consume(TokenKind::Semi);
        let range = self.sema().context().expr(expr).range;
        let ty = self.sema().context().expr(expr).ty;
        if !self.sema().context().is_void_type(ty)
            && !ty.is_error()
            && !expression_has_effect(self.sema().context(), expr)
        {
            self.diag()
                .report(DiagId::WarnUnusedExpressionResult, range.begin());
        }
        Some(self.alloc_stmt(StmtKind::Expr { expr }, range))
    }
}

/// Whether discarding the expression's result still leaves an effect
/// behind: assignments, increments, calls, allocation and exceptions do;
/// pure computations do not.
fn expression_has_effect(context: &AstContext, expr: ExprId) -> bool {
    match &context.expr(expr).kind {
        ExprKind::Binary { op, .. } => op.is_assignment(),
        ExprKind::Unary { op, .. } => op.is_increment_or_decrement(),
        ExprKind::Call { .. }
        | ExprKind::MemberCall { .. }
        | ExprKind::Construct { .. }
        | ExprKind::New { .. }
        | ExprKind::Delete { .. }
        | ExprKind::Throw { .. }
        | ExprKind::Error => true,
        ExprKind::Paren { inner } => expression_has_effect(context, *inner),
        ExprKind::Conditional {
            then_expr,
            else_expr,
            ..
        } => {
            expression_has_effect(context, *then_expr)
                || expression_has_effect(context, *else_expr)
        }
        _ => false,
    }
}

// Statement parsing is exercised end to end from `nyx_compiler`; the
// declaration used in a couple of unit checks below keeps this module
// honest about scope balance.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::parser_for;

    #[test]
    fn compound_statement_balances_scopes() {
        let (mut parser, diags) = parser_for("{ ; ; }");
        let depth = parser.sema().scope_depth();
        let stmt = parser.parse_statement().unwrap();
        assert_eq!(parser.sema().scope_depth(), depth);
        assert!(diags.is_empty());
        let StmtKind::Compound { ref stmts } = parser.sema().context().stmt(stmt).kind else {
            panic!("expected a compound statement");
        };
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn break_outside_loop_reports() {
        let (mut parser, diags) = parser_for("break;");
        parser.parse_statement();
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrBreakOutsideBreakable);
    }

    #[test]
    fn continue_inside_while_is_accepted() {
        let (mut parser, diags) = parser_for("while (true) continue;");
        parser.parse_statement().unwrap();
        assert!(diags.is_empty(), "{:?}", diags.messages());
    }

    #[test]
    fn case_outside_switch_reports() {
        let (mut parser, diags) = parser_for("case 1: ;");
        parser.parse_statement();
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrCaseOutsideSwitch);
    }

    #[test]
    fn labeled_statement_declares_label() {
        let (mut parser, diags) = parser_for("@spot: ;");
        let stmt = parser.parse_statement().unwrap();
        assert!(diags.is_empty());
        assert!(matches!(
            parser.sema().context().stmt(stmt).kind,
            StmtKind::Label { .. }
        ));
    }

    #[test]
    fn goto_without_a_matching_label_reports() {
        // Outside any function body the target must already be visible.
        let (mut parser, diags) = parser_for("goto nowhere;");
        parser.parse_statement().unwrap();
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUndeclaredLabel);
    }

    #[test]
    fn unused_expression_result_warns() {
        let (mut parser, diags) = parser_for("1 + 2;");
        parser.parse_statement().unwrap();
        assert_eq!(
            diags.diagnostics()[0].id,
            DiagId::WarnUnusedExpressionResult
        );
    }

    #[test]
    fn effectful_expression_statements_do_not_warn() {
        let (mut parser, diags) = parser_for("def x: int = 0; x = 1; x++; throw 2;");
        for _ in 0..4 {
            parser.parse_statement().unwrap();
        }
        assert!(diags.is_empty(), "{:?}", diags.messages());
    }
}
