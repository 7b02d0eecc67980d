//! Compiler-action invocation parsing.
//!
//! `$[ns.]*Name [ '(' args ')' ] [single-arg] [ '{' seq '}' ]`
//!
//! Each argument slot is matched speculatively against the categories the
//! action expects, preferring `Identifier > Type > Declaration >
//! Statement`; diagnostics are suppressed while a category is tried and
//! the token stream rewinds on failure.

use nyx_diagnostic::DiagId;
use nyx_ir::{DeclId, ExprId, SourceLocation, Token, TokenKind, TypeId};
use nyx_sema::{ActionArg, ArgKind, DeclaratorContext};

use crate::recovery::TokenSet;
use crate::Parser;

impl Parser<'_> {
    /// Parse a full `$action` invocation, returning the produced nodes.
    pub(crate) fn parse_compiler_action(&mut self) -> Option<Vec<ActionArg>> {
        debug_assert!(self.check(TokenKind::Dollar));
        self.consume();

        let mut path_names = Vec::new();
        loop {
            let (name, _) = self.expect_identifier()?;
            path_names.push(name);
            if self.check(TokenKind::Period) {
                self.consume();
            } else {
                break;
            }
        }
        let path_texts: Vec<&str> = path_names
            .iter()
            .map(|&name| self.sema().name_text(name))
            .collect();
        let dotted = path_texts.join(".");

        let Some(action) = self.sema().actions().lookup(&path_texts) else {
            self.diag()
                .report(DiagId::ErrUnknownAction, self.location())
                .arg_str(dotted);
            self.skip_action_remnant();
            return None;
        };

        let mut context = action.start();
        let mut had_args = false;

        // Parenthesized argument list.
        if self.check(TokenKind::LParen) {
            had_args = true;
            self.consume();
            let mut first = true;
            loop {
                if self.check(TokenKind::RParen) || self.at_eof() {
                    let expected = context.next_expected();
                    if !expected.is_none() && !expected.is_optional() {
                        self.diag()
                            .report(DiagId::ErrActionTooFewArguments, self.location())
                            .arg_str(dotted.clone());
                    }
                    break;
                }
                if !first && !self.expect_and_consume(TokenKind::Comma) {
                    self.skip_until(TokenSet::new().with(TokenKind::RParen), true);
                    break;
                }
                first = false;
                if self.check(TokenKind::RParen) {
                    break;
                }

                let expected = context.next_expected();
                if expected.is_none() {
                    self.diag()
                        .report(DiagId::ErrActionTooManyArguments, self.location())
                        .arg_str(dotted.clone());
                    self.skip_until(TokenSet::new().with(TokenKind::RParen), true);
                    break;
                }
                match self.parse_action_argument(expected) {
                    Some((arg, location)) => {
                        context.add_argument(self.sema_mut(), location, arg);
                    }
                    None => {
                        self.diag()
                            .report(DiagId::ErrActionArgumentMismatch, self.location());
                        self.skip_until(
                            TokenSet::new()
                                .with(TokenKind::Comma)
                                .with(TokenKind::RParen),
                            true,
                        );
                        if self.check(TokenKind::RParen) || self.at_eof() {
                            break;
                        }
                    }
                }
            }
            self.expect_and_consume(TokenKind::RParen);
        }

        // Braced sequence: elements parsed per the requirement, no commas.
        if self.check(TokenKind::LBrace) {
            had_args = true;
            self.consume();
            while !self.check(TokenKind::RBrace) && !self.at_eof() {
                let expected = context.next_expected();
                if expected.is_none() {
                    self.diag()
                        .report(DiagId::ErrActionTooManyArguments, self.location())
                        .arg_str(dotted.clone());
                    self.skip_until(TokenSet::new().with(TokenKind::RBrace), true);
                    break;
                }
                match self.parse_action_argument(expected) {
                    Some((arg, location)) => {
                        context.add_argument(self.sema_mut(), location, arg);
                    }
                    None => {
                        self.diag()
                            .report(DiagId::ErrActionArgumentMismatch, self.location());
                        self.skip_until(TokenSet::new().with(TokenKind::RBrace), true);
                        break;
                    }
                }
            }
            self.expect_and_consume(TokenKind::RBrace);
        }

        // Bare single argument.
        if !had_args && !self.expression_terminator() {
            let expected = context.next_expected();
            if !expected.is_none() {
                match self.parse_action_argument(expected) {
                    Some((arg, location)) => {
                        context.add_argument(self.sema_mut(), location, arg);
                    }
                    None if !expected.is_optional() => {
                        self.diag()
                            .report(DiagId::ErrActionTooFewArguments, self.location())
                            .arg_str(dotted.clone());
                    }
                    None => {}
                }
            }
        }

        let mut produced = Vec::new();
        context.finish(self.sema_mut(), &mut |arg| produced.push(arg));
        Some(produced)
    }

    /// Skip the argument groups of an unknown action.
    fn skip_action_remnant(&mut self) {
        if self.check(TokenKind::LParen) {
            self.consume();
            self.skip_until(TokenSet::new().with(TokenKind::RParen), false);
        }
        if self.check(TokenKind::LBrace) {
            self.consume();
            self.skip_until(TokenSet::new().with(TokenKind::RBrace), false);
        }
    }

    /// Match one argument against the expected categories, in preference
    /// order `Identifier > Type > Declaration > Statement`.
    fn parse_action_argument(
        &mut self,
        expected: ArgKind,
    ) -> Option<(ActionArg, SourceLocation)> {
        let location = self.location();

        if expected.contains(ArgKind::IDENTIFIER) {
            if let TokenKind::Ident(name) = *self.kind() {
                let matched = self.speculate(|parser| {
                    parser.consume();
                    parser.action_arg_terminator().then_some(())
                });
                if matched.is_some() {
                    return Some((ActionArg::Ident(name), location));
                }
            }
        }

        if expected.contains(ArgKind::TYPE) {
            let matched = self.speculate(|parser| {
                let ty = parser.parse_typename()?;
                parser.action_arg_terminator().then_some(ty)
            });
            if let Some(ty) = matched {
                return Some((ActionArg::Type(ty), location));
            }
        }

        if expected.contains(ArgKind::DECLARATION) {
            if let Some(decl) = self.parse_action_decl_argument() {
                return Some((ActionArg::Decl(decl), location));
            }
        }

        if expected.contains(ArgKind::STATEMENT) {
            // Expressions first: statement arguments are most often bare
            // expressions with no `;`.
            let matched = self.speculate(|parser| {
                let expr = parser.parse_expression()?;
                parser.action_arg_terminator().then_some(expr)
            });
            if let Some(expr) = matched {
                return Some((ActionArg::Expr(expr), location));
            }
            if let Some(stmt) = self.parse_statement() {
                return Some((ActionArg::Stmt(stmt), location));
            }
        }

        None
    }

    /// Whether the current token can end an action argument.
    fn action_arg_terminator(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof
        )
    }

    /// A declaration argument: parsed fully but left unregistered; the
    /// action decides whether it is ever installed.
    fn parse_action_decl_argument(&mut self) -> Option<DeclId> {
        if !matches!(self.kind(), TokenKind::KwDef | TokenKind::KwAlias) {
            return None;
        }
        let is_alias = self.check(TokenKind::KwAlias);
        let keyword = self.consume();
        let decl_context = self.sema().current_decl_context();
        let mut declarator =
            nyx_sema::Declarator::new(DeclaratorContext::Block, decl_context);
        declarator.is_alias = is_alias;
        declarator.range = nyx_ir::SourceRange::at(keyword.location, keyword.length);
        self.parse_declarator_header(&mut declarator)?;

        if declarator.is_alias {
            if !self.expect_and_consume(TokenKind::Eq) {
                return None;
            }
            declarator.ty = self.parse_typename();
            let decl = self.sema_mut().handle_declarator_detached(&declarator)?;
            self.expect_and_consume(TokenKind::Semi);
            return Some(decl);
        }

        if self.check(TokenKind::Colon) {
            self.consume();
            self.parse_type_into(&mut declarator)?;
        }
        if self.check(TokenKind::Eq) {
            self.consume();
            let expr = self.parse_assignment_expression()?;
            declarator.initializer = Some(nyx_sema::Initializer::Expr(expr));
        }
        let decl = self.sema_mut().handle_declarator_detached(&declarator)?;
        self.expect_and_consume(TokenKind::Semi);
        Some(decl)
    }

    /// `$action` in expression position: must yield an expression.
    pub(crate) fn parse_action_expression(&mut self) -> Option<ExprId> {
        let location = self.location();
        let produced = self.parse_compiler_action()?;
        for arg in &produced {
            if let ActionArg::Expr(expr) = arg {
                return Some(*expr);
            }
        }
        self.diag()
            .report(DiagId::ErrActionYieldedNothing, location)
            .arg_str("expression");
        let range = nyx_ir::SourceRange::at(location, 1);
        Some(self.sema_mut().error_expr(range))
    }

    /// `$action` in type position: must yield a type.
    pub(crate) fn parse_action_type(&mut self) -> Option<TypeId> {
        let location = self.location();
        let produced = self.parse_compiler_action()?;
        for arg in &produced {
            if let ActionArg::Type(ty) = arg {
                return Some(*ty);
            }
        }
        self.diag()
            .report(DiagId::ErrActionYieldedNothing, location)
            .arg_str("type");
        None
    }

    /// `$action` at top level (phase-2 replay): produced declarations are
    /// installed in the current context and returned.
    pub(crate) fn parse_compiler_action_producing_decls(&mut self) -> Vec<DeclId> {
        let Some(produced) = self.parse_compiler_action() else {
            return Vec::new();
        };
        let mut decls = Vec::new();
        for arg in produced {
            if let ActionArg::Decl(decl) = arg {
                let context = self.sema().current_decl_context();
                self.sema_mut().register_decl(context, decl);
                decls.push(decl);
            }
        }
        decls
    }

    /// Phase 1: capture an entire `$action` invocation as raw tokens.
    pub(crate) fn skip_compiler_action_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        debug_assert!(self.check(TokenKind::Dollar));
        tokens.push(self.consume());
        // Name path.
        loop {
            if matches!(self.kind(), TokenKind::Ident(_)) {
                tokens.push(self.consume());
                if self.check(TokenKind::Period) {
                    tokens.push(self.consume());
                    continue;
                }
            }
            break;
        }
        if self.check(TokenKind::LParen) {
            self.buffer_balanced_group(&mut tokens);
        }
        if self.check(TokenKind::LBrace) {
            self.buffer_balanced_group(&mut tokens);
        }
        if self.check(TokenKind::Semi) {
            self.consume();
        }
        tokens
    }
}
