//! Expression parsing: Pratt precedence climbing over binary operators,
//! recursive descent for unary and postfix forms.

use nyx_diagnostic::DiagId;
use nyx_ir::{BinaryOp, DeclKind, ExprId, Name, SourceRange, TokenKind, UnaryOp};
use nyx_sema::{LookupPurpose, LookupResult};

use crate::Parser;

/// Binary operator precedence, lowest binds loosest.
///
/// Assignment and the conditional operator are right-associative; all other
/// levels associate left.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct OperatorPrecedence(pub u8);

impl OperatorPrecedence {
    pub const UNKNOWN: OperatorPrecedence = OperatorPrecedence(0);
    pub const ASSIGNMENT: OperatorPrecedence = OperatorPrecedence(1);
    pub const CONDITIONAL: OperatorPrecedence = OperatorPrecedence(2);
    pub const LOGICAL_OR: OperatorPrecedence = OperatorPrecedence(3);
    pub const LOGICAL_AND: OperatorPrecedence = OperatorPrecedence(4);
    pub const BIT_OR: OperatorPrecedence = OperatorPrecedence(5);
    pub const BIT_XOR: OperatorPrecedence = OperatorPrecedence(6);
    pub const BIT_AND: OperatorPrecedence = OperatorPrecedence(7);
    pub const EQUALITY: OperatorPrecedence = OperatorPrecedence(8);
    pub const RELATIONAL: OperatorPrecedence = OperatorPrecedence(9);
    pub const SHIFT: OperatorPrecedence = OperatorPrecedence(10);
    pub const ADDITIVE: OperatorPrecedence = OperatorPrecedence(11);
    pub const MULTIPLICATIVE: OperatorPrecedence = OperatorPrecedence(12);

    #[inline]
    #[must_use]
    pub const fn one_higher(self) -> OperatorPrecedence {
        OperatorPrecedence(self.0 + 1)
    }

    /// The precedence of a token in binary-operator position.
    pub fn of(kind: &TokenKind) -> OperatorPrecedence {
        use TokenKind::*;
        match kind {
            Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | AmpEq | PipeEq | CaretEq
            | LessLessEq | GreaterGreaterEq => Self::ASSIGNMENT,
            Question => Self::CONDITIONAL,
            PipePipe => Self::LOGICAL_OR,
            AmpAmp => Self::LOGICAL_AND,
            Pipe => Self::BIT_OR,
            Caret => Self::BIT_XOR,
            Amp => Self::BIT_AND,
            EqEq | ExclaimEq => Self::EQUALITY,
            Less | Greater | LessEq | GreaterEq => Self::RELATIONAL,
            LessLess | GreaterGreater => Self::SHIFT,
            Plus | Minus => Self::ADDITIVE,
            Star | Slash | Percent => Self::MULTIPLICATIVE,
            _ => Self::UNKNOWN,
        }
    }

    /// Right-associative precedence levels.
    pub fn is_right_associative(self) -> bool {
        self == Self::ASSIGNMENT || self == Self::CONDITIONAL
    }
}

/// The binary operator a token denotes, if any.
fn binary_op_of(kind: &TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Rem,
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        LessLess => BinaryOp::Shl,
        GreaterGreater => BinaryOp::Shr,
        Less => BinaryOp::Lt,
        Greater => BinaryOp::Gt,
        LessEq => BinaryOp::Le,
        GreaterEq => BinaryOp::Ge,
        EqEq => BinaryOp::Eq,
        ExclaimEq => BinaryOp::Ne,
        Amp => BinaryOp::BitAnd,
        Caret => BinaryOp::BitXor,
        Pipe => BinaryOp::BitOr,
        AmpAmp => BinaryOp::LogicalAnd,
        PipePipe => BinaryOp::LogicalOr,
        Eq => BinaryOp::Assign,
        StarEq => BinaryOp::MulAssign,
        SlashEq => BinaryOp::DivAssign,
        PercentEq => BinaryOp::RemAssign,
        PlusEq => BinaryOp::AddAssign,
        MinusEq => BinaryOp::SubAssign,
        LessLessEq => BinaryOp::ShlAssign,
        GreaterGreaterEq => BinaryOp::ShrAssign,
        AmpEq => BinaryOp::AndAssign,
        CaretEq => BinaryOp::XorAssign,
        PipeEq => BinaryOp::OrAssign,
        _ => return None,
    })
}

impl Parser<'_> {
    /// expression:
    ///   assignment-expression
    pub(crate) fn parse_expression(&mut self) -> Option<ExprId> {
        self.parse_assignment_expression()
    }

    /// assignment-expression:
    ///   `throw` [assignment-expression]
    ///   cast-expression (binary-op rhs)*
    pub(crate) fn parse_assignment_expression(&mut self) -> Option<ExprId> {
        if self.check(TokenKind::KwThrow) {
            let start = self.location();
            self.consume();
            let operand = if self.expression_terminator() {
                None
            } else {
                Some(self.parse_assignment_expression()?)
            };
            let end = operand
                .map(|e| self.sema().context().expr(e).range)
                .unwrap_or(SourceRange::at(start, 5));
            let range = SourceRange::at(start, 0).merge(end);
            return Some(self.sema_mut().act_on_throw(operand, range));
        }
        let lhs = self.parse_cast_expression()?;
        self.parse_rhs_of_binary(lhs, OperatorPrecedence::ASSIGNMENT)
    }

    pub(crate) fn expression_terminator(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Semi
                | TokenKind::Comma
                | TokenKind::RParen
                | TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::Colon
                | TokenKind::Eof
        )
    }

    /// Pratt climbing: fold binary operators whose precedence is at least
    /// `min_prec` into `lhs`.
    pub(crate) fn parse_rhs_of_binary(
        &mut self,
        mut lhs: ExprId,
        min_prec: OperatorPrecedence,
    ) -> Option<ExprId> {
        loop {
            let prec = OperatorPrecedence::of(self.kind());
            if prec < min_prec || prec == OperatorPrecedence::UNKNOWN {
                return Some(lhs);
            }

            let op_token = self.consume();
            let op_location = op_token.location;

            if op_token.kind.same_kind(&TokenKind::Question) {
                // The middle operand is a full expression; `:` then the
                // right operand at conditional precedence.
                let then_expr = self.parse_expression()?;
                self.expect_and_consume(TokenKind::Colon);
                let mut else_expr = self.parse_cast_expression()?;
                else_expr = self.parse_rhs_of_binary(else_expr, OperatorPrecedence::CONDITIONAL)?;
                lhs = self
                    .sema_mut()
                    .act_on_conditional(lhs, then_expr, else_expr, op_location);
                continue;
            }

            let op = binary_op_of(&op_token.kind).expect("token had binary precedence");
            let mut rhs = self.parse_cast_expression()?;

            let next_prec = OperatorPrecedence::of(self.kind());
            if next_prec > prec || (prec.is_right_associative() && next_prec == prec) {
                let climb_from = if prec.is_right_associative() {
                    prec
                } else {
                    prec.one_higher()
                };
                rhs = self.parse_rhs_of_binary(rhs, climb_from)?;
            }

            lhs = self.sema_mut().act_on_binary(op, lhs, rhs, op_location);
        }
    }

    /// cast-expression:
    ///   literals, `(expr)`, `this`, id-expression, prefix operators,
    ///   `$action`, `new`, `delete`
    pub(crate) fn parse_cast_expression(&mut self) -> Option<ExprId> {
        let expr = match *self.kind() {
            TokenKind::NumericLit(_) => {
                let token = self.consume();
                self.sema_mut().act_on_numeric_literal(&token)
            }
            TokenKind::CharLit(_) => {
                let token = self.consume();
                self.sema_mut().act_on_char_literal(&token)
            }
            TokenKind::StringLit(_) => {
                let token = self.consume();
                self.sema_mut().act_on_string_literal(&token)
            }
            TokenKind::KwTrue => {
                let token = self.consume();
                self.sema_mut().act_on_bool_literal(true, token.range())
            }
            TokenKind::KwFalse => {
                let token = self.consume();
                self.sema_mut().act_on_bool_literal(false, token.range())
            }
            TokenKind::KwNull => {
                let token = self.consume();
                self.sema_mut().act_on_null_literal(token.range())
            }
            TokenKind::KwThis => {
                let token = self.consume();
                self.sema_mut().act_on_this(token.location)
            }
            TokenKind::LParen => self.parse_paren_expression()?,
            TokenKind::Ident(_) => self.parse_id_expression()?,
            TokenKind::PlusPlus => self.parse_prefix_unary(UnaryOp::PreInc)?,
            TokenKind::MinusMinus => self.parse_prefix_unary(UnaryOp::PreDec)?,
            TokenKind::Star => self.parse_prefix_unary(UnaryOp::Deref)?,
            TokenKind::Amp => self.parse_prefix_unary(UnaryOp::AddrOf)?,
            TokenKind::Plus => self.parse_prefix_unary(UnaryOp::Plus)?,
            TokenKind::Minus => self.parse_prefix_unary(UnaryOp::Minus)?,
            TokenKind::Exclaim => self.parse_prefix_unary(UnaryOp::LogicalNot)?,
            TokenKind::Tilde => self.parse_prefix_unary(UnaryOp::BitNot)?,
            TokenKind::Dollar => self.parse_action_expression()?,
            TokenKind::KwNew => self.parse_new_expression()?,
            TokenKind::KwDelete => {
                let token = self.consume();
                let operand = self.parse_cast_expression()?;
                let range = SourceRange::at(token.location, 6)
                    .merge(self.sema().context().expr(operand).range);
                self.sema_mut().act_on_delete(operand, range)
            }
            _ => {
                self.diag()
                    .report(DiagId::ErrExpectedExpression, self.location());
                return None;
            }
        };
        self.parse_postfix_suffix(expr)
    }

    fn parse_prefix_unary(&mut self, op: UnaryOp) -> Option<ExprId> {
        let token = self.consume();
        let operand = self.parse_cast_expression()?;
        let range =
            SourceRange::at(token.location, token.length).merge(self.sema().context().expr(operand).range);
        Some(self.sema_mut().act_on_unary(op, operand, token.location, range))
    }

    /// `( expression )`
    fn parse_paren_expression(&mut self) -> Option<ExprId> {
        let open = self.consume();
        let inner = self.parse_expression()?;
        let close_location = self.location();
        if !self.expect_and_consume(TokenKind::RParen) {
            return None;
        }
        let range = SourceRange::at(open.location, 1).extend_to(close_location.offset + 1);
        Some(self.sema_mut().act_on_paren_expr(inner, range))
    }

    /// id-expression: an identifier, optionally qualified by a dotted
    /// module path (`A.B.id`).
    fn parse_id_expression(&mut self) -> Option<ExprId> {
        let (name, location) = self.expect_identifier()?;
        self.ensure_resolved_unqualified(name);

        // Follow module qualifiers: while the name resolves to a module
        // and a `.` follows, descend into the module's context.
        let mut result = LookupResult::new(name, LookupPurpose::Ordinary);
        self.sema().lookup_name(&mut result);
        if let Some(mut decl) = result.single() {
            let mut is_module = matches!(
                self.sema().context().decl(decl).kind,
                DeclKind::Module | DeclKind::Import { .. }
            );
            while is_module && self.check(TokenKind::Period) {
                // An import forwards to its target module.
                if let DeclKind::Import {
                    target: Some(target),
                    ..
                } = self.sema().context().decl(decl).kind
                {
                    decl = target;
                }
                self.consume();
                let (member, member_location) = self.expect_identifier()?;
                self.ensure_resolved_in(decl, member);
                let mut inner = LookupResult::new(member, LookupPurpose::Ordinary);
                if !self.sema().lookup_qualified(&mut inner, decl) {
                    self.diag()
                        .report(DiagId::ErrUndeclaredIdentifier, member_location)
                        .arg_ident(self.sema().name_text(member));
                    let range = SourceRange::at(member_location, 0);
                    return Some(self.sema_mut().error_expr(range));
                }
                match inner.single() {
                    Some(found) => {
                        decl = found;
                        is_module = matches!(
                            self.sema().context().decl(decl).kind,
                            DeclKind::Module | DeclKind::Import { .. }
                        );
                    }
                    None => {
                        self.diag()
                            .report(DiagId::ErrAmbiguousLookup, member_location)
                            .arg_ident(self.sema().name_text(member));
                        let range = SourceRange::at(member_location, 0);
                        return Some(self.sema_mut().error_expr(range));
                    }
                }
            }
            if !is_module {
                let range = SourceRange::at(location, 0);
                return Some(self.sema_mut().build_decl_ref(decl, range));
            }
        }

        Some(self.sema_mut().act_on_id_expr(name, location))
    }

    /// If `name` currently resolves to an unresolved placeholder, resolve
    /// its declarator first (phase 2 only).
    pub(crate) fn ensure_resolved_unqualified(&mut self, name: Name) {
        if self.in_phase_one() {
            return;
        }
        let mut result = LookupResult::new(name, LookupPurpose::Ordinary);
        self.sema().lookup_name(&mut result);
        self.resolve_found_placeholders(&result);
    }

    pub(crate) fn ensure_resolved_in(&mut self, context: nyx_ir::DeclId, name: Name) {
        if self.in_phase_one() {
            return;
        }
        let mut result = LookupResult::new(name, LookupPurpose::Ordinary);
        self.sema().lookup_qualified(&mut result, context);
        self.resolve_found_placeholders(&result);
    }

    fn resolve_found_placeholders(&mut self, result: &LookupResult) {
        let pending: Vec<u32> = result
            .decls()
            .iter()
            .filter_map(|&decl| match self.sema().context().decl(decl).kind {
                DeclKind::Unresolved { declarator } => Some(declarator),
                _ => None,
            })
            .collect();
        for declarator in pending {
            self.resolve_declarator(nyx_sema::DeclaratorId(declarator));
        }
    }

    /// postfix-expression suffixes: `[index]`, `(args)`, `.member`,
    /// postfix `++`/`--`, `as type`.
    pub(crate) fn parse_postfix_suffix(&mut self, mut expr: ExprId) -> Option<ExprId> {
        loop {
            match *self.kind() {
                TokenKind::LBracket => {
                    let open = self.consume();
                    let index = self.parse_expression()?;
                    let end = self.location();
                    if !self.expect_and_consume(TokenKind::RBracket) {
                        return None;
                    }
                    let range = self
                        .sema()
                        .context()
                        .expr(expr)
                        .range
                        .extend_to(end.offset + 1);
                    expr = self
                        .sema_mut()
                        .act_on_array_subscript(expr, index, open.location, range);
                }
                TokenKind::LParen => {
                    let open = self.consume();
                    let args = self.parse_expression_list(TokenKind::RParen)?;
                    let end = self.location();
                    if !self.expect_and_consume(TokenKind::RParen) {
                        return None;
                    }
                    let range = self
                        .sema()
                        .context()
                        .expr(expr)
                        .range
                        .extend_to(end.offset + 1);
                    expr = self.sema_mut().act_on_call(expr, args, open.location, range);
                }
                TokenKind::Period => {
                    self.consume();
                    let (name, name_location) = self.expect_identifier()?;
                    let range = self
                        .sema()
                        .context()
                        .expr(expr)
                        .range
                        .extend_to(name_location.offset);
                    expr = self
                        .sema_mut()
                        .act_on_member_access(expr, name, name_location, range);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(TokenKind::PlusPlus) {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    let token = self.consume();
                    let range = self
                        .sema()
                        .context()
                        .expr(expr)
                        .range
                        .extend_to(token.location.offset + token.length);
                    expr = self.sema_mut().act_on_unary(op, expr, token.location, range);
                }
                TokenKind::KwAs => {
                    let token = self.consume();
                    let target = self.parse_typename()?;
                    let range = self
                        .sema()
                        .context()
                        .expr(expr)
                        .range
                        .extend_to(token.location.offset);
                    expr = self.sema_mut().act_on_as_type(expr, target, range);
                }
                _ => return Some(expr),
            }
        }
    }

    /// Comma-separated expressions up to (not consuming) `terminator`.
    pub(crate) fn parse_expression_list(
        &mut self,
        terminator: TokenKind,
    ) -> Option<Vec<ExprId>> {
        let mut exprs = Vec::new();
        if self.check(terminator) {
            return Some(exprs);
        }
        loop {
            exprs.push(self.parse_assignment_expression()?);
            if self.check(TokenKind::Comma) {
                self.consume();
                continue;
            }
            return Some(exprs);
        }
    }

    /// `new type [( args )]`
    fn parse_new_expression(&mut self) -> Option<ExprId> {
        let token = self.consume();
        let ty = self.parse_typename()?;
        let mut args = Vec::new();
        let mut end = token.location.offset + token.length;
        if self.check(TokenKind::LParen) {
            self.consume();
            args = self.parse_expression_list(TokenKind::RParen)?;
            end = self.location().offset + 1;
            if !self.expect_and_consume(TokenKind::RParen) {
                return None;
            }
        }
        let range = SourceRange::at(token.location, token.length).extend_to(end);
        Some(self.sema_mut().act_on_new(ty, args, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::parser_for;
    use nyx_sema::eval;

    fn eval_source(source: &'static str) -> Option<u64> {
        let (mut parser, diags) = parser_for(source);
        let expr = parser.parse_expression()?;
        assert!(diags.is_empty(), "{:?}", diags.messages());
        eval::evaluate_as_int(parser.sema_mut().context_mut(), expr)
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(eval_source("1 + 2 * 3"), Some(7));
        assert_eq!(eval_source("2 * 3 + 4 * 5"), Some(26));
    }

    #[test]
    fn parens_override_precedence() {
        assert_eq!(eval_source("(1 + 2) * 3"), Some(9));
    }

    #[test]
    fn shift_and_bitwise_levels() {
        assert_eq!(eval_source("1 << 3"), Some(8));
        // `|` binds looser than `^`, which binds looser than `&`.
        assert_eq!(eval_source("1 | 2 ^ 2 & 3"), Some(1));
    }

    #[test]
    fn comparison_feeds_logical() {
        assert_eq!(eval_source("1 < 2 && 3 != 4"), Some(1));
        assert_eq!(eval_source("1 > 2 || false"), Some(0));
    }

    #[test]
    fn conditional_takes_full_expression_in_middle() {
        assert_eq!(eval_source("true ? 10 : 20"), Some(10));
        // A nested conditional in the middle needs no parentheses.
        assert_eq!(eval_source("false ? true ? 1 : 2 : 3"), Some(3));
    }

    #[test]
    fn unary_operators_apply_before_binary() {
        assert_eq!(eval_source("-3 + 5"), Some(2));
        assert_eq!(eval_source("!false && true"), Some(1));
        assert_eq!(eval_source("~0 & 0xF"), Some(0xF));
    }

    #[test]
    fn unexpected_token_reports_expected_expression() {
        let (mut parser, diags) = parser_for("*;");
        // `*` needs an operand; `;` cannot start one.
        let result = parser.parse_expression();
        assert!(result.is_none());
        assert!(!diags.is_empty());
    }

    #[test]
    fn as_cast_parses_postfix() {
        let (mut parser, diags) = parser_for("7 as double");
        let expr = parser.parse_expression().unwrap();
        assert!(diags.is_empty(), "{:?}", diags.messages());
        assert_eq!(
            parser.sema().context().expr(expr).ty,
            nyx_ir::TypeId::DOUBLE
        );
    }
}
