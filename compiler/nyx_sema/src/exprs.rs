//! Expression synthesis and cast inference.
//!
//! Every method returns an [`ExprId`] whose node carries a canonical result
//! type and a value category. Rejected expressions become error sentinels;
//! the diagnostic is emitted here, so callers just keep going.

use nyx_diagnostic::DiagId;
use nyx_ir::{
    BinaryOp, BuiltinType, CastKind, DeclId, DeclKind, Expr, ExprId, ExprKind, Name,
    SourceLocation, SourceRange, Token, TypeData, TypeId, TypeTraitKind, UnaryOp, ValueCategory,
};
use nyx_lexer::{decode_string, CharLiteralParser, NumericLiteralParser};

use crate::lookup::{LookupPurpose, LookupResult, LookupStatus};
use crate::sema::Sema;

impl Sema {
    fn make_expr(
        &mut self,
        kind: ExprKind,
        ty: TypeId,
        category: ValueCategory,
        range: SourceRange,
    ) -> ExprId {
        self.context_mut().alloc_expr(Expr {
            kind,
            ty,
            category,
            range,
        })
    }

    /// The error sentinel; a diagnostic has already been emitted.
    pub fn error_expr(&mut self, range: SourceRange) -> ExprId {
        self.make_expr(ExprKind::Error, TypeId::ERROR, ValueCategory::RValue, range)
    }

    fn is_error(&self, expr: ExprId) -> bool {
        self.context().expr(expr).is_error()
    }

    /// Human-readable rendering of a type for diagnostics.
    pub fn type_string(&self, ty: TypeId) -> String {
        match self.context().type_data(ty) {
            TypeData::Builtin(builtin) => builtin.name().to_owned(),
            TypeData::Pointer(pointee) => format!("{}*", self.type_string(*pointee)),
            TypeData::Array { elem, size } => format!("{}[{}]", self.type_string(*elem), size),
            TypeData::IncompleteArray(elem) => format!("{}[]", self.type_string(*elem)),
            TypeData::Function { params, ret, varargs } => {
                let mut rendered = String::from("(");
                for (index, &param) in params.iter().enumerate() {
                    if index > 0 {
                        rendered.push_str(", ");
                    }
                    rendered.push_str(&self.type_string(param));
                }
                if *varargs {
                    if !params.is_empty() {
                        rendered.push_str(", ");
                    }
                    rendered.push_str("...");
                }
                rendered.push_str(") -> ");
                rendered.push_str(&self.type_string(*ret));
                rendered
            }
            TypeData::Paren(inner) => format!("({})", self.type_string(*inner)),
            TypeData::Auto { deduced: Some(inner) } => self.type_string(*inner),
            TypeData::Auto { deduced: None } => "auto".to_owned(),
            TypeData::TypeOf(_) => "typeof(...)".to_owned(),
            TypeData::Unresolved(_) => "<unresolved>".to_owned(),
            TypeData::Class(decl) | TypeData::Enum(decl) => {
                self.name_text(self.context().decl(*decl).name).to_owned()
            }
            TypeData::Error => "<error>".to_owned(),
        }
    }

    // === Literals ===

    /// Synthesize a numeric literal expression from its token.
    ///
    /// The builtin type comes from the suffix flags; without a suffix the
    /// literal is `int`, or `double` when a fraction or exponent was seen.
    pub fn act_on_numeric_literal(&mut self, token: &Token) -> ExprId {
        let range = token.range();
        let Some(spelling) = token.literal_spelling() else {
            return self.error_expr(range);
        };
        let text = self.name_text(spelling);
        let parser = NumericLiteralParser::new(text, token.location, self.diag());

        if parser.is_float() || parser.is_floating_literal() {
            let (value, overflow) = parser.float_value();
            if overflow {
                self.diag().report(DiagId::ErrLiteralTooLarge, token.location);
            }
            let builtin = if parser.is_float() {
                BuiltinType::Float
            } else {
                BuiltinType::Double
            };
            let ty = self.context().builtin_type(builtin);
            return self.make_expr(
                ExprKind::FloatingLiteral { value },
                ty,
                ValueCategory::RValue,
                range,
            );
        }

        let (value, overflow) = parser.integer_value();
        if overflow {
            self.diag().report(DiagId::ErrLiteralTooLarge, token.location);
        }
        let builtin = match (parser.is_unsigned(), parser.is_long(), parser.is_long_long()) {
            (true, _, true) => BuiltinType::ULongLong,
            (false, _, true) => BuiltinType::LongLong,
            (true, true, _) => BuiltinType::ULong,
            (false, true, _) => BuiltinType::Long,
            (true, false, false) => BuiltinType::UInt,
            (false, false, false) => BuiltinType::Int,
        };
        let ty = self.context().builtin_type(builtin);
        self.make_expr(
            ExprKind::IntegerLiteral { value },
            ty,
            ValueCategory::RValue,
            range,
        )
    }

    pub fn act_on_char_literal(&mut self, token: &Token) -> ExprId {
        let range = token.range();
        let Some(body) = token.literal_spelling() else {
            return self.error_expr(range);
        };
        let text = self.name_text(body);
        let parser = CharLiteralParser::new(text, token.location, self.diag());
        let value = parser.value();
        self.make_expr(
            ExprKind::CharLiteral { value },
            TypeId::CHAR,
            ValueCategory::RValue,
            range,
        )
    }

    /// A string literal has type `char[N]` where `N` is the decoded length
    /// (no terminator).
    pub fn act_on_string_literal(&mut self, token: &Token) -> ExprId {
        let range = token.range();
        let Some(body) = token.literal_spelling() else {
            return self.error_expr(range);
        };
        let decoded = decode_string(self.name_text(body));
        let length = decoded.chars().count() as u64;
        let value = self.interner().intern_owned(decoded);
        let ty = self.context_mut().array_type(TypeId::CHAR, length);
        self.make_expr(
            ExprKind::StringLiteral { value },
            ty,
            ValueCategory::RValue,
            range,
        )
    }

    pub fn act_on_bool_literal(&mut self, value: bool, range: SourceRange) -> ExprId {
        self.make_expr(
            ExprKind::BooleanLiteral { value },
            TypeId::BOOL,
            ValueCategory::RValue,
            range,
        )
    }

    pub fn act_on_null_literal(&mut self, range: SourceRange) -> ExprId {
        let ty = self.context_mut().pointer_type(TypeId::VOID);
        self.make_expr(
            ExprKind::NullPointerLiteral,
            ty,
            ValueCategory::RValue,
            range,
        )
    }

    // === References ===

    /// Build a reference to a named declaration.
    pub fn act_on_id_expr(&mut self, name: Name, location: SourceLocation) -> ExprId {
        let range = SourceRange::at(location, 0);
        let mut result = LookupResult::new(name, LookupPurpose::Ordinary);
        self.lookup_name(&mut result);
        match result.status() {
            LookupStatus::NotFound => {
                self.diag()
                    .report(DiagId::ErrUndeclaredIdentifier, location)
                    .arg_ident(self.name_text(name));
                self.error_expr(range)
            }
            LookupStatus::Ambiguous => {
                self.diag()
                    .report(DiagId::ErrAmbiguousLookup, location)
                    .arg_ident(self.name_text(name));
                self.error_expr(range)
            }
            LookupStatus::Found | LookupStatus::FoundOverloaded => {
                let decl = result.first().expect("non-empty lookup");
                self.build_decl_ref(decl, range)
            }
        }
    }

    pub fn build_decl_ref(&mut self, decl: DeclId, range: SourceRange) -> ExprId {
        let decl_node = self.context().decl(decl);
        if matches!(decl_node.kind, DeclKind::Unresolved { .. }) {
            // A placeholder that survived resolution was rejected as part
            // of a dependency cycle; its diagnostic is already out.
            return self.error_expr(range);
        }
        let Some(ty) = decl_node.value_type() else {
            self.diag()
                .report(DiagId::ErrUndeclaredIdentifier, range.begin())
                .arg_ident(self.name_text(decl_node.name));
            return self.error_expr(range);
        };
        let category = match decl_node.kind {
            DeclKind::Var { .. }
            | DeclKind::ParmVar { .. }
            | DeclKind::ImplicitParam { .. }
            | DeclKind::Field { .. } => ValueCategory::LValue,
            _ => ValueCategory::RValue,
        };
        self.make_expr(ExprKind::DeclRef { decl }, ty, category, range)
    }

    /// `this` refers to the implicit parameter of the enclosing method.
    pub fn act_on_this(&mut self, location: SourceLocation) -> ExprId {
        let range = SourceRange::at(location, 4);
        let param = self.current_function().and_then(|function| {
            self.context()
                .context_children(function)
                .iter()
                .copied()
                .find(|&child| {
                    matches!(self.context().decl(child).kind, DeclKind::ImplicitParam { .. })
                })
        });
        match param {
            Some(param) => {
                let ty = self
                    .context()
                    .decl(param)
                    .value_type()
                    .expect("implicit parameters are typed");
                self.make_expr(
                    ExprKind::This { param: Some(param) },
                    ty,
                    ValueCategory::RValue,
                    range,
                )
            }
            None => {
                self.diag()
                    .report(DiagId::ErrUndeclaredIdentifier, location)
                    .arg_ident("this");
                self.error_expr(range)
            }
        }
    }

    pub fn act_on_paren_expr(&mut self, inner: ExprId, range: SourceRange) -> ExprId {
        let (ty, category) = {
            let expr = self.context().expr(inner);
            (expr.ty, expr.category)
        };
        self.make_expr(ExprKind::Paren { inner }, ty, category, range)
    }

    // === Casts ===

    /// Infer the cast kind converting `from` into `to`.
    pub fn cast_kind(&self, from: TypeId, to: TypeId) -> CastKind {
        let context = self.context();
        let from_u = context.underlying_type(from);
        let to_u = context.underlying_type(to);
        if from_u == to_u {
            return CastKind::NoOp;
        }
        match (context.type_data(from_u), context.type_data(to_u)) {
            (TypeData::Builtin(a), TypeData::Builtin(b)) => {
                if a == b {
                    CastKind::NoOp
                } else if a.is_integer() && b.is_integer() {
                    if *b == BuiltinType::Bool {
                        CastKind::IntegralToBoolean
                    } else {
                        CastKind::IntegralCast
                    }
                } else if a.is_integer() && b.is_floating() {
                    CastKind::IntegralToFloating
                } else if a.is_floating() && b.is_integer() {
                    if *b == BuiltinType::Bool {
                        CastKind::FloatingToBoolean
                    } else {
                        CastKind::FloatingToIntegral
                    }
                } else if a.is_floating() && b.is_floating() {
                    CastKind::FloatingCast
                } else {
                    CastKind::Invalid
                }
            }
            (TypeData::Builtin(a), TypeData::Enum(_)) => {
                if a.is_integer() {
                    CastKind::IntegralCast
                } else if a.is_floating() {
                    CastKind::FloatingToIntegral
                } else {
                    CastKind::Invalid
                }
            }
            (TypeData::Enum(_), TypeData::Builtin(b)) => {
                if b.is_integer() {
                    if *b == BuiltinType::Bool {
                        CastKind::IntegralToBoolean
                    } else {
                        CastKind::IntegralCast
                    }
                } else if b.is_floating() {
                    CastKind::IntegralToFloating
                } else {
                    CastKind::Invalid
                }
            }
            // Conversion to a class needs a user-defined conversion, which
            // is not implemented.
            (TypeData::Builtin(_), TypeData::Class(_)) => CastKind::Invalid,
            _ => CastKind::Invalid,
        }
    }

    /// Convert `expr` to `to`, inserting an implicit cast node. Reports a
    /// type mismatch when no conversion exists.
    pub fn perform_implicit_conversion(
        &mut self,
        expr: ExprId,
        to: TypeId,
        location: SourceLocation,
    ) -> ExprId {
        if self.is_error(expr) || to.is_error() {
            return expr;
        }
        let from = self.context().expr(expr).ty;
        if self.context().underlying_type(from) == self.context().underlying_type(to) {
            return expr;
        }
        let cast = self.cast_kind(from, to);
        if cast == CastKind::Invalid {
            self.diag()
                .report(DiagId::ErrTypeMismatch, location)
                .arg_str(self.type_string(from))
                .arg_str(self.type_string(to));
            let range = self.context().expr(expr).range;
            return self.error_expr(range);
        }
        let range = self.context().expr(expr).range;
        self.make_expr(
            ExprKind::Cast { cast, operand: expr },
            to,
            ValueCategory::RValue,
            range,
        )
    }

    /// `expr as type` — the user-written cast.
    pub fn act_on_as_type(
        &mut self,
        operand: ExprId,
        target: TypeId,
        range: SourceRange,
    ) -> ExprId {
        if self.is_error(operand) || target.is_error() {
            return self.error_expr(range);
        }
        let from = self.context().expr(operand).ty;
        let cast = self.cast_kind(from, target);
        if cast == CastKind::Invalid {
            self.diag()
                .report(DiagId::ErrInvalidCast, range.begin())
                .arg_str(self.type_string(from))
                .arg_str(self.type_string(target));
            return self.error_expr(range);
        }
        self.make_expr(
            ExprKind::AsType { cast, operand },
            target,
            ValueCategory::RValue,
            range,
        )
    }

    /// Convert a condition to `bool`, diagnosing non-boolean conditions.
    pub fn check_condition(&mut self, expr: ExprId, location: SourceLocation) -> ExprId {
        if self.is_error(expr) {
            return expr;
        }
        let ty = self.context().expr(expr).ty;
        if self.context().underlying_type(ty) == TypeId::BOOL {
            return expr;
        }
        let cast = self.cast_kind(ty, TypeId::BOOL);
        if cast == CastKind::Invalid {
            self.diag()
                .report(DiagId::ErrConditionNotBool, location)
                .arg_str(self.type_string(ty));
            let range = self.context().expr(expr).range;
            return self.error_expr(range);
        }
        let range = self.context().expr(expr).range;
        self.make_expr(
            ExprKind::Cast { cast, operand: expr },
            TypeId::BOOL,
            ValueCategory::RValue,
            range,
        )
    }

    // === Operators ===

    /// The common type of two arithmetic types: floats rank above
    /// integers (`float128 > longdouble > double > float`), integers rank
    /// by size then signedness.
    pub fn common_arithmetic_type(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        let context = self.context();
        let ba = context.as_builtin(a)?;
        let bb = context.as_builtin(b)?;
        if !ba.is_arithmetic() || !bb.is_arithmetic() {
            return None;
        }
        let winner = match (ba.is_floating(), bb.is_floating()) {
            (true, true) => {
                if ba.float_rank() >= bb.float_rank() {
                    ba
                } else {
                    bb
                }
            }
            (true, false) => ba,
            (false, true) => bb,
            (false, false) => {
                if ba.integer_rank() >= bb.integer_rank() {
                    ba
                } else {
                    bb
                }
            }
        };
        Some(context.builtin_type(winner))
    }

    pub fn act_on_unary(
        &mut self,
        op: UnaryOp,
        operand: ExprId,
        op_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        if self.is_error(operand) {
            return self.error_expr(range);
        }
        let operand_ty = self.context().expr(operand).ty;
        let operand_is_lvalue = self.context().expr(operand).is_lvalue();

        match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if !self.context().is_arithmetic_type(operand_ty) {
                    return self.invalid_unary(op, operand_ty, op_location, range);
                }
                self.make_expr(
                    ExprKind::Unary { op, operand },
                    operand_ty,
                    ValueCategory::RValue,
                    range,
                )
            }
            UnaryOp::BitNot => {
                if !self.context().is_integer_type(operand_ty) {
                    return self.invalid_unary(op, operand_ty, op_location, range);
                }
                self.make_expr(
                    ExprKind::Unary { op, operand },
                    operand_ty,
                    ValueCategory::RValue,
                    range,
                )
            }
            UnaryOp::LogicalNot => {
                let operand = self.check_condition(operand, op_location);
                self.make_expr(
                    ExprKind::Unary { op, operand },
                    TypeId::BOOL,
                    ValueCategory::RValue,
                    range,
                )
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                if !operand_is_lvalue {
                    self.diag().report(DiagId::ErrNotLValue, op_location);
                    return self.error_expr(range);
                }
                if self.context().is_pointer_type(operand_ty) {
                    // Stepping a pointer is pointer arithmetic.
                    if !self.check_unsafe(op_location) {
                        return self.error_expr(range);
                    }
                } else if !self.context().is_arithmetic_type(operand_ty) {
                    return self.invalid_unary(op, operand_ty, op_location, range);
                }
                let category = if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) {
                    ValueCategory::LValue
                } else {
                    ValueCategory::RValue
                };
                self.make_expr(ExprKind::Unary { op, operand }, operand_ty, category, range)
            }
            UnaryOp::Deref => {
                let Some(pointee) = self.context().pointee_type(operand_ty) else {
                    self.diag()
                        .report(DiagId::ErrDerefNonPointer, op_location)
                        .arg_str(self.type_string(operand_ty));
                    return self.error_expr(range);
                };
                if !self.check_unsafe(op_location) {
                    return self.error_expr(range);
                }
                self.make_expr(
                    ExprKind::Unary { op, operand },
                    pointee,
                    ValueCategory::LValue,
                    range,
                )
            }
            UnaryOp::AddrOf => {
                if !operand_is_lvalue {
                    self.diag().report(DiagId::ErrNotLValue, op_location);
                    return self.error_expr(range);
                }
                if !self.check_unsafe(op_location) {
                    return self.error_expr(range);
                }
                let ty = self.context_mut().pointer_type(operand_ty);
                self.make_expr(ExprKind::Unary { op, operand }, ty, ValueCategory::RValue, range)
            }
        }
    }

    fn invalid_unary(
        &mut self,
        op: UnaryOp,
        ty: TypeId,
        location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        self.diag()
            .report(DiagId::ErrInvalidUnaryOperand, location)
            .arg_str(self.type_string(ty))
            .arg_str(op.spelling());
        self.error_expr(range)
    }

    pub fn act_on_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        op_location: SourceLocation,
    ) -> ExprId {
        let range = self
            .context()
            .expr(lhs)
            .range
            .merge(self.context().expr(rhs).range);
        if self.is_error(lhs) || self.is_error(rhs) {
            return self.error_expr(range);
        }

        if op.is_assignment() {
            return self.act_on_assignment(op, lhs, rhs, op_location, range);
        }

        let lhs_ty = self.context().expr(lhs).ty;
        let rhs_ty = self.context().expr(rhs).ty;

        // Pointer arithmetic and pointer comparisons first.
        if self.context().is_pointer_type(lhs_ty) || self.context().is_pointer_type(rhs_ty) {
            return self.act_on_pointer_binary(op, lhs, rhs, op_location, range);
        }

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let Some(common) = self.common_arithmetic_type(lhs_ty, rhs_ty) else {
                    return self.invalid_operands(lhs_ty, rhs_ty, op_location, range);
                };
                let lhs = self.perform_implicit_conversion(lhs, common, op_location);
                let rhs = self.perform_implicit_conversion(rhs, common, op_location);
                self.make_expr(ExprKind::Binary { op, lhs, rhs }, common, ValueCategory::RValue, range)
            }
            BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
                if !self.context().is_integer_type(lhs_ty) || !self.context().is_integer_type(rhs_ty)
                {
                    return self.invalid_operands(lhs_ty, rhs_ty, op_location, range);
                }
                let common = self
                    .common_arithmetic_type(lhs_ty, rhs_ty)
                    .expect("integers always share a common type");
                let lhs = self.perform_implicit_conversion(lhs, common, op_location);
                let rhs = self.perform_implicit_conversion(rhs, common, op_location);
                self.make_expr(ExprKind::Binary { op, lhs, rhs }, common, ValueCategory::RValue, range)
            }
            BinaryOp::Shl | BinaryOp::Shr => {
                if !self.context().is_integer_type(lhs_ty) || !self.context().is_integer_type(rhs_ty)
                {
                    return self.invalid_operands(lhs_ty, rhs_ty, op_location, range);
                }
                self.make_expr(ExprKind::Binary { op, lhs, rhs }, lhs_ty, ValueCategory::RValue, range)
            }
            _ if op.is_comparison() => {
                let Some(common) = self.common_arithmetic_type(lhs_ty, rhs_ty) else {
                    // Non-arithmetic operands compare only at identical
                    // types.
                    if self.context().underlying_type(lhs_ty)
                        == self.context().underlying_type(rhs_ty)
                    {
                        return self.make_expr(
                            ExprKind::Binary { op, lhs, rhs },
                            TypeId::BOOL,
                            ValueCategory::RValue,
                            range,
                        );
                    }
                    return self.invalid_operands(lhs_ty, rhs_ty, op_location, range);
                };
                let lhs = self.perform_implicit_conversion(lhs, common, op_location);
                let rhs = self.perform_implicit_conversion(rhs, common, op_location);
                self.make_expr(ExprKind::Binary { op, lhs, rhs }, TypeId::BOOL, ValueCategory::RValue, range)
            }
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                let lhs = self.check_condition(lhs, op_location);
                let rhs = self.check_condition(rhs, op_location);
                self.make_expr(ExprKind::Binary { op, lhs, rhs }, TypeId::BOOL, ValueCategory::RValue, range)
            }
            _ => self.invalid_operands(lhs_ty, rhs_ty, op_location, range),
        }
    }

    fn act_on_assignment(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        op_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        if !self.context().expr(lhs).is_lvalue() {
            self.diag().report(DiagId::ErrNotLValue, op_location);
            return self.error_expr(range);
        }
        let lhs_ty = self.context().expr(lhs).ty;

        if let Some(operation) = op.compound_operation() {
            let rhs_ty = self.context().expr(rhs).ty;
            let operands_ok = match operation {
                BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Rem | BinaryOp::BitAnd
                | BinaryOp::BitXor | BinaryOp::BitOr => {
                    self.context().is_integer_type(lhs_ty) && self.context().is_integer_type(rhs_ty)
                }
                _ => {
                    self.context().is_arithmetic_type(lhs_ty)
                        && self.context().is_arithmetic_type(rhs_ty)
                }
            };
            if !operands_ok {
                return self.invalid_operands(lhs_ty, rhs_ty, op_location, range);
            }
        }

        let rhs = self.perform_implicit_conversion(rhs, lhs_ty, op_location);
        self.make_expr(ExprKind::Binary { op, lhs, rhs }, lhs_ty, ValueCategory::LValue, range)
    }

    fn act_on_pointer_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        op_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        let lhs_ty = self.context().expr(lhs).ty;
        let rhs_ty = self.context().expr(rhs).ty;
        let lhs_ptr = self.context().is_pointer_type(lhs_ty);
        let rhs_ptr = self.context().is_pointer_type(rhs_ty);

        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                if !self.check_unsafe(op_location) {
                    return self.error_expr(range);
                }
                match (lhs_ptr, rhs_ptr) {
                    (true, false) if self.context().is_integer_type(rhs_ty) => self.make_expr(
                        ExprKind::Binary { op, lhs, rhs },
                        lhs_ty,
                        ValueCategory::RValue,
                        range,
                    ),
                    (false, true)
                        if op == BinaryOp::Add && self.context().is_integer_type(lhs_ty) =>
                    {
                        self.make_expr(
                            ExprKind::Binary { op, lhs, rhs },
                            rhs_ty,
                            ValueCategory::RValue,
                            range,
                        )
                    }
                    (true, true)
                        if op == BinaryOp::Sub
                            && self.context().underlying_type(lhs_ty)
                                == self.context().underlying_type(rhs_ty) =>
                    {
                        let ty = self.context_mut().ptrdiff_type();
                        self.make_expr(
                            ExprKind::Binary { op, lhs, rhs },
                            ty,
                            ValueCategory::RValue,
                            range,
                        )
                    }
                    _ => self.invalid_operands(lhs_ty, rhs_ty, op_location, range),
                }
            }
            _ if op.is_comparison() => {
                if lhs_ptr
                    && rhs_ptr
                    && self.context().underlying_type(lhs_ty)
                        == self.context().underlying_type(rhs_ty)
                {
                    self.make_expr(
                        ExprKind::Binary { op, lhs, rhs },
                        TypeId::BOOL,
                        ValueCategory::RValue,
                        range,
                    )
                } else {
                    self.invalid_operands(lhs_ty, rhs_ty, op_location, range)
                }
            }
            _ => self.invalid_operands(lhs_ty, rhs_ty, op_location, range),
        }
    }

    fn invalid_operands(
        &mut self,
        lhs_ty: TypeId,
        rhs_ty: TypeId,
        location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        self.diag()
            .report(DiagId::ErrInvalidOperands, location)
            .arg_str(self.type_string(lhs_ty))
            .arg_str(self.type_string(rhs_ty));
        self.error_expr(range)
    }

    /// `cond ? a : b` — the branches share the common type.
    pub fn act_on_conditional(
        &mut self,
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
        question_location: SourceLocation,
    ) -> ExprId {
        let range = self
            .context()
            .expr(cond)
            .range
            .merge(self.context().expr(else_expr).range);
        if self.is_error(cond) || self.is_error(then_expr) || self.is_error(else_expr) {
            return self.error_expr(range);
        }
        let cond = self.check_condition(cond, question_location);
        let then_ty = self.context().expr(then_expr).ty;
        let else_ty = self.context().expr(else_expr).ty;

        let result_ty = if self.context().underlying_type(then_ty)
            == self.context().underlying_type(else_ty)
        {
            then_ty
        } else if let Some(common) = self.common_arithmetic_type(then_ty, else_ty) {
            common
        } else {
            return self.invalid_operands(then_ty, else_ty, question_location, range);
        };

        let then_expr = self.perform_implicit_conversion(then_expr, result_ty, question_location);
        let else_expr = self.perform_implicit_conversion(else_expr, result_ty, question_location);
        self.make_expr(
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            result_ty,
            ValueCategory::RValue,
            range,
        )
    }

    // === Postfix forms ===

    pub fn act_on_array_subscript(
        &mut self,
        base: ExprId,
        index: ExprId,
        bracket_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        if self.is_error(base) || self.is_error(index) {
            return self.error_expr(range);
        }
        let index_ty = self.context().expr(index).ty;
        if !self.context().is_integer_type(index_ty) {
            self.diag()
                .report(DiagId::ErrInvalidOperands, bracket_location)
                .arg_str(self.type_string(self.context().expr(base).ty))
                .arg_str(self.type_string(index_ty));
            return self.error_expr(range);
        }

        let base_ty = self.context().expr(base).ty;
        let base_underlying = self.context().underlying_type(base_ty);
        let elem = match *self.context().type_data(base_underlying) {
            TypeData::Array { elem, .. } | TypeData::IncompleteArray(elem) => elem,
            TypeData::Pointer(pointee) => {
                // Indexing a pointer is pointer arithmetic.
                if !self.check_unsafe(bracket_location) {
                    return self.error_expr(range);
                }
                pointee
            }
            _ => {
                self.diag()
                    .report(DiagId::ErrSubscriptNonArray, bracket_location)
                    .arg_str(self.type_string(base_ty));
                return self.error_expr(range);
            }
        };
        self.make_expr(
            ExprKind::ArraySubscript { base, index },
            elem,
            ValueCategory::LValue,
            range,
        )
    }

    pub fn act_on_call(
        &mut self,
        callee: ExprId,
        args: Vec<ExprId>,
        paren_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        if self.is_error(callee) {
            return self.error_expr(range);
        }
        let callee_ty = self.context().expr(callee).ty;
        let underlying = self.context().underlying_type(callee_ty);
        let (params, ret, varargs) = match self.context().type_data(underlying) {
            TypeData::Function { params, ret, varargs } => {
                (params.to_vec(), *ret, *varargs)
            }
            _ => {
                self.diag()
                    .report(DiagId::ErrCalleeNotFunction, paren_location)
                    .arg_str(self.type_string(callee_ty));
                return self.error_expr(range);
            }
        };

        let count_ok = if varargs {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !count_ok {
            self.diag()
                .report(DiagId::ErrArgumentCountMismatch, paren_location)
                .arg_uint(params.len() as u64)
                .arg_uint(args.len() as u64);
            return self.error_expr(range);
        }

        let mut converted = Vec::with_capacity(args.len());
        for (index, arg) in args.into_iter().enumerate() {
            if index < params.len() {
                converted.push(self.perform_implicit_conversion(arg, params[index], paren_location));
            } else {
                converted.push(arg);
            }
        }

        let is_member = matches!(self.context().expr(callee).kind, ExprKind::Member { .. });
        let kind = if is_member {
            ExprKind::MemberCall {
                callee,
                args: converted.into_boxed_slice(),
            }
        } else {
            ExprKind::Call {
                callee,
                args: converted.into_boxed_slice(),
            }
        };
        self.make_expr(kind, ret, ValueCategory::RValue, range)
    }

    pub fn act_on_member_access(
        &mut self,
        base: ExprId,
        name: Name,
        name_location: SourceLocation,
        range: SourceRange,
    ) -> ExprId {
        if self.is_error(base) {
            return self.error_expr(range);
        }
        let base_ty = self.context().expr(base).ty;
        let underlying = self.context().underlying_type(base_ty);
        let TypeData::Class(class) = *self.context().type_data(underlying) else {
            self.diag()
                .report(DiagId::ErrMemberOfNonClass, name_location)
                .arg_str(self.type_string(base_ty));
            return self.error_expr(range);
        };

        let mut result = LookupResult::new(name, LookupPurpose::Member);
        if !self.lookup_qualified(&mut result, class) {
            self.diag()
                .report(DiagId::ErrNoSuchMember, name_location)
                .arg_str(self.type_string(base_ty))
                .arg_ident(self.name_text(name));
            return self.error_expr(range);
        }
        let Some(member) = result.first() else {
            return self.error_expr(range);
        };
        let ty = self
            .context()
            .decl(member)
            .value_type()
            .unwrap_or(TypeId::ERROR);
        let category = if matches!(self.context().decl(member).kind, DeclKind::Field { .. }) {
            self.context().expr(base).category
        } else {
            ValueCategory::RValue
        };
        self.make_expr(ExprKind::Member { base, member, name }, ty, category, range)
    }

    // === Allocation, exceptions, traits ===

    pub fn act_on_new(&mut self, ty: TypeId, args: Vec<ExprId>, range: SourceRange) -> ExprId {
        let pointer = self.context_mut().pointer_type(ty);
        self.make_expr(
            ExprKind::New {
                args: args.into_boxed_slice(),
            },
            pointer,
            ValueCategory::RValue,
            range,
        )
    }

    pub fn act_on_delete(&mut self, operand: ExprId, range: SourceRange) -> ExprId {
        if !self.is_error(operand) {
            let ty = self.context().expr(operand).ty;
            if !self.context().is_pointer_type(ty) {
                self.diag()
                    .report(DiagId::ErrDerefNonPointer, range.begin())
                    .arg_str(self.type_string(ty));
                return self.error_expr(range);
            }
        }
        self.make_expr(
            ExprKind::Delete { operand },
            TypeId::VOID,
            ValueCategory::RValue,
            range,
        )
    }

    pub fn act_on_throw(&mut self, operand: Option<ExprId>, range: SourceRange) -> ExprId {
        self.make_expr(
            ExprKind::Throw { operand },
            TypeId::VOID,
            ValueCategory::RValue,
            range,
        )
    }

    /// `$SizeOf` / `$AlignOf` before folding; the result type is the
    /// target's size type.
    pub fn act_on_type_trait(
        &mut self,
        trait_kind: TypeTraitKind,
        operand: TypeId,
        range: SourceRange,
    ) -> ExprId {
        let ty = self.context_mut().size_type();
        self.make_expr(
            ExprKind::TypeTrait { trait_kind, operand },
            ty,
            ValueCategory::RValue,
            range,
        )
    }

    /// Synthesize an integer literal of a given type (used by compiler
    /// actions).
    pub fn synthesize_int_literal(&mut self, value: u64, ty: TypeId) -> ExprId {
        self.make_expr(
            ExprKind::IntegerLiteral { value },
            ty,
            ValueCategory::RValue,
            SourceRange::DUMMY,
        )
    }

    pub fn synthesize_bool_literal(&mut self, value: bool) -> ExprId {
        self.make_expr(
            ExprKind::BooleanLiteral { value },
            TypeId::BOOL,
            ValueCategory::RValue,
            SourceRange::DUMMY,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub(crate) fn int_literal(sema: &mut Sema, value: u64) -> ExprId {
        sema.synthesize_int_literal(value, TypeId::INT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeFlags;
    use nyx_diagnostic::{CollectingConsumer, DiagnosticsEngine};
    use nyx_ir::{SharedInterner, TokenKind};
    use std::rc::Rc;

    fn sema() -> (Sema, CollectingConsumer) {
        let consumer = CollectingConsumer::new();
        let diag = Rc::new(DiagnosticsEngine::new(Box::new(consumer.clone())));
        (Sema::new(SharedInterner::new(), diag), consumer)
    }

    fn int(sema: &mut Sema, value: u64) -> ExprId {
        sema.synthesize_int_literal(value, TypeId::INT)
    }

    #[test]
    fn common_type_prefers_floats_then_rank() {
        let (sema, _) = sema();
        assert_eq!(
            sema.common_arithmetic_type(TypeId::INT, TypeId::DOUBLE),
            Some(TypeId::DOUBLE)
        );
        assert_eq!(
            sema.common_arithmetic_type(TypeId::FLOAT, TypeId::LONGDOUBLE),
            Some(TypeId::LONGDOUBLE)
        );
        assert_eq!(
            sema.common_arithmetic_type(TypeId::INT, TypeId::LONG),
            Some(TypeId::LONG)
        );
        assert_eq!(
            sema.common_arithmetic_type(TypeId::INT, TypeId::UINT),
            Some(TypeId::UINT)
        );
    }

    #[test]
    fn cast_kind_table() {
        let (sema, _) = sema();
        assert_eq!(sema.cast_kind(TypeId::INT, TypeId::INT), CastKind::NoOp);
        assert_eq!(sema.cast_kind(TypeId::INT, TypeId::LONG), CastKind::IntegralCast);
        assert_eq!(
            sema.cast_kind(TypeId::INT, TypeId::BOOL),
            CastKind::IntegralToBoolean
        );
        assert_eq!(
            sema.cast_kind(TypeId::INT, TypeId::DOUBLE),
            CastKind::IntegralToFloating
        );
        assert_eq!(
            sema.cast_kind(TypeId::DOUBLE, TypeId::INT),
            CastKind::FloatingToIntegral
        );
        assert_eq!(
            sema.cast_kind(TypeId::DOUBLE, TypeId::BOOL),
            CastKind::FloatingToBoolean
        );
        assert_eq!(
            sema.cast_kind(TypeId::FLOAT, TypeId::DOUBLE),
            CastKind::FloatingCast
        );
        assert_eq!(sema.cast_kind(TypeId::VOID, TypeId::INT), CastKind::Invalid);
    }

    #[test]
    fn binary_arithmetic_applies_common_type() {
        let (mut sema, diags) = sema();
        let a = int(&mut sema, 1);
        let b = sema.synthesize_int_literal(2, TypeId::LONG);
        let sum = sema.act_on_binary(BinaryOp::Add, a, b, SourceLocation::DUMMY);
        assert!(diags.is_empty());
        assert_eq!(sema.context().expr(sum).ty, TypeId::LONG);
        // The narrower operand was wrapped in an implicit cast.
        let ExprKind::Binary { lhs, .. } = sema.context().expr(sum).kind else {
            panic!()
        };
        assert!(matches!(
            sema.context().expr(lhs).kind,
            ExprKind::Cast { cast: CastKind::IntegralCast, .. }
        ));
    }

    #[test]
    fn comparison_yields_bool() {
        let (mut sema, _) = sema();
        let a = int(&mut sema, 1);
        let b = int(&mut sema, 2);
        let cmp = sema.act_on_binary(BinaryOp::Lt, a, b, SourceLocation::DUMMY);
        assert_eq!(sema.context().expr(cmp).ty, TypeId::BOOL);
    }

    #[test]
    fn assignment_requires_lvalue() {
        let (mut sema, diags) = sema();
        let a = int(&mut sema, 1);
        let b = int(&mut sema, 2);
        let assign = sema.act_on_binary(BinaryOp::Assign, a, b, SourceLocation::DUMMY);
        assert!(sema.context().expr(assign).is_error());
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrNotLValue);
    }

    #[test]
    fn deref_requires_unsafe_scope() {
        let (mut sema, diags) = sema();
        // Build a pointer-typed lvalue by hand.
        let pointer_ty = sema.context_mut().pointer_type(TypeId::INT);
        let ptr = sema.context_mut().alloc_expr(Expr {
            kind: ExprKind::IntegerLiteral { value: 0 },
            ty: pointer_ty,
            category: ValueCategory::LValue,
            range: SourceRange::DUMMY,
        });

        let rejected = sema.act_on_unary(
            UnaryOp::Deref,
            ptr,
            SourceLocation::DUMMY,
            SourceRange::DUMMY,
        );
        assert!(sema.context().expr(rejected).is_error());
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUnsafeOperation);

        sema.push_scope(ScopeFlags::BLOCK.union(ScopeFlags::UNSAFE));
        let accepted = sema.act_on_unary(
            UnaryOp::Deref,
            ptr,
            SourceLocation::DUMMY,
            SourceRange::DUMMY,
        );
        sema.pop_scope();
        assert_eq!(sema.context().expr(accepted).ty, TypeId::INT);
        assert_eq!(
            sema.context().expr(accepted).category,
            ValueCategory::LValue
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn conditional_common_type() {
        let (mut sema, _) = sema();
        let cond = sema.synthesize_bool_literal(true);
        let a = int(&mut sema, 1);
        let b = sema.synthesize_int_literal(2, TypeId::DOUBLE);
        let ternary = sema.act_on_conditional(cond, a, b, SourceLocation::DUMMY);
        assert_eq!(sema.context().expr(ternary).ty, TypeId::DOUBLE);
    }

    #[test]
    fn undeclared_identifier_reports() {
        let (mut sema, diags) = sema();
        let name = sema.interner().intern("ghost");
        let expr = sema.act_on_id_expr(name, SourceLocation::DUMMY);
        assert!(sema.context().expr(expr).is_error());
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUndeclaredIdentifier);
        assert!(diags.diagnostics()[0].message.contains("ghost"));
    }

    #[test]
    fn string_literal_type_is_char_array() {
        let (mut sema, _) = sema();
        let body = sema.interner().intern("hi\\n");
        let token = Token::new(
            TokenKind::StringLit(body),
            SourceLocation::DUMMY,
            6,
        );
        let expr = sema.act_on_string_literal(&token);
        let ty = sema.context().expr(expr).ty;
        // "hi\n" decodes to three chars.
        assert!(matches!(
            sema.context().type_data(ty),
            TypeData::Array { elem, size: 3 } if *elem == TypeId::CHAR
        ));
    }
}
