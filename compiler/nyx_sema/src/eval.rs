//! Constant expression evaluation.
//!
//! Folds expressions to 64-bit integer or double values. Evaluation fails
//! (returns `None`) on division or modulo by zero, shifts of at least the
//! operand's bit width, assignments, increments, and anything that is not a
//! compile-time constant. `&&`, `||` and `?:` short-circuit: the untaken
//! operand is never evaluated.

use nyx_ir::{
    AstContext, BinaryOp, BuiltinType, CastKind, DeclKind, ExprId, ExprKind, TypeId, TypeTraitKind,
    UnaryOp,
};

/// A folded constant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(u64),
    Float(f64),
}

impl ConstValue {
    pub fn as_int(self) -> u64 {
        match self {
            ConstValue::Int(v) => v,
            ConstValue::Float(f) => f as i64 as u64,
        }
    }

    pub fn as_float(self) -> f64 {
        match self {
            ConstValue::Int(v) => v as f64,
            ConstValue::Float(f) => f,
        }
    }

    fn is_truthy(self) -> bool {
        match self {
            ConstValue::Int(v) => v != 0,
            ConstValue::Float(f) => f != 0.0,
        }
    }
}

fn builtin_of(context: &AstContext, ty: TypeId) -> Option<BuiltinType> {
    context.as_builtin(ty)
}

fn is_signed(context: &AstContext, ty: TypeId) -> bool {
    builtin_of(context, ty).is_some_and(BuiltinType::is_signed)
}

fn bit_width(context: &AstContext, ty: TypeId) -> u32 {
    builtin_of(context, ty)
        .map(BuiltinType::bit_width)
        .filter(|&w| w > 0)
        .unwrap_or(64)
        .min(64)
}

/// Wrap a value to a builtin's width, sign-extending when it is signed.
fn wrap_to(value: u64, builtin: BuiltinType) -> u64 {
    let width = builtin.bit_width().min(64);
    if width == 0 || width >= 64 {
        return value;
    }
    let mask = (1u64 << width) - 1;
    let truncated = value & mask;
    if builtin.is_signed() && truncated & (1 << (width - 1)) != 0 {
        truncated | !mask
    } else {
        truncated
    }
}

/// Evaluate an expression to a constant.
pub fn evaluate(context: &mut AstContext, expr: ExprId) -> Option<ConstValue> {
    let (kind, ty) = {
        let e = context.expr(expr);
        (e.kind.clone(), e.ty)
    };

    match kind {
        ExprKind::IntegerLiteral { value } => Some(ConstValue::Int(value)),
        ExprKind::FloatingLiteral { value } => Some(ConstValue::Float(value)),
        ExprKind::CharLiteral { value } => Some(ConstValue::Int(u64::from(value))),
        ExprKind::BooleanLiteral { value } => Some(ConstValue::Int(u64::from(value))),
        ExprKind::NullPointerLiteral => Some(ConstValue::Int(0)),
        ExprKind::Paren { inner } => evaluate(context, inner),
        ExprKind::DeclRef { decl } => match context.decl(decl).kind {
            DeclKind::EnumConstant { value, .. } => Some(ConstValue::Int(value as u64)),
            _ => None,
        },
        ExprKind::Cast { cast, operand } | ExprKind::AsType { cast, operand } => {
            let value = evaluate(context, operand)?;
            apply_cast(context, cast, value, ty)
        }
        ExprKind::Unary { op, operand } => evaluate_unary(context, op, operand, ty),
        ExprKind::Binary { op, lhs, rhs } => evaluate_binary(context, op, lhs, rhs),
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            let cond = evaluate(context, cond)?;
            if cond.is_truthy() {
                evaluate(context, then_expr)
            } else {
                evaluate(context, else_expr)
            }
        }
        ExprKind::TypeTrait {
            trait_kind,
            operand,
        } => {
            let info = context.type_info(operand);
            Some(ConstValue::Int(match trait_kind {
                TypeTraitKind::SizeOf => info.size,
                TypeTraitKind::AlignOf => info.align,
            }))
        }
        _ => None,
    }
}

/// Evaluate and coerce to an integer.
pub fn evaluate_as_int(context: &mut AstContext, expr: ExprId) -> Option<u64> {
    evaluate(context, expr).map(ConstValue::as_int)
}

/// Evaluate and coerce to a double.
pub fn evaluate_as_float(context: &mut AstContext, expr: ExprId) -> Option<f64> {
    evaluate(context, expr).map(ConstValue::as_float)
}

fn apply_cast(
    context: &AstContext,
    cast: CastKind,
    value: ConstValue,
    target: TypeId,
) -> Option<ConstValue> {
    let target_builtin = builtin_of(context, target);
    match cast {
        CastKind::NoOp => Some(value),
        CastKind::IntegralCast => {
            let builtin = target_builtin?;
            Some(ConstValue::Int(wrap_to(value.as_int(), builtin)))
        }
        CastKind::IntegralToBoolean | CastKind::FloatingToBoolean => {
            Some(ConstValue::Int(u64::from(value.is_truthy())))
        }
        CastKind::IntegralToFloating => Some(ConstValue::Float(value.as_float())),
        CastKind::FloatingToIntegral => {
            let builtin = target_builtin?;
            Some(ConstValue::Int(wrap_to(value.as_int(), builtin)))
        }
        CastKind::FloatingCast => Some(ConstValue::Float(value.as_float())),
        CastKind::Invalid => None,
    }
}

fn evaluate_unary(
    context: &mut AstContext,
    op: UnaryOp,
    operand: ExprId,
    result_ty: TypeId,
) -> Option<ConstValue> {
    if op.is_increment_or_decrement() {
        return None;
    }
    let value = evaluate(context, operand)?;
    match op {
        UnaryOp::Plus => Some(value),
        UnaryOp::Minus => Some(match value {
            ConstValue::Int(v) => ConstValue::Int(v.wrapping_neg()),
            ConstValue::Float(f) => ConstValue::Float(-f),
        }),
        UnaryOp::BitNot => {
            let builtin = builtin_of(context, result_ty)?;
            Some(ConstValue::Int(wrap_to(!value.as_int(), builtin)))
        }
        UnaryOp::LogicalNot => Some(ConstValue::Int(u64::from(!value.is_truthy()))),
        _ => None,
    }
}

fn evaluate_binary(
    context: &mut AstContext,
    op: BinaryOp,
    lhs: ExprId,
    rhs: ExprId,
) -> Option<ConstValue> {
    if op.is_assignment() {
        return None;
    }

    // Short-circuit forms evaluate the right operand only when needed.
    match op {
        BinaryOp::LogicalAnd => {
            let left = evaluate(context, lhs)?;
            if !left.is_truthy() {
                return Some(ConstValue::Int(0));
            }
            let right = evaluate(context, rhs)?;
            return Some(ConstValue::Int(u64::from(right.is_truthy())));
        }
        BinaryOp::LogicalOr => {
            let left = evaluate(context, lhs)?;
            if left.is_truthy() {
                return Some(ConstValue::Int(1));
            }
            let right = evaluate(context, rhs)?;
            return Some(ConstValue::Int(u64::from(right.is_truthy())));
        }
        _ => {}
    }

    let lhs_ty = context.expr(lhs).ty;
    let left = evaluate(context, lhs)?;
    let right = evaluate(context, rhs)?;
    let float_math = matches!(left, ConstValue::Float(_)) || matches!(right, ConstValue::Float(_));
    let signed = is_signed(context, lhs_ty) || is_signed(context, context.expr(rhs).ty);

    if float_math {
        let (a, b) = (left.as_float(), right.as_float());
        return Some(match op {
            BinaryOp::Add => ConstValue::Float(a + b),
            BinaryOp::Sub => ConstValue::Float(a - b),
            BinaryOp::Mul => ConstValue::Float(a * b),
            BinaryOp::Div => {
                if b == 0.0 {
                    return None;
                }
                ConstValue::Float(a / b)
            }
            BinaryOp::Rem => {
                if b == 0.0 {
                    return None;
                }
                ConstValue::Float(a % b)
            }
            BinaryOp::Lt => ConstValue::Int(u64::from(a < b)),
            BinaryOp::Gt => ConstValue::Int(u64::from(a > b)),
            BinaryOp::Le => ConstValue::Int(u64::from(a <= b)),
            BinaryOp::Ge => ConstValue::Int(u64::from(a >= b)),
            BinaryOp::Eq => ConstValue::Int(u64::from(a == b)),
            BinaryOp::Ne => ConstValue::Int(u64::from(a != b)),
            _ => return None,
        });
    }

    let (a, b) = (left.as_int(), right.as_int());
    Some(match op {
        BinaryOp::Add => ConstValue::Int(a.wrapping_add(b)),
        BinaryOp::Sub => ConstValue::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => ConstValue::Int(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return None;
            }
            ConstValue::Int(if signed {
                (a as i64).wrapping_div(b as i64) as u64
            } else {
                a / b
            })
        }
        BinaryOp::Rem => {
            if b == 0 {
                return None;
            }
            ConstValue::Int(if signed {
                (a as i64).wrapping_rem(b as i64) as u64
            } else {
                a % b
            })
        }
        BinaryOp::Shl | BinaryOp::Shr => {
            let width = bit_width(context, lhs_ty);
            if b >= u64::from(width) {
                return None;
            }
            ConstValue::Int(if op == BinaryOp::Shl {
                a.wrapping_shl(b as u32)
            } else if signed {
                ((a as i64) >> b) as u64
            } else {
                a >> b
            })
        }
        BinaryOp::BitAnd => ConstValue::Int(a & b),
        BinaryOp::BitXor => ConstValue::Int(a ^ b),
        BinaryOp::BitOr => ConstValue::Int(a | b),
        BinaryOp::Lt => ConstValue::Int(u64::from(if signed { (a as i64) < (b as i64) } else { a < b })),
        BinaryOp::Gt => ConstValue::Int(u64::from(if signed { (a as i64) > (b as i64) } else { a > b })),
        BinaryOp::Le => ConstValue::Int(u64::from(if signed { (a as i64) <= (b as i64) } else { a <= b })),
        BinaryOp::Ge => ConstValue::Int(u64::from(if signed { (a as i64) >= (b as i64) } else { a >= b })),
        BinaryOp::Eq => ConstValue::Int(u64::from(a == b)),
        BinaryOp::Ne => ConstValue::Int(u64::from(a != b)),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_ir::{Expr, SourceRange, ValueCategory};

    fn int_lit(context: &mut AstContext, value: u64) -> ExprId {
        context.alloc_expr(Expr {
            kind: ExprKind::IntegerLiteral { value },
            ty: TypeId::INT,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        })
    }

    fn binary(context: &mut AstContext, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        context.alloc_expr(Expr {
            kind: ExprKind::Binary { op, lhs, rhs },
            ty: TypeId::INT,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        })
    }

    #[test]
    fn arithmetic_folds() {
        let mut context = AstContext::default();
        let two = int_lit(&mut context, 2);
        let three = int_lit(&mut context, 3);
        let sum = binary(&mut context, BinaryOp::Add, two, three);
        assert_eq!(evaluate_as_int(&mut context, sum), Some(5));
        let product = binary(&mut context, BinaryOp::Mul, two, three);
        assert_eq!(evaluate_as_int(&mut context, product), Some(6));
    }

    #[test]
    fn division_by_zero_fails() {
        let mut context = AstContext::default();
        let one = int_lit(&mut context, 1);
        let zero = int_lit(&mut context, 0);
        let div = binary(&mut context, BinaryOp::Div, one, zero);
        assert_eq!(evaluate(&mut context, div), None);
        let rem = binary(&mut context, BinaryOp::Rem, one, zero);
        assert_eq!(evaluate(&mut context, rem), None);
    }

    #[test]
    fn shift_past_width_fails() {
        let mut context = AstContext::default();
        let one = int_lit(&mut context, 1);
        let thirty_two = int_lit(&mut context, 32);
        let shift = binary(&mut context, BinaryOp::Shl, one, thirty_two);
        // `int` is 32 bits wide.
        assert_eq!(evaluate(&mut context, shift), None);
        let sixteen = int_lit(&mut context, 16);
        let one2 = int_lit(&mut context, 1);
        let ok = binary(&mut context, BinaryOp::Shl, one2, sixteen);
        assert_eq!(evaluate_as_int(&mut context, ok), Some(1 << 16));
    }

    #[test]
    fn short_circuit_skips_poison() {
        let mut context = AstContext::default();
        let zero = int_lit(&mut context, 0);
        let one = int_lit(&mut context, 1);
        let zero2 = int_lit(&mut context, 0);
        let poison = binary(&mut context, BinaryOp::Div, one, zero2);
        // 0 && (1/0) must evaluate to 0, never touching the division.
        let and = binary(&mut context, BinaryOp::LogicalAnd, zero, poison);
        assert_eq!(evaluate_as_int(&mut context, and), Some(0));
        // 1 || (1/0) likewise.
        let one2 = int_lit(&mut context, 1);
        let or = binary(&mut context, BinaryOp::LogicalOr, one2, poison);
        assert_eq!(evaluate_as_int(&mut context, or), Some(1));
        // But taking the poisoned arm fails.
        let one3 = int_lit(&mut context, 1);
        let and_taken = binary(&mut context, BinaryOp::LogicalAnd, one3, poison);
        assert_eq!(evaluate(&mut context, and_taken), None);
    }

    #[test]
    fn assignments_never_fold() {
        let mut context = AstContext::default();
        let a = int_lit(&mut context, 1);
        let b = int_lit(&mut context, 2);
        let assign = binary(&mut context, BinaryOp::Assign, a, b);
        assert_eq!(evaluate(&mut context, assign), None);
        let add_assign = binary(&mut context, BinaryOp::AddAssign, a, b);
        assert_eq!(evaluate(&mut context, add_assign), None);
    }

    #[test]
    fn signed_comparison() {
        let mut context = AstContext::default();
        let minus_one = int_lit(&mut context, (-1i64) as u64);
        let zero = int_lit(&mut context, 0);
        let less = binary(&mut context, BinaryOp::Lt, minus_one, zero);
        assert_eq!(evaluate_as_int(&mut context, less), Some(1));
    }

    #[test]
    fn conditional_short_circuits() {
        let mut context = AstContext::default();
        let zero = int_lit(&mut context, 0);
        let one = int_lit(&mut context, 1);
        let zero2 = int_lit(&mut context, 0);
        let poison = binary(&mut context, BinaryOp::Div, one, zero2);
        let seven = int_lit(&mut context, 7);
        let cond = context.alloc_expr(Expr {
            kind: ExprKind::Conditional {
                cond: zero,
                then_expr: poison,
                else_expr: seven,
            },
            ty: TypeId::INT,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        });
        assert_eq!(evaluate_as_int(&mut context, cond), Some(7));
    }

    #[test]
    fn size_of_folds_through_type_info() {
        let mut context = AstContext::default();
        let trait_expr = context.alloc_expr(Expr {
            kind: ExprKind::TypeTrait {
                trait_kind: TypeTraitKind::SizeOf,
                operand: TypeId::INT,
            },
            ty: TypeId::ULONG,
            category: ValueCategory::RValue,
            range: SourceRange::DUMMY,
        });
        assert_eq!(evaluate_as_int(&mut context, trait_expr), Some(4));
    }
}
