//! Diagnostic ids and the emitted diagnostic record.
//!
//! All ids are declared in a single [`define_diagnostics!`] invocation,
//! grouped by severity. The macro generates the `DiagId` enum, `ALL`,
//! `as_str()`, `severity()`, and `default_text()` — the built-in format
//! template used when no external text provider overrides it.

use nyx_ir::SourceLocation;
use std::fmt;

/// Severity of a diagnostic, derived from its id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

/// Declare every diagnostic id, grouped by severity.
///
/// Each entry is `$variant => $template`; the template is the built-in
/// format text with `{n}` argument placeholders.
macro_rules! define_diagnostics {
    ($( $severity:ident { $( $variant:ident => $template:literal ),* $(,)? } )*) => {
        /// Identifier of a diagnostic message.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum DiagId {
            $( $( #[doc = $template] $variant, )* )*
        }

        impl DiagId {
            /// All ids, for exhaustive iteration in tests.
            pub const ALL: &'static [DiagId] = &[ $( $( DiagId::$variant, )* )* ];

            /// The variant name, e.g. `"ErrExpectedGot"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $( DiagId::$variant => stringify!($variant), )* )*
                }
            }

            /// Severity of this diagnostic.
            pub const fn severity(self) -> Severity {
                match self {
                    $( $( DiagId::$variant => Severity::$severity, )* )*
                }
            }

            /// The built-in format template.
            pub const fn default_text(self) -> &'static str {
                match self {
                    $( $( DiagId::$variant => $template, )* )*
                }
            }
        }
    };
}

define_diagnostics! {
    Note {
        NoteDeclaredHere => "`{0}` previously declared here",
    }

    Warning {
        WarnUnusedExpressionResult => "expression result is unused",
    }

    Error {
        // Lexical
        ErrUnexpectedEof => "unexpected end of file",
        ErrUnterminatedString => "string literal is missing a closing quote",
        ErrUnterminatedChar => "char literal is missing a closing quote",
        ErrUnterminatedComment => "block comment is missing a closing `*/`",
        ErrMultiCharInLiteral => "char literal contains more than one character",
        ErrUnknownCharacter => "unrecognized character `{0}`",
        ErrInvalidNumericSuffix => "invalid suffix `{0}` on numeric literal",
        ErrLiteralTooLarge => "numeric literal is too large for its type",
        ErrHexFloatUnsupported => "hexadecimal floating literals are not supported",
        ErrEscapeOutOfRange => "escape sequence value does not fit in a char",

        // Syntactic
        ErrExpectedGot => "expected {0}, got {1}",
        ErrExpectedIdentifier => "expected an identifier",
        ErrExpectedDeclarator => "expected a declarator",
        ErrExpectedTypeSpecifierGot => "expected a type specifier, got {0}",
        ErrExpectedExpression => "expected an expression",
        ErrExpectedStatement => "expected a statement",
        ErrExtraneousClosingBrace => "extraneous closing brace",
        ErrInitializerOnExtern => "declaration with `extern` storage cannot have an initializer",
        ErrDuplicateSpecifier => "specifier {0} appears more than once",
        ErrUnknownSizeArrayNotOutermost => "array of unknown size is only allowed at the outermost level",
        ErrCaseOutsideSwitch => "{0} label outside of a `switch` statement",
        ErrBaseClassesUnsupported => "base classes are not supported",

        // Semantic
        ErrUndeclaredIdentifier => "use of undeclared identifier `{0}`",
        ErrCannotDeduceType => "cannot deduce a type for `{0}` without an initializer",
        ErrAmbiguousLookup => "reference to `{0}` is ambiguous",
        ErrRedefinition => "redefinition of `{0}` with a different signature",
        ErrTypeMismatch => "cannot convert from `{0}` to `{1}`",
        ErrNotLValue => "expression is not assignable",
        ErrUnsafeOperation => "unsafe operation in safe scope",
        ErrCircularDependency => "declaration of `{0}` circularly depends on itself",
        ErrNonConstantExpression => "expression is not a constant",
        ErrInvalidOperands => "invalid operand types `{0}` and `{1}`",
        ErrInvalidUnaryOperand => "invalid operand type `{0}` for unary `{1}`",
        ErrInvalidCast => "no conversion from `{0}` to `{1}`",
        ErrBreakOutsideBreakable => "`break` outside of a breakable scope",
        ErrContinueOutsideContinuable => "`continue` outside of a continuable scope",
        ErrReturnValueInVoidFunction => "cannot return a value from a function returning `void`",
        ErrMissingReturnValue => "function must return a value",
        ErrCalleeNotFunction => "called expression has non-function type `{0}`",
        ErrArgumentCountMismatch => "expected {0} arguments, got {1}",
        ErrSubscriptNonArray => "subscripted expression has non-subscriptable type `{0}`",
        ErrMemberOfNonClass => "member access on non-class type `{0}`",
        ErrNoSuchMember => "type `{0}` has no member named `{1}`",
        ErrDerefNonPointer => "cannot dereference non-pointer type `{0}`",
        ErrConditionNotBool => "condition has type `{0}`, expected `bool`",
        ErrUndeclaredLabel => "use of undeclared label `{0}`",
        ErrUnknownModule => "unknown module `{0}`",

        // Compiler actions
        ErrUnknownAction => "unknown compiler action `{0}`",
        ErrActionArgumentMismatch => "compiler action argument has the wrong kind",
        ErrActionTooFewArguments => "too few arguments to compiler action `{0}`",
        ErrActionTooManyArguments => "too many arguments to compiler action `{0}`",
        ErrActionExpectedPointer => "compiler action expects a pointer expression",
        ErrActionYieldedNothing => "compiler action `{0}` did not produce a value here",
    }

    Fatal {
        FatalUnexpectedEof => "unexpected end of file inside an open {0}",
    }
}

impl fmt::Display for DiagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formatted diagnostic, as handed to the consumer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub id: DiagId,
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_name_prefix() {
        for &id in DiagId::ALL {
            let name = id.as_str();
            let expected = if name.starts_with("Note") {
                Severity::Note
            } else if name.starts_with("Warn") {
                Severity::Warning
            } else if name.starts_with("Err") {
                Severity::Error
            } else {
                Severity::Fatal
            };
            assert_eq!(id.severity(), expected, "{name}");
        }
    }

    #[test]
    fn every_id_has_text() {
        for &id in DiagId::ALL {
            assert!(!id.default_text().is_empty(), "{}", id);
        }
    }

    #[test]
    fn ids_are_unique() {
        use std::collections::HashSet;
        let names: HashSet<&str> = DiagId::ALL.iter().map(|id| id.as_str()).collect();
        assert_eq!(names.len(), DiagId::ALL.len());
    }
}
