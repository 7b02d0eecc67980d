//! The diagnostics engine.
//!
//! One diagnostic is in flight at a time. `report` opens it; arguments are
//! attached in order through the returned builder; the diagnostic is
//! formatted and pushed to the consumer as soon as the number of supplied
//! arguments reaches the count its template requires. Reporting while a
//! diagnostic is still pending emits the pending one first.

use std::borrow::Cow;
use std::cell::RefCell;

use nyx_ir::{SourceLocation, TokenKind};

use crate::{DiagId, Diagnostic, DiagnosticConsumer, Severity};

/// A typed diagnostic argument, recorded in order of attachment.
#[derive(Clone, Debug)]
pub enum DiagArgument {
    Str(String),
    Char(char),
    SInt(i64),
    UInt(u64),
    TokenKind(TokenKind),
    /// An identifier, already resolved to its text.
    Ident(String),
}

impl DiagArgument {
    fn render(&self) -> Cow<'_, str> {
        match self {
            DiagArgument::Str(s) => Cow::Borrowed(s.as_str()),
            DiagArgument::Char(c) => Cow::Owned(c.to_string()),
            DiagArgument::SInt(v) => Cow::Owned(v.to_string()),
            DiagArgument::UInt(v) => Cow::Owned(v.to_string()),
            DiagArgument::TokenKind(kind) => Cow::Borrowed(kind.display_name()),
            DiagArgument::Ident(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

/// Maps diagnostic ids to format templates.
///
/// The engine falls back to `"(No available text)"` when a provider returns
/// `None`; the built-in provider serves each id's default template.
pub trait DiagnosticTextProvider {
    fn text_for(&self, id: DiagId) -> Option<Cow<'static, str>>;
}

/// Serves the templates compiled into [`DiagId`].
struct BuiltinTextProvider;

impl DiagnosticTextProvider for BuiltinTextProvider {
    fn text_for(&self, id: DiagId) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed(id.default_text()))
    }
}

const NO_TEXT: &str = "(No available text)";

/// Number of arguments a format template requires: one past the highest
/// `{n}` placeholder index, or zero if there are none.
pub fn required_argument_count(template: &str) -> usize {
    let mut required = 0usize;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            continue;
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut index = 0usize;
        let mut saw_digit = false;
        while let Some(&d) = chars.peek() {
            if let Some(v) = d.to_digit(10) {
                index = index * 10 + v as usize;
                saw_digit = true;
                chars.next();
            } else {
                break;
            }
        }
        if saw_digit {
            required = required.max(index + 1);
        }
    }
    required
}

/// Substitute `{n}` placeholders with rendered arguments.
///
/// Whitespace inside the braces is skipped. An unterminated placeholder is
/// a programming error in the template.
pub fn format_message(template: &str, args: &[DiagArgument]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            result.push(c);
            continue;
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut index = 0usize;
        while let Some(&d) = chars.peek() {
            if let Some(v) = d.to_digit(10) {
                index = index * 10 + v as usize;
                chars.next();
            } else {
                break;
            }
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some('}') => {}
            _ => panic!("unterminated argument placeholder in template {template:?}"),
        }
        match args.get(index) {
            Some(arg) => result.push_str(&arg.render()),
            None => result.push_str("(Broken argument)"),
        }
    }
    result
}

struct PendingDiag {
    id: DiagId,
    location: SourceLocation,
    template: Cow<'static, str>,
    required: usize,
    args: Vec<DiagArgument>,
}

struct EngineState {
    text_provider: Box<dyn DiagnosticTextProvider>,
    consumer: Box<dyn DiagnosticConsumer>,
    pending: Option<PendingDiag>,
    /// Emission is muted while this is non-zero.
    suppression: u32,
    error_count: usize,
    fatal_count: usize,
}

/// The diagnostics engine. Shared by reference between the preprocessor,
/// the parser and Sema; interior mutability keeps call sites free of
/// lifetime plumbing in this single-threaded front-end.
pub struct DiagnosticsEngine {
    state: RefCell<EngineState>,
}

impl DiagnosticsEngine {
    pub fn new(consumer: Box<dyn DiagnosticConsumer>) -> Self {
        Self::with_text_provider(Box::new(BuiltinTextProvider), consumer)
    }

    pub fn with_text_provider(
        text_provider: Box<dyn DiagnosticTextProvider>,
        consumer: Box<dyn DiagnosticConsumer>,
    ) -> Self {
        DiagnosticsEngine {
            state: RefCell::new(EngineState {
                text_provider,
                consumer,
                pending: None,
                suppression: 0,
                error_count: 0,
                fatal_count: 0,
            }),
        }
    }

    /// Open a diagnostic. Any still-pending diagnostic is emitted first; a
    /// diagnostic requiring no arguments is emitted immediately.
    pub fn report(&self, id: DiagId, location: SourceLocation) -> DiagnosticBuilder<'_> {
        {
            let mut state = self.state.borrow_mut();
            if state.pending.is_some() {
                Self::emit_pending(&mut state);
            }
            let template = state
                .text_provider
                .text_for(id)
                .unwrap_or(Cow::Borrowed(NO_TEXT));
            let required = required_argument_count(&template);
            state.pending = Some(PendingDiag {
                id,
                location,
                template,
                required,
                args: Vec::new(),
            });
            if required == 0 {
                Self::emit_pending(&mut state);
            }
        }
        DiagnosticBuilder { engine: self }
    }

    fn add_argument(&self, arg: DiagArgument) {
        let mut state = self.state.borrow_mut();
        let Some(pending) = state.pending.as_mut() else {
            return;
        };
        pending.args.push(arg);
        if pending.args.len() >= pending.required {
            Self::emit_pending(&mut state);
        }
    }

    fn emit_pending(state: &mut EngineState) {
        let Some(pending) = state.pending.take() else {
            return;
        };
        if state.suppression > 0 {
            return;
        }
        let severity = pending.id.severity();
        match severity {
            Severity::Error => state.error_count += 1,
            Severity::Fatal => {
                state.error_count += 1;
                state.fatal_count += 1;
            }
            _ => {}
        }
        let message = format_message(&pending.template, &pending.args);
        state.consumer.handle_diagnostic(Diagnostic {
            id: pending.id,
            severity,
            message,
            location: pending.location,
        });
    }

    /// Mute emission until the matching [`resume`](Self::resume).
    ///
    /// Suppression nests; the parser uses it around speculative parses.
    pub fn suppress(&self) {
        self.state.borrow_mut().suppression += 1;
    }

    pub fn resume(&self) {
        let mut state = self.state.borrow_mut();
        debug_assert!(state.suppression > 0, "unbalanced diagnostic resume");
        state.suppression = state.suppression.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.state.borrow().suppression > 0
    }

    /// Errors and fatals emitted so far (suppressed ones do not count).
    pub fn error_count(&self) -> usize {
        self.state.borrow().error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn has_fatal(&self) -> bool {
        self.state.borrow().fatal_count > 0
    }
}

/// Attaches typed arguments to the diagnostic currently in flight.
///
/// Arguments are recorded in order; the diagnostic is emitted the moment
/// the required count is reached.
pub struct DiagnosticBuilder<'a> {
    engine: &'a DiagnosticsEngine,
}

impl DiagnosticBuilder<'_> {
    pub fn arg_str(self, value: impl Into<String>) -> Self {
        self.engine.add_argument(DiagArgument::Str(value.into()));
        self
    }

    pub fn arg_char(self, value: char) -> Self {
        self.engine.add_argument(DiagArgument::Char(value));
        self
    }

    pub fn arg_int(self, value: i64) -> Self {
        self.engine.add_argument(DiagArgument::SInt(value));
        self
    }

    pub fn arg_uint(self, value: u64) -> Self {
        self.engine.add_argument(DiagArgument::UInt(value));
        self
    }

    pub fn arg_token(self, kind: TokenKind) -> Self {
        self.engine.add_argument(DiagArgument::TokenKind(kind));
        self
    }

    pub fn arg_ident(self, text: impl Into<String>) -> Self {
        self.engine.add_argument(DiagArgument::Ident(text.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingConsumer;
    use nyx_ir::FileId;

    fn engine() -> (DiagnosticsEngine, CollectingConsumer) {
        let consumer = CollectingConsumer::new();
        let engine = DiagnosticsEngine::new(Box::new(consumer.clone()));
        (engine, consumer)
    }

    fn loc() -> SourceLocation {
        SourceLocation::new(FileId(1), 0)
    }

    #[test]
    fn required_count_scans_max_placeholder() {
        assert_eq!(required_argument_count("plain text"), 0);
        assert_eq!(required_argument_count("expected {0}, got {1}"), 2);
        assert_eq!(required_argument_count("{ 2 } and {0}"), 3);
    }

    #[test]
    fn formats_in_argument_order() {
        let message = format_message(
            "expected {0}, got {1}",
            &[
                DiagArgument::TokenKind(TokenKind::Semi),
                DiagArgument::TokenKind(TokenKind::RBrace),
            ],
        );
        assert_eq!(message, "expected `;`, got `}`");
    }

    #[test]
    fn whitespace_in_placeholder_is_skipped() {
        let message = format_message("got { 0 }", &[DiagArgument::UInt(7)]);
        assert_eq!(message, "got 7");
    }

    #[test]
    #[should_panic(expected = "unterminated argument placeholder")]
    fn unterminated_placeholder_panics() {
        format_message("bad {0", &[DiagArgument::UInt(0)]);
    }

    #[test]
    fn zero_argument_diagnostic_emits_at_report() {
        let (engine, collected) = engine();
        engine.report(DiagId::ErrExpectedIdentifier, loc());
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.diagnostics()[0].id, DiagId::ErrExpectedIdentifier);
    }

    #[test]
    fn diagnostic_emits_once_arguments_satisfied() {
        let (engine, collected) = engine();
        engine
            .report(DiagId::ErrExpectedGot, loc())
            .arg_token(TokenKind::Comma)
            .arg_token(TokenKind::Semi);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.diagnostics()[0].message, "expected `,`, got `;`");
        assert_eq!(engine.error_count(), 1);
    }

    #[test]
    fn new_report_flushes_pending() {
        let (engine, collected) = engine();
        // Only one of two required arguments supplied.
        engine
            .report(DiagId::ErrExpectedGot, loc())
            .arg_token(TokenKind::Comma);
        assert_eq!(collected.len(), 0);
        // The next report forces the incomplete one out.
        engine.report(DiagId::ErrExpectedIdentifier, loc());
        assert_eq!(collected.len(), 2);
        assert_eq!(
            collected.diagnostics()[0].message,
            "expected `,`, got (Broken argument)"
        );
    }

    #[test]
    fn suppression_drops_diagnostics() {
        let (engine, collected) = engine();
        engine.suppress();
        engine.report(DiagId::ErrExpectedIdentifier, loc());
        engine.resume();
        assert_eq!(collected.len(), 0);
        assert_eq!(engine.error_count(), 0);

        engine.report(DiagId::ErrExpectedIdentifier, loc());
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn suppression_nests() {
        let (engine, collected) = engine();
        engine.suppress();
        engine.suppress();
        engine.resume();
        engine.report(DiagId::ErrExpectedIdentifier, loc());
        assert_eq!(collected.len(), 0);
        engine.resume();
        engine.report(DiagId::ErrExpectedIdentifier, loc());
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn severity_and_counts() {
        let (engine, collected) = engine();
        engine.report(DiagId::WarnUnusedExpressionResult, loc());
        engine
            .report(DiagId::FatalUnexpectedEof, loc())
            .arg_token(TokenKind::LBrace);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected.diagnostics()[0].severity, Severity::Warning);
        assert_eq!(collected.diagnostics()[1].severity, Severity::Fatal);
        assert!(engine.has_fatal());
        assert_eq!(engine.error_count(), 1);
    }
}
