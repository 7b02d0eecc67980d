//! The two-phase recursive-descent parser for Nyx.
//!
//! Phase 1 walks the top level of a translation unit: each `def`/`alias`
//! header is parsed, its type and initializer tokens are buffered into the
//! declarator, and an unresolved placeholder is registered so later code
//! can refer to the name. Compiler actions at top level are buffered the
//! same way. Phase 2 ([`Parser::divert_phase`]) replays the cached actions
//! and resolves every declarator, replaying its buffered tokens through the
//! preprocessor's cache stack; [`ResolveContext`] tracks in-flight
//! resolutions so cyclic dependencies are detected instead of looping.
//!
//! Expressions use Pratt precedence climbing; statements and declarations
//! are straight recursive descent. Errors never unwind: a failed production
//! reports, returns `None`, and the caller skips to the next anchor with
//! `skip_until`.

mod action;
mod decl;
mod expr;
mod recovery;
mod stmt;

pub use expr::OperatorPrecedence;
pub use recovery::{TokenSet, STMT_BOUNDARY, TOP_LEVEL_BOUNDARY};

use rustc_hash::FxHashSet;
use tracing::debug;

use nyx_diagnostic::{DiagId, DiagnosticsEngine};
use nyx_ir::{DeclId, IdentNamespace, Name, SourceLocation, Token, TokenKind};
use nyx_lexer::Preprocessor;
use nyx_sema::{Declarator, DeclaratorId, LookupPurpose, LookupResult, ScopeFlags, Sema};

/// Resolution state of a declarator during phase 2.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResolvingState {
    Unknown,
    Resolving,
    Resolved,
}

/// Phase-2 bookkeeping: which declarators are being resolved right now and
/// which are done. Re-entering a `Resolving` declarator is a circular
/// dependency.
#[derive(Default)]
pub struct ResolveContext {
    resolving: FxHashSet<u32>,
    resolved: FxHashSet<u32>,
}

impl ResolveContext {
    pub fn state(&self, id: DeclaratorId) -> ResolvingState {
        if self.resolved.contains(&id.0) {
            ResolvingState::Resolved
        } else if self.resolving.contains(&id.0) {
            ResolvingState::Resolving
        } else {
            ResolvingState::Unknown
        }
    }

    pub fn start_resolving(&mut self, id: DeclaratorId) {
        self.resolving.insert(id.0);
    }

    pub fn end_resolving(&mut self, id: DeclaratorId) {
        self.resolving.remove(&id.0);
        self.resolved.insert(id.0);
    }
}

/// A top-level compiler action buffered in phase 1.
struct CachedAction {
    tokens: Vec<Token>,
    decl_context: DeclId,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    One,
    Two,
}

/// Parser state for one translation unit.
pub struct Parser<'src> {
    pp: Preprocessor<'src>,
    sema: Sema,
    token: Token,
    paren_depth: u32,
    bracket_depth: u32,
    brace_depth: u32,
    /// Nesting depth of `switch` bodies, for `case`/`default` checking.
    pub(crate) switch_depth: u32,
    /// One frame per function body being parsed; collects `goto` targets
    /// so they can be checked once every label of the body is declared.
    goto_frames: Vec<Vec<(Name, SourceLocation)>>,
    declarators: Vec<Declarator>,
    resolve: ResolveContext,
    cached_actions: Vec<CachedAction>,
    phase: Phase,
}

impl<'src> Parser<'src> {
    pub fn new(pp: Preprocessor<'src>, sema: Sema) -> Self {
        let mut parser = Parser {
            pp,
            sema,
            token: Token::eof(),
            paren_depth: 0,
            bracket_depth: 0,
            brace_depth: 0,
            switch_depth: 0,
            goto_frames: Vec::new(),
            declarators: Vec::new(),
            resolve: ResolveContext::default(),
            cached_actions: Vec::new(),
            phase: Phase::One,
        };
        parser.consume();
        parser
    }

    #[inline]
    pub fn sema(&self) -> &Sema {
        &self.sema
    }

    pub fn sema_mut(&mut self) -> &mut Sema {
        &mut self.sema
    }

    pub fn into_sema(self) -> Sema {
        self.sema
    }

    pub(crate) fn diag(&self) -> &DiagnosticsEngine {
        self.sema.diag()
    }

    // === Token access ===

    #[inline]
    pub(crate) fn kind(&self) -> &TokenKind {
        &self.token.kind
    }

    #[inline]
    pub(crate) fn location(&self) -> SourceLocation {
        self.token.location
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.token.kind.same_kind(&kind)
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.token.kind, TokenKind::Eof)
    }

    /// Advance to the next token, keeping bracket depths current.
    pub(crate) fn consume(&mut self) -> Token {
        let consumed = self.token;
        match consumed.kind {
            TokenKind::LParen => self.paren_depth += 1,
            TokenKind::RParen => self.paren_depth = self.paren_depth.saturating_sub(1),
            TokenKind::LBracket => self.bracket_depth += 1,
            TokenKind::RBracket => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            TokenKind::LBrace => self.brace_depth += 1,
            TokenKind::RBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        self.token = self.pp.lex();
        consumed
    }

    /// Consume the current token if it matches, else report `expected
    /// {kind}, got {current}`.
    pub(crate) fn expect_and_consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            self.diag()
                .report(DiagId::ErrExpectedGot, self.location())
                .arg_token(kind)
                .arg_token(self.token.kind);
            false
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<(Name, SourceLocation)> {
        if let TokenKind::Ident(name) = self.token.kind {
            let location = self.location();
            self.consume();
            Some((name, location))
        } else {
            self.diag()
                .report(DiagId::ErrExpectedIdentifier, self.location());
            None
        }
    }

    // === Speculation ===

    /// Run `f` speculatively: diagnostics are suppressed, and if `f` fails
    /// the token stream is rewound as though nothing was consumed.
    pub(crate) fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let memento = self.pp.save();
        let token = self.token;
        let depths = (self.paren_depth, self.bracket_depth, self.brace_depth);
        self.diag().suppress();
        let result = f(self);
        self.diag().resume();
        if result.is_none() {
            self.pp.restore(&memento);
            self.token = token;
            (self.paren_depth, self.bracket_depth, self.brace_depth) = depths;
        }
        result
    }

    /// Run `f` in a fresh scope, popping it on every exit path.
    pub(crate) fn with_scope<T>(
        &mut self,
        flags: ScopeFlags,
        entity: Option<DeclId>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.sema.push_scope_with_entity(flags, entity);
        let result = f(self);
        self.sema.pop_scope();
        result
    }

    // === Recovery ===

    /// Skip tokens until one in `anchors` is found at the current nesting
    /// level; bracketed groups are skipped whole so recovery never crosses
    /// an unclosed container. Consumes the anchor unless `dont_consume`.
    /// Returns false if EOF was hit first.
    pub(crate) fn skip_until(&mut self, anchors: TokenSet, dont_consume: bool) -> bool {
        loop {
            if self.at_eof() {
                return anchors.contains(&TokenKind::Eof);
            }
            if anchors.contains(self.kind()) {
                if !dont_consume {
                    self.consume();
                }
                return true;
            }
            if let Some(closer) = self.kind().closed_by() {
                // Skip the whole balanced group.
                self.consume();
                self.skip_until(TokenSet::new().with(closer), false);
                continue;
            }
            self.consume();
        }
    }

    // === Declarator pool ===

    pub(crate) fn declarator_pool_len(&self) -> usize {
        self.declarators.len()
    }

    pub(crate) fn add_declarator(&mut self, declarator: Declarator) -> DeclaratorId {
        let id = DeclaratorId(self.declarators.len() as u32);
        self.declarators.push(declarator);
        id
    }

    pub(crate) fn take_declarator(&mut self, id: DeclaratorId) -> Declarator {
        std::mem::replace(
            &mut self.declarators[id.index()],
            Declarator::new(
                nyx_sema::DeclaratorContext::TypeName,
                DeclId::TRANSLATION_UNIT,
            ),
        )
    }

    pub(crate) fn put_declarator(&mut self, id: DeclaratorId, declarator: Declarator) {
        self.declarators[id.index()] = declarator;
    }

    pub(crate) fn cache_action(&mut self, tokens: Vec<Token>, decl_context: DeclId) {
        self.cached_actions.push(CachedAction {
            tokens,
            decl_context,
        });
    }

    #[inline]
    pub(crate) fn in_phase_one(&self) -> bool {
        self.phase == Phase::One
    }

    // === Goto targets ===

    pub(crate) fn push_goto_frame(&mut self) {
        self.goto_frames.push(Vec::new());
    }

    /// Record a `goto` target. Labels may be declared after the goto, so
    /// inside a function body the check is deferred to
    /// [`check_pending_gotos`](Self::check_pending_gotos); outside one the
    /// label must already be visible.
    pub(crate) fn record_goto(&mut self, label: Name, location: SourceLocation) {
        if let Some(frame) = self.goto_frames.last_mut() {
            frame.push((label, location));
            return;
        }
        let mut result = LookupResult::new(label, LookupPurpose::Label);
        if !self.sema.lookup_name(&mut result) {
            self.diag()
                .report(DiagId::ErrUndeclaredLabel, location)
                .arg_ident(self.sema.name_text(label));
        }
    }

    /// Resolve the gotos collected while `function`'s body parsed; every
    /// target must name a label declared in that function.
    pub(crate) fn check_pending_gotos(&mut self, function: DeclId) {
        let Some(frame) = self.goto_frames.pop() else {
            return;
        };
        for (label, location) in frame {
            let found = !self
                .sema
                .context()
                .lookup_in_context(function, label, IdentNamespace::LABEL)
                .is_empty();
            if !found {
                self.diag()
                    .report(DiagId::ErrUndeclaredLabel, location)
                    .arg_ident(self.sema.name_text(label));
            }
        }
    }

    // === Top level ===

    /// Parse one top-level group. Returns `true` at end of input.
    pub fn parse_top_level_decl(&mut self, decls: &mut Vec<DeclId>) -> bool {
        match *self.kind() {
            TokenKind::Eof => true,
            TokenKind::KwImport => {
                if let Some(decl) = self.parse_module_import() {
                    decls.push(decl);
                }
                false
            }
            TokenKind::KwModule => {
                if let Some(decl) = self.parse_module_decl() {
                    decls.push(decl);
                }
                false
            }
            _ => {
                decls.extend(self.parse_external_declaration());
                false
            }
        }
    }

    /// Phase 2: replay cached compiler actions, then resolve every
    /// deferred declarator. Declarations produced by the cached actions
    /// are appended to `decls`.
    pub fn divert_phase(&mut self, decls: &mut Vec<DeclId>) {
        debug!(
            actions = self.cached_actions.len(),
            declarators = self.declarators.len(),
            "entering phase 2"
        );
        self.phase = Phase::Two;

        let cached = std::mem::take(&mut self.cached_actions);
        for action in cached {
            let saved_token = self.token;
            self.pp.push_cached_tokens(action.tokens);
            self.consume();
            let produced = self.with_scope(
                ScopeFlags::DECLARABLE,
                Some(action.decl_context),
                |parser| parser.parse_compiler_action_producing_decls(),
            );
            decls.extend(produced);
            self.pp.pop_cached_tokens();
            self.token = saved_token;
        }

        for index in 0..self.declarators.len() {
            let id = DeclaratorId(index as u32);
            if self.resolve.state(id) == ResolvingState::Unknown
                && self.declarators[index].is_deferred()
            {
                self.resolve_declarator(id);
            }
        }
    }

    /// Resolve one deferred declarator: replay its cached tokens, re-enter
    /// the declarator grammar past the identifier, and replace the
    /// placeholder with the typed declaration.
    pub(crate) fn resolve_declarator(&mut self, id: DeclaratorId) {
        match self.resolve.state(id) {
            ResolvingState::Resolved => return,
            ResolvingState::Resolving => {
                // The declarator transitively needs itself.
                let name = self.declarators[id.index()].name;
                let location = self.declarators[id.index()].range.begin();
                self.diag()
                    .report(DiagId::ErrCircularDependency, location)
                    .arg_ident(self.sema.name_text(name));
                return;
            }
            ResolvingState::Unknown => {}
        }
        self.resolve.start_resolving(id);

        let mut declarator = self.take_declarator(id);
        let tokens = std::mem::take(&mut declarator.cached_tokens);

        let saved_token = self.token;
        let saved_depths = (self.paren_depth, self.bracket_depth, self.brace_depth);
        self.pp.push_cached_tokens(tokens);
        self.consume();

        let mut flags = ScopeFlags::DECLARABLE;
        if declarator.is_unsafe {
            flags = flags.union(ScopeFlags::UNSAFE);
        }
        let context = declarator.decl_context;
        self.with_scope(flags, Some(context), |parser| {
            parser.parse_resolved_declarator_tail(&mut declarator);
        });

        self.pp.pop_cached_tokens();
        self.token = saved_token;
        (self.paren_depth, self.bracket_depth, self.brace_depth) = saved_depths;

        self.put_declarator(id, declarator);
        self.resolve.end_resolving(id);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use nyx_diagnostic::CollectingConsumer;
    use nyx_ir::FileId;
    use std::rc::Rc;

    /// A parser over an in-memory source, sharing one interner between the
    /// preprocessor and Sema.
    pub(crate) fn parser_for(source: &'static str) -> (Parser<'static>, CollectingConsumer) {
        let consumer = CollectingConsumer::new();
        let diag = Rc::new(DiagnosticsEngine::new(Box::new(consumer.clone())));
        let pp = Preprocessor::new(FileId(1), source, Rc::clone(&diag));
        let sema = Sema::new(pp.interner().clone(), diag);
        (Parser::new(pp, sema), consumer)
    }
}

/// Parse a whole translation unit: phase 1 over every top-level group,
/// then phase 2. Returns all top-level declarations in source order,
/// including those synthesized by compiler actions.
pub fn parse_translation_unit(pp: Preprocessor<'_>, sema: Sema) -> (Sema, Vec<DeclId>) {
    let mut parser = Parser::new(pp, sema);
    let mut decls = Vec::new();
    loop {
        let mut group = Vec::new();
        let done = parser.parse_top_level_decl(&mut group);
        decls.append(&mut group);
        if done {
            break;
        }
    }
    parser.divert_phase(&mut decls);
    // Placeholders that were replaced during phase 2 are reported to the
    // caller as their resolved declarations.
    let resolved: Vec<DeclId> = decls
        .into_iter()
        .map(|decl| parser.resolved_decl_for(decl))
        .collect();
    (parser.into_sema(), resolved)
}

impl Parser<'_> {
    /// Map a phase-1 placeholder to the declaration that replaced it in
    /// phase 2. Non-placeholder declarations map to themselves.
    pub fn resolved_decl_for(&self, decl: DeclId) -> DeclId {
        use nyx_ir::DeclKind;
        if let DeclKind::Unresolved { declarator } = self.sema.context().decl(decl).kind {
            let declarator = &self.declarators[declarator as usize];
            if let Some(resolved) = declarator.resolved_decl {
                return resolved;
            }
        }
        decl
    }
}
