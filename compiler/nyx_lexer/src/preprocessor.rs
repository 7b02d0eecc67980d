//! The preprocessor: token source for the parser.
//!
//! Owns the identifier table and the diagnostics handle, and layers a LIFO
//! stack of cached-token buffers over the lexer. While a cache is active,
//! `lex` drains it instead of the underlying buffer; this is how deferred
//! declarator bodies are re-parsed in phase 2 and how speculative
//! look-ahead rewinds. Pushes and pops must pair.

use std::rc::Rc;

use nyx_diagnostic::DiagnosticsEngine;
use nyx_ir::{FileId, SharedInterner, Token};

use crate::{IdentifierTable, Lexer, LexerMemento};

struct CachedTokens {
    tokens: Vec<Token>,
    pos: usize,
}

/// Saved preprocessor state: byte cursor plus the read positions of every
/// active token cache.
#[derive(Clone, Debug)]
pub struct Memento {
    lexer: LexerMemento,
    cache_positions: Vec<usize>,
}

/// Token source for one translation unit.
pub struct Preprocessor<'src> {
    table: IdentifierTable,
    diag: Rc<DiagnosticsEngine>,
    lexer: Lexer<'src>,
    caches: Vec<CachedTokens>,
}

impl<'src> Preprocessor<'src> {
    pub fn new(file: FileId, input: &'src str, diag: Rc<DiagnosticsEngine>) -> Self {
        Preprocessor {
            table: IdentifierTable::new(SharedInterner::new()),
            diag,
            lexer: Lexer::new(file, input),
            caches: Vec::new(),
        }
    }

    /// Build on an existing interner (shared with Sema).
    pub fn with_interner(
        file: FileId,
        input: &'src str,
        interner: SharedInterner,
        diag: Rc<DiagnosticsEngine>,
    ) -> Self {
        Preprocessor {
            table: IdentifierTable::new(interner),
            diag,
            lexer: Lexer::new(file, input),
            caches: Vec::new(),
        }
    }

    #[inline]
    pub fn table(&self) -> &IdentifierTable {
        &self.table
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        self.table.interner()
    }

    #[inline]
    pub fn diag(&self) -> &DiagnosticsEngine {
        &self.diag
    }

    pub fn diag_handle(&self) -> Rc<DiagnosticsEngine> {
        Rc::clone(&self.diag)
    }

    /// The next token. While a cache is active it is drained first; an
    /// exhausted cache yields EOF until it is popped.
    pub fn lex(&mut self) -> Token {
        if let Some(cache) = self.caches.last_mut() {
            if cache.pos < cache.tokens.len() {
                let token = cache.tokens[cache.pos];
                cache.pos += 1;
                return token;
            }
            return Token::eof();
        }
        self.lexer
            .next_token(&self.table, &self.diag)
            .unwrap_or_else(Token::eof)
    }

    /// Activate a cached token buffer. Nested pushes stack; pops must pair.
    pub fn push_cached_tokens(&mut self, tokens: Vec<Token>) {
        self.caches.push(CachedTokens { tokens, pos: 0 });
    }

    pub fn pop_cached_tokens(&mut self) {
        let popped = self.caches.pop();
        debug_assert!(popped.is_some(), "unbalanced cached-token pop");
    }

    pub fn cache_depth(&self) -> usize {
        self.caches.len()
    }

    /// Save the full token-source state for speculative parsing.
    pub fn save(&self) -> Memento {
        Memento {
            lexer: self.lexer.save(),
            cache_positions: self.caches.iter().map(|c| c.pos).collect(),
        }
    }

    /// Rewind to a saved state. Caches pushed since the save are dropped.
    pub fn restore(&mut self, memento: &Memento) {
        debug_assert!(
            self.caches.len() >= memento.cache_positions.len(),
            "memento outlived a cached-token pop"
        );
        self.caches.truncate(memento.cache_positions.len());
        for (cache, &pos) in self.caches.iter_mut().zip(&memento.cache_positions) {
            cache.pos = pos;
        }
        self.lexer.restore(memento.lexer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_diagnostic::{CollectingConsumer, DiagnosticsEngine};
    use nyx_ir::TokenKind;

    fn preprocessor(input: &str) -> (Preprocessor<'_>, CollectingConsumer) {
        let consumer = CollectingConsumer::new();
        let diag = Rc::new(DiagnosticsEngine::new(Box::new(consumer.clone())));
        (Preprocessor::new(FileId(1), input, diag), consumer)
    }

    #[test]
    fn lexes_to_eof() {
        let (mut pp, diags) = preprocessor("def x;");
        assert_eq!(pp.lex().kind, TokenKind::KwDef);
        assert!(matches!(pp.lex().kind, TokenKind::Ident(_)));
        assert_eq!(pp.lex().kind, TokenKind::Semi);
        assert_eq!(pp.lex().kind, TokenKind::Eof);
        assert_eq!(pp.lex().kind, TokenKind::Eof);
        assert!(diags.is_empty());
    }

    #[test]
    fn cached_tokens_shadow_the_buffer() {
        let (mut pp, _) = preprocessor("a b");
        let a = pp.lex();
        pp.push_cached_tokens(vec![a, a]);
        assert_eq!(pp.lex(), a);
        assert_eq!(pp.lex(), a);
        // Exhausted cache reads as EOF until popped.
        assert_eq!(pp.lex().kind, TokenKind::Eof);
        pp.pop_cached_tokens();
        assert!(matches!(pp.lex().kind, TokenKind::Ident(_)));
    }

    #[test]
    fn caches_stack_lifo() {
        let (mut pp, _) = preprocessor("x");
        let x = pp.lex();
        pp.push_cached_tokens(vec![x]);
        pp.push_cached_tokens(vec![x, x]);
        assert_eq!(pp.cache_depth(), 2);
        assert_eq!(pp.lex(), x);
        assert_eq!(pp.lex(), x);
        pp.pop_cached_tokens();
        assert_eq!(pp.lex(), x);
        pp.pop_cached_tokens();
        assert_eq!(pp.cache_depth(), 0);
    }

    #[test]
    fn memento_restores_cache_positions() {
        let (mut pp, _) = preprocessor("x y");
        let x = pp.lex();
        pp.push_cached_tokens(vec![x, x, x]);
        let _first = pp.lex();
        let saved = pp.save();
        let _second = pp.lex();
        let _third = pp.lex();
        pp.restore(&saved);
        assert_eq!(pp.lex(), x);
        assert_eq!(pp.lex(), x);
        assert_eq!(pp.lex().kind, TokenKind::Eof);
    }

    #[test]
    fn memento_drops_caches_pushed_after_save() {
        let (mut pp, _) = preprocessor("x y");
        let x = pp.lex();
        let saved = pp.save();
        pp.push_cached_tokens(vec![x]);
        pp.restore(&saved);
        assert_eq!(pp.cache_depth(), 0);
        assert!(matches!(pp.lex().kind, TokenKind::Ident(_)));
    }
}
