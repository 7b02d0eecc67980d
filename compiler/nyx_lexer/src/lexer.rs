//! The hand-written lexer.
//!
//! One token per call, scanning byte-by-byte; the first byte selects the
//! branch. Identifier classification goes through the
//! [`IdentifierTable`](crate::IdentifierTable); literal bodies are stored
//! uninterpreted for the sub-parsers in [`crate::literal`]. The cursor
//! position can be saved into a [`LexerMemento`] and restored, which is what
//! makes speculative parsing possible.

use nyx_diagnostic::{DiagId, DiagnosticsEngine};
use nyx_ir::{FileId, SourceLocation, Token, TokenKind};

use crate::cursor::Cursor;
use crate::IdentifierTable;

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

#[inline]
fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

#[inline]
fn is_ident_body(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

#[inline]
fn is_numeric_body(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'.'
}

/// Saved lexer state; restoring rewinds the byte cursor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LexerMemento {
    pub(crate) pos: u32,
}

/// The lexer for one source file.
pub struct Lexer<'src> {
    file: FileId,
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    pub fn new(file: FileId, input: &'src str) -> Self {
        Lexer {
            file,
            cursor: Cursor::new(input),
        }
    }

    #[inline]
    pub fn save(&self) -> LexerMemento {
        LexerMemento {
            pos: self.cursor.pos(),
        }
    }

    #[inline]
    pub fn restore(&mut self, memento: LexerMemento) {
        self.cursor.set_pos(memento.pos);
    }

    #[inline]
    fn location(&self, offset: u32) -> SourceLocation {
        SourceLocation::new(self.file, offset)
    }

    fn token(&self, kind: TokenKind, start: u32) -> Token {
        Token::new(kind, self.location(start), self.cursor.pos() - start)
    }

    /// Lex the next token. `None` at end of buffer.
    pub fn next_token(
        &mut self,
        table: &IdentifierTable,
        diag: &DiagnosticsEngine,
    ) -> Option<Token> {
        loop {
            self.cursor.eat_while(is_whitespace);
            if self.cursor.is_eof() {
                return None;
            }

            let start = self.cursor.pos();
            let byte = self.cursor.current();

            let kind = match byte {
                b'/' => match self.cursor.peek() {
                    b'/' => {
                        self.cursor.eat_until_newline_or_eof();
                        continue;
                    }
                    b'*' => {
                        if !self.skip_block_comment(start, diag) {
                            return None;
                        }
                        continue;
                    }
                    b'=' => self.two(TokenKind::SlashEq),
                    _ => self.one(TokenKind::Slash),
                },
                b'0'..=b'9' => return Some(self.numeric_literal(table, start)),
                _ if is_ident_start(byte) => return Some(self.identifier(table, start)),
                b'\'' => return self.char_literal(table, start, diag),
                b'"' => return self.string_literal(table, start, diag),

                b'+' => match self.cursor.peek() {
                    b'+' => self.two(TokenKind::PlusPlus),
                    b'=' => self.two(TokenKind::PlusEq),
                    _ => self.one(TokenKind::Plus),
                },
                b'-' => match self.cursor.peek() {
                    b'-' => self.two(TokenKind::MinusMinus),
                    b'=' => self.two(TokenKind::MinusEq),
                    b'>' => self.two(TokenKind::Arrow),
                    _ => self.one(TokenKind::Minus),
                },
                b'*' => match self.cursor.peek() {
                    b'=' => self.two(TokenKind::StarEq),
                    _ => self.one(TokenKind::Star),
                },
                b'%' => match self.cursor.peek() {
                    b'=' => self.two(TokenKind::PercentEq),
                    _ => self.one(TokenKind::Percent),
                },
                b'&' => match self.cursor.peek() {
                    b'&' => self.two(TokenKind::AmpAmp),
                    b'=' => self.two(TokenKind::AmpEq),
                    _ => self.one(TokenKind::Amp),
                },
                b'|' => match self.cursor.peek() {
                    b'|' => self.two(TokenKind::PipePipe),
                    b'=' => self.two(TokenKind::PipeEq),
                    _ => self.one(TokenKind::Pipe),
                },
                b'^' => match self.cursor.peek() {
                    b'=' => self.two(TokenKind::CaretEq),
                    _ => self.one(TokenKind::Caret),
                },
                b'!' => match self.cursor.peek() {
                    b'=' => self.two(TokenKind::ExclaimEq),
                    _ => self.one(TokenKind::Exclaim),
                },
                b'=' => match self.cursor.peek() {
                    b'=' => self.two(TokenKind::EqEq),
                    _ => self.one(TokenKind::Eq),
                },
                b'<' => match (self.cursor.peek(), self.cursor.peek2()) {
                    (b'<', b'=') => self.three(TokenKind::LessLessEq),
                    (b'<', _) => self.two(TokenKind::LessLess),
                    (b'=', _) => self.two(TokenKind::LessEq),
                    _ => self.one(TokenKind::Less),
                },
                b'>' => match (self.cursor.peek(), self.cursor.peek2()) {
                    (b'>', b'=') => self.three(TokenKind::GreaterGreaterEq),
                    (b'>', _) => self.two(TokenKind::GreaterGreater),
                    (b'=', _) => self.two(TokenKind::GreaterEq),
                    _ => self.one(TokenKind::Greater),
                },
                b'.' => match (self.cursor.peek(), self.cursor.peek2()) {
                    (b'.', b'.') => self.three(TokenKind::Ellipsis),
                    _ => self.one(TokenKind::Period),
                },
                b'~' => self.one(TokenKind::Tilde),
                b'(' => self.one(TokenKind::LParen),
                b')' => self.one(TokenKind::RParen),
                b'[' => self.one(TokenKind::LBracket),
                b']' => self.one(TokenKind::RBracket),
                b'{' => self.one(TokenKind::LBrace),
                b'}' => self.one(TokenKind::RBrace),
                b',' => self.one(TokenKind::Comma),
                b';' => self.one(TokenKind::Semi),
                b':' => self.one(TokenKind::Colon),
                b'?' => self.one(TokenKind::Question),
                b'#' => self.one(TokenKind::Hash),
                b'$' => self.one(TokenKind::Dollar),
                b'@' => self.one(TokenKind::At),
                _ => {
                    self.cursor.advance_char();
                    TokenKind::Unknown
                }
            };

            return Some(self.token(kind, start));
        }
    }

    #[inline]
    fn one(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }

    #[inline]
    fn two(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance_n(2);
        kind
    }

    #[inline]
    fn three(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance_n(3);
        kind
    }

    /// Skip `/* ... */`. Nesting is not supported. Returns `false` when the
    /// comment never terminates.
    fn skip_block_comment(&mut self, start: u32, diag: &DiagnosticsEngine) -> bool {
        self.cursor.advance_n(2);
        loop {
            if self.cursor.is_eof() {
                diag.report(DiagId::ErrUnterminatedComment, self.location(start));
                return false;
            }
            if self.cursor.current() == b'*' && self.cursor.peek() == b'/' {
                self.cursor.advance_n(2);
                return true;
            }
            self.cursor.advance_char();
        }
    }

    fn identifier(&mut self, table: &IdentifierTable, start: u32) -> Token {
        self.cursor.eat_while(is_ident_body);
        let text = self.cursor.slice_from(start);
        self.token(table.classify(text), start)
    }

    /// Scan a numeric literal spelling. A `+`/`-` directly after `e`/`E`
    /// continues the literal (scientific notation); interpretation is left
    /// to the numeric sub-parser.
    fn numeric_literal(&mut self, table: &IdentifierTable, start: u32) -> Token {
        let mut prev = 0u8;
        loop {
            let current = self.cursor.current();
            if is_numeric_body(current) {
                prev = current;
                self.cursor.advance();
            } else if matches!(current, b'+' | b'-') && matches!(prev, b'e' | b'E') {
                prev = current;
                self.cursor.advance();
            } else {
                break;
            }
        }
        let spelling = table.interner().intern(self.cursor.slice_from(start));
        self.token(TokenKind::NumericLit(spelling), start)
    }

    fn char_literal(
        &mut self,
        table: &IdentifierTable,
        start: u32,
        diag: &DiagnosticsEngine,
    ) -> Option<Token> {
        self.cursor.advance();
        let body_start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                0 if self.cursor.is_eof() => {
                    diag.report(DiagId::ErrUnterminatedChar, self.location(start));
                    return None;
                }
                b'\'' => break,
                b'\\' => self.cursor.advance_n(2),
                _ => self.cursor.advance_char(),
            }
        }
        let body = table.interner().intern(self.cursor.slice(body_start, self.cursor.pos()));
        self.cursor.advance();
        Some(self.token(TokenKind::CharLit(body), start))
    }

    fn string_literal(
        &mut self,
        table: &IdentifierTable,
        start: u32,
        diag: &DiagnosticsEngine,
    ) -> Option<Token> {
        self.cursor.advance();
        let body_start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                0 if self.cursor.is_eof() => {
                    diag.report(DiagId::ErrUnterminatedString, self.location(start));
                    return None;
                }
                b'"' => break,
                b'\\' => self.cursor.advance_n(2),
                _ => self.cursor.advance_char(),
            }
        }
        let body = table.interner().intern(self.cursor.slice(body_start, self.cursor.pos()));
        self.cursor.advance();
        Some(self.token(TokenKind::StringLit(body), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_diagnostic::{CollectingConsumer, DiagnosticsEngine};
    use nyx_ir::SharedInterner;

    fn lex_all(input: &str) -> (Vec<Token>, CollectingConsumer, IdentifierTable) {
        let consumer = CollectingConsumer::new();
        let diag = DiagnosticsEngine::new(Box::new(consumer.clone()));
        let table = IdentifierTable::new(SharedInterner::new());
        let mut lexer = Lexer::new(FileId(1), input);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token(&table, &diag) {
            tokens.push(token);
        }
        (tokens, consumer, table)
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex_all(input).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let (tokens, diags, table) = lex_all("def Main x");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::KwDef);
        let main = table.interner().intern("Main");
        assert_eq!(tokens[1].kind, TokenKind::Ident(main));
        assert!(matches!(tokens[2].kind, TokenKind::Ident(_)));
    }

    #[test]
    fn greedy_longest_operators() {
        assert_eq!(
            kinds("<<= << <= < >>= >> >= >"),
            vec![
                TokenKind::LessLessEq,
                TokenKind::LessLess,
                TokenKind::LessEq,
                TokenKind::Less,
                TokenKind::GreaterGreaterEq,
                TokenKind::GreaterGreater,
                TokenKind::GreaterEq,
                TokenKind::Greater,
            ]
        );
        assert_eq!(
            kinds("++ += + -> -- -="),
            vec![
                TokenKind::PlusPlus,
                TokenKind::PlusEq,
                TokenKind::Plus,
                TokenKind::Arrow,
                TokenKind::MinusMinus,
                TokenKind::MinusEq,
            ]
        );
        assert_eq!(
            kinds("&& & |= || ^= !="),
            vec![
                TokenKind::AmpAmp,
                TokenKind::Amp,
                TokenKind::PipeEq,
                TokenKind::PipePipe,
                TokenKind::CaretEq,
                TokenKind::ExclaimEq,
            ]
        );
    }

    #[test]
    fn ellipsis_vs_period() {
        let lexed = kinds("a.b ...");
        assert_eq!(lexed.len(), 4);
        assert!(matches!(lexed[0], TokenKind::Ident(_)));
        assert_eq!(lexed[1], TokenKind::Period);
        assert!(matches!(lexed[2], TokenKind::Ident(_)));
        assert_eq!(lexed[3], TokenKind::Ellipsis);
    }

    #[test]
    fn comments_are_skipped() {
        let (tokens, diags, _) = lex_all("a // comment\nb /* block\nstill */ c");
        assert!(diags.is_empty());
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn unterminated_block_comment_reports() {
        let (tokens, diags, _) = lex_all("a /* never closed");
        assert_eq!(tokens.len(), 1);
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUnterminatedComment);
    }

    #[test]
    fn numeric_spellings_are_preserved() {
        let (tokens, diags, table) = lex_all("1e+10 0xFF 3.25 42");
        assert!(diags.is_empty());
        let spellings: Vec<&str> = tokens
            .iter()
            .map(|t| table.interner().lookup(t.literal_spelling().unwrap()))
            .collect();
        assert_eq!(spellings, vec!["1e+10", "0xFF", "3.25", "42"]);
    }

    #[test]
    fn addition_is_not_scientific_notation() {
        let (tokens, _, _) = lex_all("1+2");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0].kind, TokenKind::NumericLit(_)));
        assert_eq!(tokens[1].kind, TokenKind::Plus);
    }

    #[test]
    fn char_and_string_bodies() {
        let (tokens, diags, table) = lex_all(r#"'a' '\n' "hi \"there\"""#);
        assert!(diags.is_empty());
        let texts: Vec<&str> = tokens
            .iter()
            .map(|t| table.interner().lookup(t.literal_spelling().unwrap()))
            .collect();
        assert_eq!(texts, vec!["a", "\\n", "hi \\\"there\\\""]);
    }

    #[test]
    fn unterminated_string_reports() {
        let (tokens, diags, _) = lex_all("\"open");
        assert!(tokens.is_empty());
        assert_eq!(diags.diagnostics()[0].id, DiagId::ErrUnterminatedString);
    }

    #[test]
    fn unknown_byte_becomes_unknown_token() {
        let (tokens, diags, _) = lex_all("`");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
    }

    #[test]
    fn utf8_identifier_bodies() {
        let (tokens, diags, _) = lex_all("caf\u{E9} x");
        assert!(diags.is_empty());
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[0].kind, TokenKind::Ident(_)));
    }

    #[test]
    fn memento_rewinds() {
        let consumer = CollectingConsumer::new();
        let diag = DiagnosticsEngine::new(Box::new(consumer.clone()));
        let table = IdentifierTable::new(SharedInterner::new());
        let mut lexer = Lexer::new(FileId(1), "a b c");
        let _a = lexer.next_token(&table, &diag).unwrap();
        let saved = lexer.save();
        let b1 = lexer.next_token(&table, &diag).unwrap();
        let _c = lexer.next_token(&table, &diag).unwrap();
        lexer.restore(saved);
        let b2 = lexer.next_token(&table, &diag).unwrap();
        assert_eq!(b1, b2);
    }

    #[test]
    fn token_spellings_reconstruct_source() {
        // Lexing then re-slicing the input at token ranges must reproduce
        // the input minus whitespace and comments.
        let input = "def f(x: int) -> int { return x + 1; } // tail";
        let (tokens, diags, _) = lex_all(input);
        assert!(diags.is_empty());
        let mut reconstructed = String::new();
        let mut stripped = String::new();
        for token in &tokens {
            reconstructed.push_str(&input[token.range().to_range()]);
        }
        for piece in input[..input.find("//").unwrap()].split_whitespace() {
            stripped.push_str(piece);
        }
        assert_eq!(reconstructed, stripped);
    }
}
