//! Lexical analysis for the Nyx front-end.
//!
//! Three layers:
//! - [`Lexer`]: hand-written byte-level scanner producing one token per
//!   call, restartable through [`LexerMemento`];
//! - literal sub-parsers ([`NumericLiteralParser`], [`CharLiteralParser`],
//!   [`decode_string`]) that interpret literal spellings on demand;
//! - [`Preprocessor`]: the parser's token source, owning the identifier
//!   table and a LIFO stack of cached-token buffers for deferred bodies and
//!   speculative look-ahead.

mod cursor;
mod keyword;
mod lexer;
pub mod literal;
mod preprocessor;

pub use cursor::Cursor;
pub use keyword::IdentifierTable;
pub use lexer::{Lexer, LexerMemento};
pub use literal::{decode_string, CharLiteralParser, NumericLiteralParser};
pub use preprocessor::{Memento, Preprocessor};
