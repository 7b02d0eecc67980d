//! Token types for the Nyx lexer.
//!
//! A token is a kind tag plus a source location and byte length. Literal
//! tokens carry their raw spelling as an interned [`Name`]; the literal
//! sub-parsers in `nyx_lexer` interpret the spelling on demand. Identifier
//! tokens carry their interned name; keywords are identifiers whose name the
//! identifier table classified at startup.

use crate::{Name, SourceLocation, SourceRange};
use std::fmt;

/// A lexed token.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub length: u32,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, location: SourceLocation, length: u32) -> Self {
        Token {
            kind,
            location,
            length,
        }
    }

    /// An EOF token at a dummy location, used to seed parser state.
    pub fn eof() -> Self {
        Token {
            kind: TokenKind::Eof,
            location: SourceLocation::DUMMY,
            length: 0,
        }
    }

    /// The source range this token covers.
    #[inline]
    pub fn range(&self) -> SourceRange {
        SourceRange::at(self.location, self.length)
    }

    /// The interned identifier, if this is an identifier token.
    #[inline]
    pub fn ident(&self) -> Option<Name> {
        match self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The raw literal spelling, if this is a literal token.
    #[inline]
    pub fn literal_spelling(&self) -> Option<Name> {
        match self.kind {
            TokenKind::NumericLit(s) | TokenKind::CharLit(s) | TokenKind::StringLit(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}+{}", self.kind, self.location, self.length)
    }
}

/// Compact discriminant tag for [`TokenKind`], with semantic range layout.
///
/// All values fit below 128 so a `u128` bitset can represent any set of
/// token kinds. Categories occupy contiguous ranges with gaps left for
/// future surface growth:
///
/// | Range   | Category      |
/// |---------|---------------|
/// | 0-3     | Identifiers and literals |
/// | 10-46   | Keywords      |
/// | 50-65   | Punctuation   |
/// | 70-102  | Operators     |
/// | 125-126 | Special       |
///
/// This enum is the single source of truth for discriminant values;
/// [`TokenKind::tag`] derives from it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum TokenTag {
    Ident = 0,
    NumericLit = 1,
    CharLit = 2,
    StringLit = 3,

    KwDef = 10,
    KwAlias = 11,
    KwImport = 12,
    KwModule = 13,
    KwClass = 14,
    KwEnum = 15,
    KwIf = 16,
    KwElse = 17,
    KwWhile = 18,
    KwFor = 19,
    KwDo = 20,
    KwContinue = 21,
    KwBreak = 22,
    KwReturn = 23,
    KwGoto = 24,
    KwCase = 25,
    KwDefault = 26,
    KwSwitch = 27,
    KwTry = 28,
    KwCatch = 29,
    KwThrow = 30,
    KwThis = 31,
    KwTrue = 32,
    KwFalse = 33,
    KwNull = 34,
    KwAs = 35,
    KwTypeof = 36,
    KwUnsafe = 37,
    KwExtern = 38,
    KwStatic = 39,
    KwConst = 40,
    KwPublic = 41,
    KwProtected = 42,
    KwInternal = 43,
    KwPrivate = 44,
    KwNew = 45,
    KwDelete = 46,

    LParen = 50,
    RParen = 51,
    LBracket = 52,
    RBracket = 53,
    LBrace = 54,
    RBrace = 55,
    Comma = 56,
    Semi = 57,
    Colon = 58,
    Question = 59,
    Period = 60,
    Arrow = 61,
    Ellipsis = 62,
    Hash = 63,
    Dollar = 64,
    At = 65,

    Plus = 70,
    PlusPlus = 71,
    PlusEq = 72,
    Minus = 73,
    MinusMinus = 74,
    MinusEq = 75,
    Star = 76,
    StarEq = 77,
    Slash = 78,
    SlashEq = 79,
    Percent = 80,
    PercentEq = 81,
    Amp = 82,
    AmpAmp = 83,
    AmpEq = 84,
    Pipe = 85,
    PipePipe = 86,
    PipeEq = 87,
    Caret = 88,
    CaretEq = 89,
    Tilde = 90,
    Exclaim = 91,
    ExclaimEq = 92,
    Eq = 93,
    EqEq = 94,
    Less = 95,
    LessEq = 96,
    LessLess = 97,
    LessLessEq = 98,
    Greater = 99,
    GreaterEq = 100,
    GreaterGreater = 101,
    GreaterGreaterEq = 102,

    Unknown = 125,
    Eof = 126,
}

/// Token kinds for the Nyx lexical surface.
///
/// Identifier and literal kinds carry interned payloads so tokens stay
/// `Copy` and hashable; everything else is a unit variant.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// Identifier (interned). Keyword identifiers get their own variants.
    Ident(Name),
    /// Numeric literal; payload is the uninterpreted spelling.
    NumericLit(Name),
    /// Char literal; payload is the body between the quotes, escapes intact.
    CharLit(Name),
    /// String literal; payload is the body between the quotes, escapes intact.
    StringLit(Name),

    KwDef,
    KwAlias,
    KwImport,
    KwModule,
    KwClass,
    KwEnum,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwDo,
    KwContinue,
    KwBreak,
    KwReturn,
    KwGoto,
    KwCase,
    KwDefault,
    KwSwitch,
    KwTry,
    KwCatch,
    KwThrow,
    KwThis,
    KwTrue,
    KwFalse,
    KwNull,
    KwAs,
    KwTypeof,
    KwUnsafe,
    KwExtern,
    KwStatic,
    KwConst,
    KwPublic,
    KwProtected,
    KwInternal,
    KwPrivate,
    KwNew,
    KwDelete,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Question,
    Period,
    Arrow,
    Ellipsis,
    Hash,
    Dollar,
    At,

    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Tilde,
    Exclaim,
    ExclaimEq,
    Eq,
    EqEq,
    Less,
    LessEq,
    LessLess,
    LessLessEq,
    Greater,
    GreaterEq,
    GreaterGreater,
    GreaterGreaterEq,

    /// Byte the lexer could not classify; the caller may diagnose it.
    Unknown,
    Eof,
}

impl TokenKind {
    /// The compact discriminant tag for this kind.
    pub const fn tag(&self) -> TokenTag {
        match self {
            TokenKind::Ident(_) => TokenTag::Ident,
            TokenKind::NumericLit(_) => TokenTag::NumericLit,
            TokenKind::CharLit(_) => TokenTag::CharLit,
            TokenKind::StringLit(_) => TokenTag::StringLit,
            TokenKind::KwDef => TokenTag::KwDef,
            TokenKind::KwAlias => TokenTag::KwAlias,
            TokenKind::KwImport => TokenTag::KwImport,
            TokenKind::KwModule => TokenTag::KwModule,
            TokenKind::KwClass => TokenTag::KwClass,
            TokenKind::KwEnum => TokenTag::KwEnum,
            TokenKind::KwIf => TokenTag::KwIf,
            TokenKind::KwElse => TokenTag::KwElse,
            TokenKind::KwWhile => TokenTag::KwWhile,
            TokenKind::KwFor => TokenTag::KwFor,
            TokenKind::KwDo => TokenTag::KwDo,
            TokenKind::KwContinue => TokenTag::KwContinue,
            TokenKind::KwBreak => TokenTag::KwBreak,
            TokenKind::KwReturn => TokenTag::KwReturn,
            TokenKind::KwGoto => TokenTag::KwGoto,
            TokenKind::KwCase => TokenTag::KwCase,
            TokenKind::KwDefault => TokenTag::KwDefault,
            TokenKind::KwSwitch => TokenTag::KwSwitch,
            TokenKind::KwTry => TokenTag::KwTry,
            TokenKind::KwCatch => TokenTag::KwCatch,
            TokenKind::KwThrow => TokenTag::KwThrow,
            TokenKind::KwThis => TokenTag::KwThis,
            TokenKind::KwTrue => TokenTag::KwTrue,
            TokenKind::KwFalse => TokenTag::KwFalse,
            TokenKind::KwNull => TokenTag::KwNull,
            TokenKind::KwAs => TokenTag::KwAs,
            TokenKind::KwTypeof => TokenTag::KwTypeof,
            TokenKind::KwUnsafe => TokenTag::KwUnsafe,
            TokenKind::KwExtern => TokenTag::KwExtern,
            TokenKind::KwStatic => TokenTag::KwStatic,
            TokenKind::KwConst => TokenTag::KwConst,
            TokenKind::KwPublic => TokenTag::KwPublic,
            TokenKind::KwProtected => TokenTag::KwProtected,
            TokenKind::KwInternal => TokenTag::KwInternal,
            TokenKind::KwPrivate => TokenTag::KwPrivate,
            TokenKind::KwNew => TokenTag::KwNew,
            TokenKind::KwDelete => TokenTag::KwDelete,
            TokenKind::LParen => TokenTag::LParen,
            TokenKind::RParen => TokenTag::RParen,
            TokenKind::LBracket => TokenTag::LBracket,
            TokenKind::RBracket => TokenTag::RBracket,
            TokenKind::LBrace => TokenTag::LBrace,
            TokenKind::RBrace => TokenTag::RBrace,
            TokenKind::Comma => TokenTag::Comma,
            TokenKind::Semi => TokenTag::Semi,
            TokenKind::Colon => TokenTag::Colon,
            TokenKind::Question => TokenTag::Question,
            TokenKind::Period => TokenTag::Period,
            TokenKind::Arrow => TokenTag::Arrow,
            TokenKind::Ellipsis => TokenTag::Ellipsis,
            TokenKind::Hash => TokenTag::Hash,
            TokenKind::Dollar => TokenTag::Dollar,
            TokenKind::At => TokenTag::At,
            TokenKind::Plus => TokenTag::Plus,
            TokenKind::PlusPlus => TokenTag::PlusPlus,
            TokenKind::PlusEq => TokenTag::PlusEq,
            TokenKind::Minus => TokenTag::Minus,
            TokenKind::MinusMinus => TokenTag::MinusMinus,
            TokenKind::MinusEq => TokenTag::MinusEq,
            TokenKind::Star => TokenTag::Star,
            TokenKind::StarEq => TokenTag::StarEq,
            TokenKind::Slash => TokenTag::Slash,
            TokenKind::SlashEq => TokenTag::SlashEq,
            TokenKind::Percent => TokenTag::Percent,
            TokenKind::PercentEq => TokenTag::PercentEq,
            TokenKind::Amp => TokenTag::Amp,
            TokenKind::AmpAmp => TokenTag::AmpAmp,
            TokenKind::AmpEq => TokenTag::AmpEq,
            TokenKind::Pipe => TokenTag::Pipe,
            TokenKind::PipePipe => TokenTag::PipePipe,
            TokenKind::PipeEq => TokenTag::PipeEq,
            TokenKind::Caret => TokenTag::Caret,
            TokenKind::CaretEq => TokenTag::CaretEq,
            TokenKind::Tilde => TokenTag::Tilde,
            TokenKind::Exclaim => TokenTag::Exclaim,
            TokenKind::ExclaimEq => TokenTag::ExclaimEq,
            TokenKind::Eq => TokenTag::Eq,
            TokenKind::EqEq => TokenTag::EqEq,
            TokenKind::Less => TokenTag::Less,
            TokenKind::LessEq => TokenTag::LessEq,
            TokenKind::LessLess => TokenTag::LessLess,
            TokenKind::LessLessEq => TokenTag::LessLessEq,
            TokenKind::Greater => TokenTag::Greater,
            TokenKind::GreaterEq => TokenTag::GreaterEq,
            TokenKind::GreaterGreater => TokenTag::GreaterGreater,
            TokenKind::GreaterGreaterEq => TokenTag::GreaterGreaterEq,
            TokenKind::Unknown => TokenTag::Unknown,
            TokenKind::Eof => TokenTag::Eof,
        }
    }

    /// The tag as a bit index for token sets.
    #[inline]
    pub const fn tag_index(&self) -> u8 {
        self.tag() as u8
    }

    /// Whether two kinds have the same tag, ignoring payloads.
    #[inline]
    pub const fn same_kind(&self, other: &TokenKind) -> bool {
        self.tag_index() == other.tag_index()
    }

    pub const fn is_keyword(&self) -> bool {
        let tag = self.tag_index();
        tag >= TokenTag::KwDef as u8 && tag <= TokenTag::KwDelete as u8
    }

    /// An access specifier keyword (`public`, `protected`, `internal`,
    /// `private`).
    pub const fn is_access_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::KwPublic
                | TokenKind::KwProtected
                | TokenKind::KwInternal
                | TokenKind::KwPrivate
        )
    }

    /// The closing delimiter matching an opening one.
    pub const fn closed_by(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            _ => None,
        }
    }

    /// The opening delimiter matching a closing one.
    pub const fn closes(&self) -> Option<TokenKind> {
        match self {
            TokenKind::RParen => Some(TokenKind::LParen),
            TokenKind::RBracket => Some(TokenKind::LBracket),
            TokenKind::RBrace => Some(TokenKind::LBrace),
            _ => None,
        }
    }

    /// Display name for diagnostics.
    pub const fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::NumericLit(_) => "numeric literal",
            TokenKind::CharLit(_) => "char literal",
            TokenKind::StringLit(_) => "string literal",
            TokenKind::KwDef => "`def`",
            TokenKind::KwAlias => "`alias`",
            TokenKind::KwImport => "`import`",
            TokenKind::KwModule => "`module`",
            TokenKind::KwClass => "`class`",
            TokenKind::KwEnum => "`enum`",
            TokenKind::KwIf => "`if`",
            TokenKind::KwElse => "`else`",
            TokenKind::KwWhile => "`while`",
            TokenKind::KwFor => "`for`",
            TokenKind::KwDo => "`do`",
            TokenKind::KwContinue => "`continue`",
            TokenKind::KwBreak => "`break`",
            TokenKind::KwReturn => "`return`",
            TokenKind::KwGoto => "`goto`",
            TokenKind::KwCase => "`case`",
            TokenKind::KwDefault => "`default`",
            TokenKind::KwSwitch => "`switch`",
            TokenKind::KwTry => "`try`",
            TokenKind::KwCatch => "`catch`",
            TokenKind::KwThrow => "`throw`",
            TokenKind::KwThis => "`this`",
            TokenKind::KwTrue => "`true`",
            TokenKind::KwFalse => "`false`",
            TokenKind::KwNull => "`null`",
            TokenKind::KwAs => "`as`",
            TokenKind::KwTypeof => "`typeof`",
            TokenKind::KwUnsafe => "`unsafe`",
            TokenKind::KwExtern => "`extern`",
            TokenKind::KwStatic => "`static`",
            TokenKind::KwConst => "`const`",
            TokenKind::KwPublic => "`public`",
            TokenKind::KwProtected => "`protected`",
            TokenKind::KwInternal => "`internal`",
            TokenKind::KwPrivate => "`private`",
            TokenKind::KwNew => "`new`",
            TokenKind::KwDelete => "`delete`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Question => "`?`",
            TokenKind::Period => "`.`",
            TokenKind::Arrow => "`->`",
            TokenKind::Ellipsis => "`...`",
            TokenKind::Hash => "`#`",
            TokenKind::Dollar => "`$`",
            TokenKind::At => "`@`",
            TokenKind::Plus => "`+`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::Minus => "`-`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::Star => "`*`",
            TokenKind::StarEq => "`*=`",
            TokenKind::Slash => "`/`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::Percent => "`%`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::Amp => "`&`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::AmpEq => "`&=`",
            TokenKind::Pipe => "`|`",
            TokenKind::PipePipe => "`||`",
            TokenKind::PipeEq => "`|=`",
            TokenKind::Caret => "`^`",
            TokenKind::CaretEq => "`^=`",
            TokenKind::Tilde => "`~`",
            TokenKind::Exclaim => "`!`",
            TokenKind::ExclaimEq => "`!=`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::Less => "`<`",
            TokenKind::LessEq => "`<=`",
            TokenKind::LessLess => "`<<`",
            TokenKind::LessLessEq => "`<<=`",
            TokenKind::Greater => "`>`",
            TokenKind::GreaterEq => "`>=`",
            TokenKind::GreaterGreater => "`>>`",
            TokenKind::GreaterGreaterEq => "`>>=`",
            TokenKind::Unknown => "unknown character",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "Ident({:?})", name),
            TokenKind::NumericLit(s) => write!(f, "NumericLit({:?})", s),
            TokenKind::CharLit(s) => write!(f, "CharLit({:?})", s),
            TokenKind::StringLit(s) => write!(f, "StringLit({:?})", s),
            other => f.write_str(other.display_name()),
        }
    }
}

/// An in-order token sequence ending in [`TokenKind::Eof`].
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        TokenList { tokens }
    }
}

// Size assertion: tokens are copied around constantly.
mod size_asserts {
    use super::Token;
    crate::static_assert_size!(Token, 20);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;

    #[test]
    fn tags_are_unique_and_below_128() {
        let kinds = all_unit_kinds();
        let mut seen = [false; 128];
        for kind in kinds {
            let index = kind.tag_index() as usize;
            assert!(index < 128, "{:?} tag out of range", kind);
            assert!(!seen[index], "duplicate tag for {:?}", kind);
            seen[index] = true;
        }
    }

    #[test]
    fn payload_kinds_compare_by_tag() {
        let a = TokenKind::Ident(Name::EMPTY);
        let b = TokenKind::NumericLit(Name::EMPTY);
        assert!(a.same_kind(&TokenKind::Ident(Name::EMPTY)));
        assert!(!a.same_kind(&b));
    }

    #[test]
    fn keyword_range_is_closed() {
        assert!(TokenKind::KwDef.is_keyword());
        assert!(TokenKind::KwDelete.is_keyword());
        assert!(!TokenKind::Ident(Name::EMPTY).is_keyword());
        assert!(!TokenKind::Semi.is_keyword());
    }

    #[test]
    fn delimiters_pair_up() {
        assert_eq!(TokenKind::LParen.closed_by(), Some(TokenKind::RParen));
        assert_eq!(TokenKind::RBrace.closes(), Some(TokenKind::LBrace));
        assert_eq!(TokenKind::Semi.closed_by(), None);
    }

    #[test]
    fn token_range_spans_length() {
        let token = Token::new(
            TokenKind::Plus,
            SourceLocation::new(FileId(1), 4),
            1,
        );
        assert_eq!(token.range().start, 4);
        assert_eq!(token.range().end, 5);
    }

    fn all_unit_kinds() -> Vec<TokenKind> {
        use TokenKind::*;
        vec![
            Ident(Name::EMPTY),
            NumericLit(Name::EMPTY),
            CharLit(Name::EMPTY),
            StringLit(Name::EMPTY),
            KwDef, KwAlias, KwImport, KwModule, KwClass, KwEnum, KwIf, KwElse, KwWhile, KwFor,
            KwDo, KwContinue, KwBreak, KwReturn, KwGoto, KwCase, KwDefault, KwSwitch, KwTry,
            KwCatch, KwThrow, KwThis, KwTrue, KwFalse, KwNull, KwAs, KwTypeof, KwUnsafe, KwExtern,
            KwStatic, KwConst, KwPublic, KwProtected, KwInternal, KwPrivate, KwNew, KwDelete,
            LParen, RParen, LBracket, RBracket, LBrace, RBrace, Comma, Semi, Colon, Question,
            Period, Arrow, Ellipsis, Hash, Dollar, At, Plus, PlusPlus, PlusEq, Minus, MinusMinus,
            MinusEq, Star, StarEq, Slash, SlashEq, Percent, PercentEq, Amp, AmpAmp, AmpEq, Pipe,
            PipePipe, PipeEq, Caret, CaretEq, Tilde, Exclaim, ExclaimEq, Eq, EqEq, Less, LessEq,
            LessLess, LessLessEq, Greater, GreaterEq, GreaterGreater, GreaterGreaterEq, Unknown,
            Eof,
        ]
    }
}
