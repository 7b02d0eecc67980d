//! The identifier table: interning plus keyword classification.
//!
//! Keywords are ordinary interned identifiers whose names carry a
//! token-kind override, recorded once when the table is built. The lexer
//! asks the table to classify every identifier it scans.

use rustc_hash::FxHashMap;

use nyx_ir::{Name, SharedInterner, TokenKind};

/// Every keyword of the lexical surface with its token kind.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("def", TokenKind::KwDef),
    ("alias", TokenKind::KwAlias),
    ("import", TokenKind::KwImport),
    ("module", TokenKind::KwModule),
    ("class", TokenKind::KwClass),
    ("enum", TokenKind::KwEnum),
    ("if", TokenKind::KwIf),
    ("else", TokenKind::KwElse),
    ("while", TokenKind::KwWhile),
    ("for", TokenKind::KwFor),
    ("do", TokenKind::KwDo),
    ("continue", TokenKind::KwContinue),
    ("break", TokenKind::KwBreak),
    ("return", TokenKind::KwReturn),
    ("goto", TokenKind::KwGoto),
    ("case", TokenKind::KwCase),
    ("default", TokenKind::KwDefault),
    ("switch", TokenKind::KwSwitch),
    ("try", TokenKind::KwTry),
    ("catch", TokenKind::KwCatch),
    ("throw", TokenKind::KwThrow),
    ("this", TokenKind::KwThis),
    ("true", TokenKind::KwTrue),
    ("false", TokenKind::KwFalse),
    ("null", TokenKind::KwNull),
    ("as", TokenKind::KwAs),
    ("typeof", TokenKind::KwTypeof),
    ("unsafe", TokenKind::KwUnsafe),
    ("extern", TokenKind::KwExtern),
    ("static", TokenKind::KwStatic),
    ("const", TokenKind::KwConst),
    ("public", TokenKind::KwPublic),
    ("protected", TokenKind::KwProtected),
    ("internal", TokenKind::KwInternal),
    ("private", TokenKind::KwPrivate),
    ("new", TokenKind::KwNew),
    ("delete", TokenKind::KwDelete),
];

/// Interner plus keyword map, owned by the preprocessor.
pub struct IdentifierTable {
    interner: SharedInterner,
    keywords: FxHashMap<Name, TokenKind>,
}

impl IdentifierTable {
    /// Build the table, pre-interning all keywords.
    pub fn new(interner: SharedInterner) -> Self {
        let mut keywords = FxHashMap::default();
        for &(text, kind) in KEYWORDS {
            keywords.insert(interner.intern(text), kind);
        }
        IdentifierTable { interner, keywords }
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern identifier text and classify it as a keyword or a plain
    /// identifier.
    pub fn classify(&self, text: &str) -> TokenKind {
        let name = self.interner.intern(text);
        self.classify_name(name)
    }

    /// Classify an already interned name.
    pub fn classify_name(&self, name: Name) -> TokenKind {
        self.keywords
            .get(&name)
            .copied()
            .unwrap_or(TokenKind::Ident(name))
    }

    /// The keyword kind of a name, if it is one.
    pub fn keyword_kind(&self, name: Name) -> Option<TokenKind> {
        self.keywords.get(&name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_classify_to_their_kinds() {
        let table = IdentifierTable::new(SharedInterner::new());
        assert_eq!(table.classify("def"), TokenKind::KwDef);
        assert_eq!(table.classify("unsafe"), TokenKind::KwUnsafe);
        assert_eq!(table.classify("delete"), TokenKind::KwDelete);
    }

    #[test]
    fn non_keywords_classify_as_identifiers() {
        let table = IdentifierTable::new(SharedInterner::new());
        let name = table.interner().intern("main");
        assert_eq!(table.classify("main"), TokenKind::Ident(name));
        assert_eq!(table.keyword_kind(name), None);
    }

    #[test]
    fn every_keyword_is_registered() {
        let table = IdentifierTable::new(SharedInterner::new());
        for &(text, kind) in KEYWORDS {
            assert_eq!(table.classify(text), kind, "{text}");
        }
        assert_eq!(KEYWORDS.len(), 37);
    }
}
