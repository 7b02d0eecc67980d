//! Error recovery support.
//!
//! [`TokenSet`] is a bitset over token tags for O(1) membership tests; the
//! parser's `skip_until` uses these sets to find the next recoverable
//! anchor while keeping bracket nesting balanced.

use nyx_ir::TokenKind;

/// A set of token kinds, one bit per [`TokenKind`] tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSet(u128);

impl TokenSet {
    #[inline]
    pub const fn new() -> Self {
        TokenSet(0)
    }

    #[inline]
    #[must_use]
    pub const fn with(self, kind: TokenKind) -> Self {
        TokenSet(self.0 | (1u128 << kind.tag_index()))
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        TokenSet(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(&self, kind: &TokenKind) -> bool {
        (self.0 & (1u128 << kind.tag_index())) != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Anchors for top-level recovery: the next declaration opener or EOF.
pub const TOP_LEVEL_BOUNDARY: TokenSet = TokenSet::new()
    .with(TokenKind::KwDef)
    .with(TokenKind::KwAlias)
    .with(TokenKind::KwClass)
    .with(TokenKind::KwEnum)
    .with(TokenKind::KwImport)
    .with(TokenKind::KwModule)
    .with(TokenKind::KwUnsafe)
    .with(TokenKind::Dollar)
    .with(TokenKind::Eof);

/// Anchors for statement recovery.
pub const STMT_BOUNDARY: TokenSet = TokenSet::new()
    .with(TokenKind::Semi)
    .with(TokenKind::RBrace)
    .with(TokenKind::Eof);

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_ir::Name;

    #[test]
    fn empty_set_contains_nothing() {
        let set = TokenSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(&TokenKind::Semi));
    }

    #[test]
    fn membership_ignores_payloads() {
        let set = TokenSet::new().with(TokenKind::Ident(Name::EMPTY));
        assert!(set.contains(&TokenKind::Ident(Name::EMPTY)));
        // A different payload, same tag.
        let other = TokenKind::Ident(Name::EMPTY);
        assert!(set.contains(&other));
        assert!(!set.contains(&TokenKind::NumericLit(Name::EMPTY)));
    }

    #[test]
    fn union_combines() {
        let a = TokenSet::new().with(TokenKind::Semi);
        let b = TokenSet::new().with(TokenKind::Comma);
        let both = a.union(b);
        assert!(both.contains(&TokenKind::Semi));
        assert!(both.contains(&TokenKind::Comma));
    }

    #[test]
    fn boundaries_contain_expected_anchors() {
        assert!(TOP_LEVEL_BOUNDARY.contains(&TokenKind::KwDef));
        assert!(TOP_LEVEL_BOUNDARY.contains(&TokenKind::Eof));
        assert!(!TOP_LEVEL_BOUNDARY.contains(&TokenKind::Plus));
        assert!(STMT_BOUNDARY.contains(&TokenKind::Semi));
        assert!(STMT_BOUNDARY.contains(&TokenKind::RBrace));
    }
}
