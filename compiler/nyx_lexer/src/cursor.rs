//! Byte cursor over a source buffer.
//!
//! The cursor advances byte-by-byte; reads past the end return `0`, which no
//! scanning predicate accepts, so loops terminate without explicit bounds
//! checks at every step. It is `Copy`, enabling cheap state snapshots for
//! backtracking.

/// Byte cursor over the source text.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        assert!(
            u32::try_from(input.len()).is_ok(),
            "source files are limited to u32::MAX bytes"
        );
        Cursor { input, pos: 0 }
    }

    /// The byte at the current position, or `0` at end of input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.input.as_bytes().get(self.pos as usize).copied().unwrap_or(0)
    }

    /// The byte one ahead of current, or `0` past the end.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.byte_at(self.pos as usize + 1)
    }

    /// The byte two ahead of current, or `0` past the end.
    #[inline]
    pub fn peek2(&self) -> u8 {
        self.byte_at(self.pos as usize + 2)
    }

    #[inline]
    fn byte_at(&self, index: usize) -> u8 {
        self.input.as_bytes().get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn advance(&mut self) {
        if (self.pos as usize) < self.input.len() {
            self.pos += 1;
        }
    }

    #[inline]
    pub fn advance_n(&mut self, n: u32) {
        self.pos = (self.pos + n).min(self.input.len() as u32);
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos as usize >= self.input.len()
    }

    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Reposition the cursor; used by memento restore.
    #[inline]
    pub fn set_pos(&mut self, pos: u32) {
        debug_assert!(pos as usize <= self.input.len());
        self.pos = pos;
    }

    /// Source text between two byte offsets.
    ///
    /// Both offsets must lie on character boundaries, which holds for all
    /// token boundaries the lexer produces.
    #[inline]
    pub fn slice(&self, start: u32, end: u32) -> &'a str {
        &self.input[start as usize..end as usize]
    }

    /// Source text from `start` to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'a str {
        self.slice(start, self.pos)
    }

    /// Advance while `pred` accepts the current byte.
    ///
    /// `pred(0)` must be `false`, which is the case for every byte class
    /// predicate used by the lexer.
    #[inline]
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while pred(self.current()) {
            self.advance();
        }
    }

    /// Number of bytes in the UTF-8 character with the given leading byte.
    #[inline]
    pub fn utf8_char_width(byte: u8) -> u32 {
        match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        }
    }

    /// Advance past one full UTF-8 character.
    #[inline]
    pub fn advance_char(&mut self) {
        let width = Self::utf8_char_width(self.current());
        self.advance_n(width);
    }

    /// Advance to the next `\n` or end of input.
    ///
    /// Used by the line-comment scanner.
    pub fn eat_until_newline_or_eof(&mut self) {
        let remaining = &self.input.as_bytes()[self.pos as usize..];
        match memchr::memchr(b'\n', remaining) {
            Some(offset) => self.pos += offset as u32,
            None => self.pos = self.input.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_and_advance() {
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.current(), b'a');
        cursor.advance();
        assert_eq!(cursor.current(), b'b');
        assert_eq!(cursor.pos(), 1);
        cursor.advance_n(5);
        assert!(cursor.is_eof());
        assert_eq!(cursor.current(), 0);
    }

    #[test]
    fn peek_past_end_returns_zero() {
        let mut cursor = Cursor::new("xy");
        assert_eq!(cursor.peek(), b'y');
        assert_eq!(cursor.peek2(), 0);
        cursor.advance();
        assert_eq!(cursor.peek(), 0);
    }

    #[test]
    fn eat_while_stops_at_mismatch() {
        let mut cursor = Cursor::new("aaab");
        cursor.eat_while(|b| b == b'a');
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.current(), b'b');
    }

    #[test]
    fn eat_while_terminates_at_eof() {
        let mut cursor = Cursor::new("aaa");
        cursor.eat_while(|b| b == b'a');
        assert!(cursor.is_eof());
    }

    #[test]
    fn newline_scan_finds_lf() {
        let mut cursor = Cursor::new("// hi\nnext");
        cursor.eat_until_newline_or_eof();
        assert_eq!(cursor.current(), b'\n');
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn newline_scan_stops_at_eof() {
        let mut cursor = Cursor::new("no newline");
        cursor.eat_until_newline_or_eof();
        assert!(cursor.is_eof());
    }

    #[test]
    fn slice_respects_utf8() {
        let cursor = Cursor::new("hi\u{1F600}!");
        assert_eq!(cursor.slice(0, 2), "hi");
        assert_eq!(cursor.slice(2, 6), "\u{1F600}");
    }

    #[test]
    fn cursor_is_copy_for_checkpointing() {
        let mut cursor = Cursor::new("abcdef");
        cursor.advance_n(2);
        let saved = cursor;
        cursor.advance_n(3);
        assert_eq!(saved.pos(), 2);
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn char_widths() {
        assert_eq!(Cursor::utf8_char_width(b'a'), 1);
        assert_eq!(Cursor::utf8_char_width(0xC3), 2);
        assert_eq!(Cursor::utf8_char_width(0xE4), 3);
        assert_eq!(Cursor::utf8_char_width(0xF0), 4);
    }
}
