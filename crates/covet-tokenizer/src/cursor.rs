use std::str::Chars;

use text_size::{TextLen as _, TextSize};

pub(crate) const EOF_CHAR: char = '\0';

pub(crate) struct Cursor<'a> {
    chars: Chars<'a>,
    len: TextSize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { chars: text.chars(), len: text.text_len() }
    }

    /// Remaining input, starting at the next unconsumed character.
    pub(crate) fn rest(&self) -> &'a str {
        self.chars.as_str()
    }

    pub(crate) fn len(&self) -> TextSize {
        self.rest().text_len()
    }

    pub(crate) fn pos_within_token(&self) -> TextSize {
        self.len - self.len()
    }

    pub(crate) fn reset_pos_within_token(&mut self) {
        self.len = self.len();
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.rest().is_empty()
    }

    pub(crate) fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    pub(crate) fn advance(&mut self) -> char {
        self.chars.next().unwrap_or(EOF_CHAR)
    }

    /// Skips `n` bytes. `n` must fall on a character boundary.
    pub(crate) fn advance_bytes(&mut self, n: usize) {
        let rest = self.rest();
        self.chars = rest[n.min(rest.len())..].chars();
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool + Copy) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }

    /// Consumes a single line break (`\n` or `\r\n`) if one is next.
    pub(crate) fn eat_newline(&mut self) {
        if self.starts_with("\r\n") {
            self.advance_bytes(2);
        } else if self.peek() == '\n' {
            self.advance();
        }
    }
}
