use text_size::{TextLen as _, TextRange, TextSize};

use crate::{Token, TokenKind, tokenize};

/// Replayable cursor over the tokens of one source text.
///
/// Running past the end is not an error: `current` returns `None` and every
/// range-returning operation yields an empty range at the end of input.
pub struct TokenStream<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str, php: bool) -> Self {
        Self { text, tokens: tokenize(text, php), pos: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    pub fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos + 1).copied()
    }

    pub fn token_text(&self, token: Token) -> &'a str {
        &self.text[token.range]
    }

    pub fn advance(&mut self) -> Option<Token> {
        self.pos = (self.pos + 1).min(self.tokens.len());
        self.current()
    }

    /// The closest token before the cursor that is not whitespace or a comment.
    pub fn prev_significant(&self) -> Option<Token> {
        self.tokens[..self.pos].iter().rev().find(|token| !token.kind.is_trivia()).copied()
    }

    /// Advances at least once, stopping on the first token whose kind is in `stops`.
    ///
    /// The returned range starts after the token the cursor was on and runs
    /// through the stop token.
    pub fn next_until(&mut self, stops: &[TokenKind]) -> TextRange {
        let start = self.current_end();

        while let Some(token) = self.advance() {
            if stops.contains(&token.kind) {
                return TextRange::new(start, token.range.end());
            }
        }

        TextRange::new(start, self.text.text_len())
    }

    /// Consumes tokens, starting with the current one, until the consumed text
    /// ends with `terminator`. The cursor rests on the last consumed token.
    /// Leaves the cursor untouched when the input ends first.
    pub fn next_sequence(&mut self, terminator: &str) -> Option<TextRange> {
        let start = self.current_start();

        for (pos, token) in self.tokens.iter().enumerate().skip(self.pos) {
            let range = TextRange::new(start, token.range.end());
            if self.text[range].ends_with(terminator) {
                self.pos = pos;
                return Some(range);
            }
        }

        None
    }

    /// Steps past the current token and any whitespace after it.
    pub fn skip_whitespace(&mut self) -> TextRange {
        let start = self.current_end();
        self.advance();
        while self.current().is_some_and(|token| token.kind == TokenKind::WHITESPACE) {
            self.advance();
        }
        TextRange::new(start, self.current_start())
    }

    /// Consumes tokens while their kind is in `kinds`, starting with the current one.
    pub fn skip_while(&mut self, kinds: &[TokenKind]) -> TextRange {
        let start = self.current_start();
        while self.current().is_some_and(|token| kinds.contains(&token.kind)) {
            self.advance();
        }
        TextRange::new(start, self.current_start())
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    fn current_start(&self) -> TextSize {
        self.current().map_or_else(|| self.text.text_len(), |token| token.range.start())
    }

    fn current_end(&self) -> TextSize {
        self.current().map_or_else(|| self.text.text_len(), |token| token.range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &str) -> TokenStream<'_> {
        TokenStream::new(text, true)
    }

    #[test]
    fn next_until_includes_the_stop_token() {
        let mut stream = stream("function foo($a) {}");
        let range = stream.next_until(&[TokenKind::LEFT_PAREN]);

        assert_eq!(&stream.text()[range], " foo(");
        assert_eq!(stream.current().map(|token| token.kind), Some(TokenKind::LEFT_PAREN));
    }

    #[test]
    fn next_until_runs_to_the_end_without_a_stop() {
        let mut stream = stream("namespace Foo");
        let range = stream.next_until(&[TokenKind::SEMICOLON]);

        assert_eq!(&stream.text()[range], " Foo");
        assert_eq!(stream.current(), None);
        assert_eq!(stream.next_until(&[TokenKind::SEMICOLON]), TextRange::empty(13.into()));
    }

    #[test]
    fn next_sequence_stops_after_the_terminator() {
        let mut stream = stream("<<<EOT\nbody\nEOT;\n$x;");
        let range = stream.next_sequence("EOT").map(|range| &stream.text()[range]);

        assert_eq!(range, Some("<<<EOT\nbody\nEOT"));
        assert_eq!(stream.current().map(|token| token.kind), Some(TokenKind::END_HEREDOC));
    }

    #[test]
    fn next_sequence_restores_on_failure() {
        let mut stream = stream("$a . $b");
        stream.advance();

        assert_eq!(stream.next_sequence("nope"), None);
        assert_eq!(stream.current().map(|token| token.kind), Some(TokenKind::WHITESPACE));
    }

    #[test]
    fn skip_whitespace_and_skip_while() {
        let mut stream = stream("extends  \\Foo\\Bar {");
        let space = stream.skip_whitespace();
        assert_eq!(&stream.text()[space], "  ");

        let name = stream.skip_while(&[TokenKind::NAME, TokenKind::NS_SEPARATOR]);
        assert_eq!(&stream.text()[name], "\\Foo\\Bar");
        assert_eq!(stream.current().map(|token| token.kind), Some(TokenKind::WHITESPACE));
    }

    #[test]
    fn prev_significant_skips_trivia() {
        let mut stream = stream("Foo:: /* x */ class");
        while stream.current().is_some_and(|token| token.kind != TokenKind::CLASS_KW) {
            stream.advance();
        }

        assert_eq!(stream.prev_significant().map(|token| token.kind), Some(TokenKind::DOUBLE_COLON));

        stream.rewind();
        assert_eq!(stream.current().map(|token| token.kind), Some(TokenKind::NAME));
        assert_eq!(stream.prev_significant(), None);
    }
}
