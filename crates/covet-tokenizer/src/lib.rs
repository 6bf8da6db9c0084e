mod cursor;
mod stream;
mod token_kind;

use cursor::Cursor;
pub use stream::TokenStream;
pub use token_kind::TokenKind;
use text_size::{TextLen as _, TextRange, TextSize};
use token_kind::TokenKind::*;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Html,
    Php,
    /// Inside an interpolated string; `body` bytes remain before the closing quote.
    Quoted { body: usize },
    /// Inside a heredoc; `body` bytes remain before the `label` bytes of the closing line.
    Heredoc { body: usize, label: usize },
}

pub struct Tokenizer<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    mode: Mode,
    /// Previous significant token was `->`, `?->` or `\`, so a keyword-shaped
    /// word is a member or namespace segment name.
    name_only: bool,
}

impl<'a> Tokenizer<'a> {
    /// Starts in inline HTML, like a `.php` file on disk.
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: Cursor::new(text), mode: Mode::Html, name_only: false }
    }

    /// Starts directly in PHP code, for sources without an open tag.
    pub fn in_php(text: &'a str) -> Self {
        Self { mode: Mode::Php, ..Self::new(text) }
    }

    fn offset(&self) -> TextSize {
        self.text.text_len() - self.cursor.len()
    }

    fn range(&self) -> TextRange {
        let len = self.cursor.pos_within_token();
        TextRange::at(self.offset() - len, len)
    }

    fn text(&self) -> &'a str {
        &self.text[self.range()]
    }

    pub fn next_token(&mut self) -> Token {
        if self.cursor.is_eof() {
            return Token { kind: EOF, range: TextRange::empty(self.offset()) };
        }

        let kind = match self.mode {
            Mode::Html => self.inline_html(),
            Mode::Php => self.php(),
            Mode::Quoted { body } => self.quoted(body),
            Mode::Heredoc { body, label } => self.heredoc_body(body, label),
        };

        let range = self.range();
        self.cursor.reset_pos_within_token();

        Token { kind, range }
    }

    fn inline_html(&mut self) -> TokenKind {
        if let Some((kind, len)) = open_tag(self.cursor.rest()) {
            self.cursor.advance_bytes(len);
            self.mode = Mode::Php;
            return kind;
        }

        loop {
            let rest = self.cursor.rest();
            match rest.find("<?") {
                None => {
                    self.cursor.advance_bytes(rest.len());
                    break;
                }
                Some(0) => self.cursor.advance_bytes(2),
                Some(at) => {
                    self.cursor.advance_bytes(at);
                    if open_tag(self.cursor.rest()).is_some() {
                        break;
                    }
                }
            }
        }

        INLINE_HTML
    }

    fn php(&mut self) -> TokenKind {
        let kind = self.php_token();
        if !kind.is_trivia() {
            self.name_only = matches!(kind, OBJECT_OPERATOR | NS_SEPARATOR);
        }
        kind
    }

    fn php_token(&mut self) -> TokenKind {
        if self.cursor.starts_with("?>") {
            self.cursor.advance_bytes(2);
            self.cursor.eat_newline();
            self.mode = Mode::Html;
            return CLOSE_TAG;
        }

        match self.cursor.advance() {
            c if c.is_ascii_whitespace() => {
                self.cursor.advance_while(|c| c.is_ascii_whitespace());
                WHITESPACE
            }
            '#' if self.cursor.peek() == '[' => {
                self.cursor.advance();
                OPERATOR
            }
            '#' => self.line_comment(),
            '/' if self.cursor.peek() == '/' => self.line_comment(),
            '/' if self.cursor.peek() == '*' => self.block_comment(),
            '\'' => {
                self.delimited('\'');
                CONSTANT_ENCAPSED_STRING
            }
            '`' => {
                self.delimited('`');
                BACKQUOTED
            }
            '"' => self.double_quoted(),
            '<' if self.cursor.starts_with("<<") => {
                self.heredoc_start().unwrap_or_else(|| self.operator('<'))
            }
            '$' if is_ident_start(self.cursor.peek()) => {
                self.cursor.advance_while(is_ident_continue);
                VARIABLE
            }
            c if is_ident_start(c) => {
                self.cursor.advance_while(is_ident_continue);
                if self.name_only {
                    NAME
                } else {
                    TokenKind::keyword(self.text()).unwrap_or(NAME)
                }
            }
            '0'..='9' => {
                self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                NUMBER
            }
            '\\' => NS_SEPARATOR,
            '{' => LEFT_BRACE,
            '}' => RIGHT_BRACE,
            '(' => LEFT_PAREN,
            ')' => RIGHT_PAREN,
            '[' => LEFT_BRACKET,
            ']' => RIGHT_BRACKET,
            ';' => SEMICOLON,
            ',' => COMMA,
            c if is_operator(c) => self.operator(c),
            _ => UNKNOWN,
        }
    }

    /// Runs to the end of the line, keeping the newline, or stops before `?>`.
    fn line_comment(&mut self) -> TokenKind {
        while !self.cursor.is_eof() && !self.cursor.starts_with("?>") {
            if self.cursor.advance() == '\n' {
                break;
            }
        }
        COMMENT
    }

    fn block_comment(&mut self) -> TokenKind {
        let rest = self.cursor.rest();
        let doc = rest.starts_with("**") && rest[2..].starts_with(|c: char| c.is_ascii_whitespace());

        self.cursor.advance();
        let rest = self.cursor.rest();
        match rest.find("*/") {
            Some(at) => self.cursor.advance_bytes(at + 2),
            None => self.cursor.advance_bytes(rest.len()),
        }

        if doc { DOC_COMMENT } else { COMMENT }
    }

    /// Consumes up to and including the closing `quote`, honouring backslash escapes.
    fn delimited(&mut self, quote: char) {
        while !self.cursor.is_eof() {
            match self.cursor.advance() {
                '\\' => {
                    self.cursor.advance();
                }
                c if c == quote => return,
                _ => {}
            }
        }
    }

    fn double_quoted(&mut self) -> TokenKind {
        let scan = scan_double_quoted(self.cursor.rest());

        if !scan.interpolated {
            self.cursor.advance_bytes(scan.body + usize::from(scan.terminated));
            return CONSTANT_ENCAPSED_STRING;
        }

        self.mode = Mode::Quoted { body: scan.body };
        DOUBLE_QUOTE
    }

    fn quoted(&mut self, body: usize) -> TokenKind {
        if body > 0 {
            self.cursor.advance_bytes(body);
            self.mode = Mode::Quoted { body: 0 };
            return ENCAPSED_AND_WHITESPACE;
        }

        self.mode = Mode::Php;
        self.cursor.advance();
        DOUBLE_QUOTE
    }

    /// Recognizes `<<<ID`, `<<<"ID"` and `<<<'ID'` followed by a line break.
    /// The first `<` is already consumed.
    fn heredoc_start(&mut self) -> Option<TokenKind> {
        let rest = self.cursor.rest().strip_prefix("<<")?;
        let after = rest.trim_start_matches([' ', '\t']);

        let (quote, after) = match after.as_bytes().first() {
            Some(b'"') => (Some('"'), &after[1..]),
            Some(b'\'') => (Some('\''), &after[1..]),
            _ => (None, after),
        };

        let label_len = ident_len(after);
        if label_len == 0 {
            return None;
        }
        let label = &after[..label_len];

        let mut after = &after[label_len..];
        if let Some(quote) = quote {
            after = after.strip_prefix(quote)?;
        }

        let newline = if after.starts_with("\r\n") {
            2
        } else if after.starts_with('\n') {
            1
        } else {
            return None;
        };

        let header = self.cursor.rest().len() - after.len() + newline;
        self.cursor.advance_bytes(header);

        let (body, label) = heredoc_end(self.cursor.rest(), label);
        self.mode = Mode::Heredoc { body, label };
        Some(START_HEREDOC)
    }

    fn heredoc_body(&mut self, body: usize, label: usize) -> TokenKind {
        if body > 0 {
            self.cursor.advance_bytes(body);
            self.mode = Mode::Heredoc { body: 0, label };
            return ENCAPSED_AND_WHITESPACE;
        }

        self.cursor.advance_bytes(label);
        self.mode = Mode::Php;
        END_HEREDOC
    }

    /// Longest-match operator lexing. `first` is already consumed.
    fn operator(&mut self, first: char) -> TokenKind {
        const OPERATORS: [&str; 34] = [
            "<<=", ">>=", "**=", "...", "<=>", "===", "!==", "??=", "?->", "++", "--", "->", "=>",
            "::", "==", "!=", "<>", "<=", ">=", "&&", "||", "??", "+=", "-=", "*=", "/=", ".=",
            "%=", "&=", "|=", "^=", "<<", ">>", "**",
        ];

        let rest = self.cursor.rest();
        let matched = OPERATORS.iter().find(|operator| {
            operator.starts_with(first) && rest.starts_with(&operator[first.len_utf8()..])
        });

        match matched {
            Some(&operator) => {
                self.cursor.advance_bytes(operator.len() - first.len_utf8());
                match operator {
                    "::" => DOUBLE_COLON,
                    "->" | "?->" => OBJECT_OPERATOR,
                    _ => OPERATOR,
                }
            }
            None if first == '=' => EQ,
            None => OPERATOR,
        }
    }
}

/// Tokenizes the whole input, without the trailing `EOF` token.
pub fn tokenize(text: &str, php: bool) -> Vec<Token> {
    let mut tokenizer = if php { Tokenizer::in_php(text) } else { Tokenizer::new(text) };
    let mut tokens = Vec::new();

    loop {
        let token = tokenizer.next_token();
        if token.kind == EOF {
            break;
        }
        tokens.push(token);
    }

    tokens
}

/// `<?php` and the short `<?` take one trailing whitespace character (or `\r\n`) with them.
fn open_tag(rest: &str) -> Option<(TokenKind, usize)> {
    let after = rest.strip_prefix("<?")?;

    if after.starts_with('=') {
        return Some((OPEN_TAG_WITH_ECHO, 3));
    }

    if after.get(..3).is_some_and(|php| php.eq_ignore_ascii_case("php")) {
        let tail = &after[3..];
        let space = single_whitespace_len(tail);
        return (tail.is_empty() || space > 0).then_some((OPEN_TAG, 5 + space));
    }

    let space = single_whitespace_len(after);
    (space > 0).then_some((OPEN_TAG, 2 + space))
}

fn single_whitespace_len(text: &str) -> usize {
    if text.starts_with("\r\n") {
        2
    } else if text.starts_with([' ', '\t', '\n', '\r']) {
        1
    } else {
        0
    }
}

/// Returns the body length and the closing line length (indentation plus label).
/// An unterminated heredoc runs to the end of input.
fn heredoc_end(text: &str, label: &str) -> (usize, usize) {
    let mut line_start = 0;

    loop {
        let line = &text[line_start..];
        let candidate = line.trim_start_matches([' ', '\t']);
        let indent = line.len() - candidate.len();

        if candidate.starts_with(label) && !candidate[label.len()..].starts_with(is_ident_continue)
        {
            return (line_start, indent + label.len());
        }

        match line.find('\n') {
            Some(at) => line_start += at + 1,
            None => return (text.len(), 0),
        }
    }
}

struct QuotedScan {
    body: usize,
    terminated: bool,
    interpolated: bool,
}

/// Scans a double quoted string body, starting after the opening quote.
/// Quotes nested inside `{$...}` do not terminate the string.
fn scan_double_quoted(text: &str) -> QuotedScan {
    let bytes = text.as_bytes();
    let mut interpolated = false;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' if depth == 0 => return QuotedScan { body: i, terminated: true, interpolated },
            b'$' if depth == 0 => match bytes.get(i + 1) {
                Some(b'{') => {
                    interpolated = true;
                    depth = 1;
                    i += 2;
                    continue;
                }
                Some(&next) if is_ident_start_byte(next) => interpolated = true,
                _ => {}
            },
            b'{' if depth == 0 && bytes.get(i + 1) == Some(&b'$') => {
                interpolated = true;
                depth = 1;
            }
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            quote @ (b'\'' | b'"') if depth > 0 => {
                i = skip_quoted(bytes, i + 1, quote);
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    QuotedScan { body: bytes.len(), terminated: false, interpolated }
}

fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn ident_len(text: &str) -> usize {
    match text.chars().next() {
        Some(first) if is_ident_start(first) => {
            text.find(|c: char| !is_ident_continue(c)).unwrap_or(text.len())
        }
        _ => 0,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_start_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || !b.is_ascii()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn is_operator(c: char) -> bool {
    matches!(
        c,
        '=' | '+' | '-' | '*' | '/' | '%' | '.' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?'
            | ':' | '@' | '$'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<(TokenKind, &str)> {
        tokenize(text, false).into_iter().map(|token| (token.kind, &text[token.range])).collect()
    }

    fn lex_php(text: &str) -> Vec<(TokenKind, &str)> {
        tokenize(text, true)
            .into_iter()
            .filter(|token| token.kind != WHITESPACE)
            .map(|token| (token.kind, &text[token.range]))
            .collect()
    }

    #[test]
    fn tokens_tile_the_input() {
        let inputs = [
            "",
            "plain html only",
            "<html><?php echo 1; ?>\n<p><?= $x ?></p>",
            "<?php\n// comment ?> back to html",
            "<?php $a = \"x {$b[\"k\"]} y\"; $c = <<<EOT\n  body $d\n  EOT;\n",
            "<?php $s = 'unterminated",
            "<?php $s = \"unterminated $x",
            "<?php /* unterminated",
            "<?php $x = <<<'NOW'\nraw\nNOW\n;",
            "<?php\r\nfunction f() {\r\n    return `ls`;\r\n}\r\n",
            "<?xml version=\"1.0\"?><?php echo 'é'; ?>",
        ];

        for input in inputs {
            let tokens = tokenize(input, false);
            let joined = tokens.iter().map(|token| &input[token.range]).collect::<String>();
            assert_eq!(joined, input, "Input: '{input}'");
            assert!(tokens.iter().all(|token| !token.range.is_empty()), "Input: '{input}'");
        }
    }

    #[test]
    fn test_open_and_close_tags() {
        assert_eq!(
            lex("<p><?php echo 1 ?>\n</p>"),
            vec![
                (INLINE_HTML, "<p>"),
                (OPEN_TAG, "<?php "),
                (NAME, "echo"),
                (WHITESPACE, " "),
                (NUMBER, "1"),
                (WHITESPACE, " "),
                (CLOSE_TAG, "?>\n"),
                (INLINE_HTML, "</p>"),
            ]
        );

        assert_eq!(
            lex("<?= $x ?>"),
            vec![
                (OPEN_TAG_WITH_ECHO, "<?="),
                (WHITESPACE, " "),
                (VARIABLE, "$x"),
                (WHITESPACE, " "),
                (CLOSE_TAG, "?>"),
            ]
        );
    }

    #[test]
    fn test_xml_declaration_is_inline_html() {
        assert_eq!(lex("<?xml version=\"1.0\"?>"), vec![(INLINE_HTML, "<?xml version=\"1.0\"?>")]);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            lex_php("Namespace App; ABSTRACT Class Foo extends Bar"),
            vec![
                (NAMESPACE_KW, "Namespace"),
                (NAME, "App"),
                (SEMICOLON, ";"),
                (ABSTRACT_KW, "ABSTRACT"),
                (CLASS_KW, "Class"),
                (NAME, "Foo"),
                (EXTENDS_KW, "extends"),
                (NAME, "Bar"),
            ]
        );
    }

    #[test]
    fn test_member_names_after_arrow() {
        assert_eq!(
            lex_php("$node->class; $node?->function(); Foo::class;"),
            vec![
                (VARIABLE, "$node"),
                (OBJECT_OPERATOR, "->"),
                (NAME, "class"),
                (SEMICOLON, ";"),
                (VARIABLE, "$node"),
                (OBJECT_OPERATOR, "?->"),
                (NAME, "function"),
                (LEFT_PAREN, "("),
                (RIGHT_PAREN, ")"),
                (SEMICOLON, ";"),
                (NAME, "Foo"),
                (DOUBLE_COLON, "::"),
                (CLASS_KW, "class"),
                (SEMICOLON, ";"),
            ]
        );
    }

    #[test]
    fn test_reserved_words_in_namespaced_names() {
        assert_eq!(
            lex_php(r"use Foo\Interface; new \Lib\Class(); namespace\function();"),
            vec![
                (USE_KW, "use"),
                (NAME, "Foo"),
                (NS_SEPARATOR, r"\"),
                (NAME, "Interface"),
                (SEMICOLON, ";"),
                (NAME, "new"),
                (NS_SEPARATOR, r"\"),
                (NAME, "Lib"),
                (NS_SEPARATOR, r"\"),
                (NAME, "Class"),
                (LEFT_PAREN, "("),
                (RIGHT_PAREN, ")"),
                (SEMICOLON, ";"),
                (NAMESPACE_KW, "namespace"),
                (NS_SEPARATOR, r"\"),
                (NAME, "function"),
                (LEFT_PAREN, "("),
                (RIGHT_PAREN, ")"),
                (SEMICOLON, ";"),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex_php("// line\n# hash\n#[Attr]\n/* block */ /** doc */"),
            vec![
                (COMMENT, "// line\n"),
                (COMMENT, "# hash\n"),
                (OPERATOR, "#["),
                (NAME, "Attr"),
                (RIGHT_BRACKET, "]"),
                (COMMENT, "/* block */"),
                (DOC_COMMENT, "/** doc */"),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex_php(r#"'a\'b' "plain" "x $y" "{$a["k"]}""#),
            vec![
                (CONSTANT_ENCAPSED_STRING, r"'a\'b'"),
                (CONSTANT_ENCAPSED_STRING, r#""plain""#),
                (DOUBLE_QUOTE, "\""),
                (ENCAPSED_AND_WHITESPACE, "x $y"),
                (DOUBLE_QUOTE, "\""),
                (DOUBLE_QUOTE, "\""),
                (ENCAPSED_AND_WHITESPACE, r#"{$a["k"]}"#),
                (DOUBLE_QUOTE, "\""),
            ]
        );
    }

    #[test]
    fn test_heredoc() {
        assert_eq!(
            lex_php("<<<EOT\nHello $name\n  EOT;"),
            vec![
                (START_HEREDOC, "<<<EOT\n"),
                (ENCAPSED_AND_WHITESPACE, "Hello $name\n"),
                (END_HEREDOC, "  EOT"),
                (SEMICOLON, ";"),
            ]
        );

        assert_eq!(
            lex_php("<<<'EOT'\nEOT;"),
            vec![(START_HEREDOC, "<<<'EOT'\n"), (END_HEREDOC, "EOT"), (SEMICOLON, ";")]
        );
    }

    #[test]
    fn test_shift_is_not_heredoc() {
        assert_eq!(
            lex_php("$a <<= 1 << 2"),
            vec![
                (VARIABLE, "$a"),
                (OPERATOR, "<<="),
                (NUMBER, "1"),
                (OPERATOR, "<<"),
                (NUMBER, "2"),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex_php("$a = $b == $c => $d .= ... ::"),
            vec![
                (VARIABLE, "$a"),
                (EQ, "="),
                (VARIABLE, "$b"),
                (OPERATOR, "=="),
                (VARIABLE, "$c"),
                (OPERATOR, "=>"),
                (VARIABLE, "$d"),
                (OPERATOR, ".="),
                (OPERATOR, "..."),
                (DOUBLE_COLON, "::"),
            ]
        );
    }

    #[test]
    fn test_namespace_separators() {
        assert_eq!(
            lex_php(r"use \Foo\Bar as Baz;"),
            vec![
                (USE_KW, "use"),
                (NS_SEPARATOR, r"\"),
                (NAME, "Foo"),
                (NS_SEPARATOR, r"\"),
                (NAME, "Bar"),
                (AS_KW, "as"),
                (NAME, "Baz"),
                (SEMICOLON, ";"),
            ]
        );
    }
}
