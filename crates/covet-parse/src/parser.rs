use std::collections::BTreeSet;
use std::mem;

use covet_tokenizer::{Token, TokenKind, TokenStream};
use covet_tree::{Builder, ClassLike, Function, Modifier, Namespace, NodeId, NodeKind, Tree};
use indexmap::IndexMap;
use text_size::{TextLen as _, TextRange, TextSize};
use tracing::{debug, trace};

use crate::Config;
use crate::args;
use crate::indexer::LineIndexer;

pub(crate) struct Parser<'a> {
    text: &'a str,
    stream: TokenStream<'a>,
    builder: Builder,
    /// Open scopes, innermost last. The file root is always at the bottom.
    scopes: Vec<NodeId>,
    in_php: bool,
    /// Start of the text not yet assigned to a node.
    start: TextSize,
    pending_modifiers: BTreeSet<Modifier>,
    pending_uses: IndexMap<String, String>,
    /// Namespace the pending uses belong to.
    namespace: NodeId,
    indexer: Option<LineIndexer>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str, config: Config) -> Self {
        Self {
            text,
            stream: TokenStream::new(text, config.php),
            builder: Builder::new(text),
            scopes: vec![Builder::ROOT],
            in_php: config.php,
            start: TextSize::new(0),
            pending_modifiers: BTreeSet::new(),
            pending_uses: IndexMap::new(),
            namespace: Builder::ROOT,
            indexer: config.lines.then(|| LineIndexer::new(text)),
        }
    }

    pub(crate) fn parse(mut self) -> Tree {
        while let Some(token) = self.stream.current() {
            self.step(token);
            self.stream.advance();
        }

        let end = self.text.text_len();
        self.flush(end);
        self.flush_uses();

        if self.scopes.len() > 1 {
            debug!(unclosed = self.scopes.len() - 1, "unwinding scopes at end of input");
            self.scopes.truncate(1);
        }

        let lines = self.indexer.take().map(|indexer| indexer.finish(&self.builder));
        debug!(
            nodes = self.builder.len(),
            coverable = lines.as_ref().map_or(0, |lines| lines.coverable().count()),
            "parsed"
        );

        self.builder.finish(lines)
    }

    fn step(&mut self, token: Token) {
        use TokenKind::*;

        match token.kind {
            OPEN_TAG | OPEN_TAG_WITH_ECHO => {
                self.flush(token.range.start());
                self.emit(NodeKind::Open, token.range.end());
                self.in_php = true;
            }
            CLOSE_TAG => {
                self.flush(token.range.start());
                self.in_php = false;
                self.emit(NodeKind::Close, token.range.end());
            }
            COMMENT | DOC_COMMENT => {
                self.flush(token.range.start());
                self.emit(NodeKind::Comment, token.range.end());
            }
            CONSTANT_ENCAPSED_STRING | DOUBLE_QUOTE | START_HEREDOC => self.string(token),
            LEFT_BRACE => {
                let kind = self.code_kind();
                let id = self.emit(kind, token.range.end());
                self.open_scope(id);
            }
            RIGHT_BRACE if self.scopes.len() > 1 => self.close_scope(token),
            SEMICOLON => {
                let coverable = self.in_function_body();
                let kind = self.code_kind();
                let id = self.emit(kind, token.range.end());
                self.builder.node_mut(id).coverable = coverable;
                self.pending_modifiers.clear();
            }
            NAMESPACE_KW if self.stream.peek().is_none_or(|next| next.kind != NS_SEPARATOR) => {
                self.namespace(token);
            }
            USE_KW => self.use_statement(),
            TRAIT_KW | INTERFACE_KW | CLASS_KW if !self.follows_scope_resolution() => {
                self.class_like(token);
            }
            FUNCTION_KW if !self.follows_scope_resolution() => self.function(token),
            VARIABLE => self.pending_modifiers.clear(),
            kind => {
                if let Some(modifier) = modifier(kind) {
                    self.pending_modifiers.insert(modifier);
                }
            }
        }
    }

    fn scope(&self) -> NodeId {
        self.scopes.last().copied().unwrap_or(Builder::ROOT)
    }

    fn code_kind(&self) -> NodeKind {
        if !self.in_php {
            NodeKind::Plain
        } else if self.builder.node(self.scope()).has_methods {
            NodeKind::Attribute
        } else {
            NodeKind::Code
        }
    }

    /// Statements are coverable only directly inside a function body, never
    /// at class, namespace or file level.
    fn in_function_body(&self) -> bool {
        let scope = self.builder.node(self.scope());
        !scope.has_methods && scope.function.is_some()
    }

    fn follows_scope_resolution(&self) -> bool {
        self.stream.prev_significant().is_some_and(|token| token.kind == TokenKind::DOUBLE_COLON)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.stream.current().map(|token| token.kind)
    }

    /// Turns the pending text up to `end` into a node of the current scope.
    fn emit(&mut self, kind: NodeKind, end: TextSize) -> NodeId {
        let scope = self.scope();
        let id = self.builder.attach(scope, kind, TextRange::new(self.start, end), self.in_php);
        self.start = end;

        if let Some(indexer) = &mut self.indexer {
            indexer.assign(&mut self.builder, id);
        }

        id
    }

    fn flush(&mut self, end: TextSize) {
        if end > self.start {
            let kind = self.code_kind();
            self.emit(kind, end);
        }
    }

    fn flush_uses(&mut self) {
        if self.pending_uses.is_empty() {
            return;
        }

        let uses = mem::take(&mut self.pending_uses);
        if let Some(namespace) = self.builder.node_mut(self.namespace).kind.namespace_mut() {
            namespace.uses.extend(uses);
        }
    }

    fn open_scope(&mut self, id: NodeId) {
        self.scopes.push(id);
        self.pending_modifiers.clear();
        trace!(depth = self.scopes.len() - 1, kind = self.builder.node(id).kind.abbr(), "open scope");
    }

    fn close_scope(&mut self, token: Token) {
        self.flush(token.range.start());

        let Some(scope) = self.scopes.pop() else { return };
        let is_closure = self.builder.node(scope).kind.function().is_some_and(|f| f.is_closure);
        let close = if is_closure { self.closure_tail(token.range) } else { token.range };

        self.builder.node_mut(scope).close = close;
        self.start = close.end();
        self.pending_modifiers.clear();

        if let Some(indexer) = &mut self.indexer {
            indexer.close(&mut self.builder, scope);
        }

        trace!(depth = self.scopes.len() - 1, kind = self.builder.node(scope).kind.abbr(), "close scope");
    }

    /// After a closure body, the text up to the punctuation that ends the
    /// surrounding expression belongs to the closure: `},`, `})`, `};`, `}]`.
    fn closure_tail(&mut self, close: TextRange) -> TextRange {
        use TokenKind::*;

        let mut end = close.end();
        while let Some(next) = self.stream.peek() {
            if matches!(
                next.kind,
                LEFT_BRACE
                    | RIGHT_BRACE
                    | OPEN_TAG
                    | OPEN_TAG_WITH_ECHO
                    | CLOSE_TAG
                    | INLINE_HTML
                    | FUNCTION_KW
                    | CLASS_KW
            ) {
                break;
            }

            self.stream.advance();
            end = next.range.end();

            if matches!(next.kind, RIGHT_PAREN | SEMICOLON | COMMA | RIGHT_BRACKET) {
                break;
            }
        }

        TextRange::new(close.start(), end)
    }

    fn string(&mut self, token: Token) {
        self.flush(token.range.start());

        let end = match token.kind {
            TokenKind::DOUBLE_QUOTE => self.stream.next_until(&[TokenKind::DOUBLE_QUOTE]).end(),
            TokenKind::START_HEREDOC => self.heredoc(token),
            _ => token.range.end(),
        };

        self.emit(NodeKind::String, end);
    }

    /// A heredoc runs through its closing label, plus a `;` right after it.
    fn heredoc(&mut self, token: Token) -> TextSize {
        let label = heredoc_label(self.stream.token_text(token));
        let mut end = self.stream.next_sequence(label).map_or(token.range.end(), TextRange::end);

        if let Some(next) = self.stream.peek().filter(|next| next.kind == TokenKind::SEMICOLON) {
            self.stream.advance();
            end = next.range.end();
        }

        end
    }

    fn namespace(&mut self, token: Token) {
        self.flush(token.range.start());
        self.flush_uses();

        let rest = self.stream.next_until(&[TokenKind::SEMICOLON, TokenKind::LEFT_BRACE]);
        let name = self.text[rest].trim_end_matches([';', '{']).trim().to_owned();

        self.scopes.truncate(1);
        let id = self.emit(NodeKind::Namespace(Namespace { name, uses: IndexMap::new() }), rest.end());
        self.namespace = id;
        self.open_scope(id);
    }

    /// `use A\B, C as D;` and `use A\{B, C as D};`. Inside class-like bodies
    /// the statement imports traits, so nothing is recorded.
    fn use_statement(&mut self) {
        use TokenKind::*;

        let record = self.builder.node(self.scope()).kind.class_like().is_none();
        let mut stop = SEMICOLON;
        let mut prefix = String::new();
        let mut entry = UseEntry::default();
        let mut end = self.text.text_len();

        while let Some(token) = self.stream.advance() {
            if token.kind == stop {
                end = token.range.end();
                break;
            }

            let text = self.stream.token_text(token);
            match token.kind {
                COMMA => {
                    let done = mem::replace(&mut entry, UseEntry::new(&prefix));
                    self.record_use(record, done);
                }
                // `use function A\b;`, `use const A\B;`
                FUNCTION_KW if entry.is_fresh() => {}
                NAME if entry.is_fresh() && text.eq_ignore_ascii_case("const") => {}
                NAME => entry.push_segment(text),
                NS_SEPARATOR => entry.push(text),
                AS_KW => entry.aliased = true,
                LEFT_BRACE => {
                    stop = RIGHT_BRACE;
                    prefix.clone_from(&entry.name);
                    entry = UseEntry::new(&prefix);
                }
                _ => {}
            }
        }

        if stop == RIGHT_BRACE
            && let Some(next) = self.stream.peek().filter(|next| next.kind == SEMICOLON)
        {
            self.stream.advance();
            end = next.range.end();
        }

        self.record_use(record, entry);
        self.emit(NodeKind::Use, end);
    }

    fn record_use(&mut self, record: bool, entry: UseEntry) {
        if let Some((alias, name)) = entry.finish().filter(|_| record) {
            self.pending_uses.insert(alias, name);
        }
    }

    fn class_like(&mut self, token: Token) {
        use TokenKind::*;

        self.flush(token.range.start());
        self.stream.skip_whitespace();

        let name = self
            .stream
            .current()
            .filter(|name| name.kind == NAME)
            .map(|name| self.stream.token_text(name).to_owned())
            .unwrap_or_default();

        let stops: &[TokenKind] = match token.kind {
            CLASS_KW => &[LEFT_BRACE, EXTENDS_KW],
            TRAIT_KW => &[LEFT_BRACE, SEMICOLON],
            _ => &[LEFT_BRACE],
        };
        let mut end = self.read_until(stops);

        let mut extends = String::new();
        if self.current_kind() == Some(EXTENDS_KW) {
            self.stream.skip_whitespace();
            let name = self.stream.skip_while(&[NAME, NS_SEPARATOR]);
            extends = self.text[name].to_owned();
            end = self.read_until(&[LEFT_BRACE]);
        }

        let class = ClassLike { name, extends };
        let kind = match token.kind {
            CLASS_KW => NodeKind::Class(class),
            TRAIT_KW => NodeKind::Trait(class),
            _ => NodeKind::Interface(class),
        };

        let id = self.emit(kind, end);
        if self.current_kind() == Some(LEFT_BRACE) {
            self.open_scope(id);
        }
    }

    fn function(&mut self, token: Token) {
        use TokenKind::*;

        self.flush(token.range.start());

        let head = self.stream.next_until(&[LEFT_PAREN]);
        let name = self.text[head].trim_end_matches('(').trim().trim_start_matches('&').trim();
        let name = name.to_owned();

        let args = if self.current_kind() == Some(LEFT_PAREN) {
            args::parse(&mut self.stream)
        } else {
            IndexMap::new()
        };
        let end = self.stream.next_until(&[SEMICOLON, LEFT_BRACE]).end();

        let is_method = self.builder.node(self.scope()).has_methods;
        let modifiers = mem::take(&mut self.pending_modifiers);
        let function = Function {
            is_closure: name.is_empty(),
            name,
            args,
            visibility: if is_method { modifiers } else { BTreeSet::new() },
            is_method,
        };

        let id = self.emit(NodeKind::Function(function), end);

        // Abstract and interface methods have no body.
        if self.current_kind() == Some(LEFT_BRACE) {
            self.open_scope(id);
        }
    }

    /// End of the first token whose kind is in `stops`, the current one included.
    fn read_until(&mut self, stops: &[TokenKind]) -> TextSize {
        match self.stream.current() {
            Some(token) if stops.contains(&token.kind) => token.range.end(),
            _ => self.stream.next_until(stops).end(),
        }
    }
}

#[derive(Default)]
struct UseEntry {
    name: String,
    alias: String,
    last: String,
    aliased: bool,
}

impl UseEntry {
    fn new(prefix: &str) -> Self {
        Self { name: prefix.to_owned(), ..Self::default() }
    }

    /// No identifier seen yet; a group prefix does not count.
    fn is_fresh(&self) -> bool {
        self.last.is_empty() && !self.aliased
    }

    fn push(&mut self, text: &str) {
        if self.aliased { self.alias.push_str(text) } else { self.name.push_str(text) }
    }

    fn push_segment(&mut self, text: &str) {
        text.clone_into(&mut self.last);
        self.push(text);
    }

    /// Returns `(alias, name)`. Without `as`, the alias is the last name segment.
    fn finish(self) -> Option<(String, String)> {
        let alias = if self.aliased && !self.alias.is_empty() { self.alias } else { self.last };
        (!alias.is_empty() && !self.name.is_empty()).then_some((alias, self.name))
    }
}

fn heredoc_label(start: &str) -> &str {
    start.trim_start_matches('<').trim().trim_matches(['"', '\''])
}

fn modifier(kind: TokenKind) -> Option<Modifier> {
    Some(match kind {
        TokenKind::FINAL_KW => Modifier::Final,
        TokenKind::ABSTRACT_KW => Modifier::Abstract,
        TokenKind::PRIVATE_KW => Modifier::Private,
        TokenKind::PROTECTED_KW => Modifier::Protected,
        TokenKind::PUBLIC_KW => Modifier::Public,
        TokenKind::STATIC_KW => Modifier::Static,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heredoc_labels() {
        assert_eq!(heredoc_label("<<<EOT\n"), "EOT");
        assert_eq!(heredoc_label("<<< \"EOT\"\r\n"), "EOT");
        assert_eq!(heredoc_label("<<<'RAW'\n"), "RAW");
    }

    #[test]
    fn use_entries() {
        let mut entry = UseEntry::default();
        for (segment, text) in [(true, "Foo"), (false, "\\"), (true, "Bar")] {
            if segment { entry.push_segment(text) } else { entry.push(text) }
        }
        assert_eq!(entry.finish(), Some(("Bar".to_owned(), "Foo\\Bar".to_owned())));

        let mut entry = UseEntry::new("Foo\\");
        assert!(entry.is_fresh());
        entry.push_segment("Bar");
        entry.aliased = true;
        entry.push_segment("Baz");
        assert_eq!(entry.finish(), Some(("Baz".to_owned(), "Foo\\Bar".to_owned())));

        assert_eq!(UseEntry::new("Foo\\").finish(), None);
    }

    #[test]
    fn modifiers() {
        assert_eq!(modifier(TokenKind::STATIC_KW), Some(Modifier::Static));
        assert_eq!(modifier(TokenKind::VARIABLE), None);
    }
}
