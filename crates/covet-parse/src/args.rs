use std::mem;

use covet_tokenizer::{TokenKind, TokenStream};
use covet_tree::ArgKey;
use indexmap::IndexMap;

/// Parses a parameter list. The stream must rest on the opening `(`; it is
/// left on the matching `)`, or past the end of input when there is none.
pub(crate) fn parse(stream: &mut TokenStream<'_>) -> IndexMap<ArgKey, String> {
    use TokenKind::*;

    let mut args = Args::default();
    let mut depth = 0usize;

    while let Some(token) = stream.current() {
        let text = stream.token_text(token);

        match token.kind {
            LEFT_PAREN | LEFT_BRACKET | LEFT_BRACE => {
                if depth > 0 {
                    args.value.push_str(text);
                }
                depth += 1;
            }
            RIGHT_PAREN | RIGHT_BRACKET | RIGHT_BRACE => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    args.finish_arg();
                    break;
                }
                args.value.push_str(text);
            }
            COMMA if depth == 1 => args.finish_arg(),
            EQ if depth == 1 && args.name.is_none() => {
                args.name = Some(mem::take(&mut args.value));
            }
            _ => args.value.push_str(text),
        }

        stream.advance();
    }

    args.map
}

#[derive(Default)]
struct Args {
    map: IndexMap<ArgKey, String>,
    name: Option<String>,
    value: String,
    position: usize,
}

impl Args {
    fn finish_arg(&mut self) {
        let value = mem::take(&mut self.value);
        let value = value.trim();

        match self.name.take() {
            _ if value.is_empty() => {}
            Some(name) => {
                self.map.insert(ArgKey::Name(name.trim().to_owned()), value.to_owned());
            }
            None => {
                self.map.insert(ArgKey::Index(self.position), value.to_owned());
                self.position += 1;
            }
        }
    }
}
