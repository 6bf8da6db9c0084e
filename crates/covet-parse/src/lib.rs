//! Single-pass structural parser for PHP sources.
//!
//! [`parse`] splits a file into namespaces, class-likes, functions,
//! statements, comments and strings without building a full syntax tree.
//! Every byte of the input ends up in exactly one node, so [`unparse`]
//! always restores the original text. With [`Config::lines`] set, the tree
//! also carries a per-line table telling which lines end an executable
//! statement.

mod args;
mod debug;
mod indexer;
mod parser;

use covet_inputs::File;
pub use covet_tree::Tree;
pub use debug::{debug, render};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Build the per-line coverage table.
    pub lines: bool,
    /// Start in PHP code instead of inline HTML.
    pub php: bool,
}

pub fn parse(text: &str, config: Config) -> Tree {
    parser::Parser::new(text, config).parse()
}

pub fn unparse(tree: &Tree) -> String {
    tree.unparse()
}

pub trait FileParse {
    fn parse(self, db: &dyn salsa::Database) -> &Tree;
}

impl FileParse for File {
    fn parse(self, db: &dyn salsa::Database) -> &Tree {
        parse_file(db, self)
    }
}

#[salsa::tracked(returns(ref), no_eq)]
fn parse_file(db: &dyn salsa::Database, file: File) -> Tree {
    parse(file.text(db), Config { lines: true, php: file.php(db) })
}
