mod logging;

use anyhow::{Context as _, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use covet_inputs::File;
use covet_parse::{Config, FileParse as _};
use mimalloc::MiMalloc;
use salsa::DatabaseImpl;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(clap::Args)]
struct Source {
    path: Utf8PathBuf,
    /// Treat the file as PHP code from the first byte.
    #[arg(long)]
    php: bool,
}

#[derive(Parser)]
enum Options {
    /// Print the per-line node table.
    Debug(Source),
    /// Print the one-based numbers of executable lines.
    Lines(Source),
    /// Verify that the parsed tree reproduces the file.
    Check(Source),
}

impl Source {
    fn load(self, db: &DatabaseImpl) -> anyhow::Result<File> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path))?;
        Ok(File::new(db, self.path, text, self.php))
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let db = DatabaseImpl::default();

    match Options::parse() {
        Options::Debug(source) => {
            let file = source.load(&db)?;
            print!("{}", covet_parse::render(file.parse(&db)));
        }
        Options::Lines(source) => {
            let file = source.load(&db)?;
            if let Some(lines) = file.parse(&db).lines() {
                for line in lines.coverable() {
                    println!("{}", line + 1);
                }
            }
        }
        Options::Check(source) => {
            let file = source.load(&db)?;
            let tree = file.parse(&db);
            tracing::debug!(path = %file.path(&db), nodes = tree.len(), "parsed");

            if covet_parse::unparse(tree) != file.text(&db) {
                bail!("`{}` does not round-trip", file.path(&db));
            }

            let config = Config { lines: false, php: file.php(&db) };
            if covet_parse::parse(file.text(&db), config).unparse() != file.text(&db) {
                bail!("`{}` does not round-trip without line indexing", file.path(&db));
            }

            let coverable = tree.lines().map_or(0, |lines| lines.coverable().count());
            println!("{}: {} nodes, {coverable} executable lines", file.path(&db), tree.len());
        }
    }

    Ok(())
}
