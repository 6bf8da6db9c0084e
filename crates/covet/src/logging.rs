//! Diagnostic logging for the command line tool.
//!
//! Nothing is installed unless `COVET_LOG` or `RUST_LOG` is set. `COVET_LOG`
//! wins when both are present and accepts the usual directive syntax, e.g.
//! `COVET_LOG=covet_parse=trace covet lines file.php`.

use tracing_subscriber::EnvFilter;

const VAR: &str = "COVET_LOG";

pub(crate) fn init_tracing() {
    let filter = match std::env::var(VAR) {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    // Output stays on stderr so it never mixes with the command's results.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
