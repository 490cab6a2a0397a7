pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

pub use app::pipeline::{Stage, UsingRemover, remove_usings};
pub use infra::grammar::Grammar;

use tracing::Level;

/// Install the stderr log subscriber. Standard output is reserved for rewritten source.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
