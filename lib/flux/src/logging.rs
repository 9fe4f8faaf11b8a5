//! Thin wrapper around `slog`/`sloggers` so every server constructs its root
//! logger the same way. Re-exports the `slog` macros so callers only need
//! `use flux::logging;` and then `logging::info!(log, "..."; "k" => v)`.

pub use slog::{debug, error, info, o, trace, warn, Logger};

use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// Build the root logger for a server process. Terminal destination,
/// `debug` level by default, writing to stderr.
pub fn init(component: &'static str) -> Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(Severity::Debug);
    builder.destination(Destination::Stderr);

    let logger = builder.build().expect("failed to build terminal logger");
    logger.new(o!("component" => component))
}
