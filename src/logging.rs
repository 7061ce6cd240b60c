//! Diagnostic logging to stderr.
//!
//! Stdout carries the JSON/table output, so every log line goes to stderr.
//! `RUST_LOG` wins when set; otherwise the `-v` count picks the level.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Map a `-v` count to a level: 0 = error, 1 = warn, 2 = info, 3 = debug, 4+ = trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn filter_for(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level_from_verbosity(verbosity).as_str().to_lowercase())
    }
}

/// Install the global subscriber. Call once, before any lookup.
pub fn init(verbosity: u8) {
    fmt::Subscriber::builder()
        .with_env_filter(filter_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 3)
        .init();
}
