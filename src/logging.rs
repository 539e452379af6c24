//! Tracing initialization.
//!
//! `--verbosity` picks the level (0 = warnings only, 1 = progress, 2+ = debug);
//! `RUST_LOG` overrides it when set.

use tracing_subscriber::EnvFilter;

pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}
