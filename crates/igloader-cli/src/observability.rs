// Tracing initialization; RUST_LOG overrides the level picked from -v/-q.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `terminal_progress` is set when warnings and failures already reach the
/// user through the progress output, so they are not logged a second time.
pub fn init_tracing(verbose: u8, quiet: bool, terminal_progress: bool) {
    init_tracing_with_level(level_for(verbose, quiet, terminal_progress));
}

pub fn init_tracing_with_level(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    // Logs go to stderr so stdout stays clean for progress and JSON output.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn level_for(verbose: u8, quiet: bool, terminal_progress: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 if terminal_progress => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
