//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so stdout carries nothing but the data URI (or JSON).
//! `RUST_LOG` wins over the verbosity flag when set.

use tracing_subscriber::EnvFilter;

/// Map `-v` repetitions to a default directive for this crate.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "image_inline=warn",
        1 => "image_inline=info",
        2 => "image_inline=debug",
        _ => "image_inline=trace",
    }
}

pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
