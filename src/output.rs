//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The `inspect` and `check` commands describe what happened rather than
//! dumping payloads. Every entity gets a header line (its path relative to
//! the allowed root) followed by indented context lines.
//!
//! ## Inspect
//!
//! ```text
//! photos/sunset.jpg
//!     Source: /srv/images/photos/sunset.jpg
//!     Format: jpeg
//!     Dimensions: 2000x500 → 800x200
//!     Bytes: 1.4 MiB → 61.2 KiB (data URI 81.6 KiB)
//! ```
//!
//! ## Check
//!
//! ```text
//! Allowed root
//!     /srv/images
//! Limits
//!     max_file_size: 100.0 MiB
//!     max_dimension: 16384px
//!     max_alloc: 1.0 GiB
//! Resize
//!     width: 20-800px (lanczos3)
//! Encoding
//!     jpeg_quality: 85
//! ```
//!
//! ## Errors
//!
//! Plain output gets one line, `error[TooLarge]: ...`. With `read --json` the
//! same error is printed as `{"kind": "TooLarge", "message": "..."}`.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::config::ReaderConfig;
use crate::imaging::Dimensions;
use crate::reader::{ErrorKind, ReadError, ReadOutcome};
use crate::sandbox::AllowedRoot;
use serde::Serialize;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count with binary units.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn format_dimensions(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

/// `2000x500 → 800x200`, or `400x100 (unchanged)`.
fn dimension_change(original: Dimensions, output: Dimensions) -> String {
    if original == output {
        format!("{} (unchanged)", format_dimensions(original))
    } else {
        format!(
            "{} → {}",
            format_dimensions(original),
            format_dimensions(output)
        )
    }
}

/// Format a successful read without its payload.
pub fn format_outcome(outcome: &ReadOutcome, root: &AllowedRoot) -> Vec<String> {
    let header = outcome
        .source
        .strip_prefix(root.path())
        .unwrap_or(&outcome.source)
        .display()
        .to_string();
    vec![
        header,
        format!("{}Source: {}", indent(1), outcome.source.display()),
        format!("{}Format: {}", indent(1), outcome.format),
        format!(
            "{}Dimensions: {}",
            indent(1),
            dimension_change(outcome.original, outcome.output)
        ),
        format!(
            "{}Bytes: {} → {} (data URI {})",
            indent(1),
            format_bytes(outcome.file_size),
            format_bytes(outcome.encoded_len as u64),
            format_bytes(outcome.data_uri.len() as u64)
        ),
    ]
}

pub fn print_outcome(outcome: &ReadOutcome, root: &AllowedRoot) {
    for line in format_outcome(outcome, root) {
        println!("{}", line);
    }
}

/// Format the effective configuration for `check`.
pub fn format_check(config: &ReaderConfig, root: &AllowedRoot) -> Vec<String> {
    let filter = serde_json::to_value(config.resize.filter)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    vec![
        "Allowed root".to_string(),
        format!("{}{}", indent(1), root.path().display()),
        "Limits".to_string(),
        format!(
            "{}max_file_size: {}",
            indent(1),
            format_bytes(config.limits.max_file_size)
        ),
        format!("{}max_dimension: {}px", indent(1), config.limits.max_dimension),
        format!(
            "{}max_alloc: {}",
            indent(1),
            format_bytes(config.limits.max_alloc)
        ),
        "Resize".to_string(),
        format!(
            "{}width: {}-{}px ({})",
            indent(1),
            config.resize.min_width,
            config.resize.max_width,
            filter
        ),
        "Encoding".to_string(),
        format!("{}jpeg_quality: {}", indent(1), config.encoding.jpeg_quality),
    ]
}

pub fn print_check(config: &ReaderConfig, root: &AllowedRoot) {
    for line in format_check(config, root) {
        println!("{}", line);
    }
}

/// One-line error with its classification, e.g. `error[TooLarge]: ...`.
pub fn format_error(err: &ReadError) -> String {
    format!("error[{}]: {}", err.kind(), err)
}

#[derive(Serialize)]
struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

/// Machine-readable form of a failed read for `read --json`.
pub fn format_error_json(err: &ReadError) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ErrorReport {
        kind: err.kind(),
        message: err.to_string(),
    })
}
