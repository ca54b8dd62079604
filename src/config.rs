//! Reader configuration module.
//!
//! Handles loading, validating, and layering configuration. Values are
//! resolved in this order, later layers overriding earlier ones:
//!
//! ```text
//! stock defaults  →  config.toml  →  environment  →  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! allowed_root = "."          # The only directory images may be read from
//!
//! [limits]
//! max_file_size = 104857600   # Bytes; larger files are refused before decoding
//! max_dimension = 16384       # Decoder cap on width and height, in pixels
//! max_alloc = 1073741824      # Decoder allocation ceiling, in bytes
//!
//! [resize]
//! min_width = 20              # Narrower images are scaled up to this width
//! max_width = 800             # Wider images are scaled down to this width
//! filter = "lanczos3"         # nearest | triangle | catmull_rom | gaussian | lanczos3
//!
//! [encoding]
//! jpeg_quality = 85           # 1-100, JPEG re-encode only
//! ```
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `IMAGE_INLINE_ROOT` | `allowed_root` |
//! | `IMAGE_INLINE_MAX_FILE_SIZE` | `limits.max_file_size` |
//!
//! Unknown keys are rejected to catch typos early.

use crate::guard::MAX_FILE_SIZE;
use crate::imaging::{
    JPEG_QUALITY, MAX_DECODE_ALLOC, MAX_DECODE_DIMENSION, MAX_WIDTH, MIN_WIDTH, ResizeFilter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_ROOT: &str = "IMAGE_INLINE_ROOT";
pub const ENV_MAX_FILE_SIZE: &str = "IMAGE_INLINE_MAX_FILE_SIZE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid value for {var}: {reason}")]
    Env { var: String, reason: String },
}

/// Reader configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Directory outside of which no file may be read.
    pub allowed_root: String,
    /// File size and decode limits.
    pub limits: LimitsConfig,
    /// Width normalization settings.
    pub resize: ResizeConfig,
    /// Re-encode settings.
    pub encoding: EncodingConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            allowed_root: ".".to_string(),
            limits: LimitsConfig::default(),
            resize: ResizeConfig::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "allowed_root must not be empty".into(),
            ));
        }
        if self.limits.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size must be greater than 0".into(),
            ));
        }
        if self.limits.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "limits.max_dimension must be greater than 0".into(),
            ));
        }
        if self.limits.max_alloc == 0 {
            return Err(ConfigError::Validation(
                "limits.max_alloc must be greater than 0".into(),
            ));
        }
        if self.resize.min_width == 0 {
            return Err(ConfigError::Validation(
                "resize.min_width must be greater than 0".into(),
            ));
        }
        if self.resize.min_width > self.resize.max_width {
            return Err(ConfigError::Validation(format!(
                "resize.min_width ({}) must not exceed resize.max_width ({})",
                self.resize.min_width, self.resize.max_width
            )));
        }
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

/// File size and decode limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Default per-request size ceiling in bytes.
    pub max_file_size: u64,
    /// Largest width or height the decoder will accept.
    pub max_dimension: u32,
    /// Largest buffer the decoder may allocate, in bytes.
    pub max_alloc: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            max_dimension: MAX_DECODE_DIMENSION,
            max_alloc: MAX_DECODE_ALLOC,
        }
    }
}

/// Width normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub min_width: u32,
    pub max_width: u32,
    /// Resampling filter for both up- and downscaling.
    pub filter: ResizeFilter,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_width: MIN_WIDTH,
            max_width: MAX_WIDTH,
            filter: ResizeFilter::default(),
        }
    }
}

/// Re-encode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// JPEG quality (1 = worst, 100 = best). Other formats are lossless.
    pub jpeg_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ReaderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build an overlay from environment variables.
///
/// Takes the variables as an iterator so tests never touch the process
/// environment. Returns `Ok(None)` when no relevant variable is set.
pub fn env_overlay<I, K, V>(vars: I) -> Result<Option<toml::Value>, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut table = toml::Table::new();
    for (key, value) in vars {
        let (key, value) = (key.as_ref(), value.as_ref());
        match key {
            ENV_ROOT => {
                table.insert(
                    "allowed_root".to_string(),
                    toml::Value::String(value.to_string()),
                );
            }
            ENV_MAX_FILE_SIZE => {
                let bytes: i64 = value.trim().parse().map_err(|e| ConfigError::Env {
                    var: key.to_string(),
                    reason: format!("{e} (expected a byte count)"),
                })?;
                let mut limits = toml::Table::new();
                limits.insert("max_file_size".to_string(), toml::Value::Integer(bytes));
                table.insert("limits".to_string(), toml::Value::Table(limits));
            }
            _ => {}
        }
    }
    Ok((!table.is_empty()).then_some(toml::Value::Table(table)))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ReaderConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ReaderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory plus the process environment.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ReaderConfig, ConfigError> {
    let file = load_raw_config(dir)?;
    let env = env_overlay(std::env::vars())?;
    resolve_config(stock_defaults_value(), file.into_iter().chain(env))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-inline configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   IMAGE_INLINE_ROOT           -> allowed_root
#   IMAGE_INLINE_MAX_FILE_SIZE  -> limits.max_file_size
# and the --root flag overrides both.
#
# Unknown keys will cause an error.

# The only directory images may be read from. Relative paths in requests
# are resolved against it; anything resolving outside it is refused.
allowed_root = "."

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Files larger than this many bytes are refused before any decoding.
# Individual requests may pass their own max_size.
max_file_size = 104857600

# Images wider or taller than this many pixels are refused by the decoder.
max_dimension = 16384

# Decoding that would allocate more than this many bytes is refused.
# The default fits a 16384x16384 RGBA image.
max_alloc = 1073741824

# ---------------------------------------------------------------------------
# Width normalization
# ---------------------------------------------------------------------------
[resize]
# Images narrower than min_width are scaled up to it, images wider than
# max_width are scaled down to it. Height follows the aspect ratio.
# Widths already inside the window are returned untouched.
min_width = 20
max_width = 800

# Resampling filter: nearest, triangle, catmull_rom, gaussian, lanczos3.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Re-encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (1-100). PNG, GIF and WebP are re-encoded losslessly.
jpeg_quality = 85
"##
}
