//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::WidthBounds;

/// Clamp a width into the bounds window.
///
/// Returns `None` when `width` already lies inside `[min, max]` (inclusive):
/// such images are passed through without resampling.
///
/// # Examples
/// ```
/// # use image_inline::imaging::{WidthBounds, calculate_target_width};
/// let bounds = WidthBounds { min: 20, max: 800 };
/// assert_eq!(calculate_target_width(2000, bounds), Some(800));
/// assert_eq!(calculate_target_width(10, bounds), Some(20));
/// assert_eq!(calculate_target_width(400, bounds), None);
/// ```
pub fn calculate_target_width(width: u32, bounds: WidthBounds) -> Option<u32> {
    if width > bounds.max {
        Some(bounds.max)
    } else if width < bounds.min {
        Some(bounds.min)
    } else {
        None
    }
}

/// Height that keeps the aspect ratio at `target_width`.
///
/// `round(height × target_width / width)`, never less than one pixel.
pub fn calculate_scaled_height(original: (u32, u32), target_width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h.max(1);
    }
    let ratio = target_width as f64 / orig_w as f64;
    ((orig_h as f64 * ratio).round() as u32).max(1)
}

/// Output dimensions after normalization.
///
/// Returns the original dimensions unchanged when the width is in bounds.
pub fn calculate_normalized_dimensions(original: (u32, u32), bounds: WidthBounds) -> (u32, u32) {
    match calculate_target_width(original.0, bounds) {
        Some(target) => (target, calculate_scaled_height(original, target)),
        None => original,
    }
}
