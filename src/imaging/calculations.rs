//! Pure calculation functions for the resize cascade.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Decide which configured widths to render for an image.
///
/// `widths` must be sorted descending without duplicates. Returns the suffix
/// starting at the first width strictly smaller than `intrinsic_width`. When
/// no width is smaller, the image is still reduced to the smallest configured
/// width, so the cascade is never empty for a non-empty configuration.
///
/// # Examples
/// ```
/// # use img_resize::imaging::plan_cascade;
/// assert_eq!(plan_cascade(1000, &[1400, 1200, 800, 400]), &[800, 400]);
/// assert_eq!(plan_cascade(300, &[1400, 1200, 800, 400]), &[400]);
/// ```
pub fn plan_cascade(intrinsic_width: u32, widths: &[u32]) -> &[u32] {
    match widths.iter().position(|&w| w < intrinsic_width) {
        Some(start) => &widths[start..],
        None => &widths[widths.len().saturating_sub(1)..],
    }
}

/// Height for `width` that preserves the intrinsic aspect ratio.
///
/// Computed as `floor(width * height / intrinsic_width)` in 64-bit, so large
/// images cannot overflow. A zero intrinsic width yields 0.
pub fn scaled_height(width: u32, intrinsic: Dimensions) -> u32 {
    let height = (u64::from(width) * u64::from(intrinsic.height))
        .checked_div(u64::from(intrinsic.width))
        .unwrap_or(0);
    u32::try_from(height).unwrap_or(u32::MAX)
}
