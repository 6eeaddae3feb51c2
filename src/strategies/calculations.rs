//! Pure dimension math for thumbnails.
//!
//! Mirrors ImageMagick's `WxH>` geometry: fit inside a square box keeping
//! the aspect ratio, and only ever shrink.

/// Dimensions that fit `(width, height)` inside a `max_edge` square.
///
/// Sources already inside the box are returned unchanged. The short edge is
/// rounded to the nearest pixel and never drops below 1.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (short as f64 * max_edge as f64 / long as f64).round() as u32;
        scaled.max(1)
    };
    if width >= height {
        (max_edge, scale(height, width))
    } else {
        (scale(width, height), max_edge)
    }
}
