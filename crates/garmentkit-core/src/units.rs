//! Unit conversion utilities
//!
//! Print areas are configured in real-world inches and laid out on a
//! pixel canvas. The conversion is a fixed DPI, 96 by default.

/// Default screen resolution used to size print areas.
pub const DEFAULT_DPI: f64 = 96.0;

/// Convert inches to pixels at the given DPI
pub fn inches_to_pixels(inches: f64, dpi: f64) -> f64 {
    inches * dpi
}
