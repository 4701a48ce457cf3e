//! Common types for the rlogin protocol implementation.
//!
//! This crate provides the shared types used across the rlogin client
//! implementation:
//! - [`WindowSize`] - terminal dimensions in character cells and pixels

/// Terminal dimensions as reported to the rlogin server.
///
/// Rows and columns are measured in character cells; `pixels_x` and
/// `pixels_y` give the size of the terminal window in pixels. All four
/// fields travel on the wire as 16-bit values, so the type uses `u16`
/// throughout. A valid size has no zero field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowSize {
    pub rows: u16,
    pub columns: u16,
    pub pixels_x: u16,
    pub pixels_y: u16,
}

impl WindowSize {
    /// Create a new window size.
    pub const fn new(rows: u16, columns: u16, pixels_x: u16, pixels_y: u16) -> Self {
        Self {
            rows,
            columns,
            pixels_x,
            pixels_y,
        }
    }

    /// Check that every dimension is strictly positive.
    pub const fn is_valid(&self) -> bool {
        self.rows > 0 && self.columns > 0 && self.pixels_x > 0 && self.pixels_y > 0
    }
}

impl Default for WindowSize {
    /// The classic 80x24 terminal at 640x480 pixels.
    fn default() -> Self {
        Self::new(24, 80, 640, 480)
    }
}
