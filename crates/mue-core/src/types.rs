//! # Types Module
//!
//! Value types copied across the script boundary.
//!
//! ## Responsibilities
//! - **Vector2D**: `f64` pair used for positions, sizes and window dimensions.
//! - **Color**: 8-bit RGBA color with Skia conversion.
//! - **Rectangle**: `f32` rectangle with raylib collision semantics.
//! - **WindowConfig**: title, target frame rate and dimensions of the window.
//!
//! None of these types have identity; the codecs in `scripting::codec` create a
//! fresh value for every conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D vector in script space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Represents a RGBA color with one byte per channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts to Skia's `Color` struct.
    #[cfg(feature = "skia")]
    pub fn to_skia(&self) -> skia_safe::Color {
        skia_safe::Color::from_argb(self.a, self.r, self.g, self.b)
    }
}

/// An axis-aligned rectangle. Used both as collision input and as collision output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true when the two rectangles overlap. Shared edges do not count.
    pub fn check_collision(&self, other: &Rectangle) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Computes the overlapping area, or `None` when the rectangles do not collide.
    pub fn collision_rec(&self, other: &Rectangle) -> Option<Rectangle> {
        if !self.check_collision(other) {
            return None;
        }

        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        Some(Rectangle::new(left, top, right - left, bottom - top))
    }
}

/// Window title with a fixed capacity.
///
/// Holds at most [`WindowTitle::MAX_LEN`] bytes, leaving room for a terminator in
/// a 1024-byte native buffer. Input is cut at the first NUL and at the last UTF-8
/// character boundary that fits, so it never overflows regardless of the length a
/// script supplies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WindowTitle(String);

impl WindowTitle {
    /// Capacity of the native buffer, terminator included.
    pub const CAPACITY: usize = 1024;
    /// Longest title in bytes.
    pub const MAX_LEN: usize = Self::CAPACITY - 1;

    pub fn new(text: &str) -> Self {
        let text = match text.find('\0') {
            Some(nul) => &text[..nul],
            None => text,
        };

        let mut end = text.len().min(Self::MAX_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        Self(text[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WindowTitle {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for WindowTitle {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<WindowTitle> for String {
    fn from(title: WindowTitle) -> Self {
        title.0
    }
}

impl fmt::Display for WindowTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for the window and frame-rate resource.
///
/// Built from the defaults at startup, optionally replaced by the `setup` hook's
/// return value, then fixed for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowConfig {
    pub title: WindowTitle,
    pub target_fps: i32,
    pub dimensions: Vector2D,
}

impl WindowConfig {
    pub const DEFAULT_TITLE: &'static str = "window";
    pub const DEFAULT_TARGET_FPS: i32 = 120;
    pub const DEFAULT_WIDTH: f64 = 800.0;
    pub const DEFAULT_HEIGHT: f64 = 600.0;

    pub fn new(title: &str, target_fps: i32, width: f64, height: f64) -> Self {
        Self {
            title: WindowTitle::new(title),
            target_fps,
            dimensions: Vector2D::new(width, height),
        }
    }

    /// Window width in whole pixels.
    pub fn width(&self) -> i32 {
        self.dimensions.x as i32
    }

    /// Window height in whole pixels.
    pub fn height(&self) -> i32 {
        self.dimensions.y as i32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_TITLE,
            Self::DEFAULT_TARGET_FPS,
            Self::DEFAULT_WIDTH,
            Self::DEFAULT_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_collision_rec() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(5.0, 5.0, 10.0, 10.0);

        assert!(a.check_collision(&b));
        assert_eq!(a.collision_rec(&b), Some(Rectangle::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(b.collision_rec(&a), Some(Rectangle::new(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(10.0, 0.0, 10.0, 10.0);

        assert!(!a.check_collision(&b));
        assert_eq!(a.collision_rec(&b), None);
    }

    #[test]
    fn test_contained_rectangle() {
        let outer = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rectangle::new(20.0, 30.0, 10.0, 5.0);

        assert_eq!(outer.collision_rec(&inner), Some(inner));
    }

    #[test]
    fn test_title_truncates_to_capacity() {
        let long = "a".repeat(5000);
        let title = WindowTitle::new(&long);
        assert_eq!(title.as_str().len(), WindowTitle::MAX_LEN);
    }

    #[test]
    fn test_title_stops_at_terminator() {
        let title = WindowTitle::new("pong\0garbage");
        assert_eq!(title.as_str(), "pong");
    }

    #[test]
    fn test_title_respects_char_boundaries() {
        // 'é' is two bytes; 512 of them straddle the 1023-byte limit.
        let long = "é".repeat(512);
        let title = WindowTitle::new(&long);
        assert_eq!(title.as_str().len(), 1022);
        assert!(title.as_str().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_default_window_config() {
        let config = WindowConfig::default();
        assert_eq!(config.title.as_str(), "window");
        assert_eq!(config.target_fps, 120);
        assert_eq!((config.width(), config.height()), (800, 600));
    }
}
