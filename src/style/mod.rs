//! # Style
//!
//! Colors and text styles shared by the layout primitives and the PDF
//! writer. Report templates are parameterized by a two-color [`Palette`].

use serde::{Deserialize, Serialize};

use crate::font::StandardFont;

/// An RGBA color with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// From 8-bit channels.
    pub fn rgb8(rgb: [u8; 3]) -> Self {
        Self::rgb(
            rgb[0] as f64 / 255.0,
            rgb[1] as f64 / 255.0,
            rgb[2] as f64 / 255.0,
        )
    }

    /// Blend toward white; `amount` 0.0 keeps the color, 1.0 gives white.
    pub fn tint(&self, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self::rgb(
            self.r + (1.0 - self.r) * t,
            self.g + (1.0 - self.g) * t,
            self.b + (1.0 - self.b) * t,
        )
    }

    /// 8-bit channels, for raster output.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Font, size and color for one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub fn regular(size: f64) -> Self {
        Self {
            font: StandardFont::Helvetica,
            size,
            color: Color::BLACK,
        }
    }

    pub fn bold(size: f64) -> Self {
        Self {
            font: StandardFont::HelveticaBold,
            size,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// The "primary" and "secondary" colors every template is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: [u8; 3],
    pub secondary: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: [0, 102, 153],
            secondary: [51, 51, 51],
        }
    }
}

impl Palette {
    pub fn primary(&self) -> Color {
        Color::rgb8(self.primary)
    }

    pub fn secondary(&self) -> Color {
        Color::rgb8(self.secondary)
    }
}
