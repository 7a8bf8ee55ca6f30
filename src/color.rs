use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::KeyColorsError;

/// An 8-bit sRGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Euclidean distance in RGB space.
    #[inline]
    pub fn distance(&self, other: &Color) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    #[inline]
    pub fn distance_squared(&self, other: &Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({:3}, {:3}, {:3})", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = KeyColorsError;

    /// Accepts `#rrggbb` or `rrggbb`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(KeyColorsError::InvalidHex(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| KeyColorsError::InvalidHex(s.to_string()))
        };
        Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl From<Srgb<u8>> for Color {
    fn from(c: Srgb<u8>) -> Self {
        Color::new(c.red, c.green, c.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(c: Color) -> Self {
        Srgb::new(c.r, c.g, c.b)
    }
}

/// A palette entry together with the number of pixels the quantizer assigned to it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub color: Color,
    pub population: usize,
}
