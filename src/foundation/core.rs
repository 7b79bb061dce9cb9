use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{BoothError, BoothResult};

pub use kurbo::{Rect, Size};

/// Packed 8-bit RGB colour.
///
/// Serialized as a `#rrggbb` hex string so config files and requests stay readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const GREEN: Self = Self::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Lenient parse used for UI-provided colours: anything unparseable becomes white.
    pub fn parse_or_white(s: &str) -> Self {
        s.parse().unwrap_or(Self::WHITE)
    }
}

impl FromStr for Rgb8 {
    type Err = BoothError;

    fn from_str(s: &str) -> BoothResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(BoothError::invalid_input(format!(
                "colour '{s}' is not a #rrggbb hex string"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                BoothError::invalid_input(format!("colour '{s}' has a non-hex digit"))
            })
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = BoothError;

    fn try_from(value: String) -> BoothResult<Self> {
        value.parse()
    }
}

impl From<Rgb8> for String {
    fn from(value: Rgb8) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Integer pixel rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.left) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.top) + u64::from(self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Return `true` when the rectangle lies inside `[0,width) x [0,height)`.
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }

    pub fn contains(self, x: u32, y: u32) -> bool {
        x >= self.left
            && y >= self.top
            && u64::from(x) < self.right()
            && u64::from(y) < self.bottom()
    }

    pub fn overlaps(self, other: PixelRect) -> bool {
        u64::from(self.left) < other.right()
            && u64::from(other.left) < self.right()
            && u64::from(self.top) < other.bottom()
            && u64::from(other.top) < self.bottom()
    }

    pub fn size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}
