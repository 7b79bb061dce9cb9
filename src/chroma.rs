//! Threshold-based green-screen classification.
//!
//! The classifier is intentionally asymmetric: it only asks whether the green channel dominates
//! red and blue by a margin. It is not a general chroma keyer and performs no smoothing, so key
//! edges are hard (binary mask, no feathering).

use std::sync::Arc;

use crate::foundation::core::Rgb8;

/// Lowest and highest accepted values of the user-facing intensity slider.
pub const INTENSITY_MIN: f64 = 0.0;
pub const INTENSITY_MAX: f64 = 100.0;

/// Key colour parameters derived from a single intensity value in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyColorSpec {
    /// Reference hue the thresholds approximate.
    pub reference: Rgb8,
    intensity: f64,
    g_threshold: f64,
    tolerance: f64,
}

impl KeyColorSpec {
    /// Green key for the given intensity. Out-of-range or NaN intensities are clamped.
    pub fn green(intensity: f64) -> Self {
        let intensity = if intensity.is_nan() {
            INTENSITY_MIN
        } else {
            intensity.clamp(INTENSITY_MIN, INTENSITY_MAX)
        };
        Self {
            reference: Rgb8::GREEN,
            intensity,
            g_threshold: 140.0 - 0.4 * intensity,
            tolerance: 30.0 + 0.5 * intensity,
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Minimum green value a key pixel must exceed.
    pub fn g_threshold(&self) -> f64 {
        self.g_threshold
    }

    /// Minimum separation of green over both red and blue.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline]
    pub fn classify(&self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
        g > self.g_threshold && g > r + self.tolerance && g > b + self.tolerance
    }
}

impl Default for KeyColorSpec {
    fn default() -> Self {
        Self::green(50.0)
    }
}

/// Content that replaces key pixels. Exactly one variant is active at a time.
#[derive(Clone, Debug)]
pub enum BackgroundSpec {
    /// Decoded still, sampled proportionally into display space.
    Image(Arc<image::RgbaImage>),
    /// Solid fill.
    Color(Rgb8),
}

impl BackgroundSpec {
    pub fn image(img: image::RgbaImage) -> Self {
        Self::Image(Arc::new(img))
    }

    /// True for an image background with no pixels to sample.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Image(img) => img.width() == 0 || img.height() == 0,
            Self::Color(_) => false,
        }
    }

    /// Build from a UI selection: a loaded image wins, otherwise the colour is used.
    ///
    /// Mirrors the booth behaviour of falling back to the colour when the image fails to load.
    pub fn from_selection(image: Option<image::RgbaImage>, color: Option<&str>) -> Option<Self> {
        match (image, color) {
            (Some(img), _) if img.width() > 0 && img.height() > 0 => Some(Self::image(img)),
            (_, Some(hex)) => Some(Self::Color(Rgb8::parse_or_white(hex))),
            _ => None,
        }
    }
}
