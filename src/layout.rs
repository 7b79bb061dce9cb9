//! Layout templates: where each selected photo goes on the output canvas.
//!
//! Templates are plain data (serde, camelCase keys) so a deployment can replace the built-in
//! registry with its own JSON file. Every template is validated once when the catalog is built;
//! after that the compositor trusts slot geometry without re-checking.

use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::PixelRect,
    error::{BoothError, BoothResult},
};

pub mod catalog;

pub use catalog::{LayoutCatalog, TemplateSummary};

/// Nominal `"W:H"` aspect ratio of a slot. Informational; the slot rectangle is authoritative.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AspectRatio(pub String);

impl AspectRatio {
    /// `W / H`, or `1.0` when the ratio is missing or unparseable.
    pub fn value(&self) -> f64 {
        let Some((w, h)) = self.0.split_once(':') else {
            return 1.0;
        };
        match (w.trim().parse::<f64>(), h.trim().parse::<f64>()) {
            (Ok(w), Ok(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => w / h,
            _ => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl Slot {
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.left, self.top, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoPosition {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl LogoPosition {
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.left, self.top, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Size a frame graphic should be authored at for a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub description: String,
    pub orientation: Orientation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub capture_count: usize,
    pub select_count: usize,
    #[serde(alias = "stripWidth")]
    pub canvas_width: u32,
    #[serde(alias = "stripHeight")]
    pub canvas_height: u32,
    #[serde(default)]
    pub has_frame: bool,
    #[serde(alias = "layout")]
    pub slots: Vec<Slot>,
    pub frame_size: FrameSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_position: Option<LogoPosition>,
}

impl LayoutTemplate {
    pub fn validate(&self) -> BoothResult<()> {
        let id = &self.id;
        if id.trim().is_empty() {
            return Err(BoothError::validation("template id must be non-empty"));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(BoothError::validation(format!(
                "template '{id}': canvas must be non-zero, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.select_count == 0 {
            return Err(BoothError::validation(format!(
                "template '{id}': selectCount must be >= 1"
            )));
        }
        if self.select_count > self.capture_count {
            return Err(BoothError::validation(format!(
                "template '{id}': selectCount {} exceeds captureCount {}",
                self.select_count, self.capture_count
            )));
        }
        if self.slots.len() != self.select_count {
            return Err(BoothError::validation(format!(
                "template '{id}': {} slots but selectCount is {}",
                self.slots.len(),
                self.select_count
            )));
        }

        for (i, slot) in self.slots.iter().enumerate() {
            let r = slot.rect();
            if r.is_empty() || !r.fits_within(self.canvas_width, self.canvas_height) {
                return Err(BoothError::validation(format!(
                    "template '{id}': slot {i} {}x{} at ({}, {}) is outside the {}x{} canvas",
                    r.width, r.height, r.left, r.top, self.canvas_width, self.canvas_height
                )));
            }
        }

        if let Some(logo) = self.logo_position {
            let r = logo.rect();
            if r.is_empty() || !r.fits_within(self.canvas_width, self.canvas_height) {
                return Err(BoothError::validation(format!(
                    "template '{id}': logo rectangle is outside the canvas"
                )));
            }
        }
        Ok(())
    }

    /// Whether `supplied` photos are enough to fill every slot.
    pub fn accepts(&self, supplied: usize) -> bool {
        supplied >= self.select_count
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            capture_count: self.capture_count,
            select_count: self.select_count,
            frame_size: self.frame_size.clone(),
        }
    }
}
