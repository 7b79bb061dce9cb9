//! Scannable pointer to a finished strip.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    assets::encode,
    foundation::error::{BoothError, BoothResult},
};

pub const DEFAULT_CODE_SIZE_PX: u32 = 300;
pub const DEFAULT_CODE_MARGIN: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEncoder {
    /// Target edge length; the symbol is drawn at the largest integer module scale that fits.
    pub size_px: u32,
    /// Quiet zone, in modules.
    pub margin: u32,
}

impl Default for CodeEncoder {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_CODE_SIZE_PX,
            margin: DEFAULT_CODE_MARGIN,
        }
    }
}

/// Rendered QR symbol, black on white.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeImage {
    pub width: u32,
    pub height: u32,
    /// Modules per side, quiet zone excluded.
    pub modules: u32,
    /// Pixels per module.
    pub scale: u32,
    /// PNG bytes, serialized as a `data:image/png;base64,` URL.
    #[serde(rename = "dataUrl", serialize_with = "serialize_data_url")]
    pub png: Vec<u8>,
}

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

fn serialize_data_url<S: Serializer>(png: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&png_data_url(png))
}

fn png_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png))
}

impl CodeImage {
    /// Inline form handed to web clients.
    pub fn data_url(&self) -> String {
        png_data_url(&self.png)
    }

    pub fn to_luma(&self) -> BoothResult<image::GrayImage> {
        Ok(image::load_from_memory(&self.png)
            .map_err(|e| BoothError::encoding(format!("code image is not a valid png: {e}")))?
            .to_luma8())
    }
}

struct Raster {
    img: image::GrayImage,
    modules: u32,
    scale: u32,
}

impl CodeEncoder {
    pub fn new(size_px: u32, margin: u32) -> Self {
        Self { size_px, margin }
    }

    /// Encode `address` with medium error correction. Output depends only on the address.
    pub fn encode(&self, address: &str) -> BoothResult<CodeImage> {
        let Raster {
            img,
            modules,
            scale,
        } = self.rasterize(address)?;
        Ok(CodeImage {
            width: img.width(),
            height: img.height(),
            modules,
            scale,
            png: encode::encode_png_luma(&img)?,
        })
    }

    fn rasterize(&self, address: &str) -> BoothResult<Raster> {
        if address.is_empty() {
            return Err(BoothError::encoding("cannot encode an empty address"));
        }
        let code =
            qrcode::QrCode::with_error_correction_level(address.as_bytes(), qrcode::EcLevel::M)
                .map_err(|e| BoothError::encoding(format!("qr encode failed: {e}")))?;

        let modules = code.width() as u32;
        let scale = (self.size_px / (modules + 2 * self.margin)).max(1);
        let drawn = (modules + 2 * self.margin) * scale;
        // Symbols that fit are centered in a `size_px` square; larger ones grow the image.
        let side = drawn.max(self.size_px);
        let offset = (side - drawn) / 2 + self.margin * scale;

        let mut img = image::GrayImage::from_pixel(side, side, image::Luma([255]));
        for (i, color) in code.to_colors().into_iter().enumerate() {
            if color != qrcode::Color::Dark {
                continue;
            }
            let x0 = offset + (i as u32 % modules) * scale;
            let y0 = offset + (i as u32 / modules) * scale;
            for y in y0..y0 + scale {
                for x in x0..x0 + scale {
                    img.put_pixel(x, y, image::Luma([0]));
                }
            }
        }
        Ok(Raster {
            img,
            modules,
            scale,
        })
    }
}

#[cfg(test)]
pub(crate) fn decode_for_test(img: &image::GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one qr grid");
    let (_meta, content) = grids[0].decode().unwrap();
    content
}
