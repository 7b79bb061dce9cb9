use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    assets::{Graphic, encode::encode_jpeg},
    code::{CodeEncoder, CodeImage},
    foundation::error::{BoothError, BoothResult},
    layout::LayoutTemplate,
    strip::{
        composite::{over_layer, paste_opaque},
        fit::{contain_fit, cover_fit, stretch_fit},
        output::OutputStore,
    },
};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

const CANVAS_FILL: image::Rgb<u8> = image::Rgb([255, 255, 255]);

/// Optional artwork layered over the photos.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overlays<'a> {
    pub logo: Option<&'a Graphic>,
    pub frame: Option<&'a Graphic>,
}

/// Outcome of one successful composition.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResult {
    pub output_image_path: PathBuf,
    pub output_image_address: String,
    pub output_public_path: String,
    /// `None` when the code image could not be produced.
    pub code_image: Option<CodeImage>,
    pub created_at: DateTime<Utc>,
    pub template_id: String,
    pub template_name: String,
    pub width: u32,
    pub height: u32,
    /// xxh3-64 of the composited canvas pixels, hex.
    pub content_hash: String,
}

/// Hash of raw canvas pixels; equal inputs give equal hashes.
pub fn content_hash(canvas: &image::RgbImage) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(canvas.as_raw()))
}

/// Decode the first `count` encoded stills in parallel.
pub fn decode_photos<B: AsRef<[u8]> + Sync>(
    images: &[B],
    count: usize,
) -> BoothResult<Vec<image::RgbImage>> {
    if images.len() < count {
        return Err(BoothError::invalid_input(format!(
            "{count} photos required, {} supplied",
            images.len()
        )));
    }
    images[..count]
        .par_iter()
        .enumerate()
        .map(|(i, bytes)| {
            crate::assets::decode::decode_rgb(bytes.as_ref()).map_err(|e| match e {
                BoothError::InvalidInput(msg) => {
                    BoothError::invalid_input(format!("photo {}: {msg}", i + 1))
                }
                other => other,
            })
        })
        .collect()
}

/// Build the strip canvas: photos into slots, then logo, then frame.
///
/// Pure; nothing touches the filesystem. Photos beyond the slot count are ignored. A logo or
/// frame that fails to render is skipped with a warning.
pub fn render_strip(
    photos: &[image::RgbImage],
    template: &LayoutTemplate,
    overlays: Overlays<'_>,
) -> BoothResult<image::RgbImage> {
    if !template.accepts(photos.len()) {
        return Err(BoothError::invalid_input(format!(
            "template '{}' needs {} photos, {} supplied",
            template.id,
            template.select_count,
            photos.len()
        )));
    }

    let mut canvas =
        image::RgbImage::from_pixel(template.canvas_width, template.canvas_height, CANVAS_FILL);

    let tiles = template
        .slots
        .par_iter()
        .zip(photos.par_iter())
        .map(|(slot, photo)| cover_fit(photo, slot.width, slot.height))
        .collect::<BoothResult<Vec<_>>>()?;
    for (slot, tile) in template.slots.iter().zip(&tiles) {
        paste_opaque(&mut canvas, tile, slot.left, slot.top);
    }

    if let (Some(logo), Some(pos)) = (overlays.logo, template.logo_position) {
        match contain_fit(logo, pos.width, pos.height) {
            Ok(layer) => over_layer(&mut canvas, &layer, pos.left, pos.top),
            Err(err) => tracing::warn!(error = %err, "logo overlay skipped"),
        }
    }

    if let Some(frame) = overlays.frame.filter(|_| template.has_frame) {
        match stretch_fit(frame, template.canvas_width, template.canvas_height) {
            Ok(layer) => over_layer(&mut canvas, &layer, 0, 0),
            Err(err) => tracing::warn!(error = %err, "frame overlay skipped"),
        }
    }

    Ok(canvas)
}

/// Batch compositor: renders, encodes, stores and points at the result.
#[derive(Clone, Debug)]
pub struct StripCompositor {
    store: OutputStore,
    code: CodeEncoder,
    jpeg_quality: u8,
}

impl StripCompositor {
    pub fn new(store: OutputStore, code: CodeEncoder) -> Self {
        Self {
            store,
            code,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    #[tracing::instrument(skip_all, fields(template = %template.id, supplied = images.len()))]
    pub fn compose<B: AsRef<[u8]> + Sync>(
        &self,
        images: &[B],
        template: &LayoutTemplate,
        overlays: Overlays<'_>,
    ) -> BoothResult<CompositionResult> {
        let photos = decode_photos(images, template.select_count)?;
        let canvas = render_strip(&photos, template, overlays)?;
        let hash = content_hash(&canvas);
        tracing::info!(
            width = canvas.width(),
            height = canvas.height(),
            logo = overlays.logo.is_some(),
            frame = overlays.frame.is_some(),
            "strip composited"
        );

        let jpeg = encode_jpeg(&canvas, self.jpeg_quality)?;
        let created_at = Utc::now();
        let stored = self.store.persist(&jpeg, created_at)?;
        tracing::info!(path = %stored.path.display(), "strip saved");

        let code_image = match self.code.encode(&stored.address) {
            Ok(code) => Some(code),
            Err(err) => {
                tracing::warn!(error = %err, "code image generation failed");
                None
            }
        };

        Ok(CompositionResult {
            output_image_path: stored.path,
            output_image_address: stored.address,
            output_public_path: stored.public_path,
            code_image,
            created_at,
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            width: canvas.width(),
            height: canvas.height(),
            content_hash: hash,
        })
    }
}
