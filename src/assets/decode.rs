use std::sync::Arc;

use anyhow::Context;

use crate::{
    BoothResult,
    assets::Graphic,
    foundation::error::BoothError,
};

pub fn decode_rgb(bytes: &[u8]) -> BoothResult<image::RgbImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| BoothError::invalid_input(format!("malformed image payload: {e}")))?;
    Ok(dyn_img.to_rgb8())
}

pub fn decode_rgba(bytes: &[u8]) -> BoothResult<image::RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| BoothError::invalid_input(format!("malformed image payload: {e}")))?;
    Ok(dyn_img.to_rgba8())
}

pub fn parse_svg(bytes: &[u8]) -> BoothResult<Arc<usvg::Tree>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(Arc::new(tree))
}

/// Decode an overlay graphic, sniffing SVG by content rather than trusting the file name.
pub fn decode_graphic(bytes: &[u8]) -> BoothResult<Graphic> {
    if looks_like_svg(bytes) {
        return Ok(Graphic::Svg(parse_svg(bytes)?));
    }
    Ok(Graphic::Raster(Arc::new(decode_rgba(bytes)?)))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
