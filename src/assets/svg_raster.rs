use crate::foundation::error::{BoothError, BoothResult};

const MAX_DIM: u32 = 16_384;

/// Intrinsic pixel size of an SVG document, rounded up.
pub fn svg_intrinsic_size(tree: &usvg::Tree) -> BoothResult<(u32, u32)> {
    fn to_px(v: f32) -> BoothResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(BoothError::invalid_input("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    Ok((to_px(size.width())?, to_px(size.height())?))
}

/// Rasterize `tree` scaled (possibly non-uniformly) to exactly `width x height`.
///
/// Output is premultiplied RGBA8, which is what tiny-skia produces natively.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> BoothResult<image::RgbaImage> {
    if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
        return Err(BoothError::invalid_input(format!(
            "svg raster size out of range: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| BoothError::encoding("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    image::RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| BoothError::encoding("svg pixmap size mismatch"))
}
