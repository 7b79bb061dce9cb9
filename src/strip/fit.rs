use image::imageops::FilterType;

use crate::{
    assets::Graphic,
    foundation::{
        core::{PixelRect, Size},
        error::{BoothError, BoothResult},
    },
};

/// Uniform scale that makes `src` cover `dst` completely.
pub fn cover_scale(src: Size, dst: Size) -> f64 {
    (dst.width / src.width).max(dst.height / src.height)
}

/// Uniform scale that makes `src` fit entirely inside `dst`.
pub fn contain_scale(src: Size, dst: Size) -> f64 {
    (dst.width / src.width).min(dst.height / src.height)
}

/// Size of `src_w x src_h` scaled uniformly until it covers `dst_w x dst_h`.
///
/// Each axis rounds to the nearest pixel and never drops below the target.
pub fn cover_size(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32) {
    let scale = cover_scale(
        Size::new(f64::from(src_w), f64::from(src_h)),
        Size::new(f64::from(dst_w), f64::from(dst_h)),
    );
    let w = ((f64::from(src_w) * scale).round() as u32).max(dst_w);
    let h = ((f64::from(src_h) * scale).round() as u32).max(dst_h);
    (w, h)
}

/// Centered `dst_w x dst_h` window of the image once scaled to [`cover_size`].
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> PixelRect {
    let (w, h) = cover_size(src_w, src_h, dst_w, dst_h);
    PixelRect::new((w - dst_w) / 2, (h - dst_h) / 2, dst_w, dst_h)
}

/// Resize `img` to exactly `width x height` without distortion, cropping the overflow evenly.
///
/// The image is scaled uniformly first and cropped second, so both axes share one scale factor.
pub fn cover_fit(img: &image::RgbImage, width: u32, height: u32) -> BoothResult<image::RgbImage> {
    let (sw, sh) = img.dimensions();
    if sw == 0 || sh == 0 || width == 0 || height == 0 {
        return Err(BoothError::invalid_input(format!(
            "cannot cover-fit {sw}x{sh} into {width}x{height}"
        )));
    }
    let scaled_size = cover_size(sw, sh, width, height);
    let crop = cover_crop(sw, sh, width, height);

    let scaled;
    let scaled_ref = if scaled_size == (sw, sh) {
        img
    } else {
        scaled = image::imageops::resize(img, scaled_size.0, scaled_size.1, FilterType::Lanczos3);
        &scaled
    };
    if scaled_size == (width, height) {
        return Ok(scaled_ref.clone());
    }
    Ok(
        image::imageops::crop_imm(scaled_ref, crop.left, crop.top, crop.width, crop.height)
            .to_image(),
    )
}

/// Render `graphic` inside `width x height` preserving its aspect ratio. The result is
/// premultiplied RGBA of exactly the box size, centered, with transparent padding.
pub fn contain_fit(graphic: &Graphic, width: u32, height: u32) -> BoothResult<image::RgbaImage> {
    let (gw, gh) = graphic.intrinsic_size()?;
    if gw == 0 || gh == 0 || width == 0 || height == 0 {
        return Err(BoothError::invalid_input(format!(
            "cannot contain-fit {gw}x{gh} into {width}x{height}"
        )));
    }
    let scale = contain_scale(
        Size::new(f64::from(gw), f64::from(gh)),
        Size::new(f64::from(width), f64::from(height)),
    );
    let iw = ((f64::from(gw) * scale).round() as u32).clamp(1, width);
    let ih = ((f64::from(gh) * scale).round() as u32).clamp(1, height);
    let inner = graphic.render_premul(iw, ih)?;
    if (iw, ih) == (width, height) {
        return Ok(inner);
    }

    let mut boxed = image::RgbaImage::new(width, height);
    image::imageops::replace(
        &mut boxed,
        &inner,
        i64::from((width - iw) / 2),
        i64::from((height - ih) / 2),
    );
    Ok(boxed)
}

/// Render `graphic` to exactly `width x height`, ignoring its aspect ratio.
pub fn stretch_fit(graphic: &Graphic, width: u32, height: u32) -> BoothResult<image::RgbaImage> {
    graphic.render_premul(width, height)
}
