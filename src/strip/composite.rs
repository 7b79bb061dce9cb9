//! Layer blending onto the opaque strip canvas.
//!
//! Layers are premultiplied RGBA8; the canvas is opaque RGB8, so destination alpha is always 255.

pub type PremulRgba8 = [u8; 4];

/// Source-over of a premultiplied pixel onto an opaque one.
pub fn over(dst: [u8; 3], src: PremulRgba8) -> [u8; 3] {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return [src[0], src[1], src[2]];
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Copy an opaque tile onto the canvas at `(left, top)`, clipping at the canvas edge.
pub fn paste_opaque(canvas: &mut image::RgbImage, tile: &image::RgbImage, left: u32, top: u32) {
    image::imageops::replace(canvas, tile, i64::from(left), i64::from(top));
}

/// Composite a premultiplied layer onto the canvas at `(left, top)`, clipping at the canvas edge.
pub fn over_layer(canvas: &mut image::RgbImage, layer: &image::RgbaImage, left: u32, top: u32) {
    let (cw, ch) = canvas.dimensions();
    if left >= cw || top >= ch {
        return;
    }
    let w = layer.width().min(cw - left);
    let h = layer.height().min(ch - top);

    for y in 0..h {
        for x in 0..w {
            let src = layer.get_pixel(x, y).0;
            if src[3] == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(left + x, top + y);
            dst.0 = over(dst.0, src);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
