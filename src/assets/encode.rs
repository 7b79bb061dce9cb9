use std::io::Cursor;

use crate::foundation::error::{BoothError, BoothResult};

/// Baseline JPEG at the given quality (1..=100).
pub fn encode_jpeg(img: &image::RgbImage, quality: u8) -> BoothResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .encode_image(img)
        .map_err(|e| BoothError::encoding(format!("jpeg encode failed: {e}")))?;
    Ok(buf)
}

pub fn encode_png_luma(img: &image::GrayImage) -> BoothResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| BoothError::encoding(format!("png encode failed: {e}")))?;
    Ok(buf)
}
