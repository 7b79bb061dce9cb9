use crate::foundation::error::{BoothError, BoothResult};

/// Channel layout of a source frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// A frame as delivered by a [`FrameSource`](crate::preview::FrameSource).
///
/// Frames are never mutated once handed to the compositor; all work happens on its private
/// buffers.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub layout: PixelLayout,
    /// Tightly packed, row-major, 8 bits per channel.
    pub data: Vec<u8>,
}

impl Frame {
    /// Build a frame, rejecting buffers whose length does not match the dimensions.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> BoothResult<Self> {
        let frame = Self {
            width,
            height,
            layout,
            data,
        };
        if !frame.is_well_formed() {
            return Err(BoothError::invalid_input(format!(
                "frame buffer of {} bytes does not match {}x{}x{}",
                frame.data.len(),
                width,
                height,
                layout.channels()
            )));
        }
        Ok(frame)
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgb8,
            data: img.into_raw(),
        }
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgba8,
            data: img.into_raw(),
        }
    }

    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(self.layout.channels()))
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.expected_len() == Some(self.data.len())
    }
}

/// RGBA8 buffer shown on the display surface and read by the capture gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, straight alpha, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl DisplayFrame {
    /// Resize the buffer for a new geometry, reusing the existing allocation where possible.
    pub(crate) fn reshape(&mut self, width: u32, height: u32) {
        let len = (width as usize) * (height as usize) * 4;
        self.width = width;
        self.height = height;
        if self.data.len() != len {
            self.data.resize(len, 0);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Horizontally mirrored copy (`x' = width - 1 - x`).
    pub fn mirrored(&self) -> Self {
        let mut out = Self::default();
        out.reshape(self.width, self.height);
        let row_len = (self.width as usize) * 4;
        for (src_row, dst_row) in self
            .data
            .chunks_exact(row_len)
            .zip(out.data.chunks_exact_mut(row_len))
        {
            for (src_px, dst_px) in src_row
                .chunks_exact(4)
                .zip(dst_row.chunks_exact_mut(4).rev())
            {
                dst_px.copy_from_slice(src_px);
            }
        }
        out
    }

    /// Drop alpha for encoders that only take RGB (JPEG).
    pub fn to_rgb_image(&self) -> BoothResult<image::RgbImage> {
        let mut rgb = Vec::with_capacity((self.width as usize) * (self.height as usize) * 3);
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
        image::RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| BoothError::encoding("display buffer does not match its dimensions"))
    }
}

/// Copy `src` into `dst` with a horizontal flip, expanding RGB to opaque RGBA.
///
/// `dst` must already be shaped to the frame dimensions.
pub(crate) fn mirror_into(src: &Frame, dst: &mut DisplayFrame) {
    let ch = src.layout.channels();
    let src_row_len = (src.width as usize) * ch;
    let dst_row_len = (src.width as usize) * 4;

    for (src_row, dst_row) in src
        .data
        .chunks_exact(src_row_len)
        .zip(dst.data.chunks_exact_mut(dst_row_len))
    {
        for (src_px, dst_px) in src_row
            .chunks_exact(ch)
            .zip(dst_row.chunks_exact_mut(4).rev())
        {
            dst_px[0] = src_px[0];
            dst_px[1] = src_px[1];
            dst_px[2] = src_px[2];
            dst_px[3] = if ch == 4 { src_px[3] } else { 255 };
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ramp(width: u32, height: u32) -> Frame {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, (x * 7 + y) as u8]);
            }
        }
        Frame::new(width, height, PixelLayout::Rgb8, data).unwrap()
    }

    #[test]
    fn new_rejects_mismatched_buffers() {
        assert!(Frame::new(2, 2, PixelLayout::Rgb8, vec![0; 11]).is_err());
        assert!(Frame::new(2, 2, PixelLayout::Rgba8, vec![0; 12]).is_err());
        assert!(Frame::new(0, 2, PixelLayout::Rgb8, vec![]).is_err());
        assert!(Frame::new(2, 2, PixelLayout::Rgba8, vec![0; 16]).is_ok());
    }

    #[test]
    fn mirror_flips_columns_and_adds_alpha() {
        let src = ramp(3, 2);
        let mut dst = DisplayFrame::default();
        dst.reshape(3, 2);
        mirror_into(&src, &mut dst);

        assert_eq!(dst.pixel(0, 0), [2, 0, 14, 255]);
        assert_eq!(dst.pixel(2, 0), [0, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 1), [1, 1, 8, 255]);
    }

    #[test]
    fn mirror_keeps_source_alpha() {
        let src = Frame::new(2, 1, PixelLayout::Rgba8, vec![1, 2, 3, 40, 5, 6, 7, 80]).unwrap();
        let mut dst = DisplayFrame::default();
        dst.reshape(2, 1);
        mirror_into(&src, &mut dst);
        assert_eq!(dst.data, vec![5, 6, 7, 80, 1, 2, 3, 40]);
    }

    #[test]
    fn rgb_export_drops_alpha() {
        let mut f = DisplayFrame::default();
        f.reshape(1, 1);
        f.data.copy_from_slice(&[9, 8, 7, 6]);
        assert_eq!(f.to_rgb_image().unwrap().into_raw(), vec![9, 8, 7]);
    }

    proptest! {
        #[test]
        fn mirroring_twice_is_identity(
            width in 1u32..12,
            height in 1u32..12,
            seed in any::<u64>(),
        ) {
            let mut state = seed;
            let mut data = vec![0u8; (width * height * 4) as usize];
            for b in &mut data {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                *b = (state >> 56) as u8;
            }
            let frame = DisplayFrame { width, height, data };
            prop_assert_eq!(frame.mirrored().mirrored(), frame);
        }
    }
}
