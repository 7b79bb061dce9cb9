use std::sync::Arc;

use crate::{
    chroma::{BackgroundSpec, KeyColorSpec},
    foundation::error::{BoothError, BoothResult},
    preview::frame::{DisplayFrame, Frame, mirror_into},
};

/// Lifecycle of the live compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositorState {
    /// No frame source attached.
    Idle,
    /// Frames are mirrored and shown unchanged.
    MirrorOnly,
    /// Frames are mirrored and key pixels are replaced.
    Keying,
}

/// Real-time mirror + green-screen compositor.
///
/// Uses two RGBA buffers: each tick writes into the working buffer and then swaps it with the
/// published one, so readers of [`FrameCompositor::published`] never observe a half-written
/// frame. Background sampling tables are rebuilt only when the geometry or the background
/// changes.
#[derive(Debug)]
pub struct FrameCompositor {
    state: CompositorState,
    keying_requested: bool,
    key: KeyColorSpec,
    background: Option<BackgroundSpec>,

    working: DisplayFrame,
    published: DisplayFrame,
    has_published: bool,

    sampler: BackgroundSampler,
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new(KeyColorSpec::default())
    }
}

impl FrameCompositor {
    pub fn new(key: KeyColorSpec) -> Self {
        Self {
            state: CompositorState::Idle,
            keying_requested: false,
            key,
            background: None,
            working: DisplayFrame::default(),
            published: DisplayFrame::default(),
            has_published: false,
            sampler: BackgroundSampler::default(),
        }
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn key(&self) -> &KeyColorSpec {
        &self.key
    }

    /// A frame source became available.
    pub fn attach(&mut self) {
        if self.state == CompositorState::Idle {
            self.state = self.active_state();
        }
    }

    /// The frame source went away. The last published frame is dropped.
    pub fn detach(&mut self) {
        self.state = CompositorState::Idle;
        self.has_published = false;
    }

    /// Toggle the key effect without interrupting the loop.
    ///
    /// While idle the preference is remembered and applied on the next [`attach`](Self::attach).
    pub fn set_keying(&mut self, enabled: bool) {
        self.keying_requested = enabled;
        if self.state != CompositorState::Idle {
            self.state = self.active_state();
        }
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        self.key = KeyColorSpec::green(intensity);
    }

    /// Replace the key fill. An image without pixels counts as no background.
    pub fn set_background(&mut self, background: Option<BackgroundSpec>) {
        self.background = background.filter(|bg| !bg.is_empty());
        self.sampler.invalidate();
    }

    pub fn background(&self) -> Option<&BackgroundSpec> {
        self.background.as_ref()
    }

    /// Most recently published frame, if any tick has completed since attach.
    pub fn published(&self) -> Option<&DisplayFrame> {
        self.has_published.then_some(&self.published)
    }

    /// Run one tick on `frame` and publish the result.
    ///
    /// Malformed frames are rejected with `InvalidInput` and leave the published frame as it
    /// was; callers are expected to drop the frame and keep looping.
    pub fn process(&mut self, frame: &Frame) -> BoothResult<&DisplayFrame> {
        if self.state == CompositorState::Idle {
            return Err(BoothError::invalid_input(
                "compositor has no attached frame source",
            ));
        }
        if !frame.is_well_formed() {
            return Err(BoothError::invalid_input(format!(
                "dropping malformed {}x{} frame ({} bytes)",
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }

        self.working.reshape(frame.width, frame.height);
        mirror_into(frame, &mut self.working);

        if self.state == CompositorState::Keying {
            self.apply_key();
        }

        std::mem::swap(&mut self.working, &mut self.published);
        self.has_published = true;
        Ok(&self.published)
    }

    fn active_state(&self) -> CompositorState {
        if self.keying_requested {
            CompositorState::Keying
        } else {
            CompositorState::MirrorOnly
        }
    }

    fn apply_key(&mut self) {
        let Some(background) = &self.background else {
            return;
        };
        let key = self.key;
        let (width, height) = (self.working.width, self.working.height);

        match background {
            BackgroundSpec::Color(c) => {
                for px in self.working.data.chunks_exact_mut(4) {
                    if key.classify(px[0], px[1], px[2]) {
                        px[0] = c.r;
                        px[1] = c.g;
                        px[2] = c.b;
                        px[3] = 255;
                    }
                }
            }
            BackgroundSpec::Image(bg) if bg.width() == 0 || bg.height() == 0 => {}
            BackgroundSpec::Image(bg) => {
                self.sampler.prepare(bg, width, height);
                let bg_raw = bg.as_raw();
                let row_len = (width as usize) * 4;
                for (y, row) in self.working.data.chunks_exact_mut(row_len).enumerate() {
                    let bg_row = self.sampler.rows[y];
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        if !key.classify(px[0], px[1], px[2]) {
                            continue;
                        }
                        let bi = (bg_row + self.sampler.cols[x]) * 4;
                        px[0] = bg_raw[bi];
                        px[1] = bg_raw[bi + 1];
                        px[2] = bg_raw[bi + 2];
                        px[3] = 255;
                    }
                }
            }
        }
    }
}

/// Cached display-to-background index tables.
///
/// `cols[x] = floor(x * bg_w / w)` and `rows[y] = floor(y * bg_h / h) * bg_w`.
#[derive(Debug, Default)]
struct BackgroundSampler {
    key: Option<(usize, u32, u32)>,
    cols: Vec<usize>,
    rows: Vec<usize>,
}

impl BackgroundSampler {
    fn invalidate(&mut self) {
        self.key = None;
    }

    fn prepare(&mut self, bg: &Arc<image::RgbaImage>, width: u32, height: u32) {
        let id = Arc::as_ptr(bg) as usize;
        if self.key == Some((id, width, height)) {
            return;
        }
        let (bg_w, bg_h) = (u64::from(bg.width()), u64::from(bg.height()));
        let (w, h) = (u64::from(width), u64::from(height));

        self.cols.clear();
        self.cols
            .extend((0..w).map(|x| (x * bg_w / w).min(bg_w.saturating_sub(1)) as usize));
        self.rows.clear();
        self.rows.extend(
            (0..h).map(|y| ((y * bg_h / h).min(bg_h.saturating_sub(1)) * bg_w) as usize),
        );
        self.key = Some((id, width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgb8;
    use crate::preview::frame::PixelLayout;

    const GREEN: [u8; 3] = [0, 255, 0];
    const SKIN: [u8; 3] = [224, 172, 105];

    fn frame(pixels: &[[u8; 3]], width: u32) -> Frame {
        let height = pixels.len() as u32 / width;
        Frame::new(width, height, PixelLayout::Rgb8, pixels.concat()).unwrap()
    }

    fn keyed(bg: Option<BackgroundSpec>) -> FrameCompositor {
        let mut c = FrameCompositor::new(KeyColorSpec::green(50.0));
        c.attach();
        c.set_keying(true);
        c.set_background(bg);
        c
    }

    #[test]
    fn state_transitions() {
        let mut c = FrameCompositor::default();
        assert_eq!(c.state(), CompositorState::Idle);
        c.set_keying(true);
        assert_eq!(c.state(), CompositorState::Idle);
        c.attach();
        assert_eq!(c.state(), CompositorState::Keying);
        c.set_keying(false);
        assert_eq!(c.state(), CompositorState::MirrorOnly);
        c.detach();
        assert_eq!(c.state(), CompositorState::Idle);
        assert!(c.published().is_none());
    }

    #[test]
    fn idle_compositor_rejects_frames() {
        let mut c = FrameCompositor::default();
        assert!(c.process(&frame(&[SKIN], 1)).is_err());
    }

    #[test]
    fn mirror_only_never_keys() {
        let mut c = FrameCompositor::default();
        c.attach();
        c.set_background(Some(BackgroundSpec::Color(Rgb8::new(1, 2, 3))));
        let out = c.process(&frame(&[GREEN, SKIN], 2)).unwrap();
        assert_eq!(out.data, vec![224, 172, 105, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn color_background_replaces_key_pixels_only() {
        let mut c = keyed(Some(BackgroundSpec::Color(Rgb8::new(10, 20, 30))));
        let out = c.process(&frame(&[GREEN, SKIN], 2)).unwrap();
        // mirrored: skin lands on the left, green on the right
        assert_eq!(out.pixel(0, 0), [224, 172, 105, 255]);
        assert_eq!(out.pixel(1, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn no_background_leaves_key_pixels_untouched() {
        let mut c = keyed(None);
        let out = c.process(&frame(&[GREEN], 1)).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn image_background_is_sampled_proportionally() {
        // 2x1 background, 4x1 display: display columns 0,1 -> bg 0 and 2,3 -> bg 1
        let bg = image::RgbaImage::from_raw(2, 1, vec![100, 0, 0, 7, 0, 0, 200, 7]).unwrap();
        let mut c = keyed(Some(BackgroundSpec::image(bg)));
        let out = c.process(&frame(&[GREEN; 4], 4)).unwrap();
        assert_eq!(out.pixel(0, 0), [100, 0, 0, 255]);
        assert_eq!(out.pixel(1, 0), [100, 0, 0, 255]);
        assert_eq!(out.pixel(2, 0), [0, 0, 200, 255]);
        assert_eq!(out.pixel(3, 0), [0, 0, 200, 255]);
    }

    #[test]
    fn image_background_sampled_after_mirroring() {
        let bg = image::RgbaImage::from_raw(2, 1, vec![100, 0, 0, 255, 0, 0, 200, 255]).unwrap();
        let mut c = keyed(Some(BackgroundSpec::image(bg)));
        // source: green on the left, skin on the right; display: skin left, green right
        let out = c.process(&frame(&[GREEN, SKIN], 2)).unwrap();
        assert_eq!(out.pixel(0, 0), [224, 172, 105, 255]);
        assert_eq!(out.pixel(1, 0), [0, 0, 200, 255]);
    }

    #[test]
    fn malformed_frame_keeps_previous_publication() {
        let mut c = keyed(None);
        c.process(&frame(&[SKIN], 1)).unwrap();
        let bad = Frame {
            width: 4,
            height: 4,
            layout: PixelLayout::Rgb8,
            data: vec![0; 5],
        };
        assert!(c.process(&bad).is_err());
        assert_eq!(c.published().unwrap().pixel(0, 0), [224, 172, 105, 255]);
    }

    #[test]
    fn empty_image_background_counts_as_none() {
        let mut c = keyed(Some(BackgroundSpec::image(image::RgbaImage::new(0, 0))));
        assert!(c.background().is_none());
        let out = c.process(&frame(&[GREEN, SKIN], 2)).unwrap();
        assert_eq!(out.pixel(1, 0), [0, 255, 0, 255]);

        c.set_background(Some(BackgroundSpec::image(image::RgbaImage::new(3, 0))));
        assert!(c.background().is_none());
    }

    #[test]
    fn geometry_change_rebuilds_sampler() {
        let bg = image::RgbaImage::from_raw(2, 1, vec![100, 0, 0, 255, 0, 0, 200, 255]).unwrap();
        let mut c = keyed(Some(BackgroundSpec::image(bg)));
        c.process(&frame(&[GREEN; 4], 4)).unwrap();
        let out = c.process(&frame(&[GREEN; 2], 2)).unwrap();
        assert_eq!(out.width, 2);
        assert_eq!(out.pixel(0, 0), [100, 0, 0, 255]);
        assert_eq!(out.pixel(1, 0), [0, 0, 200, 255]);
    }
}
