use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    assets::decode::decode_rgb,
    foundation::error::{BoothError, BoothResult},
    preview::frame::Frame,
};

/// Producer of live frames.
///
/// `poll_frame` must not block: `Ok(None)` means "nothing new yet", and the caller simply
/// tries again on its next tick.
pub trait FrameSource {
    fn poll_frame(&mut self) -> BoothResult<Option<Frame>>;

    /// Release the underlying device. Called once on teardown.
    fn release(&mut self) {}
}

/// Frames pushed by the host, e.g. from a camera callback.
#[derive(Debug, Default)]
pub struct QueuedFrameSource {
    queue: VecDeque<Frame>,
    released: bool,
}

impl QueuedFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        if !self.released {
            self.queue.push_back(frame);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FromIterator<Frame> for QueuedFrameSource {
    fn from_iter<T: IntoIterator<Item = Frame>>(iter: T) -> Self {
        Self {
            queue: iter.into_iter().collect(),
            released: false,
        }
    }
}

impl FrameSource for QueuedFrameSource {
    fn poll_frame(&mut self) -> BoothResult<Option<Frame>> {
        Ok(self.queue.pop_front())
    }

    fn release(&mut self) {
        self.released = true;
        self.queue.clear();
    }
}

/// Replays a directory of stills (sorted by file name) as a frame stream.
#[derive(Debug)]
pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> BoothResult<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read frame directory '{}'", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("list frame directory '{}'", dir.display()))?
                .path();
            if is_still(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(BoothError::invalid_input(format!(
                "no .png/.jpg/.jpeg frames in '{}'",
                dir.display()
            )));
        }
        paths.sort();

        Ok(Self {
            pending: paths.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn poll_frame(&mut self) -> BoothResult<Option<Frame>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path)
            .map_err(|e| BoothError::io(format!("read frame '{}'", path.display()), e))?;
        Ok(Some(Frame::from_rgb_image(decode_rgb(&bytes)?)))
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}

fn is_still(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::frame::PixelLayout;

    #[test]
    fn queued_source_drains_in_order_and_stops_after_release() {
        let mk = |v: u8| Frame::new(1, 1, PixelLayout::Rgb8, vec![v, v, v]).unwrap();
        let mut src: QueuedFrameSource = [mk(1), mk(2)].into_iter().collect();
        assert_eq!(src.poll_frame().unwrap().unwrap().data[0], 1);
        assert_eq!(src.poll_frame().unwrap().unwrap().data[0], 2);
        assert!(src.poll_frame().unwrap().is_none());

        src.push(mk(3));
        src.release();
        src.push(mk(4));
        assert!(src.is_released());
        assert_eq!(src.pending(), 0);
    }

    #[test]
    fn image_sequence_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10u8)] {
            image::RgbImage::from_pixel(3, 2, image::Rgb([shade, shade, shade]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let mut src = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(src.remaining(), 2);
        let first = src.poll_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (3, 2));
        assert_eq!(first.data[0], 10);
        assert_eq!(src.poll_frame().unwrap().unwrap().data[0], 20);
        assert!(src.poll_frame().unwrap().is_none());
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path()).is_err());
    }
}
