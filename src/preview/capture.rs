use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    assets::encode::encode_jpeg,
    foundation::error::BoothResult,
    preview::frame::DisplayFrame,
};

/// Quality used for captured stills; matches the booth's `image/jpeg` 0.95 snapshots.
pub const DEFAULT_CAPTURE_QUALITY: u8 = 95;

/// One still extracted from the live display buffer.
#[derive(Clone, Debug)]
pub struct CapturedPhoto {
    /// 0-based position in capture order.
    pub index: usize,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded pixels.
    pub jpeg: Arc<[u8]>,
}

/// Capture-ordered photos for one session, bounded by the template's capture count.
#[derive(Clone, Debug)]
pub struct PhotoRoll {
    capacity: usize,
    photos: Vec<CapturedPhoto>,
}

impl PhotoRoll {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            photos: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.photos.len() >= self.capacity
    }

    pub fn photos(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    /// Encoded stills in the order given by `selection` (indices into the roll).
    ///
    /// This is the hand-off to the strip compositor once the user has picked their subset.
    pub fn select(&self, selection: &[usize]) -> Option<Vec<Arc<[u8]>>> {
        selection
            .iter()
            .map(|&i| self.photos.get(i).map(|p| Arc::clone(&p.jpeg)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.photos.clear();
    }

    pub fn into_photos(self) -> Vec<CapturedPhoto> {
        self.photos
    }
}

/// Edge-triggered capture latch.
///
/// Only a `false -> true` transition of the capture signal extracts a photo; holding the signal
/// high does nothing further, and `true -> false` re-arms the latch.
#[derive(Debug)]
pub struct CaptureGate {
    was_active: bool,
    quality: u8,
    roll: PhotoRoll,
}

impl CaptureGate {
    pub fn new(capture_count: usize) -> Self {
        Self::with_quality(capture_count, DEFAULT_CAPTURE_QUALITY)
    }

    pub fn with_quality(capture_count: usize, quality: u8) -> Self {
        Self {
            was_active: false,
            quality: quality.clamp(1, 100),
            roll: PhotoRoll::new(capture_count),
        }
    }

    pub fn is_latched(&self) -> bool {
        self.was_active
    }

    pub fn roll(&self) -> &PhotoRoll {
        &self.roll
    }

    pub fn into_roll(self) -> PhotoRoll {
        self.roll
    }

    /// Forget all photos and re-arm, for a retake.
    pub fn reset(&mut self) {
        self.was_active = false;
        self.roll.clear();
    }

    /// Observe the external capture signal for this tick.
    ///
    /// Returns the new photo on a rising edge when a frame is available and the roll has room.
    pub fn on_capture_signal(
        &mut self,
        active: bool,
        current: Option<&DisplayFrame>,
    ) -> BoothResult<Option<CapturedPhoto>> {
        let rising = active && !self.was_active;
        self.was_active = active;
        if !rising {
            return Ok(None);
        }

        if self.roll.is_full() {
            tracing::warn!(
                capacity = self.roll.capacity(),
                "capture ignored: maximum photos reached"
            );
            return Ok(None);
        }
        let Some(frame) = current.filter(|f| !f.is_empty()) else {
            tracing::warn!("capture ignored: no frame has been published yet");
            return Ok(None);
        };

        let jpeg = encode_jpeg(&frame.to_rgb_image()?, self.quality)?;
        let photo = CapturedPhoto {
            index: self.roll.len(),
            captured_at: Utc::now(),
            width: frame.width,
            height: frame.height,
            jpeg: Arc::from(jpeg),
        };
        tracing::info!(
            index = photo.index,
            width = photo.width,
            height = photo.height,
            "photo captured"
        );
        self.roll.photos.push(photo.clone());
        Ok(Some(photo))
    }
}
