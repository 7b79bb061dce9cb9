use crate::{
    chroma::{BackgroundSpec, KeyColorSpec},
    preview::{
        capture::{CaptureGate, CapturedPhoto, DEFAULT_CAPTURE_QUALITY, PhotoRoll},
        compositor::{CompositorState, FrameCompositor},
        frame::DisplayFrame,
        source::FrameSource,
        surface::DisplaySurface,
    },
};

/// Options for a live preview session.
#[derive(Clone, Debug)]
pub struct PreviewOpts {
    /// Maximum photos kept in the roll (the template's capture count).
    pub capture_count: usize,
    /// Key intensity in `[0, 100]`.
    pub intensity: f64,
    /// Start with the key effect enabled.
    pub keying: bool,
    pub capture_quality: u8,
}

impl Default for PreviewOpts {
    fn default() -> Self {
        Self {
            capture_count: 8,
            intensity: 50.0,
            keying: false,
            capture_quality: DEFAULT_CAPTURE_QUALITY,
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// No frame was ready; the host should simply schedule the next tick.
    Waiting,
    /// A new frame was composited and presented.
    Presented,
    /// A frame arrived but was dropped (malformed, or the source reported an error).
    Skipped,
    /// The session was torn down; no further work happens.
    Stopped,
}

#[derive(Clone, Debug)]
pub struct Tick {
    pub status: TickStatus,
    /// Photo taken on this tick, if the capture signal had a rising edge.
    pub captured: Option<CapturedPhoto>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub ticks: u64,
    pub presented: u64,
    pub skipped: u64,
    pub waiting: u64,
    pub captured: u64,
}

/// Live preview loop: frame source -> compositor -> display surface, plus capture.
///
/// The host drives the loop by calling [`PreviewSession::tick`] once per display refresh.
/// A tick never blocks and never fails terminally; rescheduling is the host's job and
/// [`PreviewSession::stop`] ends the loop.
pub struct PreviewSession<S: FrameSource, D: DisplaySurface> {
    source: Option<S>,
    surface: D,
    compositor: FrameCompositor,
    gate: CaptureGate,
    stats: PreviewStats,
}

impl<S: FrameSource, D: DisplaySurface> PreviewSession<S, D> {
    pub fn start(source: S, surface: D, opts: &PreviewOpts) -> Self {
        let mut compositor = FrameCompositor::new(KeyColorSpec::green(opts.intensity));
        compositor.set_keying(opts.keying);
        compositor.attach();
        tracing::info!(
            capture_count = opts.capture_count,
            intensity = opts.intensity,
            keying = opts.keying,
            "preview started"
        );
        Self {
            source: Some(source),
            surface,
            compositor,
            gate: CaptureGate::with_quality(opts.capture_count, opts.capture_quality),
            stats: PreviewStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn state(&self) -> CompositorState {
        self.compositor.state()
    }

    pub fn set_keying(&mut self, enabled: bool) {
        self.compositor.set_keying(enabled);
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        self.compositor.set_intensity(intensity);
    }

    pub fn set_background(&mut self, background: Option<BackgroundSpec>) {
        self.compositor.set_background(background);
    }

    pub fn display(&self) -> Option<&DisplayFrame> {
        self.compositor.published()
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn photos(&self) -> &PhotoRoll {
        self.gate.roll()
    }

    /// Discard captured photos for a retake.
    pub fn reset_photos(&mut self) {
        self.gate.reset();
    }

    pub fn stats(&self) -> PreviewStats {
        self.stats
    }

    /// Run one scheduling tick with the current state of the capture signal.
    pub fn tick(&mut self, capture_signal: bool) -> Tick {
        let Some(source) = self.source.as_mut() else {
            return Tick {
                status: TickStatus::Stopped,
                captured: None,
            };
        };
        self.stats.ticks += 1;

        let status = match source.poll_frame() {
            Ok(None) => TickStatus::Waiting,
            Ok(Some(frame)) => match self.compositor.process(&frame) {
                Ok(published) => {
                    if let Err(err) = self.surface.present(published) {
                        tracing::warn!(error = %err, "display surface rejected frame");
                    }
                    TickStatus::Presented
                }
                Err(err) => {
                    tracing::debug!(error = %err, "preview frame skipped");
                    TickStatus::Skipped
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "frame source error, skipping tick");
                TickStatus::Skipped
            }
        };
        match status {
            TickStatus::Waiting => self.stats.waiting += 1,
            TickStatus::Presented => self.stats.presented += 1,
            TickStatus::Skipped => self.stats.skipped += 1,
            TickStatus::Stopped => {}
        }

        // Capture reads the buffer published above, never a half-written one.
        let captured = match self
            .gate
            .on_capture_signal(capture_signal, self.compositor.published())
        {
            Ok(photo) => photo,
            Err(err) => {
                tracing::warn!(error = %err, "capture failed");
                None
            }
        };
        if captured.is_some() {
            self.stats.captured += 1;
        }

        Tick { status, captured }
    }

    /// Tear down: release the frame source and stop scheduling work. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            self.compositor.detach();
            tracing::info!(
                ticks = self.stats.ticks,
                captured = self.stats.captured,
                "preview stopped"
            );
        }
    }

    /// Stop the session and hand over the captured photos.
    pub fn finish(mut self) -> PhotoRoll {
        self.stop();
        let gate = std::mem::replace(&mut self.gate, CaptureGate::new(0));
        gate.into_roll()
    }
}

impl<S: FrameSource, D: DisplaySurface> Drop for PreviewSession<S, D> {
    fn drop(&mut self) {
        self.stop();
    }
}
