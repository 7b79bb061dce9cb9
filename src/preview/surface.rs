use crate::{foundation::error::BoothResult, preview::frame::DisplayFrame};

/// Consumer of published preview frames (a window, a texture upload, a test buffer).
pub trait DisplaySurface {
    fn present(&mut self, frame: &DisplayFrame) -> BoothResult<()>;
}

/// In-memory surface for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    presented: u64,
    last: Option<DisplayFrame>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last(&self) -> Option<&DisplayFrame> {
        self.last.as_ref()
    }
}

impl DisplaySurface for InMemorySurface {
    fn present(&mut self, frame: &DisplayFrame) -> BoothResult<()> {
        self.presented += 1;
        match &mut self.last {
            Some(last) => last.clone_from(frame),
            None => self.last = Some(frame.clone()),
        }
        Ok(())
    }
}
