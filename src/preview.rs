//! Live camera preview: mirror, green-screen replacement and edge-triggered capture.
//!
//! ```text
//! FrameSource ──poll──▶ FrameCompositor ──publish──▶ DisplaySurface
//!                              │
//!                              └──snapshot──▶ CaptureGate ──▶ PhotoRoll
//! ```

pub mod capture;
pub mod compositor;
pub mod frame;
pub mod session;
pub mod source;
pub mod surface;

pub use capture::{CaptureGate, CapturedPhoto, PhotoRoll};
pub use compositor::{CompositorState, FrameCompositor};
pub use frame::{DisplayFrame, Frame, PixelLayout};
pub use session::{PreviewOpts, PreviewSession, PreviewStats, Tick, TickStatus};
pub use source::{FrameSource, ImageSequenceSource, QueuedFrameSource};
pub use surface::{DisplaySurface, InMemorySurface};
