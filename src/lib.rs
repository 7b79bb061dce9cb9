#![forbid(unsafe_code)]

//! Photo-booth compositing engine.
//!
//! Two pipelines share this crate:
//!
//! - [`preview`]: a per-tick loop that mirrors live frames, optionally replaces green key pixels
//!   with a background, and captures stills on a signal edge.
//! - [`strip`]: a batch compositor that places selected stills into a [`layout`] template,
//!   overlays logo and frame artwork, stores the JPEG and returns a QR [`code`] pointing at it.
//!
//! [`service::Booth`] wires both to a [`config::BoothConfig`].

pub mod assets;
pub mod chroma;
pub mod code;
pub mod config;
pub mod foundation;
pub mod layout;
pub mod logging;
pub mod preview;
pub mod service;
pub mod strip;

pub use assets::{AssetKind, AssetLibrary, Graphic};
pub use chroma::{BackgroundSpec, KeyColorSpec};
pub use code::{CodeEncoder, CodeImage};
pub use config::{BoothConfig, UnknownTemplatePolicy};
pub use foundation::core::{PixelRect, Rgb8};
pub use foundation::error::{BoothError, BoothResult, ErrorKind, ErrorResponse};
pub use layout::{LayoutCatalog, LayoutTemplate, Slot, TemplateSummary};
pub use preview::{
    CaptureGate, CapturedPhoto, CompositorState, DisplayFrame, DisplaySurface, Frame,
    FrameCompositor, FrameSource, PhotoRoll, PixelLayout, PreviewOpts, PreviewSession, Tick,
    TickStatus,
};
pub use service::{Booth, ComposeRequest, ComposeRequestFile};
pub use strip::{CompositionResult, Overlays, StripCompositor};
