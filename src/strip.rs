//! Batch strip composition.
//!
//! ```text
//! encoded stills --decode--> RgbImage --cover fit--> slots on white canvas
//!                                                   |
//!                                    logo (contain) + frame (stretch), source-over
//!                                                   |
//!                         JPEG --> OutputStore (no-clobber) --> address --> CodeEncoder
//! ```

pub mod composite;
pub mod compositor;
pub mod fit;
pub mod output;

pub use compositor::{
    CompositionResult, DEFAULT_JPEG_QUALITY, Overlays, StripCompositor, content_hash,
    decode_photos, render_strip,
};
pub use output::{OutputStore, StoredOutput};
