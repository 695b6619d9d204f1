//! colorpage-pipeline: photo to coloring-page line art (sans-IO).
//!
//! Converts an RGBA raster into monochrome line art through:
//! grayscale -> invert -> box blur -> color dodge -> levels.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers and returns pixel buffers. Decoding, encoding, and
//! scheduling live in `colorpage-io`. No stage logs.

pub mod blur;
pub mod config;
pub mod diagnostics;
pub mod dodge;
pub mod grayscale;
pub mod invert;
pub mod levels;
pub mod pipeline;
pub mod types;

pub use config::SketchConfig;
pub use pipeline::{
    Sketcher, StageId, StagedResult, transform, transform_in_place, transform_raw,
    transform_staged,
};
pub use types::{Dimensions, PipelineError, PixelBuffer, RgbaImage};
