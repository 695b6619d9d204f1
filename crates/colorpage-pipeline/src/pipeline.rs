//! Fixed-order orchestration of the sketch stages.
//!
//! ```text
//! source ─┬─ copy ─> grayscale G ─┬─ copy ─> invert ─> blur ─> B
//!         │                       │                            │
//!         └──────── output O <── color-dodge(G, B) <───────────┘
//!                      │
//!                   levels (in place) ─> result
//! ```
//!
//! [`Sketcher`] owns the scratch buffers for G, the inverted copy and the
//! blur's intermediate pass, so repeated runs on same-sized images do
//! not reallocate. It holds no other state: two runs with the same input
//! always produce the same bytes.
//!
//! [`transform_staged`] runs the same sequence but keeps every
//! intermediate, for previews and debugging.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blur::{BoxBlur, box_blur};
use crate::config::SketchConfig;
use crate::dodge::color_dodge;
use crate::grayscale::to_grayscale;
use crate::invert::invert;
use crate::levels::apply_levels;
use crate::types::{PipelineError, PixelBuffer};

/// Reusable pipeline runner holding only scratch memory.
#[derive(Debug, Default, Clone)]
pub struct Sketcher {
    gray: Vec<u8>,
    inverted: Vec<u8>,
    blur: BoxBlur,
}

impl Sketcher {
    /// Create a runner with no scratch memory allocated yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gray: Vec::new(),
            inverted: Vec::new(),
            blur: BoxBlur::new(),
        }
    }

    /// Turn `image` into line art in place.
    ///
    /// Returns the config actually applied (after clamping).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] if the config holds
    /// a NaN. Nothing is modified in that case.
    pub fn run(
        &mut self,
        image: &mut PixelBuffer,
        config: &SketchConfig,
    ) -> Result<SketchConfig, PipelineError> {
        let config = config.clamped()?;

        let mut gray = PixelBuffer::copy_into(image, std::mem::take(&mut self.gray));
        to_grayscale(&mut gray);

        let mut inverted = PixelBuffer::copy_into(&gray, std::mem::take(&mut self.inverted));
        invert(&mut inverted);
        self.blur.apply(&mut inverted, config.blur_radius());

        let dodged = color_dodge(&gray, &inverted, image);

        self.gray = gray.into_raw();
        self.inverted = inverted.into_raw();
        dodged?;

        apply_levels(image, config.cleanliness);
        Ok(config)
    }
}

/// Turn `source` into a new line-art buffer of the same size.
///
/// # Errors
///
/// Returns [`PipelineError::ParameterOutOfRange`] if the config holds a
/// NaN.
pub fn transform(source: &PixelBuffer, config: &SketchConfig) -> Result<PixelBuffer, PipelineError> {
    let mut output = source.clone();
    Sketcher::new().run(&mut output, config)?;
    Ok(output)
}

/// Turn `image` into line art, overwriting it.
///
/// # Errors
///
/// Same as [`transform`].
pub fn transform_in_place(
    image: &mut PixelBuffer,
    config: &SketchConfig,
) -> Result<(), PipelineError> {
    Sketcher::new().run(image, config).map(|_| ())
}

/// Run the pipeline over raw RGBA bytes, e.g. canvas image data.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] or
/// [`PipelineError::BufferSizeMismatch`] if the bytes do not describe a
/// `width` x `height` RGBA image, and
/// [`PipelineError::ParameterOutOfRange`] for a NaN parameter.
pub fn transform_raw(
    width: u32,
    height: u32,
    pixels: &[u8],
    config: &SketchConfig,
) -> Result<Vec<u8>, PipelineError> {
    let mut image = PixelBuffer::new(width, height, pixels.to_vec())?;
    transform_in_place(&mut image, config)?;
    Ok(image.into_raw())
}

/// Identifies one stage of [`StagedResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    /// The untouched input.
    Original,
    /// Luminance copy.
    Grayscale,
    /// Negative of the luminance copy.
    Inverted,
    /// Box-blurred negative.
    Blurred,
    /// Color-dodge of grayscale and blurred negative.
    Dodged,
    /// Final levels-adjusted line art.
    Output,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Original,
        Self::Grayscale,
        Self::Inverted,
        Self::Blurred,
        Self::Dodged,
        Self::Output,
    ];

    /// Lower-case name, suitable for file names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Grayscale => "grayscale",
            Self::Inverted => "inverted",
            Self::Blurred => "blurred",
            Self::Dodged => "dodged",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("Original"),
            Self::Grayscale => f.write_str("Grayscale"),
            Self::Inverted => f.write_str("Inverted"),
            Self::Blurred => f.write_str("Blurred"),
            Self::Dodged => f.write_str("Dodged"),
            Self::Output => f.write_str("Output"),
        }
    }
}

/// Result of a pipeline run with every intermediate buffer preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedResult {
    /// The input image.
    pub original: PixelBuffer,
    /// After grayscale conversion.
    pub grayscale: PixelBuffer,
    /// After inverting the grayscale copy.
    pub inverted: PixelBuffer,
    /// After blurring the inverted copy.
    pub blurred: PixelBuffer,
    /// After color-dodge, before levels.
    pub dodged: PixelBuffer,
    /// Final line art.
    pub output: PixelBuffer,
    /// The clamped config that was applied.
    pub config: SketchConfig,
}

impl StagedResult {
    /// The buffer for one stage.
    #[must_use]
    pub const fn stage(&self, id: StageId) -> &PixelBuffer {
        match id {
            StageId::Original => &self.original,
            StageId::Grayscale => &self.grayscale,
            StageId::Inverted => &self.inverted,
            StageId::Blurred => &self.blurred,
            StageId::Dodged => &self.dodged,
            StageId::Output => &self.output,
        }
    }
}

/// Run the pipeline keeping every intermediate buffer.
///
/// The `output` field is byte-identical to what [`transform`] returns.
///
/// # Errors
///
/// Same as [`transform`].
pub fn transform_staged(
    source: &PixelBuffer,
    config: &SketchConfig,
) -> Result<StagedResult, PipelineError> {
    let config = config.clamped()?;

    let mut grayscale = source.clone();
    to_grayscale(&mut grayscale);

    let mut inverted = grayscale.clone();
    invert(&mut inverted);

    let mut blurred = inverted.clone();
    box_blur(&mut blurred, config.blur_radius());

    let mut dodged = source.clone();
    color_dodge(&grayscale, &blurred, &mut dodged)?;

    let mut output = dodged.clone();
    apply_levels(&mut output, config.cleanliness);

    Ok(StagedResult {
        original: source.clone(),
        grayscale,
        inverted,
        blurred,
        dodged,
        output,
        config,
    })
}
