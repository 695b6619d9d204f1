//! Errors raised at the file/codec boundary.

use std::path::PathBuf;

use colorpage_pipeline::PipelineError;

/// Errors that can occur while loading, encoding, or saving images.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input bytes are not a supported image format.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[source] image::ImageError),

    /// Reading an input file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Writing an output file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The pixel pipeline rejected the image or parameters.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
