//! colorpage-io: file and codec boundary around the sketch pipeline.
//!
//! Decodes uploaded photos, fits them to the working width, encodes
//! results as PNG bytes or data URLs, and publishes renders through a
//! latest-request-wins [`RenderSession`].

pub mod decode;
pub mod encode;
pub mod error;
pub mod session;

pub use decode::{MAX_WORKING_WIDTH, decode_image, fit_to_width, load_image};
pub use encode::{download_filename, encode_png, png_data_url, save_png};
pub use error::IoError;
pub use session::{RenderSession, RenderTicket, Rendered};
