//! Reading and writing of `.flo` optical flow files.
//!
//! # File Format
//!
//! A `.flo` file stores a 2-band `f32` image holding the horizontal (`u`) and
//! vertical (`v`) flow components. Everything is little-endian:
//!
//! ```text
//! Header (12 bytes):
//!   Tag: "PIEH" (4 bytes), which reads as the f32 202021.25
//!   Width: i32, 1..=99999
//!   Height: i32, 1..=99999
//!
//! Data (width * height * 2 * 4 bytes):
//!   u[row0,col0], v[row0,col0], u[row0,col1], v[row0,col1], ...
//! ```
//!
//! The tag doubles as a byte-order check: a file written with the wrong
//! endianness fails with [`FlowError::BadTag`] instead of being swapped.

mod error;
mod file;
mod flo;

pub use error::{Axis, FlowError, FlowErrorKind, FlowResult};
pub use file::{FLO_EXTENSION, read_flow_file, write_flow_file};
pub use flo::{FLO_TAG, FLO_TAG_BYTES, FloHeader, decode, encode, encode_to_vec};
