//! Compute module - Flow field storage, raster access and warping.

mod field;
mod raster;
mod remap;

pub use field::*;
pub use raster::*;
pub use remap::*;

pub(crate) use field::check_dimension;
