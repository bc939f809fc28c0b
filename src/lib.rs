//! Flo Warp - `.flo` optical flow files and flow-based image warping.
//!
//! This crate reads and writes dense 2-band `f32` flow fields in the `.flo`
//! container and applies them to images with a nearest-neighbour backward
//! warp. It does not estimate optical flow.
//!
//! # Architecture
//!
//! - `format`: the `.flo` codec and its error taxonomy
//! - `compute`: flow field and raster types, and the warp itself
//! - `schema`: serde configuration for warping
//! - `pipeline`: decode -> observers -> warp driver
//! - `imaging`: PNG/JPEG adapter used by the command-line tool
//!
//! # Example
//!
//! ```rust,no_run
//! use flo_warp::{
//!     compute::{FloatImage, warp},
//!     format::read_flow_file,
//! };
//!
//! let flow = read_flow_file("frame.flo")?;
//! let source = FloatImage::new(flow.width(), flow.height(), 3);
//! let warped = warp(&flow, &source)?;
//! # Ok::<(), flo_warp::format::FlowError>(())
//! ```

pub mod compute;
pub mod format;
pub mod imaging;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use compute::{FloatImage, FlowField, FlowStats, FlowVector, Raster, RasterMut, warp, warp_with};
pub use format::{FlowError, FlowErrorKind, read_flow_file, write_flow_file};
pub use pipeline::{FlowObserver, WarpPipeline};
pub use schema::{UnknownFlowPolicy, WarpConfig};
