//! Schema module - Configuration types for flow warping.

mod config;

pub use config::*;
