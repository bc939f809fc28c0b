//! Dense two-band optical flow field.
//!
//! A flow field stores one `(u, v)` displacement per pixel, interleaved and
//! row-major: `u[row0,col0], v[row0,col0], u[row0,col1], ...`.

use super::raster::{FloatImage, Raster, RasterMut};
use crate::format::{Axis, FlowError, FlowResult};

/// Magnitude above which a flow component is considered unknown.
pub const UNKNOWN_FLOW_THRESH: f32 = 1e9;

/// Largest width or height a flow field may have.
pub const MAX_DIMENSION: usize = 99999;

/// Number of bands in a flow field.
pub const FLOW_CHANNELS: usize = 2;

/// Check one image dimension against `[1, MAX_DIMENSION]`.
pub(crate) fn check_dimension(axis: Axis, value: i64) -> FlowResult<usize> {
    if value < 1 || value > MAX_DIMENSION as i64 {
        return Err(FlowError::InvalidDimensions { axis, value });
    }
    Ok(value as usize)
}

/// Horizontal (`u`) and vertical (`v`) displacement of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowVector {
    pub u: f32,
    pub v: f32,
}

impl FlowVector {
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// Whether this vector carries no usable motion.
    ///
    /// True if either component is NaN or exceeds [`UNKNOWN_FLOW_THRESH`] in
    /// magnitude.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.u.abs() > UNKNOWN_FLOW_THRESH
            || self.v.abs() > UNKNOWN_FLOW_THRESH
            || self.u.is_nan()
            || self.v.is_nan()
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.u * self.u + self.v * self.v).sqrt()
    }
}

/// Row-major `width x height x 2` flow buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl FlowField {
    /// Create a zero-motion field.
    pub fn new(width: usize, height: usize) -> FlowResult<Self> {
        let width = check_dimension(Axis::Width, width as i64)?;
        let height = check_dimension(Axis::Height, height as i64)?;
        Ok(Self {
            width,
            height,
            data: vec![0.0; width * height * FLOW_CHANNELS],
        })
    }

    /// Wrap an interleaved `u, v` buffer.
    ///
    /// A buffer holding whole bands of the wrong count is rejected as
    /// [`FlowError::InvalidChannelCount`]; any other wrong length is
    /// [`FlowError::BufferLength`].
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> FlowResult<Self> {
        let width = check_dimension(Axis::Width, width as i64)?;
        let height = check_dimension(Axis::Height, height as i64)?;
        let pixels = width * height;
        let expected = pixels * FLOW_CHANNELS;
        if data.len() != expected {
            if data.len() % pixels == 0 {
                return Err(FlowError::InvalidChannelCount {
                    channels: data.len() / pixels,
                });
            }
            return Err(FlowError::BufferLength {
                expected,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a field by evaluating `f(col, row)` for every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> FlowVector,
    ) -> FlowResult<Self> {
        let mut field = Self::new(width, height)?;
        for row in 0..field.height {
            for col in 0..field.width {
                field.set_vector(col, row, f(col, row));
            }
        }
        Ok(field)
    }

    /// Decoder entry point: dimensions already validated, buffer filled.
    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height * FLOW_CHANNELS);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn vector(&self, col: usize, row: usize) -> FlowVector {
        let idx = (row * self.width + col) * FLOW_CHANNELS;
        FlowVector::new(self.data[idx], self.data[idx + 1])
    }

    #[inline]
    pub fn set_vector(&mut self, col: usize, row: usize, vector: FlowVector) {
        let idx = (row * self.width + col) * FLOW_CHANNELS;
        self.data[idx] = vector.u;
        self.data[idx + 1] = vector.v;
    }

    /// Interleaved samples of one row.
    pub fn row(&self, row: usize) -> &[f32] {
        let stride = self.width * FLOW_CHANNELS;
        &self.data[row * stride..(row + 1) * stride]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Iterate vectors in row-major order.
    pub fn vectors(&self) -> impl Iterator<Item = FlowVector> + '_ {
        self.data
            .chunks_exact(FLOW_CHANNELS)
            .map(|uv| FlowVector::new(uv[0], uv[1]))
    }

    /// Convert into a generic 2-band image.
    pub fn into_image(self) -> FloatImage {
        FloatImage::from_parts(self.width, self.height, FLOW_CHANNELS, self.data)
    }
}

impl TryFrom<FloatImage> for FlowField {
    type Error = FlowError;

    fn try_from(image: FloatImage) -> Result<Self, Self::Error> {
        if image.channels() != FLOW_CHANNELS {
            return Err(FlowError::InvalidChannelCount {
                channels: image.channels(),
            });
        }
        let (width, height) = (image.width(), image.height());
        Self::from_vec(width, height, image.into_vec())
    }
}

impl Raster for FlowField {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn channels(&self) -> usize {
        FLOW_CHANNELS
    }

    #[inline]
    fn sample(&self, col: usize, row: usize, channel: usize) -> f32 {
        self.data[(row * self.width + col) * FLOW_CHANNELS + channel]
    }
}

impl RasterMut for FlowField {
    #[inline]
    fn set_sample(&mut self, col: usize, row: usize, channel: usize, value: f32) {
        self.data[(row * self.width + col) * FLOW_CHANNELS + channel] = value;
    }
}

/// Summary statistics for a flow field.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStats {
    pub known_count: usize,
    pub unknown_count: usize,
    /// Mean magnitude over known vectors.
    pub mean_magnitude: f32,
    /// Max magnitude over known vectors.
    pub max_magnitude: f32,
}

impl FlowStats {
    pub fn compute(field: &FlowField) -> Self {
        let mut known_count = 0usize;
        let mut unknown_count = 0usize;
        let mut sum_mag = 0.0f64;
        let mut max_mag = 0.0f32;

        for vector in field.vectors() {
            if vector.is_unknown() {
                unknown_count += 1;
                continue;
            }
            let mag = vector.magnitude();
            known_count += 1;
            sum_mag += mag as f64;
            max_mag = max_mag.max(mag);
        }

        Self {
            known_count,
            unknown_count,
            mean_magnitude: if known_count > 0 {
                (sum_mag / known_count as f64) as f32
            } else {
                0.0
            },
            max_magnitude: max_mag,
        }
    }
}

impl std::fmt::Display for FlowStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} known, {} unknown, mean magnitude {:.4}, max magnitude {:.4}",
            self.known_count, self.unknown_count, self.mean_magnitude, self.max_magnitude
        )
    }
}
