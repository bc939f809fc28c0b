//! Minimal multi-band float raster capability and an owned implementation.
//!
//! The codec and the warp only address pixels through [`Raster`] and
//! [`RasterMut`], so any image library can be plugged in by implementing
//! these traits for its buffer type.

/// Read access to a row-major `width x height x channels` float buffer.
pub trait Raster {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn channels(&self) -> usize;

    /// Sample at column `col`, row `row`, band `channel`.
    ///
    /// Callers guarantee the coordinates are in bounds.
    fn sample(&self, col: usize, row: usize, channel: usize) -> f32;
}

/// Write access on top of [`Raster`].
pub trait RasterMut: Raster {
    fn set_sample(&mut self, col: usize, row: usize, channel: usize, value: f32);
}

/// Owned row-major float image with interleaved channels.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl FloatImage {
    /// Create a zero-filled image.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self::filled(width, height, channels, 0.0)
    }

    /// Create an image with every sample set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, value: f32) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![value; width * height * channels],
        }
    }

    /// Wrap an existing buffer. Returns `None` when its length does not match
    /// `width * height * channels`.
    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(channels)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub(crate) fn from_parts(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Build an image by evaluating `f(col, row, channel)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(width * height * channels);
        for row in 0..height {
            for col in 0..width {
                for channel in 0..channels {
                    data.push(f(col, row, channel));
                }
            }
        }
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    #[inline]
    fn index(&self, col: usize, row: usize, channel: usize) -> usize {
        (row * self.width + col) * self.channels + channel
    }

    /// All channels of one pixel.
    pub fn pixel(&self, col: usize, row: usize) -> &[f32] {
        let start = self.index(col, row, 0);
        &self.data[start..start + self.channels]
    }

    /// One row of interleaved samples.
    pub fn row(&self, row: usize) -> &[f32] {
        let stride = self.width * self.channels;
        &self.data[row * stride..(row + 1) * stride]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl Raster for FloatImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    fn sample(&self, col: usize, row: usize, channel: usize) -> f32 {
        self.data[self.index(col, row, channel)]
    }
}

impl RasterMut for FloatImage {
    #[inline]
    fn set_sample(&mut self, col: usize, row: usize, channel: usize, value: f32) {
        let idx = self.index(col, row, channel);
        self.data[idx] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(FloatImage::from_vec(2, 2, 3, vec![0.0; 11]).is_none());
        assert!(FloatImage::from_vec(2, 2, 3, vec![0.0; 12]).is_some());
    }

    #[test]
    fn test_interleaved_layout() {
        let img = FloatImage::from_fn(3, 2, 2, |c, r, ch| (r * 100 + c * 10 + ch) as f32);

        assert_eq!(img.sample(2, 1, 1), 121.0);
        assert_eq!(img.pixel(1, 0), &[10.0, 11.0]);
        assert_eq!(img.row(1), &[100.0, 101.0, 110.0, 111.0, 120.0, 121.0]);
    }

    #[test]
    fn test_set_sample() {
        let mut img = FloatImage::new(4, 4, 3);
        img.set_sample(3, 2, 2, 7.5);

        assert_eq!(img.sample(3, 2, 2), 7.5);
        assert_eq!(img.data().iter().filter(|&&v| v != 0.0).count(), 1);
    }
}
