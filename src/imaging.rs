//! Raster file adapter backed by the `image` crate.
//!
//! The codec and the warp never touch image files; this adapter converts
//! between PNG/JPEG/etc. on disk and [`FloatImage`] for the command-line tool.

use std::path::{Path, PathBuf};

use crate::compute::{FloatImage, Raster};

/// Errors raised while loading or saving raster files.
#[derive(Debug, thiserror::Error)]
pub enum ImageIoError {
    #[error("failed to read image '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot save a {channels}-channel image as RGB")]
    UnsupportedChannels { channels: usize },

    #[error("image dimensions {width}x{height} exceed the supported range")]
    TooLarge { width: usize, height: usize },
}

/// Load any supported raster file as a 3-channel image with samples in `[0, 1]`.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<FloatImage, ImageIoError> {
    let path = path.as_ref();
    let rgb = image::open(path)
        .map_err(|source| ImageIoError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb32f();

    let (width, height) = rgb.dimensions();
    Ok(FloatImage::from_parts(
        width as usize,
        height as usize,
        3,
        rgb.into_raw(),
    ))
}

/// Save a 3-channel image, clamping samples to `[0, 1]` and quantising to
/// 8 bits. The format follows the file extension.
pub fn save_rgb<P: AsRef<Path>>(img: &FloatImage, path: P) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    if img.channels() != 3 {
        return Err(ImageIoError::UnsupportedChannels {
            channels: img.channels(),
        });
    }

    let too_large = || ImageIoError::TooLarge {
        width: img.width(),
        height: img.height(),
    };
    let width = u32::try_from(img.width()).map_err(|_| too_large())?;
    let height = u32::try_from(img.height()).map_err(|_| too_large())?;
    let buffer =
        image::Rgb32FImage::from_raw(width, height, img.data().to_vec()).ok_or_else(too_large)?;

    image::DynamicImage::ImageRgb32F(buffer)
        .to_rgb8()
        .save(path)
        .map_err(|source| ImageIoError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_png_roundtrip_quantises() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gradient.png");

        let img = FloatImage::from_fn(4, 2, 3, |c, r, ch| match ch {
            0 => c as f32 / 3.0,
            1 => r as f32,
            _ => 2.0,
        });
        save_rgb(&img, &path).unwrap();

        let loaded = load_rgb(&path).unwrap();
        assert_eq!(loaded.width(), 4);
        assert_eq!(loaded.height(), 2);
        assert_eq!(loaded.channels(), 3);
        assert_eq!(loaded.sample(3, 0, 0), 1.0);
        assert_eq!(loaded.sample(0, 1, 1), 1.0);
        // Out-of-range samples are clamped.
        assert_eq!(loaded.sample(2, 1, 2), 1.0);
        assert!((loaded.sample(1, 0, 0) - 85.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_save_rejects_two_band_image() {
        let dir = tempdir().unwrap();
        let err = save_rgb(&FloatImage::new(2, 2, 2), dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, ImageIoError::UnsupportedChannels { channels: 2 }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_rgb(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, ImageIoError::Read { .. }));
    }
}
