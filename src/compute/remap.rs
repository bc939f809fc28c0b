//! Nearest-neighbour backward warping of an image by a flow field.
//!
//! Every destination pixel `(c, r)` pulls its value from the source pixel at
//! `(c + u, r + v)`, rounded to the nearest integer and clamped to the image.
//! No interpolation, no blending.

use rayon::prelude::*;

use super::field::{FlowField, FlowVector, UNKNOWN_FLOW_THRESH};
use super::raster::{FloatImage, Raster};
use crate::format::{FlowError, FlowResult};
use crate::schema::{UnknownFlowPolicy, WarpConfig};

/// Whether the warp refuses to address with this vector.
///
/// Unlike [`FlowVector::is_unknown`] the threshold itself already counts as
/// unknown here.
#[inline]
fn is_unaddressable(vector: FlowVector) -> bool {
    vector.u.abs() >= UNKNOWN_FLOW_THRESH
        || vector.v.abs() >= UNKNOWN_FLOW_THRESH
        || vector.u.is_nan()
        || vector.v.is_nan()
}

/// Round half away from zero, then clamp into `[0, size - 1]`.
///
/// Both bounds are checked against the unclamped rounded value.
#[inline]
fn clamp_axis(target: f32, size: usize) -> usize {
    let rounded = target.round() as i64;
    if rounded < 0 {
        0
    } else if rounded >= size as i64 {
        size - 1
    } else {
        rounded as usize
    }
}

/// Source pixel that destination `(col, row)` samples, or `None` if the flow
/// vector is unknown.
#[inline]
pub fn source_coord(
    col: usize,
    row: usize,
    vector: FlowVector,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    if is_unaddressable(vector) {
        return None;
    }
    Some((
        clamp_axis(col as f32 + vector.u, width),
        clamp_axis(row as f32 + vector.v, height),
    ))
}

/// Fill one destination row.
#[inline]
fn warp_row<S: Raster + ?Sized>(
    flow: &FlowField,
    source: &S,
    row: usize,
    out: &mut [f32],
    policy: UnknownFlowPolicy,
) {
    let width = flow.width();
    let height = flow.height();
    let channels = source.channels();

    for (col, pixel) in out.chunks_exact_mut(channels).enumerate() {
        let (sc, sr) = match source_coord(col, row, flow.vector(col, row), width, height) {
            Some(coord) => coord,
            None => match policy {
                UnknownFlowPolicy::Origin => (0, 0),
                UnknownFlowPolicy::Skip => continue,
                UnknownFlowPolicy::Fill { value } => {
                    pixel.fill(value);
                    continue;
                }
            },
        };
        for (channel, dst) in pixel.iter_mut().enumerate() {
            *dst = source.sample(sc, sr, channel);
        }
    }
}

/// Warp `source` by `flow` with the default configuration.
///
/// Unknown flow samples the source origin.
pub fn warp<S: Raster + Sync + ?Sized>(flow: &FlowField, source: &S) -> FlowResult<FloatImage> {
    warp_with(flow, source, &WarpConfig::default())
}

/// Warp `source` by `flow`.
///
/// The output has the source's dimensions and channel count. Fails with
/// [`FlowError::DimensionMismatch`] when the flow and source sizes differ.
pub fn warp_with<S: Raster + Sync + ?Sized>(
    flow: &FlowField,
    source: &S,
    config: &WarpConfig,
) -> FlowResult<FloatImage> {
    if source.width() != flow.width() || source.height() != flow.height() {
        return Err(FlowError::DimensionMismatch {
            flow_width: flow.width(),
            flow_height: flow.height(),
            image_width: source.width(),
            image_height: source.height(),
        });
    }

    let channels = source.channels();
    let mut output = FloatImage::new(flow.width(), flow.height(), channels);
    if channels == 0 {
        return Ok(output);
    }

    let stride = flow.width() * channels;
    let policy = config.unknown_policy;

    if config.parallel {
        // Rows are disjoint; source and flow are only read.
        output
            .data_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, out)| warp_row(flow, source, row, out, policy));
    } else {
        for (row, out) in output.data_mut().chunks_mut(stride).enumerate() {
            warp_row(flow, source, row, out, policy);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FlowErrorKind, decode, encode_to_vec};
    use std::io::Cursor;

    /// Source whose pixel (c, r) holds (c, r, 100*r + c).
    fn coord_image(width: usize, height: usize) -> FloatImage {
        FloatImage::from_fn(width, height, 3, |c, r, ch| match ch {
            0 => c as f32,
            1 => r as f32,
            _ => (100 * r + c) as f32,
        })
    }

    fn sequential() -> WarpConfig {
        WarpConfig {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_flow() {
        let flow = FlowField::new(7, 5).unwrap();
        let source = coord_image(7, 5);

        let out = warp(&flow, &source).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_uniform_shift() {
        let flow = FlowField::from_fn(6, 4, |_, _| FlowVector::new(1.0, 2.0)).unwrap();
        let source = coord_image(6, 4);

        let out = warp(&flow, &source).unwrap();

        assert_eq!(out.pixel(0, 0), source.pixel(1, 2));
        assert_eq!(out.pixel(3, 1), source.pixel(4, 3));
        // Clamped at the right and bottom edges.
        assert_eq!(out.pixel(5, 3), source.pixel(5, 3));
    }

    #[test]
    fn test_clamp_beyond_right_edge() {
        let mut flow = FlowField::new(5, 1).unwrap();
        flow.set_vector(4, 0, FlowVector::new(10.0, 0.0));

        assert_eq!(source_coord(4, 0, FlowVector::new(10.0, 0.0), 5, 1), Some((4, 0)));
        let out = warp(&flow, &coord_image(5, 1)).unwrap();
        assert_eq!(out.sample(4, 0, 0), 4.0);
    }

    #[test]
    fn test_clamp_below_zero() {
        assert_eq!(source_coord(2, 3, FlowVector::new(-7.0, -3.6), 5, 5), Some((0, 0)));
        assert_eq!(source_coord(2, 3, FlowVector::new(-2.4, -3.4), 5, 5), Some((0, 0)));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        // 1 + 0.5 = 1.5 -> 2; 3 - 2.5 = 0.5 -> 1
        assert_eq!(source_coord(1, 3, FlowVector::new(0.5, -2.5), 10, 10), Some((2, 1)));
        // 0 - 0.5 = -0.5 -> -1 -> clamped to 0
        assert_eq!(source_coord(0, 0, FlowVector::new(-0.5, 0.49), 10, 10), Some((0, 0)));
        assert_eq!(source_coord(4, 4, FlowVector::new(0.49, -0.51), 10, 10), Some((4, 3)));
    }

    #[test]
    fn test_unknown_flow_samples_origin() {
        let mut flow = FlowField::new(4, 3).unwrap();
        flow.set_vector(3, 2, FlowVector::new(2e9, 0.0));
        flow.set_vector(1, 1, FlowVector::new(0.0, f32::NAN));
        let source = coord_image(4, 3);

        let out = warp(&flow, &source).unwrap();

        assert_eq!(out.pixel(3, 2), source.pixel(0, 0));
        assert_eq!(out.pixel(1, 1), source.pixel(0, 0));
        assert_eq!(out.pixel(2, 2), source.pixel(2, 2));
    }

    #[test]
    fn test_threshold_itself_is_unaddressable() {
        assert_eq!(source_coord(2, 0, FlowVector::new(1e9, 0.0), 5, 1), None);
        assert_eq!(source_coord(2, 0, FlowVector::new(0.0, -1e9), 5, 1), None);
        assert_eq!(source_coord(2, 0, FlowVector::new(f32::INFINITY, 0.0), 5, 1), None);
        assert!(source_coord(2, 0, FlowVector::new(9.9e8, 0.0), 5, 1).is_some());
    }

    #[test]
    fn test_skip_and_fill_policies() {
        let mut flow = FlowField::new(3, 1).unwrap();
        flow.set_vector(1, 0, FlowVector::new(-2e9, 0.0));
        let source = FloatImage::filled(3, 1, 3, 9.0);

        let skip = WarpConfig {
            unknown_policy: UnknownFlowPolicy::Skip,
            ..sequential()
        };
        let out = warp_with(&flow, &source, &skip).unwrap();
        assert_eq!(out.pixel(1, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(out.pixel(0, 0), &[9.0, 9.0, 9.0]);

        let fill = WarpConfig {
            unknown_policy: UnknownFlowPolicy::Fill { value: -1.0 },
            ..sequential()
        };
        let out = warp_with(&flow, &source, &fill).unwrap();
        assert_eq!(out.pixel(1, 0), &[-1.0, -1.0, -1.0]);
        assert_eq!(out.pixel(2, 0), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let flow = FlowField::new(4, 4).unwrap();
        let err = warp(&flow, &coord_image(4, 5)).unwrap_err();
        assert_eq!(err.kind(), FlowErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_output_keeps_channel_count() {
        let flow = FlowField::new(3, 2).unwrap();
        let rgba = FloatImage::filled(3, 2, 4, 0.5);

        let out = warp(&flow, &rgba).unwrap();
        assert_eq!(out.channels(), 4);
        assert_eq!(out, rgba);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (w, h) = (37, 23);
        let flow = FlowField::from_fn(w, h, |c, r| {
            if (c + r) % 11 == 0 {
                FlowVector::new(3e9, 0.0)
            } else {
                FlowVector::new((c as f32 * 0.7).sin() * 9.0, (r as f32 * 1.3).cos() * 6.5)
            }
        })
        .unwrap();
        let source = coord_image(w, h);

        let parallel = warp(&flow, &source).unwrap();
        let serial = warp_with(&flow, &source, &sequential()).unwrap();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_end_to_end_five_by_one() {
        let mut field = FlowField::new(5, 1).unwrap();
        field.set_vector(0, 0, FlowVector::new(-5.0, 0.0));

        let bytes = encode_to_vec(&field).unwrap();
        let decoded = decode(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded.vector(0, 0).u, -5.0);

        let source = FloatImage::from_fn(5, 1, 3, |c, _, ch| (c * 10 + ch) as f32);
        let out = warp(&decoded, &source).unwrap();
        assert_eq!(out, source);
    }
}
