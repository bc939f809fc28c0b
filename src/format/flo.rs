//! Binary codec for `.flo` optical flow files.

use std::io::{self, Read, Write};

use super::error::{Axis, FlowError, FlowResult};
use crate::compute::{FLOW_CHANNELS, FlowField, Raster, check_dimension};

/// Tag value every `.flo` file starts with, read as a little-endian `f32`.
pub const FLO_TAG: f32 = 202021.25;

/// ASCII spelling of [`FLO_TAG`], written at the start of every file.
pub const FLO_TAG_BYTES: &[u8; 4] = b"PIEH";

/// Validated `.flo` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloHeader {
    pub width: usize,
    pub height: usize,
}

impl FloHeader {
    /// Size of header in bytes.
    /// Tag(4) + Width(4) + Height(4) = 12
    pub const SIZE: usize = 12;

    /// Parse and validate the 12 header bytes.
    ///
    /// Checks the tag first, then width, then height.
    pub fn parse(bytes: &[u8; FloHeader::SIZE]) -> FlowResult<Self> {
        let tag = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if f32::from_le_bytes(tag) != FLO_TAG {
            return Err(FlowError::BadTag { found: tag });
        }

        let width = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let height = i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        Ok(Self {
            width: check_dimension(Axis::Width, width as i64)?,
            height: check_dimension(Axis::Height, height as i64)?,
        })
    }

    /// Header for a raster about to be encoded.
    pub fn for_raster<R: Raster + ?Sized>(raster: &R) -> FlowResult<Self> {
        if raster.channels() != FLOW_CHANNELS {
            return Err(FlowError::InvalidChannelCount {
                channels: raster.channels(),
            });
        }
        Ok(Self {
            width: check_dimension(Axis::Width, raster.width() as i64)?,
            height: check_dimension(Axis::Height, raster.height() as i64)?,
        })
    }

    /// Number of `f32` values in one row of payload.
    pub fn row_len(&self) -> usize {
        self.width * FLOW_CHANNELS
    }

    /// Byte offset of the first sample of `row`.
    pub fn row_offset(&self, row: usize) -> u64 {
        Self::SIZE as u64 + (row * self.row_len() * 4) as u64
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.row_offset(self.height)
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> FlowResult<()> {
        w.write_all(FLO_TAG_BYTES).map_err(|e| FlowError::io(0, e))?;
        w.write_all(&(self.width as i32).to_le_bytes())
            .map_err(|e| FlowError::io(4, e))?;
        w.write_all(&(self.height as i32).to_le_bytes())
            .map_err(|e| FlowError::io(8, e))?;
        Ok(())
    }
}

/// Fill `buf` from `r`, stopping early only at end of stream.
///
/// Returns the number of bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decode a complete `.flo` stream.
///
/// The stream must hold exactly one header and its payload; anything after
/// the last row is an error.
pub fn decode<R: Read>(r: &mut R) -> FlowResult<FlowField> {
    let mut bytes = [0u8; FloHeader::SIZE];
    let read = read_full(r, &mut bytes).map_err(|e| FlowError::io(0, e))?;
    if read < FloHeader::SIZE {
        return Err(FlowError::TruncatedHeader { read });
    }
    let header = FloHeader::parse(&bytes)?;

    let row_len = header.row_len();
    let mut data: Vec<f32> = Vec::new();

    // Grow only with rows the stream actually delivers.
    for row in 0..header.height {
        data.try_reserve(row_len).map_err(|_| {
            FlowError::io(
                header.row_offset(row),
                io::Error::from(io::ErrorKind::OutOfMemory),
            )
        })?;
        let start = data.len();
        data.resize(start + row_len, 0.0);
        // Read straight into the float storage; byte order is fixed up below.
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut data[start..]);
        let read = read_full(r, dst).map_err(|e| FlowError::io(header.row_offset(row), e))?;
        if read < dst.len() {
            return Err(FlowError::TruncatedData { row });
        }
    }

    if cfg!(target_endian = "big") {
        for v in &mut data {
            *v = f32::from_bits(u32::from_le(v.to_bits()));
        }
    }

    let mut peek = [0u8; 1];
    let extra = read_full(r, &mut peek).map_err(|e| FlowError::io(header.file_size(), e))?;
    if extra > 0 {
        return Err(FlowError::TrailingData);
    }

    Ok(FlowField::from_parts(header.width, header.height, data))
}

/// Encode a 2-band raster as a `.flo` stream.
///
/// Nothing is written unless the raster has exactly two bands and valid
/// dimensions.
pub fn encode<W: Write, R: Raster + ?Sized>(raster: &R, w: &mut W) -> FlowResult<()> {
    let header = FloHeader::for_raster(raster)?;
    header.write_to(w)?;

    let mut row_bytes = Vec::with_capacity(header.row_len() * 4);
    for row in 0..header.height {
        row_bytes.clear();
        for col in 0..header.width {
            for channel in 0..FLOW_CHANNELS {
                row_bytes.extend_from_slice(&raster.sample(col, row, channel).to_le_bytes());
            }
        }
        w.write_all(&row_bytes)
            .map_err(|e| FlowError::io(header.row_offset(row), e))?;
    }

    Ok(())
}

/// Encode into a fresh byte vector.
pub fn encode_to_vec<R: Raster + ?Sized>(raster: &R) -> FlowResult<Vec<u8>> {
    let header = FloHeader::for_raster(raster)?;
    let mut bytes = Vec::with_capacity(header.file_size() as usize);
    encode(raster, &mut bytes)?;
    Ok(bytes)
}
