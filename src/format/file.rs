//! Path-level reading and writing of `.flo` files.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{FlowError, FlowResult};
use super::flo::{FloHeader, decode, encode};
use crate::compute::{FlowField, Raster};

/// File extension of flow files, including the dot.
pub const FLO_EXTENSION: &str = ".flo";

/// Suffix of the file name starting at its last dot, if any.
fn extension_of(path: &Path) -> Option<&[u8]> {
    let name = path.file_name()?.as_encoded_bytes();
    let dot = name.iter().rposition(|&b| b == b'.')?;
    Some(&name[dot..])
}

fn check_read_extension(path: &Path) -> FlowResult<()> {
    match extension_of(path) {
        Some(ext) if ext == FLO_EXTENSION.as_bytes() => Ok(()),
        _ => Err(FlowError::InvalidExtension {
            path: path.to_path_buf(),
        }),
    }
}

fn check_write_extension(path: &Path) -> FlowResult<()> {
    match extension_of(path) {
        None => Err(FlowError::MissingExtension {
            path: path.to_path_buf(),
        }),
        Some(ext) if ext != FLO_EXTENSION.as_bytes() => Err(FlowError::InvalidExtension {
            path: path.to_path_buf(),
        }),
        Some(_) => Ok(()),
    }
}

/// Read a `.flo` file into a flow field.
pub fn read_flow_file<P: AsRef<Path>>(path: P) -> FlowResult<FlowField> {
    let path = path.as_ref();
    check_read_extension(path)?;

    let file = File::open(path).map_err(|e| FlowError::io(0, e).in_file(path))?;
    let mut reader = BufReader::new(file);
    decode(&mut reader).map_err(|e| e.in_file(path))
}

/// Sibling path that receives the bytes until the write completes.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Run `write` against a buffered `<path>.partial` file and move it over
/// `path` once flushed. On failure the partial file is removed and `path` is
/// left as it was.
fn write_atomically<F>(path: &Path, end_offset: u64, write: F) -> FlowResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> FlowResult<()>,
{
    let partial = partial_path(path);
    let file = File::create(&partial).map_err(|e| FlowError::io(0, e))?;
    let mut writer = BufWriter::new(file);

    let result = write(&mut writer)
        .and_then(|()| writer.flush().map_err(|e| FlowError::io(end_offset, e)));
    drop(writer);

    let result = result
        .and_then(|()| fs::rename(&partial, path).map_err(|e| FlowError::io(end_offset, e)));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

/// Write a 2-band raster to a `.flo` file.
///
/// The raster is validated before any file is created, and a failed write
/// never leaves a partial `.flo` behind.
pub fn write_flow_file<R: Raster + ?Sized, P: AsRef<Path>>(raster: &R, path: P) -> FlowResult<()> {
    let path = path.as_ref();
    check_write_extension(path)?;
    let header = FloHeader::for_raster(raster).map_err(|e| e.in_file(path))?;

    write_atomically(path, header.file_size(), |w| encode(raster, w))
        .map_err(|e| e.in_file(path))
}
