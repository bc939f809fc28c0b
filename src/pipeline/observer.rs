//! Observers notified with every decoded flow field.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::compute::{FlowField, FlowStats};

/// Hook called by [`super::WarpPipeline`] after a flow field is decoded.
pub trait FlowObserver {
    fn on_flow(&mut self, flow: &FlowField) -> io::Result<()>;
}

/// Appends the u and v planes of every observed field to two text files.
///
/// Values are written column by column (all rows of column 0 first), each
/// followed by a single space.
#[derive(Debug, Clone)]
pub struct TextDumpObserver {
    x_path: PathBuf,
    y_path: PathBuf,
}

impl TextDumpObserver {
    pub fn new(x_path: impl Into<PathBuf>, y_path: impl Into<PathBuf>) -> Self {
        Self {
            x_path: x_path.into(),
            y_path: y_path.into(),
        }
    }

    fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }
}

/// Significant digits of a dumped sample.
const DUMP_PRECISION: usize = 6;

/// Drop trailing fractional zeros, and the dot if nothing follows it.
fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Write `value` in `%g` style: [`DUMP_PRECISION`] significant digits,
/// exponent form outside `[1e-4, 1e6)`, no trailing zeros.
fn write_sample<W: Write>(w: &mut W, value: f32) -> io::Result<()> {
    if value.is_nan() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return write!(w, "{sign}nan");
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return write!(w, "{sign}inf");
    }
    if value == 0.0 {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return write!(w, "{sign}0");
    }

    let value = f64::from(value);
    let scientific = format!("{:.*e}", DUMP_PRECISION - 1, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .ok_or_else(|| io::Error::other(format!("unexpected float form {scientific}")))?;
    let exponent: i32 = exponent.parse().map_err(io::Error::other)?;

    if exponent < -4 || exponent >= DUMP_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(w, "{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (DUMP_PRECISION as i32 - 1 - exponent) as usize;
        let fixed = format!("{value:.decimals$}");
        w.write_all(trim_fraction(&fixed).as_bytes())
    }
}

/// Write one band column-major.
pub fn write_plane<W: Write>(w: &mut W, flow: &FlowField, channel: usize) -> io::Result<()> {
    for col in 0..flow.width() {
        for row in 0..flow.height() {
            let vector = flow.vector(col, row);
            let value = if channel == 0 { vector.u } else { vector.v };
            write_sample(w, value)?;
            w.write_all(b" ")?;
        }
    }
    Ok(())
}

impl FlowObserver for TextDumpObserver {
    fn on_flow(&mut self, flow: &FlowField) -> io::Result<()> {
        for (channel, path) in [(0, &self.x_path), (1, &self.y_path)] {
            let mut w = Self::open_append(path)?;
            write_plane(&mut w, flow, channel)?;
            w.flush()?;
        }
        log::debug!(
            "dumped {}x{} flow to {} and {}",
            flow.width(),
            flow.height(),
            self.x_path.display(),
            self.y_path.display()
        );
        Ok(())
    }
}

/// Logs [`FlowStats`] of every observed field at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsLogObserver;

impl FlowObserver for StatsLogObserver {
    fn on_flow(&mut self, flow: &FlowField) -> io::Result<()> {
        let stats = FlowStats::compute(flow);
        log::info!("flow {}x{}: {}", flow.width(), flow.height(), stats);
        if stats.unknown_count > 0 {
            log::warn!(
                "{} unknown flow vectors will be handled by the unknown-flow policy",
                stats.unknown_count
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::FlowVector;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_plane_is_column_major() {
        let flow = FlowField::from_fn(2, 2, |c, r| FlowVector::new((c * 10 + r) as f32, -1.5))
            .unwrap();

        let mut out = Vec::new();
        write_plane(&mut out, &flow, 0).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1 10 11 ");

        let mut out = Vec::new();
        write_plane(&mut out, &flow, 1).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "-1.5 -1.5 -1.5 -1.5 ");
    }

    fn sample_text(value: f32) -> String {
        let mut out = Vec::new();
        write_sample(&mut out, value).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_sample_uses_six_significant_digits() {
        assert_eq!(sample_text(1.0), "1");
        assert_eq!(sample_text(-0.5), "-0.5");
        assert_eq!(sample_text(0.1), "0.1");
        assert_eq!(sample_text(3.14159265), "3.14159");
        assert_eq!(sample_text(123456.7), "123457");
        assert_eq!(sample_text(0.0001), "0.0001");
    }

    #[test]
    fn test_sample_exponent_form() {
        assert_eq!(sample_text(1e10), "1e+10");
        assert_eq!(sample_text(1234567.0), "1.23457e+06");
        assert_eq!(sample_text(999999.7), "1e+06");
        assert_eq!(sample_text(0.00001), "1e-05");
        assert_eq!(sample_text(-2.5e-7), "-2.5e-07");
    }

    #[test]
    fn test_sample_special_values() {
        assert_eq!(sample_text(0.0), "0");
        assert_eq!(sample_text(-0.0), "-0");
        assert_eq!(sample_text(f32::NAN), "nan");
        assert_eq!(sample_text(f32::INFINITY), "inf");
        assert_eq!(sample_text(f32::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_dump_appends() {
        let dir = tempdir().unwrap();
        let x = dir.path().join("x.txt");
        let y = dir.path().join("y.txt");
        let mut observer = TextDumpObserver::new(&x, &y);

        let flow = FlowField::from_fn(2, 1, |c, _| FlowVector::new(c as f32, 0.25)).unwrap();
        observer.on_flow(&flow).unwrap();
        observer.on_flow(&flow).unwrap();

        assert_eq!(fs::read_to_string(&x).unwrap(), "0 1 0 1 ");
        assert_eq!(fs::read_to_string(&y).unwrap(), "0.25 0.25 0.25 0.25 ");
    }

    #[test]
    fn test_stats_observer_never_fails() {
        let mut flow = FlowField::new(2, 2).unwrap();
        flow.set_vector(0, 0, FlowVector::new(f32::NAN, 0.0));
        assert!(StatsLogObserver.on_flow(&flow).is_ok());
    }
}
