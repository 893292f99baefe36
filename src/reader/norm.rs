//! Normalization-vector decoding.
//!
//! A normalization vector is a length-prefixed array of per-bin divisors:
//! the count (int64 when version > 8, else int32) followed by the values
//! (float32 widened to float64 when version > 8, else float64). Absent
//! bins are stored as NaN and kept as-is; they surface as NaN or infinite
//! normalized counts rather than being dropped here.

use crate::error::{HicError, Result};
use crate::reader::cursor::Cursor;

/// Decode a normalization vector from its footer-addressed byte range.
pub(crate) fn parse_norm_vector(buf: &[u8], version: i32) -> Result<Vec<f64>> {
    let mut cur = Cursor::new(buf, "normalization vector");

    let n_values = if version > 8 {
        cur.read_i64()?
    } else {
        i64::from(cur.read_i32()?)
    };
    if n_values < 0 {
        return Err(HicError::BadFormat(format!(
            "negative normalization vector length {}",
            n_values
        )));
    }

    let width = if version > 8 { 4 } else { 8 };
    let estimate = (n_values as usize).min(cur.remaining() / width);
    let mut values = Vec::with_capacity(estimate);
    for _ in 0..n_values {
        let value = if version > 8 {
            f64::from(cur.read_f32()?)
        } else {
            cur.read_f64()?
        };
        values.push(value);
    }
    Ok(values)
}
