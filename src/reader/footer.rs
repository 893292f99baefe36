//! `.hic` footer parsing.
//!
//! The footer starts at the master index position and holds, in order:
//!
//! ```text
//! - nBytes: int64 if version > 8, else int32 (total footer size; skipped)
//! - master index: int32 count of (key, offset, size) entries, where key
//!   is the string "{c1}_{c2}" for chromosome indices c1 <= c2
//! - expected-value maps: two sections, skipped entirely; the second
//!   carries an extra leading type string per entry
//! - normalization vector index: int32 count of
//!   (normType, chrIdx, unit, resolution, position, size) entries
//! ```
//!
//! The caller hands in the full `[master, end-of-file)` byte range; when
//! the requested normalization is `NONE` parsing stops right after the
//! master index, which is why the expected-value sections can be skipped
//! lazily.

use crate::error::{HicError, Result};
use crate::reader::cursor::Cursor;
use crate::types::{IndexEntry, Unit};

/// What a query needs out of the footer.
#[derive(Debug)]
pub(crate) struct Footer {
    /// Offset of the chromosome-pair matrix metadata.
    pub matrix_position: u64,
    /// Normalization vector for the first (lower-index) chromosome.
    pub c1_norm: Option<IndexEntry>,
    /// Normalization vector for the second chromosome.
    pub c2_norm: Option<IndexEntry>,
}

/// Parse the footer for one `(c1, c2, norm, unit, resolution)` lookup.
///
/// `c1` and `c2` must already be ordered `c1 <= c2`. Norm entries are
/// reported as `None` when absent; policy for missing vectors belongs to
/// the orchestrator.
pub(crate) fn parse_footer(
    buf: &[u8],
    version: i32,
    c1: i32,
    c2: i32,
    norm: &str,
    unit: Unit,
    resolution: i32,
) -> Result<Footer> {
    let mut cur = Cursor::new(buf, "footer");

    // total footer size, not needed for navigation
    if version > 8 {
        cur.read_i64()?;
    } else {
        cur.read_i32()?;
    }

    let key = format!("{}_{}", c1, c2);
    let n_entries = cur.read_i32()?;
    if n_entries < 0 {
        return Err(HicError::BadFormat(format!(
            "negative master index entry count {}",
            n_entries
        )));
    }

    let mut matrix_position = None;
    for _ in 0..n_entries {
        let entry_key = cur.read_cstring()?;
        let position = cur.read_i64()?;
        cur.read_i32()?; // size in bytes
        if entry_key == key {
            matrix_position = Some(position as u64);
        }
    }
    let matrix_position = matrix_position.ok_or(HicError::MatrixNotFound(key))?;

    if norm == "NONE" {
        return Ok(Footer {
            matrix_position,
            c1_norm: None,
            c2_norm: None,
        });
    }

    skip_expected_value_map(&mut cur, version, false)?;
    skip_expected_value_map(&mut cur, version, true)?;

    let n_entries = cur.read_i32()?;
    if n_entries < 0 {
        return Err(HicError::BadFormat(format!(
            "negative normalization index entry count {}",
            n_entries
        )));
    }

    let mut c1_norm = None;
    let mut c2_norm = None;
    for _ in 0..n_entries {
        let norm_type = cur.read_cstring()?;
        let chr_index = cur.read_i32()?;
        let entry_unit = cur.read_cstring()?;
        let entry_resolution = cur.read_i32()?;
        let position = cur.read_i64()?;
        let size = if version > 8 {
            cur.read_i64()?
        } else {
            i64::from(cur.read_i32()?)
        };

        if norm_type != norm || entry_unit != unit.as_str() || entry_resolution != resolution {
            continue;
        }
        let entry = IndexEntry {
            position: position as u64,
            size: size as u64,
        };
        if chr_index == c1 {
            c1_norm = Some(entry);
        }
        if chr_index == c2 {
            c2_norm = Some(entry);
        }
    }

    Ok(Footer {
        matrix_position,
        c1_norm,
        c2_norm,
    })
}

/// Skip one expected-value map section.
///
/// Entry layout: optional type string (second section only), unit string,
/// bin size, value count (i64 when version > 8, else i32), the values
/// (f32 when version > 8, else f64), then the per-chromosome scale
/// factors (chrIdx: i32 plus one value of the same width).
fn skip_expected_value_map(cur: &mut Cursor<'_>, version: i32, has_type_string: bool) -> Result<()> {
    let value_width = if version > 8 { 4 } else { 8 };

    let n_maps = cur.read_i32()?;
    if n_maps < 0 {
        return Err(HicError::BadFormat(format!(
            "negative expected-value map count {}",
            n_maps
        )));
    }

    for _ in 0..n_maps {
        if has_type_string {
            cur.read_cstring()?;
        }
        cur.read_cstring()?; // unit
        cur.read_i32()?; // bin size

        let n_values = if version > 8 {
            cur.read_i64()?
        } else {
            i64::from(cur.read_i32()?)
        };
        if n_values < 0 {
            return Err(HicError::BadFormat(format!(
                "negative expected-value count {}",
                n_values
            )));
        }
        cur.skip(n_values as usize * value_width)?;

        let n_factors = cur.read_i32()?;
        if n_factors < 0 {
            return Err(HicError::BadFormat(format!(
                "negative normalization factor count {}",
                n_factors
            )));
        }
        cur.skip(n_factors as usize * (4 + value_width))?;
    }

    Ok(())
}
