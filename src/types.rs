//! Common types used throughout hicfetch

use crate::error::HicError;
use std::fmt;
use std::str::FromStr;

/// Coordinate system for matrix bins.
///
/// `.hic` containers store matrices binned either by base pairs or by
/// restriction-enzyme fragments; every resolution level is keyed by the
/// pair `(unit, bin size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Base-pair bins
    Bp,
    /// Restriction-fragment bins
    Frag,
}

impl Unit {
    /// The on-disk spelling of the unit (`"BP"` or `"FRAG"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Bp => "BP",
            Unit::Frag => "FRAG",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BP" => Ok(Unit::Bp),
            "FRAG" => Ok(Unit::Frag),
            other => Err(HicError::InvalidUnit(other.to_string())),
        }
    }
}

/// A named contig from the container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    /// Chromosome name as spelled in the file (e.g. `"1"`, `"chrX"`)
    pub name: String,
    /// Serial position in the header's chromosome table
    pub index: i32,
    /// Chromosome length in base pairs
    pub length: i64,
}

/// A nonzero contact-matrix cell in genomic coordinates.
///
/// `bin_x` and `bin_y` are the starts of the two bins in base pairs (or
/// fragment units for `FRAG` matrices), always nonnegative multiples of
/// the queried bin size. `counts` is the raw value, or the normalized
/// value when a normalization was requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// Genomic start of the row bin
    pub bin_x: i64,
    /// Genomic start of the column bin
    pub bin_y: i64,
    /// Contact count for the cell
    pub counts: f32,
}

/// Address of a byte range within the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    /// Absolute byte offset
    pub position: u64,
    /// Length in bytes
    pub size: u64,
}
