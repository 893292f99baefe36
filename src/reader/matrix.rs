//! Locating one resolution level of a chromosome-pair matrix.
//!
//! Matrix metadata at the footer-supplied offset:
//!
//! ```text
//! - c1: int32, c2: int32, nResolutions: int32
//! - per resolution:
//!   - unit: NUL-terminated string ("BP" or "FRAG")
//!   - zoom index: int32 (legacy, unused)
//!   - sumCounts, occupiedCellCount, stdDev, percent95: float32 (unused)
//!   - binSize, blockBinCount, blockColumnCount: int32
//!   - nBlocks: int32, then (blockNumber: int32, position: int64,
//!     size: int32) per block
//! ```
//!
//! The unit string's length is not knowable in advance, so the locator
//! probes a single byte to discriminate `B`/`F` before fetching the
//! fixed-size remainder of the entry. Non-matching resolutions are
//! skipped by advancing the offset past their block tables rather than
//! parsing them.

use crate::error::{HicError, Result};
use crate::io::ByteSource;
use crate::reader::cursor::Cursor;
use crate::types::{IndexEntry, Unit};
use std::collections::BTreeMap;

/// Bytes per block-index entry: blockNumber + position + size.
const BLOCK_INDEX_ENTRY_SIZE: usize = 4 + 8 + 4;

/// One resolution level of a chromosome-pair matrix, with its block index.
#[derive(Debug)]
pub(crate) struct ZoomIndex {
    pub bin_size: i32,
    pub block_bin_count: i32,
    pub block_column_count: i32,
    pub blocks: BTreeMap<i32, IndexEntry>,
}

/// Walk the resolution entries at `matrix_position` until one matches
/// `(unit, bin_size)` and return its geometry and block index.
pub(crate) fn locate_zoom(
    source: &mut ByteSource,
    matrix_position: u64,
    unit: Unit,
    bin_size: i32,
) -> Result<ZoomIndex> {
    let head = source.read_at(matrix_position, 12)?;
    let mut cur = Cursor::new(&head, "matrix header");
    cur.read_i32()?; // c1
    cur.read_i32()?; // c2
    let n_resolutions = cur.read_i32()?;
    if n_resolutions < 0 {
        return Err(HicError::BadFormat(format!(
            "negative resolution count {}",
            n_resolutions
        )));
    }

    let mut pos = matrix_position + 12;
    for _ in 0..n_resolutions {
        let probe = source.read_at(pos, 1)?;
        let unit_len = match probe[0] {
            b'B' => 3, // "BP\0"
            b'F' => 5, // "FRAG\0"
            other => {
                return Err(HicError::BadFormat(format!(
                    "unrecognized unit tag {:#04x} in resolution entry",
                    other
                )))
            }
        };
        let header_size = 5 * 4 + 4 * 4 + unit_len;

        let entry = source.read_at(pos, header_size)?;
        let mut cur = Cursor::new(&entry, "resolution entry");
        let entry_unit = cur.read_cstring()?;
        cur.read_i32()?; // legacy zoom index
        cur.skip(16)?; // summary statistics
        let entry_bin_size = cur.read_i32()?;
        let block_bin_count = cur.read_i32()?;
        let block_column_count = cur.read_i32()?;
        let n_blocks = cur.read_i32()?;
        if n_blocks < 0 {
            return Err(HicError::BadFormat(format!(
                "negative block count {}",
                n_blocks
            )));
        }
        let table_size = n_blocks as usize * BLOCK_INDEX_ENTRY_SIZE;

        if entry_unit == unit.as_str() && entry_bin_size == bin_size {
            let table = source.read_at(pos + header_size as u64, table_size)?;
            let mut cur = Cursor::new(&table, "block index");
            let mut blocks = BTreeMap::new();
            for _ in 0..n_blocks {
                let number = cur.read_i32()?;
                let position = cur.read_i64()?;
                let size = cur.read_i32()?;
                blocks.insert(
                    number,
                    IndexEntry {
                        position: position as u64,
                        size: size as u64,
                    },
                );
            }
            return Ok(ZoomIndex {
                bin_size: entry_bin_size,
                block_bin_count,
                block_column_count,
                blocks,
            });
        }

        pos += (header_size + table_size) as u64;
    }

    Err(HicError::ResolutionNotFound { unit, bin_size })
}
