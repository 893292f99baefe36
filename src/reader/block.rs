//! Block decompression and record decoding.
//!
//! A block is a zlib-compressed payload holding the nonzero cells of one
//! matrix tile. The decompressed payload begins with the record count in
//! every format version:
//!
//! ```text
//! - nRecords: int32
//! - version < 7: nRecords x (binX: int32, binY: int32, counts: float32)
//! - version >= 7:
//!   - binXOffset: int32, binYOffset: int32
//!   - useShort: byte (0 means counts are int16, nonzero means float32)
//!   - [version > 8] useShortBinX, useShortBinY: byte, same convention
//!   - type: byte
//!     - 1: list of rows; row count, then per row the bin-Y delta, a
//!       column count, and per column the bin-X delta and the count
//!     - 2: dense grid; nPts: int32, width: int16, then nPts values in
//!       row-major order with -32768 (int16) or NaN (float32) marking
//!       absent cells
//! ```
//!
//! Bin deltas and row/column counts are int16 when the corresponding
//! `useShortBin*` flag is set, int32 otherwise; versions 7 and 8 always
//! use int16.

use crate::error::{HicError, Result};
use crate::reader::cursor::Cursor;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Sentinel for an absent cell in a dense int16 grid.
const SHORT_SENTINEL: i16 = -32768;

/// A nonzero cell in bin coordinates, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawRecord {
    pub bin_x: i32,
    pub bin_y: i32,
    pub counts: f32,
}

/// Decompress a block payload.
///
/// The output buffer is pre-sized to ten times the compressed length —
/// comfortably above observed expansion ratios — and grows past that if a
/// block turns out denser.
pub(crate) fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(10));
    ZlibDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| HicError::Inflate(e.to_string()))?;
    Ok(out)
}

/// Decode the records of a decompressed block.
pub(crate) fn decode_block(data: &[u8], version: i32) -> Result<Vec<RawRecord>> {
    let mut cur = Cursor::new(data, "block");
    let n_records = cur.read_i32()?;

    let estimate = (n_records.max(0) as usize).min(cur.remaining() / 4);
    let mut records = Vec::with_capacity(estimate);

    if version < 7 {
        for _ in 0..n_records {
            let bin_x = cur.read_i32()?;
            let bin_y = cur.read_i32()?;
            let counts = cur.read_f32()?;
            records.push(RawRecord {
                bin_x,
                bin_y,
                counts,
            });
        }
        return Ok(records);
    }

    let bin_x_offset = cur.read_i32()?;
    let bin_y_offset = cur.read_i32()?;
    let use_short = cur.read_u8()? == 0;
    let (use_short_bin_x, use_short_bin_y) = if version > 8 {
        (cur.read_u8()? == 0, cur.read_u8()? == 0)
    } else {
        (true, true)
    };

    let block_type = cur.read_u8()?;
    match block_type {
        1 => {
            let row_count = read_bin_value(&mut cur, use_short_bin_y)?;
            for _ in 0..row_count {
                let bin_y = bin_y_offset + read_bin_value(&mut cur, use_short_bin_y)?;
                let col_count = read_bin_value(&mut cur, use_short_bin_x)?;
                for _ in 0..col_count {
                    let bin_x = bin_x_offset + read_bin_value(&mut cur, use_short_bin_x)?;
                    let counts = if use_short {
                        f32::from(cur.read_i16()?)
                    } else {
                        cur.read_f32()?
                    };
                    records.push(RawRecord {
                        bin_x,
                        bin_y,
                        counts,
                    });
                }
            }
        }
        2 => {
            let n_points = cur.read_i32()?;
            let width = i32::from(cur.read_i16()?);
            if n_points > 0 && width <= 0 {
                return Err(HicError::BadFormat(format!(
                    "dense block with nonpositive width {}",
                    width
                )));
            }
            for i in 0..n_points {
                let row = i / width;
                let col = i - row * width;
                let bin_x = bin_x_offset + col;
                let bin_y = bin_y_offset + row;
                if use_short {
                    let c = cur.read_i16()?;
                    if c != SHORT_SENTINEL {
                        records.push(RawRecord {
                            bin_x,
                            bin_y,
                            counts: f32::from(c),
                        });
                    }
                } else {
                    let c = cur.read_f32()?;
                    if !c.is_nan() {
                        records.push(RawRecord {
                            bin_x,
                            bin_y,
                            counts: c,
                        });
                    }
                }
            }
        }
        other => return Err(HicError::UnknownBlockType(other)),
    }

    Ok(records)
}

/// The record count a block declares, without decoding its records.
///
/// For dense (type 2) blocks the declared count includes sentinel cells,
/// so it can exceed the number of records [`decode_block`] emits.
pub(crate) fn declared_record_count(data: &[u8]) -> Result<i32> {
    Cursor::new(data, "block").read_i32()
}

fn read_bin_value(cur: &mut Cursor<'_>, short: bool) -> Result<i32> {
    if short {
        Ok(i32::from(cur.read_i16()?))
    } else {
        cur.read_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_inflate_round_trip() {
        let payload = b"sparse contact data".repeat(50);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(inflate(&compressed).unwrap(), payload);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(matches!(
            inflate(&[0xde, 0xad, 0xbe, 0xef]),
            Err(HicError::Inflate(_))
        ));
    }

    #[test]
    fn test_decode_v6_triples() {
        let mut data = Vec::new();
        data.extend_from_slice(&2i32.to_le_bytes());
        for (x, y, c) in [(1i32, 2i32, 3.5f32), (7, 8, 1.0)] {
            data.extend_from_slice(&x.to_le_bytes());
            data.extend_from_slice(&y.to_le_bytes());
            data.extend_from_slice(&c.to_le_bytes());
        }

        let records = decode_block(&data, 6).unwrap();
        assert_eq!(
            records,
            vec![
                RawRecord {
                    bin_x: 1,
                    bin_y: 2,
                    counts: 3.5
                },
                RawRecord {
                    bin_x: 7,
                    bin_y: 8,
                    counts: 1.0
                },
            ]
        );
    }

    /// v8 type 1 block: short bins, short counts, two rows.
    #[test]
    fn test_decode_v8_row_list_short() {
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_le_bytes()); // nRecords
        data.extend_from_slice(&100i32.to_le_bytes()); // binXOffset
        data.extend_from_slice(&200i32.to_le_bytes()); // binYOffset
        data.push(0); // short counts
        data.push(1); // type
        data.extend_from_slice(&2i16.to_le_bytes()); // rowCount
        // row at y = 200 + 3, one column
        data.extend_from_slice(&3i16.to_le_bytes());
        data.extend_from_slice(&1i16.to_le_bytes());
        data.extend_from_slice(&5i16.to_le_bytes()); // x delta
        data.extend_from_slice(&40i16.to_le_bytes()); // counts
        // row at y = 200 + 4, two columns
        data.extend_from_slice(&4i16.to_le_bytes());
        data.extend_from_slice(&2i16.to_le_bytes());
        data.extend_from_slice(&6i16.to_le_bytes());
        data.extend_from_slice(&41i16.to_le_bytes());
        data.extend_from_slice(&7i16.to_le_bytes());
        data.extend_from_slice(&42i16.to_le_bytes());

        let records = decode_block(&data, 8).unwrap();
        assert_eq!(
            records,
            vec![
                RawRecord {
                    bin_x: 105,
                    bin_y: 203,
                    counts: 40.0
                },
                RawRecord {
                    bin_x: 106,
                    bin_y: 204,
                    counts: 41.0
                },
                RawRecord {
                    bin_x: 107,
                    bin_y: 204,
                    counts: 42.0
                },
            ]
        );
    }

    /// v9 type 1 block with int32 bin widths and float counts.
    #[test]
    fn test_decode_v9_row_list_wide() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes()); // nRecords
        data.extend_from_slice(&0i32.to_le_bytes()); // binXOffset
        data.extend_from_slice(&0i32.to_le_bytes()); // binYOffset
        data.push(1); // float counts
        data.push(1); // int32 bin X
        data.push(1); // int32 bin Y
        data.push(1); // type
        data.extend_from_slice(&1i32.to_le_bytes()); // rowCount
        data.extend_from_slice(&70000i32.to_le_bytes()); // y
        data.extend_from_slice(&1i32.to_le_bytes()); // colCount
        data.extend_from_slice(&65000i32.to_le_bytes()); // x
        data.extend_from_slice(&2.25f32.to_le_bytes());

        let records = decode_block(&data, 9).unwrap();
        assert_eq!(
            records,
            vec![RawRecord {
                bin_x: 65000,
                bin_y: 70000,
                counts: 2.25
            }]
        );
    }

    /// Dense 3x3 float grid with NaN sentinels at opposite corners.
    #[test]
    fn test_decode_dense_nan_sentinels() {
        let mut data = Vec::new();
        data.extend_from_slice(&9i32.to_le_bytes()); // nRecords (declared)
        data.extend_from_slice(&10i32.to_le_bytes()); // binXOffset
        data.extend_from_slice(&20i32.to_le_bytes()); // binYOffset
        data.push(1); // float values
        data.push(2); // type
        data.extend_from_slice(&9i32.to_le_bytes()); // nPts
        data.extend_from_slice(&3i16.to_le_bytes()); // width
        for i in 0..9 {
            let value = if i == 0 || i == 8 { f32::NAN } else { i as f32 };
            data.extend_from_slice(&value.to_le_bytes());
        }

        let records = decode_block(&data, 8).unwrap();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| !r.counts.is_nan()));
        // cell (0,0) and (2,2) of the grid are absent
        assert!(!records
            .iter()
            .any(|r| (r.bin_x, r.bin_y) == (10, 20) || (r.bin_x, r.bin_y) == (12, 22)));
        // spot-check row-major placement: i = 5 is row 1, col 2
        assert!(records.contains(&RawRecord {
            bin_x: 12,
            bin_y: 21,
            counts: 5.0
        }));
        // declared count still reports the full grid
        assert_eq!(declared_record_count(&data).unwrap(), 9);
    }

    /// Dense int16 grid with the -32768 sentinel.
    #[test]
    fn test_decode_dense_short_sentinel() {
        let mut data = Vec::new();
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.push(0); // short values
        data.push(2); // type
        data.extend_from_slice(&4i32.to_le_bytes()); // nPts
        data.extend_from_slice(&2i16.to_le_bytes()); // width
        for value in [7i16, -32768, 9, -32768] {
            data.extend_from_slice(&value.to_le_bytes());
        }

        let records = decode_block(&data, 7).unwrap();
        assert_eq!(
            records,
            vec![
                RawRecord {
                    bin_x: 0,
                    bin_y: 0,
                    counts: 7.0
                },
                RawRecord {
                    bin_x: 0,
                    bin_y: 1,
                    counts: 9.0
                },
            ]
        );
    }

    #[test]
    fn test_unknown_block_type() {
        let mut data = Vec::new();
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.push(0);
        data.push(3); // not a known layout
        assert!(matches!(
            decode_block(&data, 8),
            Err(HicError::UnknownBlockType(3))
        ));
    }

    #[test]
    fn test_truncated_block() {
        let mut data = Vec::new();
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        // payload ends before the flags
        assert!(matches!(
            decode_block(&data, 8),
            Err(HicError::UnexpectedEof { .. })
        ));
    }
}
