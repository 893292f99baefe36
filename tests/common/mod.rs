//! Shared fixture builder: assembles complete synthetic `.hic` containers
//! in memory (header, compressed blocks, normalization vectors, matrix
//! metadata, footer) so integration tests can exercise the full query
//! path against known contents.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// One chromosome-pair matrix at a single resolution.
pub struct FixtureMatrix {
    pub c1: i32,
    pub c2: i32,
    pub unit: &'static str,
    pub bin_size: i32,
    pub block_bin_count: i32,
    pub block_column_count: i32,
    /// `(block number, uncompressed payload)`
    pub blocks: Vec<(i32, Vec<u8>)>,
}

/// One normalization vector and its index entry.
pub struct FixtureNorm {
    pub norm: &'static str,
    pub chr_index: i32,
    pub unit: &'static str,
    pub bin_size: i32,
    pub values: Vec<f64>,
}

fn push_cstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

fn compress(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

/// Assemble a complete container.
pub fn build_hic(
    version: i32,
    chromosomes: &[(&str, i64)],
    matrices: &[FixtureMatrix],
    norms: &[FixtureNorm],
) -> Vec<u8> {
    let mut out = Vec::new();

    // header
    out.extend_from_slice(b"HIC\0");
    out.extend_from_slice(&version.to_le_bytes());
    let master_field = out.len();
    out.extend_from_slice(&0i64.to_le_bytes()); // patched below
    push_cstr(&mut out, "test-genome");
    if version > 8 {
        out.extend_from_slice(&0i64.to_le_bytes()); // nviPosition
        out.extend_from_slice(&0i64.to_le_bytes()); // nviLength
    }
    out.extend_from_slice(&0i32.to_le_bytes()); // no attributes
    out.extend_from_slice(&(chromosomes.len() as i32).to_le_bytes());
    for (name, length) in chromosomes {
        push_cstr(&mut out, name);
        if version > 8 {
            out.extend_from_slice(&length.to_le_bytes());
        } else {
            out.extend_from_slice(&(*length as i32).to_le_bytes());
        }
    }

    // compressed block payloads
    let mut block_tables: Vec<Vec<(i32, i64, i32)>> = Vec::new();
    for matrix in matrices {
        let mut table = Vec::new();
        for (number, payload) in &matrix.blocks {
            let compressed = compress(payload);
            table.push((*number, out.len() as i64, compressed.len() as i32));
            out.extend_from_slice(&compressed);
        }
        block_tables.push(table);
    }

    // normalization vector payloads
    let mut norm_addrs: Vec<(i64, i64)> = Vec::new();
    for norm in norms {
        let mut payload = Vec::new();
        if version > 8 {
            payload.extend_from_slice(&(norm.values.len() as i64).to_le_bytes());
            for v in &norm.values {
                payload.extend_from_slice(&(*v as f32).to_le_bytes());
            }
        } else {
            payload.extend_from_slice(&(norm.values.len() as i32).to_le_bytes());
            for v in &norm.values {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
        norm_addrs.push((out.len() as i64, payload.len() as i64));
        out.extend_from_slice(&payload);
    }

    // matrix metadata, one resolution per matrix
    let mut matrix_positions = Vec::new();
    for (matrix, table) in matrices.iter().zip(&block_tables) {
        matrix_positions.push(out.len() as i64);
        out.extend_from_slice(&matrix.c1.to_le_bytes());
        out.extend_from_slice(&matrix.c2.to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes()); // one resolution
        push_cstr(&mut out, matrix.unit);
        out.extend_from_slice(&0i32.to_le_bytes()); // legacy zoom index
        for _ in 0..4 {
            out.extend_from_slice(&0.0f32.to_le_bytes()); // summary stats
        }
        out.extend_from_slice(&matrix.bin_size.to_le_bytes());
        out.extend_from_slice(&matrix.block_bin_count.to_le_bytes());
        out.extend_from_slice(&matrix.block_column_count.to_le_bytes());
        out.extend_from_slice(&(table.len() as i32).to_le_bytes());
        for (number, position, size) in table {
            out.extend_from_slice(&number.to_le_bytes());
            out.extend_from_slice(&position.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
    }

    // footer
    let master = out.len() as i64;
    if version > 8 {
        out.extend_from_slice(&0i64.to_le_bytes()); // total footer size, unused
    } else {
        out.extend_from_slice(&0i32.to_le_bytes());
    }
    out.extend_from_slice(&(matrices.len() as i32).to_le_bytes());
    for (matrix, position) in matrices.iter().zip(&matrix_positions) {
        push_cstr(&mut out, &format!("{}_{}", matrix.c1, matrix.c2));
        out.extend_from_slice(&position.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes()); // section size, unused
    }
    // two empty expected-value maps
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    // normalization vector index
    out.extend_from_slice(&(norms.len() as i32).to_le_bytes());
    for (norm, (position, size)) in norms.iter().zip(&norm_addrs) {
        push_cstr(&mut out, norm.norm);
        out.extend_from_slice(&norm.chr_index.to_le_bytes());
        push_cstr(&mut out, norm.unit);
        out.extend_from_slice(&norm.bin_size.to_le_bytes());
        out.extend_from_slice(&position.to_le_bytes());
        if version > 8 {
            out.extend_from_slice(&size.to_le_bytes());
        } else {
            out.extend_from_slice(&(*size as i32).to_le_bytes());
        }
    }

    out[master_field..master_field + 8].copy_from_slice(&master.to_le_bytes());
    out
}

/// Version-6 block payload: a plain triple list.
pub fn block_triples(records: &[(i32, i32, f32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(records.len() as i32).to_le_bytes());
    for (x, y, c) in records {
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
        out.extend_from_slice(&c.to_le_bytes());
    }
    out
}

/// Type-1 (list-of-rows) block payload with float counts and int16 bin
/// deltas, zero offsets. Records must have bin indices that fit in i16.
pub fn block_rows(version: i32, records: &[(i32, i32, f32)]) -> Vec<u8> {
    use std::collections::BTreeMap;
    let mut rows: BTreeMap<i32, Vec<(i32, f32)>> = BTreeMap::new();
    for (x, y, c) in records {
        rows.entry(*y).or_default().push((*x, *c));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(records.len() as i32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // binXOffset
    out.extend_from_slice(&0i32.to_le_bytes()); // binYOffset
    out.push(1); // float counts
    if version > 8 {
        out.push(0); // int16 bin X
        out.push(0); // int16 bin Y
    }
    out.push(1); // type 1
    out.extend_from_slice(&(rows.len() as i16).to_le_bytes());
    for (y, cols) in rows {
        out.extend_from_slice(&(y as i16).to_le_bytes());
        out.extend_from_slice(&(cols.len() as i16).to_le_bytes());
        for (x, c) in cols {
            out.extend_from_slice(&(x as i16).to_le_bytes());
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    out
}

/// Type-2 (dense grid) block payload with float values; NaN marks an
/// absent cell. `values` is row-major with the given width.
pub fn block_dense(version: i32, width: i16, values: &[f32]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(values.len() as i32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // binXOffset
    out.extend_from_slice(&0i32.to_le_bytes()); // binYOffset
    out.push(1); // float values
    if version > 8 {
        out.push(0);
        out.push(0);
    }
    out.push(2); // type 2
    out.extend_from_slice(&(values.len() as i32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Write container bytes to a temp file and return the guard.
pub fn write_fixture(data: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(".hic").unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}
