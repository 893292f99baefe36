//! `.hic` header parsing.
//!
//! The header opens every container:
//!
//! ```text
//! - magic: "HIC" (NUL-terminated)
//! - version: int32 (supported: 6 through 9)
//! - masterIndexPosition: int64 (absolute offset of the footer)
//! - genomeId: NUL-terminated string
//! - [version > 8] nviPosition: int64, nviLength: int64
//! - nAttributes: int32, then key/value NUL-terminated string pairs
//! - nChromosomes: int32, then per chromosome:
//!   - name: NUL-terminated string
//!   - length: int64 if version > 8, else int32
//! ```
//!
//! Chromosome indices are serial positions in this table; the footer keys
//! chromosome-pair matrices by those indices.

use crate::error::{HicError, Result};
use crate::reader::cursor::Cursor;
use crate::types::Chromosome;
use std::collections::HashMap;

/// Highest container version this reader understands.
pub(crate) const MAX_SUPPORTED_VERSION: i32 = 9;

/// Lowest container version still supported.
pub(crate) const MIN_SUPPORTED_VERSION: i32 = 6;

/// Parsed header contents.
pub(crate) struct Header {
    pub version: i32,
    pub master_index_position: u64,
    pub genome_id: String,
    pub attributes: HashMap<String, String>,
    pub chromosomes: HashMap<String, Chromosome>,
}

/// Parse a header from a prefix of the container.
///
/// The buffer only needs to cover the header itself; a buffer that ends
/// inside the header yields [`HicError::UnexpectedEof`], which the caller
/// uses as the signal to fetch a larger prefix.
pub(crate) fn parse_header(buf: &[u8]) -> Result<Header> {
    if buf.len() < 3 || &buf[..3] != b"HIC" {
        return Err(HicError::BadMagic);
    }

    let mut cur = Cursor::new(buf, "header");
    cur.read_cstring()?; // magic, validated above

    let version = cur.read_i32()?;
    if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version) {
        return Err(HicError::UnsupportedVersion(version));
    }

    let master_index_position = cur.read_i64()?;
    if master_index_position < 0 {
        return Err(HicError::BadFormat(format!(
            "negative master index position {}",
            master_index_position
        )));
    }

    let genome_id = cur.read_cstring()?;

    if version > 8 {
        cur.read_i64()?; // nviPosition
        cur.read_i64()?; // nviLength
    }

    let n_attributes = cur.read_i32()?;
    if n_attributes < 0 {
        return Err(HicError::BadFormat(format!(
            "negative attribute count {}",
            n_attributes
        )));
    }
    let mut attributes = HashMap::with_capacity(n_attributes as usize);
    for _ in 0..n_attributes {
        let key = cur.read_cstring()?;
        let value = cur.read_cstring()?;
        attributes.insert(key, value);
    }

    let n_chromosomes = cur.read_i32()?;
    if n_chromosomes < 0 {
        return Err(HicError::BadFormat(format!(
            "negative chromosome count {}",
            n_chromosomes
        )));
    }
    let mut chromosomes = HashMap::with_capacity(n_chromosomes as usize);
    for index in 0..n_chromosomes {
        let name = cur.read_cstring()?;
        let length = if version > 8 {
            cur.read_i64()?
        } else {
            i64::from(cur.read_i32()?)
        };
        chromosomes.insert(
            name.clone(),
            Chromosome {
                name,
                index,
                length,
            },
        );
    }

    Ok(Header {
        version,
        master_index_position: master_index_position as u64,
        genome_id,
        attributes,
        chromosomes,
    })
}
