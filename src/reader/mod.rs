//! Region queries against `.hic` containers.
//!
//! [`HicReader`] owns a byte source and the parsed header, and answers
//! rectangular region queries: given a normalization name, two loci, a
//! bin unit, and a bin size, it walks footer → matrix index → blocks and
//! returns the nonzero cells inside the requested rectangle.
//!
//! One query runs strictly top-down: the footer locates the matrix and
//! the normalization vectors, the matrix index yields block geometry, the
//! region is mapped to block numbers, and each block is fetched, inflated,
//! and decoded in turn. Block buffers are dropped before the next block is
//! fetched; the normalization vectors and the block index live for the
//! duration of the query. The format version lives on the reader, so
//! concurrent queries over different files never share state.
//!
//! # Example
//!
//! ```no_run
//! use hicfetch::{HicReader, Unit};
//!
//! # fn main() -> hicfetch::Result<()> {
//! let mut hic = HicReader::open("contacts.hic")?;
//! for rec in hic.query("NONE", "1:0:1000000", "1:0:1000000", Unit::Bp, 10000)? {
//!     println!("{}\t{}\t{}", rec.bin_x, rec.bin_y, rec.counts);
//! }
//! # Ok(())
//! # }
//! ```

mod block;
mod cursor;
mod footer;
mod grid;
mod header;
mod matrix;
mod norm;

use crate::error::{HicError, Result};
use crate::io::ByteSource;
use crate::types::{Chromosome, ContactRecord, Unit};
use matrix::ZoomIndex;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Normalization name meaning "raw counts".
pub const NORM_NONE: &str = "NONE";

/// Initial header prefetch size; doubles until the header fits.
const HEADER_PREFETCH_SIZE: usize = 100_000;

/// Random-access reader over one `.hic` container.
///
/// Construction parses the header; each [`query`](HicReader::query) then
/// resolves the footer and matrix index for its own chromosome pair and
/// resolution. The reader holds no per-query state between calls.
pub struct HicReader {
    source: ByteSource,
    version: i32,
    master_index_position: u64,
    genome_id: String,
    attributes: HashMap<String, String>,
    chromosomes: HashMap<String, Chromosome>,
}

/// Everything a query needs after footer and matrix resolution.
struct QueryPlan {
    intra: bool,
    /// Caller passed the chromosomes in descending index order, so
    /// emitted coordinates must be mirrored back.
    swapped: bool,
    /// Requested rectangle in storage orientation and genomic units:
    /// `[x1, x2, y1, y2]`.
    orig: [i64; 4],
    zoom: ZoomIndex,
    block_numbers: BTreeSet<i32>,
    norm_vectors: Option<(Vec<f64>, Vec<f64>)>,
}

impl HicReader {
    /// Open a container by path or URL and parse its header.
    ///
    /// Names beginning with `http` are fetched over HTTP byte ranges;
    /// anything else is opened as a local file.
    ///
    /// # Errors
    ///
    /// [`HicError::SourceUnavailable`] when the source cannot be opened,
    /// [`HicError::BadMagic`] / [`HicError::UnsupportedVersion`] /
    /// [`HicError::BadFormat`] when the header is not a readable `.hic`
    /// header.
    pub fn open(name: &str) -> Result<Self> {
        let mut source = ByteSource::open(name)?;

        let mut prefetch = HEADER_PREFETCH_SIZE;
        loop {
            let buf = source.read_at_most(0, prefetch)?;
            match header::parse_header(&buf) {
                Ok(header) => {
                    return Ok(Self {
                        source,
                        version: header.version,
                        master_index_position: header.master_index_position,
                        genome_id: header.genome_id,
                        attributes: header.attributes,
                        chromosomes: header.chromosomes,
                    });
                }
                // the header outgrew the prefetch; fetch a larger prefix
                Err(HicError::UnexpectedEof { .. }) if buf.len() == prefetch => {
                    prefetch *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Container format version (6 through 9).
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Genome identifier from the header (e.g. `"hg19"`).
    pub fn genome_id(&self) -> &str {
        &self.genome_id
    }

    /// Header attribute dictionary.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Chromosomes declared in the header, keyed by name.
    pub fn chromosomes(&self) -> &HashMap<String, Chromosome> {
        &self.chromosomes
    }

    /// Fetch the nonzero cells of the requested rectangle.
    ///
    /// `chr1loc` and `chr2loc` are `NAME` or `NAME:start:end` (genomic
    /// units, inclusive); a bare name means the whole chromosome. Records
    /// come back in genomic coordinates (bin start times bin size) and in
    /// the caller's orientation: `bin_x` lies on `chr1loc`'s chromosome
    /// and `bin_y` on `chr2loc`'s, even though the container stores each
    /// pair only once. With
    /// a normalization other than [`NORM_NONE`], counts are divided by
    /// the product of the two per-bin divisors; bins whose divisor is NaN
    /// or zero produce NaN or infinite counts and are returned unchanged.
    ///
    /// For an intrachromosomal query, a record qualifies if it falls in
    /// the requested rectangle or in its reflection across the diagonal,
    /// since only the upper triangle is stored.
    ///
    /// # Errors
    ///
    /// Lookup failures ([`HicError::ChromosomeNotFound`],
    /// [`HicError::MatrixNotFound`], [`HicError::ResolutionNotFound`],
    /// [`HicError::NormNotAvailable`]) and any structural or I/O error
    /// from the container.
    pub fn query(
        &mut self,
        norm: &str,
        chr1loc: &str,
        chr2loc: &str,
        unit: Unit,
        bin_size: i32,
    ) -> Result<Vec<ContactRecord>> {
        let plan = self.plan_query(norm, chr1loc, chr2loc, unit, bin_size, true)?;
        let bin_size = i64::from(bin_size);

        let mut records = Vec::new();
        for number in &plan.block_numbers {
            let Some(entry) = plan.zoom.blocks.get(number) else {
                continue;
            };
            if entry.size == 0 {
                continue;
            }
            let compressed = self.source.read_at(entry.position, entry.size as usize)?;
            let data = block::inflate(&compressed)?;

            for raw in block::decode_block(&data, self.version)? {
                let x = i64::from(raw.bin_x) * bin_size;
                let y = i64::from(raw.bin_y) * bin_size;
                let counts = match &plan.norm_vectors {
                    Some((c1_norm, c2_norm)) => {
                        let d1 = bin_divisor(c1_norm, raw.bin_x);
                        let d2 = bin_divisor(c2_norm, raw.bin_y);
                        (f64::from(raw.counts) / (d1 * d2)) as f32
                    }
                    None => raw.counts,
                };

                let inside = x >= plan.orig[0]
                    && x <= plan.orig[1]
                    && y >= plan.orig[2]
                    && y <= plan.orig[3];
                let mirrored = plan.intra
                    && y >= plan.orig[0]
                    && y <= plan.orig[1]
                    && x >= plan.orig[2]
                    && x <= plan.orig[3];
                if inside || mirrored {
                    let (bin_x, bin_y) = if plan.swapped { (y, x) } else { (x, y) };
                    records.push(ContactRecord { bin_x, bin_y, counts });
                }
            }
        }

        debug!(
            blocks = plan.block_numbers.len(),
            records = records.len(),
            "query complete"
        );
        Ok(records)
    }

    /// Sum of the record counts declared by the blocks covering the
    /// rectangle, without materializing the records.
    ///
    /// This is the pre-filter count: it includes records outside the
    /// exact rectangle within the covering blocks, and for dense blocks
    /// it includes sentinel (absent) cells, so it is an upper bound on
    /// `query(...).len()`.
    pub fn count_records(
        &mut self,
        norm: &str,
        chr1loc: &str,
        chr2loc: &str,
        unit: Unit,
        bin_size: i32,
    ) -> Result<i64> {
        let plan = self.plan_query(norm, chr1loc, chr2loc, unit, bin_size, false)?;

        let mut count = 0i64;
        for number in &plan.block_numbers {
            let Some(entry) = plan.zoom.blocks.get(number) else {
                continue;
            };
            if entry.size == 0 {
                continue;
            }
            let compressed = self.source.read_at(entry.position, entry.size as usize)?;
            let data = block::inflate(&compressed)?;
            count += i64::from(block::declared_record_count(&data)?);
        }
        Ok(count)
    }

    /// Shared front half of `query` and `count_records`: locus parsing,
    /// footer and matrix resolution, and block-number selection.
    ///
    /// `load_norm_vectors` controls whether the vectors are actually read;
    /// their presence in the footer is validated either way so both entry
    /// points fail identically when one is missing.
    fn plan_query(
        &mut self,
        norm: &str,
        chr1loc: &str,
        chr2loc: &str,
        unit: Unit,
        bin_size: i32,
        load_norm_vectors: bool,
    ) -> Result<QueryPlan> {
        if bin_size <= 0 {
            return Err(HicError::InvalidBinSize(bin_size));
        }

        let (name1, range1) = parse_locus(chr1loc)?;
        let (name2, range2) = parse_locus(chr2loc)?;
        let chr1 = self.chromosome(name1)?.clone();
        let chr2 = self.chromosome(name2)?.clone();
        let range1 = range1.unwrap_or((0, chr1.length));
        let range2 = range2.unwrap_or((0, chr2.length));

        // the container stores each pair once, keyed by ascending index;
        // swap the coordinate intervals along with the chromosomes
        let swapped = chr1.index > chr2.index;
        let (c1, c2, orig) = if swapped {
            (
                chr2.index,
                chr1.index,
                [range2.0, range2.1, range1.0, range1.1],
            )
        } else {
            (
                chr1.index,
                chr2.index,
                [range1.0, range1.1, range2.0, range2.1],
            )
        };
        let intra = c1 == c2;
        let bins: [i64; 4] = orig.map(|v| v / i64::from(bin_size));

        let total = self.source.total_len()?;
        if self.master_index_position >= total {
            return Err(HicError::BadFormat(format!(
                "master index position {} is beyond the end of the container ({} bytes)",
                self.master_index_position, total
            )));
        }
        let footer_buf = self.source.read_at(
            self.master_index_position,
            (total - self.master_index_position) as usize,
        )?;
        let footer = footer::parse_footer(&footer_buf, self.version, c1, c2, norm, unit, bin_size)?;

        let norm_entries = if norm == NORM_NONE {
            None
        } else {
            match (footer.c1_norm, footer.c2_norm) {
                (Some(e1), Some(e2)) => Some((e1, e2)),
                _ => {
                    return Err(HicError::NormNotAvailable {
                        norm: norm.to_string(),
                        unit,
                        bin_size,
                    })
                }
            }
        };

        let norm_vectors = match norm_entries {
            Some((e1, e2)) if load_norm_vectors => {
                let buf1 = self.source.read_at(e1.position, e1.size as usize)?;
                let buf2 = self.source.read_at(e2.position, e2.size as usize)?;
                Some((
                    norm::parse_norm_vector(&buf1, self.version)?,
                    norm::parse_norm_vector(&buf2, self.version)?,
                ))
            }
            _ => None,
        };

        let zoom = matrix::locate_zoom(&mut self.source, footer.matrix_position, unit, bin_size)?;

        let block_numbers = if self.version > 8 && intra {
            grid::blocks_for_region_v9_intra(bins, zoom.block_bin_count, zoom.block_column_count)
        } else {
            grid::blocks_for_region(bins, zoom.block_bin_count, zoom.block_column_count, intra)
        };
        debug!(
            c1,
            c2,
            bin_size,
            blocks = block_numbers.len(),
            "query planned"
        );

        Ok(QueryPlan {
            intra,
            swapped,
            orig,
            zoom,
            block_numbers,
            norm_vectors,
        })
    }

    fn chromosome(&self, name: &str) -> Result<&Chromosome> {
        self.chromosomes
            .get(name)
            .ok_or_else(|| HicError::ChromosomeNotFound(name.to_string()))
    }
}

/// Per-bin divisor, NaN when the vector does not cover the bin.
fn bin_divisor(values: &[f64], bin: i32) -> f64 {
    usize::try_from(bin)
        .ok()
        .and_then(|i| values.get(i).copied())
        .unwrap_or(f64::NAN)
}

/// Split a locus string into its name and optional inclusive range.
fn parse_locus(loc: &str) -> Result<(&str, Option<(i64, i64)>)> {
    let mut parts = loc.split(':');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(HicError::InvalidLocus(loc.to_string()));
    }
    match (parts.next(), parts.next()) {
        (None, _) => Ok((name, None)),
        (Some(start), Some(end)) => {
            let start: i64 = start
                .parse()
                .map_err(|_| HicError::InvalidLocus(loc.to_string()))?;
            let end: i64 = end
                .parse()
                .map_err(|_| HicError::InvalidLocus(loc.to_string()))?;
            if start < 0 || end < start {
                return Err(HicError::InvalidLocus(loc.to_string()));
            }
            Ok((name, Some((start, end))))
        }
        (Some(_), None) => Err(HicError::InvalidLocus(loc.to_string())),
    }
}

/// Fetch the records of one region query, returning an empty list on any
/// failure.
///
/// This is the string-typed convenience entry point: `unit` is `"BP"` or
/// `"FRAG"`, `name` is a path or `http` URL, loci are `NAME[:start:end]`.
/// Failures are reported through a `tracing` warning rather than the
/// return value; use [`HicReader`] directly for typed errors.
pub fn fetch_records(
    norm: &str,
    name: &str,
    chr1loc: &str,
    chr2loc: &str,
    unit: &str,
    bin_size: i32,
) -> Vec<ContactRecord> {
    let run = || -> Result<Vec<ContactRecord>> {
        let unit: Unit = unit.parse()?;
        HicReader::open(name)?.query(norm, chr1loc, chr2loc, unit, bin_size)
    };
    match run() {
        Ok(records) => records,
        Err(e) => {
            warn!("{}", e);
            Vec::new()
        }
    }
}

/// Count the records covered by one region query, returning zero on any
/// failure.
///
/// Counterpart of [`fetch_records`] with the same parameters and failure
/// behavior; see [`HicReader::count_records`] for what the count means.
pub fn fetch_record_count(
    norm: &str,
    name: &str,
    chr1loc: &str,
    chr2loc: &str,
    unit: &str,
    bin_size: i32,
) -> i64 {
    let run = || -> Result<i64> {
        let unit: Unit = unit.parse()?;
        HicReader::open(name)?.count_records(norm, chr1loc, chr2loc, unit, bin_size)
    };
    match run() {
        Ok(count) => count,
        Err(e) => {
            warn!("{}", e);
            0
        }
    }
}
