//! hicfetch: random-access reader for `.hic` contact-matrix containers
//!
//! # Overview
//!
//! `.hic` files store the sparse, binned contact matrices produced by
//! chromosome-conformation-capture (Hi-C) experiments, together with
//! normalization vectors and metadata. hicfetch reads a rectangular slice
//! of one matrix without touching the rest of the container: it follows
//! the header to the footer, the footer to the matrix and normalization
//! indexes, maps the requested region to compressed blocks, and inflates
//! and decodes only those.
//!
//! Containers can live on disk or behind any HTTP server that supports
//! byte-range requests; in both cases only the needed byte ranges are
//! read.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hicfetch::{HicReader, Unit};
//!
//! # fn main() -> hicfetch::Result<()> {
//! let mut hic = HicReader::open("experiment.hic")?;
//! println!("genome: {}", hic.genome_id());
//!
//! // raw counts for chr1 x chr1 at 10 kb resolution
//! let records = hic.query("NONE", "1:0:2000000", "1:0:2000000", Unit::Bp, 10000)?;
//! for rec in &records {
//!     println!("{}\t{}\t{}", rec.bin_x, rec.bin_y, rec.counts);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The same call works against a URL:
//!
//! ```no_run
//! # use hicfetch::{HicReader, Unit};
//! # fn main() -> hicfetch::Result<()> {
//! let mut hic = HicReader::open("https://example.com/experiment.hic")?;
//! let records = hic.query("KR", "X", "X", Unit::Bp, 25000)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`fetch_records`] and [`fetch_record_count`] are string-typed
//! convenience wrappers that map every failure to an empty result and a
//! `tracing` warning.
//!
//! ## Module Organization
//!
//! - [`io`]: positioned byte-range access (local files, HTTP)
//! - [`reader`]: header/footer/matrix decoding and region queries
//! - [`types`]: records, chromosomes, units
//! - [`error`]: the error taxonomy

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod io;
pub mod reader;
pub mod types;

// Re-export commonly used types
pub use error::{HicError, Result};
pub use reader::{fetch_record_count, fetch_records, HicReader, NORM_NONE};
pub use types::{Chromosome, ContactRecord, Unit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
