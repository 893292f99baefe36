//! Error types for hicfetch

use crate::types::Unit;
use thiserror::Error;

/// Result type alias for hicfetch operations
pub type Result<T> = std::result::Result<T, HicError>;

/// Error types that can occur while reading a `.hic` container
#[derive(Debug, Error)]
pub enum HicError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The leading magic string is not `HIC`
    #[error("magic string is missing; this does not appear to be a .hic file")]
    BadMagic,

    /// The container's format version is outside the supported range
    #[error("format version {0} is not supported")]
    UnsupportedVersion(i32),

    /// Structurally invalid container data
    #[error("malformed container: {0}")]
    BadFormat(String),

    /// A source could not be opened for reading
    #[error("{name} cannot be opened for reading: {reason}")]
    SourceUnavailable {
        /// Path or URL of the source
        name: String,
        /// Why the open failed
        reason: String,
    },

    /// Network-level failure while fetching a byte range
    #[cfg(feature = "network")]
    #[error("network error: {0}")]
    Network(String),

    /// HTTP failure status while fetching a byte range
    #[cfg(feature = "network")]
    #[error("HTTP error {status}: {url}")]
    Http {
        /// HTTP status code
        status: u16,
        /// URL that failed
        url: String,
    },

    /// A decode ran past the end of the available bytes
    #[error("unexpected end of data while reading {context}: needed {expected} bytes, had {actual}")]
    UnexpectedEof {
        /// What was being decoded
        context: &'static str,
        /// Bytes the decode needed
        expected: usize,
        /// Bytes that were available
        actual: usize,
    },

    /// Block decompression failed
    #[error("block decompression failed: {0}")]
    Inflate(String),

    /// A requested chromosome name is absent from the header
    #[error("{0} not found in the file")]
    ChromosomeNotFound(String),

    /// The master index has no entry for the requested chromosome pair
    #[error("file does not have the chromosome pair map {0}")]
    MatrixNotFound(String),

    /// No resolution level matches the requested unit and bin size
    #[error("file has no matrix at {bin_size} {unit} resolution")]
    ResolutionNotFound {
        /// Requested bin unit
        unit: Unit,
        /// Requested bin size
        bin_size: i32,
    },

    /// The footer lacks a normalization vector for one or both chromosomes
    #[error("file does not contain {norm} normalization vectors for one or both chromosomes at {bin_size} {unit}")]
    NormNotAvailable {
        /// Requested normalization name
        norm: String,
        /// Requested bin unit
        unit: Unit,
        /// Requested bin size
        bin_size: i32,
    },

    /// A block declared a record layout this reader does not know
    #[error("unknown block record type {0}")]
    UnknownBlockType(u8),

    /// The unit string is neither `BP` nor `FRAG`
    #[error("unit must be one of BP or FRAG, got {0:?}")]
    InvalidUnit(String),

    /// A locus string could not be parsed as `NAME` or `NAME:start:end`
    #[error("invalid locus {0:?}; expected NAME or NAME:start:end")]
    InvalidLocus(String),

    /// The requested bin size is zero or negative
    #[error("bin size must be positive, got {0}")]
    InvalidBinSize(i32),
}
