//! Byte-range access over local files and HTTP resources.
//!
//! Every structure in a `.hic` container is located by absolute byte
//! offset, so the reader's only demand on its input is positioned reads:
//! `read_at(offset, len)`. This module unifies the two places a container
//! can live:
//!
//! - **Local**: a file, read with `seek` + `read_exact`, or through a
//!   memory map once the file crosses [`MMAP_THRESHOLD`].
//! - **Remote** (feature `network`): an HTTP resource supporting byte-range
//!   requests, served by [`crate::io::network::HttpClient`].
//!
//! Sequential decoding always happens against an in-memory buffer returned
//! by one of these calls; no component assumes a source can be re-read
//! inside a single logical fetch.

use crate::error::{HicError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

#[cfg(feature = "network")]
use crate::io::network::RemoteSource;

/// File size at which local sources switch to memory-mapped I/O (50 MB).
///
/// Below the threshold, `seek` + `read` wins; above it the page cache
/// serves repeated random reads of the block index and block payloads
/// without syscalls per read.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

/// A positioned-read capability over a local or remote container.
#[derive(Debug)]
pub enum ByteSource {
    /// Local file
    Local(LocalSource),
    /// HTTP resource supporting byte-range requests
    #[cfg(feature = "network")]
    Remote(RemoteSource),
}

impl ByteSource {
    /// Open a source by name.
    ///
    /// Names beginning with `http` select the HTTP path; everything else
    /// is treated as a local file path.
    ///
    /// # Errors
    ///
    /// Returns [`HicError::SourceUnavailable`] when the file cannot be
    /// opened or the HTTP client cannot be constructed.
    pub fn open(name: &str) -> Result<Self> {
        #[cfg(feature = "network")]
        if name.starts_with("http") {
            return Ok(ByteSource::Remote(RemoteSource::new(name)?));
        }
        Ok(ByteSource::Local(LocalSource::open(name)?))
    }

    /// Read exactly `len` bytes starting at `pos`.
    ///
    /// # Errors
    ///
    /// A read crossing the end of the resource is
    /// [`HicError::UnexpectedEof`] for local sources and
    /// [`HicError::Network`] for remote ones.
    pub fn read_at(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        match self {
            ByteSource::Local(src) => src.read_at(pos, len),
            #[cfg(feature = "network")]
            ByteSource::Remote(src) => src.read_at(pos, len),
        }
    }

    /// Read up to `len` bytes starting at `pos`, clamped to the end of the
    /// resource.
    ///
    /// Used for the header prefetch, where the caller does not yet know
    /// how large the resource is.
    pub fn read_at_most(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        match self {
            ByteSource::Local(src) => src.read_at_most(pos, len),
            #[cfg(feature = "network")]
            ByteSource::Remote(src) => src.read_at_most(pos, len),
        }
    }

    /// Total length of the resource in bytes.
    ///
    /// For local files this is the file size; for remote resources it is
    /// the total parsed from the first response's `Content-Range` header
    /// (a one-byte probe request is issued if nothing has been fetched
    /// yet).
    pub fn total_len(&mut self) -> Result<u64> {
        match self {
            ByteSource::Local(src) => Ok(src.len),
            #[cfg(feature = "network")]
            ByteSource::Remote(src) => src.total_len(),
        }
    }
}

/// Local-file byte source with threshold-based mmap.
#[derive(Debug)]
pub struct LocalSource {
    file: File,
    len: u64,
    map: Option<Mmap>,
}

impl LocalSource {
    /// Open a local file, memory-mapping it when it is at least
    /// [`MMAP_THRESHOLD`] bytes.
    pub fn open(path: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| HicError::SourceUnavailable {
            name: path.to_string(),
            reason: e.to_string(),
        })?;
        let len = file
            .metadata()
            .map_err(|e| HicError::SourceUnavailable {
                name: path.to_string(),
                reason: e.to_string(),
            })?
            .len();

        let map = if len >= MMAP_THRESHOLD {
            // SAFETY: the map is dropped with this struct and the file is
            // opened read-only.
            Some(unsafe { Mmap::map(&file)? })
        } else {
            None
        };

        Ok(Self { file, len, map })
    }

    fn read_at(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let available = self.len.saturating_sub(pos) as usize;
        if available < len {
            return Err(HicError::UnexpectedEof {
                context: "byte range",
                expected: len,
                actual: available,
            });
        }

        if let Some(map) = &self.map {
            let start = pos as usize;
            return Ok(map[start..start + len].to_vec());
        }

        let mut buf = vec![0u8; len];
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_at_most(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let clamped = len.min(self.len.saturating_sub(pos) as usize);
        self.read_at(pos, clamped)
    }
}
