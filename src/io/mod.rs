//! I/O module: positioned byte-range access to containers
//!
//! The decoder layers above never touch a file or socket directly; they
//! consume [`ByteSource::read_at`] and decode from the returned buffers.

pub mod source;

pub use source::{ByteSource, MMAP_THRESHOLD};

#[cfg(feature = "network")]
pub mod network;
#[cfg(feature = "network")]
pub use network::HttpClient;
