//! HTTP byte-range client for remote `.hic` containers.
//!
//! A `.hic` query touches a handful of widely separated regions of the
//! container (header, footer, matrix index, normalization vectors, blocks),
//! so the remote path never downloads the file: every read is an HTTP
//! `Range: bytes=A-B` request. Servers must answer `206 Partial Content`;
//! a `200` means the server ignored the range header and would hand back
//! the entire resource, which is treated as an error.
//!
//! The total resource length is taken from the `Content-Range:
//! bytes A-B/N` header of the first response and cached — reading the
//! footer requires knowing `N` up front.
//!
//! Fetched ranges land in a byte-bounded LRU cache so that overlapping
//! probe reads (the matrix locator reads one discriminator byte, then the
//! surrounding header) and repeated queries against one reader do not
//! re-download.

use crate::error::{HicError, Result};
use bytes::Bytes;
use lru::LruCache;
use std::time::Duration;

/// Maximum bytes held by the range cache (16 MB).
pub const DEFAULT_CACHE_SIZE: usize = 16 * 1024 * 1024;

/// Request timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of attempts per range before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A fetched byte range plus the resource total from `Content-Range`.
#[derive(Debug, Clone)]
struct RangeResponse {
    data: Bytes,
    total: u64,
}

/// Byte-bounded LRU cache over fetched ranges.
///
/// Bounds actual bytes held rather than entry count, evicting
/// least-recently-used ranges until a new one fits. A range larger than
/// the whole cache is passed through uncached.
#[derive(Debug)]
struct ByteBoundedCache {
    cache: LruCache<(u64, u64), RangeResponse>,
    current_size: usize,
    max_size: usize,
}

impl ByteBoundedCache {
    fn new(max_size: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            current_size: 0,
            max_size,
        }
    }

    fn get(&mut self, key: &(u64, u64)) -> Option<&RangeResponse> {
        self.cache.get(key)
    }

    fn put(&mut self, key: (u64, u64), value: RangeResponse) {
        let value_size = value.data.len();
        if value_size > self.max_size {
            return;
        }

        if let Some(old) = self.cache.peek(&key) {
            self.current_size = self.current_size.saturating_sub(old.data.len());
        }

        while self.current_size + value_size > self.max_size && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_size = self.current_size.saturating_sub(evicted.data.len());
            }
        }

        self.current_size += value_size;
        self.cache.push(key, value);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    fn current_bytes(&self) -> usize {
        self.current_size
    }
}

/// Blocking HTTP client issuing byte-range requests with retry and a
/// byte-bounded range cache.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    cache: ByteBoundedCache,
    max_retries: u32,
}

impl HttpClient {
    /// Create a client with the default cache size.
    pub fn new() -> Result<Self> {
        Self::with_cache_size(DEFAULT_CACHE_SIZE)
    }

    /// Create a client holding at most `cache_size_bytes` of fetched data.
    pub fn with_cache_size(cache_size_bytes: usize) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(format!("hicfetch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HicError::Network(e.to_string()))?;

        Ok(Self {
            client,
            cache: ByteBoundedCache::new(cache_size_bytes),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Fetch `[start, end)` of `url`, returning the bytes and the total
    /// resource length.
    ///
    /// Responses may be shorter than requested when the range runs past
    /// the end of the resource; they are never longer.
    pub fn fetch_range(&mut self, url: &str, start: u64, end: u64) -> Result<(Bytes, u64)> {
        let key = (start, end);
        if let Some(hit) = self.cache.get(&key) {
            return Ok((hit.data.clone(), hit.total));
        }

        let response = self.fetch_with_retry(url, start, end)?;
        let result = (response.data.clone(), response.total);
        self.cache.put(key, response);
        Ok(result)
    }

    fn fetch_with_retry(&self, url: &str, start: u64, end: u64) -> Result<RangeResponse> {
        let mut attempts = 0;
        let mut backoff = Duration::from_millis(100);

        loop {
            match self.fetch_range_once(url, start, end) {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(e);
                    }
                    std::thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }
    }

    fn fetch_range_once(&self, url: &str, start: u64, end: u64) -> Result<RangeResponse> {
        let range_header = format!("bytes={}-{}", start, end - 1);

        let response = self
            .client
            .get(url)
            .header("Range", range_header)
            .send()
            .map_err(|e| HicError::Network(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            206 => {}
            200 => {
                return Err(HicError::Network(format!(
                    "server ignored the range request and returned the whole resource: {}",
                    url
                )));
            }
            416 => {
                return Err(HicError::Network(format!(
                    "requested range {}-{} is out of bounds for {}",
                    start,
                    end - 1,
                    url
                )));
            }
            _ => {
                return Err(HicError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
        }

        let total = parse_content_range_total(
            response
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
        )
        .ok_or_else(|| {
            HicError::Network(format!("missing or unparseable Content-Range header: {}", url))
        })?;

        let data = response
            .bytes()
            .map_err(|e| HicError::Network(e.to_string()))?;

        let expected = (end - start) as usize;
        if data.len() > expected {
            return Err(HicError::Network(format!(
                "server returned more data than requested: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }

        Ok(RangeResponse { data, total })
    }

    /// Number of ranges currently cached (test hook).
    #[cfg(test)]
    fn cache_entries(&self) -> usize {
        self.cache.len()
    }
}

/// Extract the total resource length from a `Content-Range` header value
/// of the form `bytes A-B/N`.
fn parse_content_range_total(value: Option<&str>) -> Option<u64> {
    let (_, total) = value?.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Remote byte source: an HTTP URL plus its client and the cached
/// resource length.
#[derive(Debug)]
pub struct RemoteSource {
    client: HttpClient,
    url: String,
    total: Option<u64>,
}

impl RemoteSource {
    /// Create a source for `url`. No request is issued until the first
    /// read.
    pub fn new(url: &str) -> Result<Self> {
        let client = HttpClient::new().map_err(|e| HicError::SourceUnavailable {
            name: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            url: url.to_string(),
            total: None,
        })
    }

    pub(crate) fn read_at(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let data = self.read_at_most(pos, len)?;
        if data.len() < len {
            return Err(HicError::Network(format!(
                "short range response at offset {}: wanted {} bytes, got {}",
                pos,
                len,
                data.len()
            )));
        }
        Ok(data)
    }

    pub(crate) fn read_at_most(&mut self, pos: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let (data, total) = self
            .client
            .fetch_range(&self.url, pos, pos + len as u64)?;
        self.total.get_or_insert(total);
        Ok(data.to_vec())
    }

    pub(crate) fn total_len(&mut self) -> Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        self.read_at_most(0, 1)?;
        // read_at_most records the total from the probe's Content-Range
        self.total
            .ok_or_else(|| HicError::Network("resource length unavailable".to_string()))
    }
}
