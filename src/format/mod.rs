// src/format/mod.rs
//! nginx disk cache file header formats
//!
//! An nginx cache file starts with a fixed binary header describing the
//! cached response, followed by the cache key line, the raw upstream
//! response headers and the body. The header layout changed over nginx
//! releases:
//!
//! | Version | Size | Layout |
//! |---------|------|--------|
//! | 0 | 40 bytes | no version tag, timestamps, crc32, offsets |
//! | 3 | 144 bytes | version tag, version 0 fields, ETag, Vary, variant |
//!
//! Both layouts are little-endian with no padding between fields. The
//! version 0 header carries 6 trailing padding bytes because the server
//! wrote it straight from a native 64-bit struct.

mod header;
mod probe;

pub use header::{Ver0Header, Ver3Header, SIZE_SHIFT, VER0_FIELDS_SIZE, VER0_HEADER_SIZE, VER3_HEADER_SIZE};
pub use probe::probe_version;

/// Highest header version this tool understands
pub const MAX_VERSION: u64 = 3;

/// Version tags above this are bytes of a legacy header, not a version
pub const VERSION_CEILING: u64 = 1000;

/// Capacity of the ETag buffer (NGX_HTTP_CACHE_ETAG_LEN)
pub const ETAG_LEN: usize = 42;

/// Capacity of the Vary buffer (NGX_HTTP_CACHE_VARY_LEN)
pub const VARY_LEN: usize = 42;

/// Size of the variant key (NGX_HTTP_CACHE_KEY_LEN)
pub const KEY_LEN: usize = 16;

/// Whether a probed version is one this tool can read
#[inline]
pub fn is_supported(version: u64) -> bool {
    version <= MAX_VERSION
}
