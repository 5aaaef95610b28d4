// src/variant.rs

//! Cache variant key computation
//!
//! nginx distinguishes variants of one cached URL by an MD5 digest over
//! the response headers named in `Vary` (`ngx_http_file_cache_vary`). For
//! each listed name, in order, the digest covers:
//!
//! ```text
//! lowercase(name) ":" value "\r\n"
//! ```
//!
//! where `value` is empty when the header is absent.

use crate::error::{Error, Result};
use crate::format::{KEY_LEN, VARY_LEN};
use crate::headers::header_bytes;
use http::HeaderMap;
use md5::{Digest, Md5};

/// Reject Vary values nginx never caches
///
/// A wildcard varies on everything, and a value longer than the header's
/// Vary buffer cannot be stored.
pub fn check_cacheable(vary: &[u8]) -> Result<()> {
    if vary.len() > VARY_LEN || vary == b"*" {
        return Err(Error::NonCacheableVary(
            String::from_utf8_lossy(vary).into_owned(),
        ));
    }
    Ok(())
}

/// Compute the variant key for a Vary value against the stored headers
pub fn variant_hash(vary: &[u8], headers: &HeaderMap) -> Result<[u8; KEY_LEN]> {
    check_cacheable(vary)?;

    let mut hasher = Md5::new();
    for name in vary.split(|&b| b == b',') {
        let name = name.trim_ascii();
        hasher.update(name.to_ascii_lowercase());
        hasher.update(b":");
        hasher.update(header_bytes(headers, name).unwrap_or_default());
        hasher.update(b"\r\n");
    }

    Ok(hasher.finalize().into())
}
