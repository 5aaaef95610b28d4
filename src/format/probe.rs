// src/format/probe.rs

use super::VERSION_CEILING;
use crate::error::Result;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Detect the header version of a cache file
///
/// Reads the first 8 bytes of the file as a little-endian integer and
/// restores the caller's read position afterwards. Legacy (version 0)
/// headers have no version field, so a value above [`VERSION_CEILING`] is
/// really a timestamp and maps to 0. A file too short to hold a tag is
/// treated the same way.
pub fn probe_version<R: Read + Seek>(source: &mut R) -> Result<u64> {
    let position = source.stream_position()?;
    source.seek(SeekFrom::Start(0))?;

    let mut prefix = [0u8; 8];
    let filled = read_prefix(source, &mut prefix);
    source.seek(SeekFrom::Start(position))?;

    if filled? < prefix.len() {
        return Ok(0);
    }

    let tag = u64::from_le_bytes(prefix);
    Ok(if tag > VERSION_CEILING { 0 } else { tag })
}

/// Fill as much of `buf` as the source allows, stopping at end of file
fn read_prefix<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
