// src/convert.rs

//! Version 0 to version 3 record conversion
//!
//! Conversion reads the legacy header, parses the stored response headers
//! to recover the ETag and Vary values nginx 1.7.3+ keeps in the header,
//! computes the variant key, and writes the new header followed by the rest
//! of the original file unchanged. Offsets in the new header account for
//! the larger header, so the key line, stored headers and body land exactly
//! where they are expected.

use crate::error::{Error, Result};
use crate::format::{self, Ver0Header, Ver3Header, VER0_HEADER_SIZE};
use crate::headers::{extract_headers, header_bytes};
use crate::variant::variant_hash;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

/// What [`convert_stream`] did with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAction {
    /// Already version 3; bytes copied through unchanged
    PassedThrough { bytes: u64 },
    /// Converted from version 0
    Converted { header: Box<Ver3Header>, body_bytes: u64 },
}

/// Build the version 3 header for a legacy record without writing anything
///
/// All validation happens here: offsets, header block syntax and the Vary
/// policy. A record rejected at this stage produces no output.
pub fn plan_record<R: Read + Seek>(source: &mut R) -> Result<Ver3Header> {
    source.seek(SeekFrom::Start(0))?;
    let v0 = Ver0Header::decode(source)?;

    let headers = extract_headers(source, &v0)?;
    let mut v3 = Ver3Header::from_v0(&v0)?;

    if let Some(etag) = header_bytes(&headers, b"etag").filter(|v| !v.is_empty()) {
        v3.set_etag(etag);
    }

    if let Some(vary) = header_bytes(&headers, b"vary").filter(|v| !v.is_empty()) {
        v3.variant = variant_hash(vary, &headers)?;
        v3.set_vary(vary)?;
    }

    Ok(v3)
}

/// Convert a legacy record from `source` into `sink`
///
/// The source may be positioned anywhere. On success the sink holds the
/// version 3 header followed by every byte after the legacy header. If an
/// error is returned after writing started, the sink contents are partial
/// and must be discarded.
pub fn convert_record<R, W>(source: &mut R, sink: &mut W) -> Result<Ver3Header>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    let header = plan_record(source)?;
    let body_bytes = write_record(source, sink, &header)?;

    debug!(
        "Converted record: etag_len={} vary_len={} header_start={} body_start={} ({} bytes after header)",
        header.etag_len, header.vary_len, header.header_start, header.body_start, body_bytes
    );

    Ok(header)
}

fn write_record<R, W>(source: &mut R, sink: &mut W, header: &Ver3Header) -> Result<u64>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    source.seek(SeekFrom::Start(VER0_HEADER_SIZE as u64))?;
    header.encode(sink)?;
    let copied = io::copy(source, sink)?;
    Ok(copied)
}

/// Emit a file in version 3 form, converting only when needed
///
/// Version 3 input is copied through unchanged, version 0 input is
/// converted, and any other version is rejected before anything is
/// written.
pub fn convert_stream<R, W>(source: &mut R, sink: &mut W) -> Result<StreamAction>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    match format::probe_version(source)? {
        3 => {
            source.seek(SeekFrom::Start(0))?;
            let bytes = io::copy(source, sink)?;
            Ok(StreamAction::PassedThrough { bytes })
        }
        0 => {
            let header = plan_record(source)?;
            let body_bytes = write_record(source, sink, &header)?;
            Ok(StreamAction::Converted {
                header: Box::new(header),
                body_bytes,
            })
        }
        other => Err(Error::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{SIZE_SHIFT, VER3_HEADER_SIZE};
    use md5::{Digest, Md5};
    use std::io::Cursor;

    const KEY: &[u8] = b"\nKEY: http://example.com/index.html\n";
    const BODY: &[u8] = b"<html><body>cached</body></html>";

    fn legacy_record(block: &[u8]) -> (Ver0Header, Vec<u8>) {
        let header_start = (VER0_HEADER_SIZE + KEY.len()) as u16;
        let header = Ver0Header {
            valid_sec: 1_420_070_400,
            last_modified: 1_419_984_000,
            date: 1_420_066_800,
            crc32: 0x1234_5678,
            valid_msec: 0,
            header_start,
            body_start: header_start + block.len() as u16,
        };

        let mut file = Vec::new();
        header.encode(&mut file).unwrap();
        file.extend_from_slice(KEY);
        file.extend_from_slice(block);
        file.extend_from_slice(BODY);
        (header, file)
    }

    #[test]
    fn test_convert_etag_vary_record() {
        let block = b"HTTP/1.1 200 OK\r\nETag: \"abc\"\r\nVary: Accept-Encoding\r\nAccept-Encoding: gzip\r\n\r\n";
        let (v0, file) = legacy_record(block);

        let mut out = Vec::new();
        let v3 = convert_record(&mut Cursor::new(&file), &mut out).unwrap();

        assert_eq!(v3.etag(), b"\"abc\"");
        assert_eq!(v3.etag_len, 5);
        assert_eq!(v3.vary(), b"Accept-Encoding");
        assert_eq!(v3.vary_len, 15);
        let expected: [u8; 16] = Md5::digest(b"accept-encoding:gzip\r\n").into();
        assert_eq!(v3.variant, expected);
        assert_eq!(usize::from(v3.header_start), usize::from(v0.header_start) + SIZE_SHIFT);
        assert_eq!(usize::from(v3.body_start), usize::from(v0.body_start) + SIZE_SHIFT);

        assert_eq!(out.len(), file.len() + SIZE_SHIFT);
        assert_eq!(&out[VER3_HEADER_SIZE..], &file[VER0_HEADER_SIZE..]);

        // The recorded offsets point at the same content in the new file
        let hs = usize::from(v3.header_start);
        let bs = usize::from(v3.body_start);
        assert!(out[hs..].starts_with(b"HTTP/1.1 200 OK"));
        assert_eq!(&out[bs..], BODY);

        let decoded = Ver3Header::decode(&mut Cursor::new(&out)).unwrap();
        assert_eq!(decoded, v3);
    }

    #[test]
    fn test_convert_without_etag_or_vary() {
        let block = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n";
        let (_, file) = legacy_record(block);

        let mut out = Vec::new();
        let v3 = convert_record(&mut Cursor::new(&file), &mut out).unwrap();
        assert_eq!(v3.etag_len, 0);
        assert_eq!(v3.vary_len, 0);
        assert_eq!(v3.variant, [0u8; 16]);
    }

    #[test]
    fn test_empty_vary_is_ignored() {
        let block = b"HTTP/1.1 200 OK\r\nVary:\r\nETag:   \r\n\r\n";
        let (_, file) = legacy_record(block);

        let v3 = plan_record(&mut Cursor::new(&file)).unwrap();
        assert_eq!(v3.vary_len, 0);
        assert_eq!(v3.etag_len, 0);
        assert_eq!(v3.variant, [0u8; 16]);
    }

    #[test]
    fn test_wildcard_vary_writes_nothing() {
        let block = b"HTTP/1.1 200 OK\r\nVary: *\r\n\r\n";
        let (_, file) = legacy_record(block);

        let mut out = Vec::new();
        let err = convert_record(&mut Cursor::new(&file), &mut out).unwrap_err();
        assert!(matches!(err, Error::NonCacheableVary(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_long_vary_writes_nothing() {
        let block = b"HTTP/1.1 200 OK\r\nVary: Accept-Encoding, Accept-Language, User-Agent\r\n\r\n";
        let (_, file) = legacy_record(block);

        let mut out = Vec::new();
        let err = convert_record(&mut Cursor::new(&file), &mut out).unwrap_err();
        assert!(matches!(err, Error::NonCacheableVary(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_block_writes_nothing() {
        let block = b"HTTP/1.1 200 OK\r\nnot a header line\r\n\r\n";
        let (_, file) = legacy_record(block);

        let mut out = Vec::new();
        let err = convert_record(&mut Cursor::new(&file), &mut out).unwrap_err();
        assert!(matches!(err, Error::MalformedHeaders(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_convert_repositions_source() {
        let block = b"HTTP/1.1 200 OK\r\n\r\n";
        let (_, file) = legacy_record(block);

        let mut cursor = Cursor::new(&file);
        cursor.set_position(77);
        let mut out = Vec::new();
        convert_record(&mut cursor, &mut out).unwrap();
        assert_eq!(&out[VER3_HEADER_SIZE..], &file[VER0_HEADER_SIZE..]);
    }

    #[test]
    fn test_stream_passes_version_3_through() {
        let mut v3 = Ver3Header::default();
        v3.set_etag(b"\"kept\"");
        let mut file = Vec::new();
        v3.encode(&mut file).unwrap();
        file.extend_from_slice(b"\nKEY: k\nHTTP/1.1 200 OK\r\n\r\nbody");

        let mut out = Vec::new();
        let action = convert_stream(&mut Cursor::new(&file), &mut out).unwrap();
        assert_eq!(
            action,
            StreamAction::PassedThrough {
                bytes: file.len() as u64
            }
        );
        assert_eq!(out, file);
    }

    #[test]
    fn test_stream_converts_version_0() {
        let (_, file) = legacy_record(b"HTTP/1.1 200 OK\r\n\r\n");

        let mut out = Vec::new();
        let action = convert_stream(&mut Cursor::new(&file), &mut out).unwrap();
        assert!(matches!(action, StreamAction::Converted { .. }));
        assert_eq!(crate::format::probe_version(&mut Cursor::new(&out)).unwrap(), 3);
    }

    #[test]
    fn test_stream_rejects_unsupported_version() {
        let mut file = 2u64.to_le_bytes().to_vec();
        file.extend_from_slice(&[0u8; 200]);

        let mut out = Vec::new();
        let err = convert_stream(&mut Cursor::new(&file), &mut out).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(2)));
        assert!(out.is_empty());
    }
}
