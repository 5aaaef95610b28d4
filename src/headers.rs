// src/headers.rs

//! Stored response header extraction
//!
//! nginx copies the upstream response status line and header lines into
//! the cache file between `header_start` and `body_start`. The block is
//! parsed with MIME header rules: one `Name: Value` per line, folded
//! continuation lines, terminated by an empty line.

use crate::error::{Error, Result};
use crate::format::Ver0Header;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

/// Read and parse the header block recorded in a legacy header
///
/// Reads at most `body_start - header_start` bytes starting at
/// `header_start`; a file that ends early yields a shorter block.
pub fn extract_headers<R: Read + Seek>(source: &mut R, header: &Ver0Header) -> Result<HeaderMap> {
    let len = header.header_block_len()?;

    source.seek(SeekFrom::Start(u64::from(header.header_start)))?;
    let mut block = Vec::with_capacity(usize::from(len) + 2);
    source.by_ref().take(u64::from(len)).read_to_end(&mut block)?;

    trace!(
        "Read {} of {} header block bytes at offset {}",
        block.len(),
        len,
        header.header_start
    );

    parse_header_block(&block)
}

/// Parse a raw header block whose first line is an HTTP status line
///
/// A terminating blank line is appended before parsing because nginx may
/// store the block without it when the block ends exactly at `body_start`.
pub fn parse_header_block(block: &[u8]) -> Result<HeaderMap> {
    let mut data = Vec::with_capacity(block.len() + 2);
    data.extend_from_slice(block);
    data.extend_from_slice(b"\r\n");

    let mut lines = Lines::new(&data);
    // Status line, e.g. "HTTP/1.1 200 OK"
    lines.next();

    let mut map = HeaderMap::new();
    let mut first = true;

    loop {
        let Some(line) = lines.next() else {
            return Err(Error::MalformedHeaders(
                "header block ends without a blank line".to_string(),
            ));
        };

        if first && line.first().is_some_and(|&b| is_fold(b)) {
            return Err(Error::MalformedHeaders(format!(
                "initial header line is a continuation: {:?}",
                String::from_utf8_lossy(line)
            )));
        }
        first = false;

        if line.is_empty() {
            return Ok(map);
        }

        let mut line = trim_end(line).to_vec();
        while let Some(next) = lines.peek() {
            if !next.first().is_some_and(|&b| is_fold(b)) {
                break;
            }
            lines.next();
            let folded = trim(next);
            if !folded.is_empty() {
                line.push(b' ');
                line.extend_from_slice(folded);
            }
        }

        insert_line(&mut map, &line)?;
    }
}

fn insert_line(map: &mut HeaderMap, line: &[u8]) -> Result<()> {
    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return Err(Error::MalformedHeaders(format!(
            "missing colon: {:?}",
            String::from_utf8_lossy(line)
        )));
    };

    let (name, value) = (&line[..colon], trim(&line[colon + 1..]));
    if name.is_empty() {
        // Field names are tokens of at least one character; tolerate and skip
        return Ok(());
    }

    let name = HeaderName::from_bytes(name).map_err(|_| {
        Error::MalformedHeaders(format!(
            "invalid header name: {:?}",
            String::from_utf8_lossy(name)
        ))
    })?;
    let value = HeaderValue::from_bytes(value).map_err(|_| {
        Error::MalformedHeaders(format!("invalid value for header {}", name))
    })?;

    map.append(name, value);
    Ok(())
}

/// Look up the first value of a header as raw bytes
///
/// Names that are not valid header names simply have no value.
pub fn header_bytes<'a>(map: &'a HeaderMap, name: &[u8]) -> Option<&'a [u8]> {
    let name = HeaderName::from_bytes(name).ok()?;
    map.get(&name).map(HeaderValue::as_bytes)
}

#[inline]
fn is_fold(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_fold(b)).unwrap_or(bytes.len());
    trim_end(&bytes[start..])
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| !is_fold(b)).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Line splitter over `\n`, stripping an optional trailing `\r`
///
/// A final fragment without a newline is not a complete line and is not
/// yielded.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    fn peek(&self) -> Option<&'a [u8]> {
        Self::split(self.rest).map(|(line, _)| line)
    }

    fn split(data: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
        let newline = data.iter().position(|&b| b == b'\n')?;
        let line = &data[..newline];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some((line, &data[newline + 1..]))
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (line, rest) = Self::split(self.rest)?;
        self.rest = rest;
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::VER0_HEADER_SIZE;
    use std::io::Cursor;

    const BLOCK: &[u8] = b"HTTP/1.1 200 OK\r\n\
        ETag: \"abc\"\r\n\
        Vary: Accept-Encoding\r\n\
        Accept-Encoding: gzip\r\n\
        \r\n";

    #[test]
    fn test_parse_basic_block() {
        let map = parse_header_block(BLOCK).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(header_bytes(&map, b"etag"), Some(&b"\"abc\""[..]));
        assert_eq!(header_bytes(&map, b"Vary"), Some(&b"Accept-Encoding"[..]));
        assert_eq!(header_bytes(&map, b"ACCEPT-ENCODING"), Some(&b"gzip"[..]));
        assert_eq!(header_bytes(&map, b"Cookie"), None);
    }

    #[test]
    fn test_missing_terminator_is_supplied() {
        let block = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n";
        let map = parse_header_block(block).unwrap();
        assert_eq!(header_bytes(&map, b"content-type"), Some(&b"text/html"[..]));
    }

    #[test]
    fn test_truncated_mid_line_is_malformed() {
        // The appended CRLF completes the line but no blank line follows
        let block = b"HTTP/1.1 200 OK\r\nContent-Type: text/ht";
        let err = parse_header_block(block).unwrap_err();
        assert!(matches!(err, Error::MalformedHeaders(_)));
    }

    #[test]
    fn test_status_line_only() {
        let map = parse_header_block(b"HTTP/1.1 204 No Content\r\n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_bare_newlines_and_whitespace() {
        // A tab-led line right after the status line continues nothing
        let block = b"HTTP/1.0 200 OK\n\tX-Empty:\t\n\n";
        assert!(matches!(
            parse_header_block(block),
            Err(Error::MalformedHeaders(_))
        ));

        let block = b"HTTP/1.0 200 OK\nServer:   nginx  \nX-Empty:\t\n\n";
        let map = parse_header_block(block).unwrap();
        assert_eq!(header_bytes(&map, b"server"), Some(&b"nginx"[..]));
        assert_eq!(header_bytes(&map, b"x-empty"), Some(&b""[..]));
    }

    #[test]
    fn test_folded_continuation() {
        let block = b"HTTP/1.1 200 OK\r\nVary: Accept-Encoding,\r\n  Cookie\r\n\r\n";
        let map = parse_header_block(block).unwrap();
        assert_eq!(header_bytes(&map, b"vary"), Some(&b"Accept-Encoding, Cookie"[..]));
    }

    #[test]
    fn test_repeated_header_first_value_wins() {
        let block = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n";
        let map = parse_header_block(block).unwrap();
        assert_eq!(map.get_all("set-cookie").iter().count(), 2);
        assert_eq!(header_bytes(&map, b"Set-Cookie"), Some(&b"a=1"[..]));
    }

    #[test]
    fn test_missing_colon_is_malformed() {
        let block = b"HTTP/1.1 200 OK\r\nthis is not a header\r\n\r\n";
        assert!(matches!(
            parse_header_block(block),
            Err(Error::MalformedHeaders(_))
        ));
    }

    #[test]
    fn test_invalid_name_is_malformed() {
        let block = b"HTTP/1.1 200 OK\r\nBad Name: x\r\n\r\n";
        assert!(matches!(
            parse_header_block(block),
            Err(Error::MalformedHeaders(_))
        ));
    }

    #[test]
    fn test_empty_name_is_skipped() {
        let block = b"HTTP/1.1 200 OK\r\n: orphan\r\nX-A: 1\r\n\r\n";
        let map = parse_header_block(block).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_lines_after_terminator_ignored() {
        let block = b"HTTP/1.1 200 OK\r\nX-A: 1\r\n\r\nnot a header at all";
        let map = parse_header_block(block).unwrap();
        assert_eq!(header_bytes(&map, b"x-a"), Some(&b"1"[..]));
    }

    #[test]
    fn test_extract_from_record() {
        let key = b"\nKEY: http://example.com/\n";
        let header_start = (VER0_HEADER_SIZE + key.len()) as u16;
        let header = Ver0Header {
            header_start,
            body_start: header_start + BLOCK.len() as u16,
            ..Default::default()
        };

        let mut file = Vec::new();
        header.encode(&mut file).unwrap();
        file.extend_from_slice(key);
        file.extend_from_slice(BLOCK);
        file.extend_from_slice(b"<html>body</html>");

        let map = extract_headers(&mut Cursor::new(file), &header).unwrap();
        assert_eq!(header_bytes(&map, b"etag"), Some(&b"\"abc\""[..]));
    }

    #[test]
    fn test_extract_block_without_terminator() {
        // nginx stores the block up to body_start without the final CRLF
        let block = b"HTTP/1.1 200 OK\r\nETag: \"x\"\r\n";
        let header = Ver0Header {
            header_start: VER0_HEADER_SIZE as u16,
            body_start: (VER0_HEADER_SIZE + block.len()) as u16,
            ..Default::default()
        };

        let mut file = Vec::new();
        header.encode(&mut file).unwrap();
        file.extend_from_slice(block);
        file.extend_from_slice(b"body");

        let map = extract_headers(&mut Cursor::new(file), &header).unwrap();
        assert_eq!(header_bytes(&map, b"etag"), Some(&b"\"x\""[..]));
    }

    #[test]
    fn test_extract_inverted_offsets() {
        let header = Ver0Header {
            header_start: 90,
            body_start: 60,
            ..Default::default()
        };
        let err = extract_headers(&mut Cursor::new(vec![0u8; 128]), &header).unwrap_err();
        assert!(matches!(err, Error::InvalidOffsets { .. }));
    }
}
