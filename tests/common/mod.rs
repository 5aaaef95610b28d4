// tests/common/mod.rs

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use ngx_cache_conv::format::{VER0_HEADER_SIZE, VER3_HEADER_SIZE};
use ngx_cache_conv::{Ver0Header, Ver3Header};
use std::fs;
use std::path::{Path, PathBuf};

pub const BODY: &[u8] = b"<html>cached body</html>";

pub const GZIP_BLOCK: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: text/html\r\n\
ETag: \"5f3e-abc\"\r\n\
Vary: Accept-Encoding\r\n\
Accept-Encoding: gzip\r\n\
\r\n";

pub const PLAIN_BLOCK: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 24\r\n\r\n";

pub const STAR_BLOCK: &[u8] = b"HTTP/1.1 200 OK\r\nVary: *\r\n\r\n";

/// Bytes between the fixed header and the header block
const KEY_LINE: &[u8] = b"\nKEY: http://example.com/\n";

/// Version 0 header describing `block` placed after the key line
pub fn legacy_header(block: &[u8]) -> Ver0Header {
    let header_start = (VER0_HEADER_SIZE + KEY_LINE.len()) as u16;
    Ver0Header {
        valid_sec: 1_700_000_000,
        last_modified: 1_699_000_000,
        date: 1_699_999_000,
        crc32: 0xdead_beef,
        valid_msec: 250,
        header_start,
        body_start: header_start + block.len() as u16,
    }
}

/// Complete version 0 record: header, key line, header block, body
pub fn legacy_record(block: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    legacy_header(block).encode(&mut out).unwrap();
    out.extend_from_slice(KEY_LINE);
    out.extend_from_slice(block);
    out.extend_from_slice(body);
    out
}

/// Complete version 3 record with no ETag or Vary
pub fn current_record(body: &[u8]) -> Vec<u8> {
    let header = Ver3Header {
        header_start: VER3_HEADER_SIZE as u16,
        body_start: (VER3_HEADER_SIZE + PLAIN_BLOCK.len()) as u16,
        ..Ver3Header::default()
    };

    let mut out = Vec::new();
    header.encode(&mut out).unwrap();
    out.extend_from_slice(PLAIN_BLOCK);
    out.extend_from_slice(body);
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, bytes).unwrap();
    path
}

pub fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// All regular files below `dir`
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
