// src/format/header.rs

//! Version 0 and version 3 header codecs
//!
//! Every field is read and written individually, so the wire layout never
//! depends on how Rust lays out these structs in memory.

use super::{ETAG_LEN, KEY_LEN, VARY_LEN};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Bytes occupied by the version 0 fields themselves
pub const VER0_FIELDS_SIZE: usize = 8 + 8 + 8 + 4 + 2 + 2 + 2;

/// Bytes occupied by a version 0 header on disk, including trailing padding
pub const VER0_HEADER_SIZE: usize = 40;

/// Bytes occupied by a version 3 header on disk
pub const VER3_HEADER_SIZE: usize =
    8 + VER0_FIELDS_SIZE + 1 + ETAG_LEN + 1 + VARY_LEN + KEY_LEN;

/// Amount every stored offset grows by when a header is upgraded
pub const SIZE_SHIFT: usize = VER3_HEADER_SIZE - VER0_HEADER_SIZE;

const VER0_PADDING: usize = VER0_HEADER_SIZE - VER0_FIELDS_SIZE;

/// Legacy cache header (nginx before 1.7.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ver0Header {
    pub valid_sec: u64,
    pub last_modified: u64,
    pub date: u64,
    pub crc32: u32,
    pub valid_msec: u16,
    /// Offset of the stored response headers from the start of the file
    pub header_start: u16,
    /// Offset of the response body from the start of the file
    pub body_start: u16,
}

impl Ver0Header {
    /// Decode a header from the current position, consuming all 40 bytes
    pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let header = Self {
            valid_sec: reader.read_u64::<LittleEndian>()?,
            last_modified: reader.read_u64::<LittleEndian>()?,
            date: reader.read_u64::<LittleEndian>()?,
            crc32: reader.read_u32::<LittleEndian>()?,
            valid_msec: reader.read_u16::<LittleEndian>()?,
            header_start: reader.read_u16::<LittleEndian>()?,
            body_start: reader.read_u16::<LittleEndian>()?,
        };

        let mut padding = [0u8; VER0_PADDING];
        reader.read_exact(&mut padding)?;

        Ok(header)
    }

    /// Encode the header, padding it to its on-disk size
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.valid_sec)?;
        writer.write_u64::<LittleEndian>(self.last_modified)?;
        writer.write_u64::<LittleEndian>(self.date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u16::<LittleEndian>(self.valid_msec)?;
        writer.write_u16::<LittleEndian>(self.header_start)?;
        writer.write_u16::<LittleEndian>(self.body_start)?;
        writer.write_all(&[0u8; VER0_PADDING])?;
        Ok(())
    }

    /// Length of the stored response header block
    pub fn header_block_len(&self) -> Result<u16> {
        self.body_start
            .checked_sub(self.header_start)
            .ok_or(Error::InvalidOffsets {
                header_start: self.header_start,
                body_start: self.body_start,
            })
    }
}

/// Cache header written by nginx 1.7.3 and later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ver3Header {
    pub version: u64,
    pub valid_sec: u64,
    pub last_modified: u64,
    pub date: u64,
    pub crc32: u32,
    pub valid_msec: u16,
    pub header_start: u16,
    pub body_start: u16,
    pub etag_len: u8,
    pub etag: [u8; ETAG_LEN],
    pub vary_len: u8,
    pub vary: [u8; VARY_LEN],
    pub variant: [u8; KEY_LEN],
}

impl Default for Ver3Header {
    fn default() -> Self {
        Self {
            version: 3,
            valid_sec: 0,
            last_modified: 0,
            date: 0,
            crc32: 0,
            valid_msec: 0,
            header_start: 0,
            body_start: 0,
            etag_len: 0,
            etag: [0; ETAG_LEN],
            vary_len: 0,
            vary: [0; VARY_LEN],
            variant: [0; KEY_LEN],
        }
    }
}

impl Ver3Header {
    /// Upgrade a legacy header
    ///
    /// Validity fields are copied unchanged and both offsets move by
    /// [`SIZE_SHIFT`]. ETag, Vary and variant start out empty.
    pub fn from_v0(v0: &Ver0Header) -> Result<Self> {
        Ok(Self {
            valid_sec: v0.valid_sec,
            last_modified: v0.last_modified,
            date: v0.date,
            crc32: v0.crc32,
            valid_msec: v0.valid_msec,
            header_start: shift_offset(v0.header_start)?,
            body_start: shift_offset(v0.body_start)?,
            ..Self::default()
        })
    }

    /// Store an ETag, truncating it to the buffer capacity
    pub fn set_etag(&mut self, etag: &[u8]) {
        let len = etag.len().min(ETAG_LEN);
        self.etag = [0; ETAG_LEN];
        self.etag[..len].copy_from_slice(&etag[..len]);
        self.etag_len = len as u8;
    }

    /// Store a Vary value; values that do not fit are non-cacheable
    pub fn set_vary(&mut self, vary: &[u8]) -> Result<()> {
        if vary.len() > VARY_LEN {
            return Err(Error::NonCacheableVary(
                String::from_utf8_lossy(vary).into_owned(),
            ));
        }
        self.vary = [0; VARY_LEN];
        self.vary[..vary.len()].copy_from_slice(vary);
        self.vary_len = vary.len() as u8;
        Ok(())
    }

    /// The meaningful part of the ETag buffer
    pub fn etag(&self) -> &[u8] {
        &self.etag[..usize::from(self.etag_len).min(ETAG_LEN)]
    }

    /// The meaningful part of the Vary buffer
    pub fn vary(&self) -> &[u8] {
        &self.vary[..usize::from(self.vary_len).min(VARY_LEN)]
    }

    /// Encode the header, writing exactly [`VER3_HEADER_SIZE`] bytes
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.valid_sec)?;
        writer.write_u64::<LittleEndian>(self.last_modified)?;
        writer.write_u64::<LittleEndian>(self.date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u16::<LittleEndian>(self.valid_msec)?;
        writer.write_u16::<LittleEndian>(self.header_start)?;
        writer.write_u16::<LittleEndian>(self.body_start)?;
        writer.write_u8(self.etag_len)?;
        writer.write_all(&self.etag)?;
        writer.write_u8(self.vary_len)?;
        writer.write_all(&self.vary)?;
        writer.write_all(&self.variant)?;
        Ok(())
    }

    /// Decode a header from the current position
    pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut header = Self {
            version: reader.read_u64::<LittleEndian>()?,
            valid_sec: reader.read_u64::<LittleEndian>()?,
            last_modified: reader.read_u64::<LittleEndian>()?,
            date: reader.read_u64::<LittleEndian>()?,
            crc32: reader.read_u32::<LittleEndian>()?,
            valid_msec: reader.read_u16::<LittleEndian>()?,
            header_start: reader.read_u16::<LittleEndian>()?,
            body_start: reader.read_u16::<LittleEndian>()?,
            ..Self::default()
        };
        header.etag_len = reader.read_u8()?;
        reader.read_exact(&mut header.etag)?;
        header.vary_len = reader.read_u8()?;
        reader.read_exact(&mut header.vary)?;
        reader.read_exact(&mut header.variant)?;
        Ok(header)
    }
}

fn shift_offset(offset: u16) -> Result<u16> {
    let shifted = usize::from(offset) + SIZE_SHIFT;
    u16::try_from(shifted).map_err(|_| Error::OffsetOverflow {
        offset: shifted,
        max: usize::from(u16::MAX),
    })
}
