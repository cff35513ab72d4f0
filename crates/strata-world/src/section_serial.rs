//! Binary serialization and deserialization for [`Section`].
//!
//! A section file is a gzip stream. The decompressed payload is versioned and
//! append-only: each format version adds fields at the end, so older files
//! stay decodable and simply leave the newer fields at their empty default.
//!
//! ## Decompressed Layout
//!
//! | Since | Size | Field |
//! |-------|------|-------|
//! | 1 | 1 | Format version (`u8`, currently 3) |
//! | 1 | V×4 | Cells (`u32` LE each, 0 = empty, otherwise id + 1) |
//! | 2 | A×4 | Edges (`u32` LE each, same bias as cells) |
//! | 2 | var | Extras: per cell a `u32` LE count, then `count` × `u32` LE ids |
//! | 3 | 4 | Data length (`u32` LE) |
//! | 3 | L | Data as a UTF-8 JSON object |
//!
//! Where V = `SECTION_VOLUME`, A = `SECTION_AREA`, and all grids are walked in
//! [`LocalPos::index`](strata_coords::LocalPos::index) order.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use strata_coords::{SECTION_AREA, SECTION_VOLUME, SectionCoord};

use crate::registry::ContentId;
use crate::section::{Section, SectionData};

/// Format version written by [`encode`].
pub const FORMAT_VERSION: u8 = 3;

/// First version carrying the edge and extra grids.
pub const EDGES_VERSION: u8 = 2;

/// First version carrying the JSON data blob.
pub const DATA_VERSION: u8 = 3;

/// Largest raw (biased) value a cell or edge may hold.
const MAX_BIASED: u32 = u16::MAX as u32 + 1;

/// Budget for the variable-length parts of a payload: extra ids and the data blob.
const MAX_VARIABLE_BYTES: usize = 64 * 1024 * 1024;

/// Largest decompressed payload [`decode`] accepts and [`encode`] produces.
///
/// The fixed grids, one extra count per cell, and the data length prefix,
/// plus [`MAX_VARIABLE_BYTES`].
pub const MAX_PAYLOAD: usize =
    1 + SECTION_VOLUME * 4 + SECTION_AREA * 4 + SECTION_VOLUME * 4 + 4 + MAX_VARIABLE_BYTES;

/// Errors produced while encoding or decoding a section.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The gzip layer could not be read or written.
    #[error("compression stream error: {0}")]
    Compression(#[source] std::io::Error),
    /// The version byte is newer than this build understands.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    /// The version byte is 0, which no writer has ever produced.
    #[error("invalid format version: {0}")]
    InvalidVersion(u8),
    /// The payload ended early.
    #[error("data truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum expected byte count.
        expected: usize,
        /// Actual byte count available.
        actual: usize,
    },
    /// A cell or edge value does not map to any [`ContentId`].
    #[error("content value out of range: {0}")]
    InvalidContent(u32),
    /// An extra-list entry does not fit a [`ContentId`].
    #[error("extra value out of range: {0}")]
    InvalidExtra(u32),
    /// The data blob is not a JSON object.
    #[error("invalid section data: {0}")]
    Json(#[from] serde_json::Error),
    /// Bytes remain after the last field of the declared version.
    #[error("{0} trailing bytes after section payload")]
    TrailingBytes(usize),
    /// The decompressed payload exceeds the size limit.
    #[error("section payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    /// A length does not fit its `u32` prefix.
    #[error("length {0} does not fit a u32 prefix")]
    LengthOverflow(usize),
}

/// Encodes a section at the current [`FORMAT_VERSION`].
pub fn encode(section: &Section) -> Result<Vec<u8>, CodecError> {
    encode_with_version(section, FORMAT_VERSION)
}

/// Encodes a section in an older (or the current) format version.
///
/// Fields the version does not carry are dropped.
pub fn encode_with_version(section: &Section, version: u8) -> Result<Vec<u8>, CodecError> {
    if version == 0 {
        return Err(CodecError::InvalidVersion(version));
    }
    if version > FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut buf = Vec::with_capacity(1 + (SECTION_VOLUME + SECTION_AREA) * 4 + SECTION_VOLUME * 4);
    buf.push(version);

    for cell in section.cells() {
        buf.extend_from_slice(&bias(*cell).to_le_bytes());
    }

    if version >= EDGES_VERSION {
        for edge in section.edges() {
            buf.extend_from_slice(&bias(*edge).to_le_bytes());
        }
        for index in 0..SECTION_VOLUME {
            let list = section.extras_at(index);
            buf.extend_from_slice(&length_prefix(list.len())?.to_le_bytes());
            for id in list {
                buf.extend_from_slice(&(id.0 as u32).to_le_bytes());
            }
        }
    }

    if version >= DATA_VERSION {
        let json = serde_json::to_vec(section.data())?;
        buf.extend_from_slice(&length_prefix(json.len())?.to_le_bytes());
        buf.extend_from_slice(&json);
    }

    if buf.len() > MAX_PAYLOAD {
        return Err(CodecError::PayloadTooLarge { limit: MAX_PAYLOAD });
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&buf).map_err(CodecError::Compression)?;
    encoder.finish().map_err(CodecError::Compression)
}

/// Decodes a section file's bytes into a [`Section`] at `coord`.
///
/// Returns an error if the data is corrupted, truncated, larger than
/// [`MAX_PAYLOAD`] once decompressed, or written by a newer format version.
/// A decode failure never yields an empty section.
pub fn decode(coord: SectionCoord, bytes: &[u8]) -> Result<Section, CodecError> {
    decode_limited(coord, bytes, MAX_PAYLOAD)
}

fn decode_limited(coord: SectionCoord, bytes: &[u8], limit: usize) -> Result<Section, CodecError> {
    let mut payload = Vec::new();
    GzDecoder::new(bytes)
        .take(limit as u64 + 1)
        .read_to_end(&mut payload)
        .map_err(CodecError::Compression)?;
    if payload.len() > limit {
        return Err(CodecError::PayloadTooLarge { limit });
    }

    let mut reader = Reader::new(&payload);
    let version = reader.u8()?;
    if version == 0 {
        return Err(CodecError::InvalidVersion(version));
    }
    if version > FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut section = Section::new(coord);

    reader.ensure(SECTION_VOLUME * 4)?;
    for cell in section.cells_mut() {
        *cell = unbias(reader.u32()?)?;
    }

    if version >= EDGES_VERSION {
        reader.ensure(SECTION_AREA * 4)?;
        for edge in section.edges_mut() {
            *edge = unbias(reader.u32()?)?;
        }
        for index in 0..SECTION_VOLUME {
            let count = reader.u32()? as usize;
            if count == 0 {
                continue;
            }
            reader.ensure(count.saturating_mul(4))?;
            let mut list = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = reader.u32()?;
                let id = u16::try_from(raw).map_err(|_| CodecError::InvalidExtra(raw))?;
                list.push(ContentId(id));
            }
            section.set_extras_at(index, list);
        }
    }

    if version >= DATA_VERSION {
        let len = reader.u32()? as usize;
        let json = reader.bytes(len)?;
        let data: SectionData = serde_json::from_slice(json)?;
        section.set_data(data);
    }

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }

    Ok(section)
}

fn length_prefix(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))
}

fn bias(content: Option<ContentId>) -> u32 {
    content.map_or(0, |id| id.0 as u32 + 1)
}

fn unbias(raw: u32) -> Result<Option<ContentId>, CodecError> {
    match raw {
        0 => Ok(None),
        1..=MAX_BIASED => Ok(Some(ContentId((raw - 1) as u16))),
        _ => Err(CodecError::InvalidContent(raw)),
    }
}

/// Bounds-checked little-endian cursor over the decompressed payload.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails with [`CodecError::Truncated`] unless `len` more bytes are available.
    fn ensure(&self, len: usize) -> Result<(), CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Truncated {
                expected: self.pos.saturating_add(len),
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        self.ensure(len)?;
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
