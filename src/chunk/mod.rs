//! PNG container framing.
//!
//! Splits a byte buffer into its ordered sequence of typed chunks.
//! Framing is validated against the buffer length before any slice is taken,
//! so a corrupted length field fails instead of reading out of bounds.

use crate::error::{LensError, Result};
use std::fmt;

/// Fixed 8-byte PNG signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Length + type header bytes preceding every payload.
const HEADER_LEN: usize = 8;

/// Trailing CRC bytes following every payload.
const CRC_LEN: usize = 4;

/// Four-byte chunk type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image trailer; parsing stops after it.
    pub const IEND: ChunkType = ChunkType(*b"IEND");
    /// International text chunk carrying the embedded JSON document.
    pub const ITXT: ChunkType = ChunkType(*b"iTXt");

    /// Tag as text, `None` when the bytes are not ASCII.
    pub fn as_str(&self) -> Option<&str> {
        if self.0.is_ascii() {
            std::str::from_utf8(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(tag) => f.write_str(tag),
            None => write!(f, "{:02x?}", self.0),
        }
    }
}

/// One parsed chunk. Borrows its payload from the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Payload length declared in the header.
    pub length: u32,
    /// Type tag.
    pub chunk_type: ChunkType,
    /// Payload bytes (`length` of them).
    pub data: &'a [u8],
    /// Stored CRC, not verified.
    pub crc: u32,
}

impl Chunk<'_> {
    /// Bytes this chunk occupies in the container (header + payload + CRC).
    pub fn span(&self) -> usize {
        HEADER_LEN + self.data.len() + CRC_LEN
    }
}

/// Check for the PNG signature at offset 0.
pub fn has_png_signature(data: &[u8]) -> bool {
    data.len() >= PNG_SIGNATURE.len() && data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Parse a PNG buffer into its chunks.
///
/// Reads chunks in order until `IEND` is seen or the buffer is exhausted.
///
/// # Errors
/// * `LensError::Format` - missing signature, a header cut short, or a declared
///   length that runs past the end of the buffer
pub fn read_chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if !has_png_signature(data) {
        return Err(LensError::format("missing PNG signature"));
    }

    let mut chunks = Vec::new();
    let mut offset = PNG_SIGNATURE.len();

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < HEADER_LEN + CRC_LEN {
            return Err(LensError::format(format!(
                "truncated chunk header at offset {} ({} bytes left)",
                offset, remaining
            )));
        }

        let length = read_u32_be(&data[offset..offset + 4]);
        let chunk_type = ChunkType([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]);

        // usize arithmetic cannot overflow here: length <= u32::MAX and remaining
        // already fits in usize.
        let payload_len = length as usize;
        if payload_len > remaining - HEADER_LEN - CRC_LEN {
            return Err(LensError::format(format!(
                "chunk {} at offset {} declares {} bytes but only {} remain",
                chunk_type,
                offset,
                length,
                remaining - HEADER_LEN - CRC_LEN
            )));
        }

        let payload_start = offset + HEADER_LEN;
        let payload_end = payload_start + payload_len;
        let crc = read_u32_be(&data[payload_end..payload_end + CRC_LEN]);

        chunks.push(Chunk {
            length,
            chunk_type,
            data: &data[payload_start..payload_end],
            crc,
        });

        offset = payload_end + CRC_LEN;
        if chunk_type == ChunkType::IEND {
            break;
        }
    }

    Ok(chunks)
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
