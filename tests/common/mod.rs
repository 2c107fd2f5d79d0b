//! Synthetic PNG containers for tests.
//!
//! The image data is a placeholder; only chunk framing matters to the
//! extractor.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Builds a PNG chunk by chunk.
pub struct PngBuilder {
    bytes: Vec<u8>,
}

impl PngBuilder {
    pub fn new() -> Self {
        PngBuilder {
            bytes: SIGNATURE.to_vec(),
        }
        .chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0])
    }

    pub fn chunk(mut self, tag: &[u8; 4], payload: &[u8]) -> Self {
        self.bytes
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(tag);
        self.bytes.extend_from_slice(payload);
        self.bytes.extend_from_slice(&0u32.to_be_bytes());
        self
    }

    /// Uncompressed iTXt chunk holding `text`.
    pub fn itxt(self, text: &str) -> Self {
        let payload = itxt_payload(text.as_bytes(), false);
        self.chunk(b"iTXt", &payload)
    }

    /// zlib-compressed iTXt chunk holding `text`.
    pub fn itxt_compressed(self, text: &str) -> Self {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).expect("compress");
        let deflated = encoder.finish().expect("finish");
        let payload = itxt_payload(&deflated, true);
        self.chunk(b"iTXt", &payload)
    }

    pub fn idat(self) -> Self {
        self.chunk(b"IDAT", &[0x78, 0x9c, 0x63, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01])
    }

    pub fn finish(self) -> Vec<u8> {
        self.chunk(b"IEND", &[]).bytes
    }
}

fn itxt_payload(text: &[u8], compressed: bool) -> Vec<u8> {
    let mut payload = b"Description\0".to_vec();
    payload.push(u8::from(compressed));
    payload.push(0);
    payload.extend_from_slice(b"\0\0");
    payload.extend_from_slice(text);
    payload
}

/// A player entry as written by screenshot tools.
pub fn player(id: &str, name: &str) -> Value {
    json!({"id": id, "displayName": name})
}

/// Screenshot metadata naming the given players.
pub fn world_metadata(players: &[Value]) -> Value {
    json!({
        "application": "VRCX",
        "version": 1,
        "author": {"id": "usr_author", "displayName": "Author"},
        "world": {"name": "The Great Pug", "id": "wrld_pug"},
        "players": players,
    })
}

/// Write a PNG embedding `metadata` at `path`, creating parent directories.
pub fn write_screenshot(path: &Path, metadata: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    let png = PngBuilder::new()
        .itxt(&metadata.to_string())
        .idat()
        .finish();
    std::fs::write(path, png).expect("write png");
}
