//! iTXt payload envelope.
//!
//! Layout: keyword NUL, compression flag (1 byte), compression method
//! (1 byte), language tag NUL, translated keyword NUL, then the text.

use crate::error::{LensError, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Borrowed view of an iTXt payload split into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEnvelope<'a> {
    /// Keyword (Latin-1, kept as bytes).
    pub keyword: &'a [u8],
    /// Whether `text` is zlib-compressed.
    pub compressed: bool,
    /// Compression method byte; 0 is zlib.
    pub compression_method: u8,
    /// Language tag.
    pub language_tag: &'a [u8],
    /// Translated keyword (UTF-8).
    pub translated_keyword: &'a [u8],
    /// Remaining bytes, possibly compressed.
    pub text: &'a [u8],
}

impl TextEnvelope<'_> {
    /// Keyword as a lossy string.
    pub fn keyword_str(&self) -> String {
        String::from_utf8_lossy(self.keyword).into_owned()
    }

    /// Decompress (when flagged) and decode the text as UTF-8.
    pub fn decode_text(&self) -> Result<String> {
        let bytes = if self.compressed {
            if self.compression_method != 0 {
                return Err(decode_error(
                    format!("unsupported compression method {}", self.compression_method),
                    self.text,
                ));
            }
            let mut inflated = Vec::new();
            ZlibDecoder::new(self.text)
                .read_to_end(&mut inflated)
                .map_err(|e| decode_error(format!("zlib inflate failed: {}", e), self.text))?;
            inflated
        } else {
            self.text.to_vec()
        };

        String::from_utf8(bytes).map_err(|e| {
            let raw = String::from_utf8_lossy(e.as_bytes()).into_owned();
            LensError::Decode {
                message: format!("text is not valid UTF-8: {}", e.utf8_error()),
                raw,
            }
        })
    }
}

/// Split an iTXt payload into its envelope fields.
///
/// # Errors
/// * `LensError::Decode` - a NUL terminator is missing, the flag bytes are cut
///   off, or the compression flag is neither 0 nor 1
pub fn parse_envelope(data: &[u8]) -> Result<TextEnvelope<'_>> {
    let (keyword, rest) = split_nul(data).ok_or_else(|| decode_error("unterminated keyword", data))?;

    if rest.len() < 2 {
        return Err(decode_error("missing compression flag and method", data));
    }
    let compressed = match rest[0] {
        0 => false,
        1 => true,
        other => return Err(decode_error(format!("invalid compression flag {}", other), data)),
    };
    let compression_method = rest[1];
    let rest = &rest[2..];

    let (language_tag, rest) =
        split_nul(rest).ok_or_else(|| decode_error("unterminated language tag", data))?;
    let (translated_keyword, text) =
        split_nul(rest).ok_or_else(|| decode_error("unterminated translated keyword", data))?;

    Ok(TextEnvelope {
        keyword,
        compressed,
        compression_method,
        language_tag,
        translated_keyword,
        text,
    })
}

fn split_nul(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = data.iter().position(|&b| b == 0)?;
    Some((&data[..pos], &data[pos + 1..]))
}

fn decode_error(message: impl Into<String>, raw: &[u8]) -> LensError {
    LensError::Decode {
        message: message.into(),
        raw: String::from_utf8_lossy(raw).into_owned(),
    }
}
