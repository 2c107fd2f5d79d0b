//! Embedded metadata decoding.
//!
//! Finds the first iTXt chunk of a PNG, unwraps its envelope and parses the
//! text as a JSON object. The decoded fields are merged with the capture
//! timestamp and the source file name into a [`DecodedRecord`].

pub mod capture;
pub mod envelope;

use crate::chunk::{read_chunks, ChunkType};
use crate::error::{LensError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Key holding the participant list in decoded payloads.
pub const PARTICIPANTS_KEY: &str = "players";

/// One decoded screenshot.
///
/// Serializes as a flat JSON object: the payload fields plus `timestamp`
/// and `filename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Capture time, ISO-8601.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Source file name (no directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Every other field of the decoded payload.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// An identity listed in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identity id.
    pub id: String,
    /// Display name at capture time.
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

impl DecodedRecord {
    /// Merge payload fields with timestamp and file name.
    ///
    /// `timestamp` and `filename` always win over payload keys of the same name.
    pub fn new(timestamp: String, filename: String, mut fields: Map<String, Value>) -> Self {
        fields.remove("timestamp");
        fields.remove("filename");
        DecodedRecord {
            timestamp: Some(timestamp),
            filename: Some(filename),
            fields,
        }
    }

    /// Record for an image without embedded metadata.
    pub fn without_metadata(timestamp: String, filename: String) -> Self {
        let mut fields = Map::new();
        fields.insert("metadata".to_string(), Value::Object(Map::new()));
        DecodedRecord {
            timestamp: Some(timestamp),
            filename: Some(filename),
            fields,
        }
    }

    /// Parsed capture time, `None` when missing or malformed.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(capture::parse_timestamp)
    }

    /// The participant list, `None` when the record has none.
    ///
    /// Numeric ids are kept in their decimal form. Entries whose `id` is
    /// missing, empty, zero or of another type are skipped.
    pub fn participants(&self) -> Option<Vec<Participant>> {
        let list = self.fields.get(PARTICIPANTS_KEY)?.as_array()?;
        Some(
            list.iter()
                .filter_map(|entry| {
                    let id = participant_id(entry.get("id")?)?;
                    Some(Participant {
                        id,
                        display_name: entry
                            .get("displayName")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect(),
        )
    }

    /// Whole record as a JSON value.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        if let Some(ts) = &self.timestamp {
            object.insert("timestamp".to_string(), Value::String(ts.clone()));
        }
        if let Some(name) = &self.filename {
            object.insert("filename".to_string(), Value::String(name.clone()));
        }
        Value::Object(object)
    }
}

fn participant_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode PNG bytes into a record.
///
/// A PNG without an iTXt chunk decodes to a record with an empty `metadata`
/// object.
///
/// # Errors
/// * `LensError::Format` - the container is not a well-framed PNG
/// * `LensError::Decode` - the envelope is malformed or the text is not a
///   JSON object; the raw text is attached
pub fn decode_png(data: &[u8], filename: &str, captured_at: &DateTime<Utc>) -> Result<DecodedRecord> {
    let chunks = read_chunks(data)?;
    let timestamp = capture::format_timestamp(captured_at);

    let Some(chunk) = chunks.iter().find(|c| c.chunk_type == ChunkType::ITXT) else {
        return Ok(DecodedRecord::without_metadata(timestamp, filename.to_string()));
    };

    let envelope = envelope::parse_envelope(chunk.data)?;
    let text = envelope.decode_text()?;

    let fields = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::error!("Raw iTXt chunk data: {}", text);
            return Err(LensError::Decode {
                message: format!("expected a JSON object, found {}", json_type(&other)),
                raw: text,
            });
        }
        Err(e) => {
            log::error!("Raw iTXt chunk data: {}", text);
            return Err(LensError::Decode {
                message: e.to_string(),
                raw: text,
            });
        }
    };

    Ok(DecodedRecord::new(timestamp, filename.to_string(), fields))
}

/// Read and decode one PNG file.
///
/// The file name and capture time are derived from `path`.
pub fn decode_file(path: &Path) -> Result<DecodedRecord> {
    let data = std::fs::read(path).map_err(|e| LensError::io(path, e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let captured_at = capture::capture_time(path);
    decode_png(&data, &filename, &captured_at)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_filename_wins_over_payload() {
        let fields = object(json!({"filename": "spoofed.png", "author": "x"}));
        let record = DecodedRecord::new("2024-01-01T00:00:00.000Z".into(), "real.png".into(), fields);
        assert_eq!(record.filename.as_deref(), Some("real.png"));
        assert!(!record.fields.contains_key("filename"));
        assert_eq!(record.to_value()["filename"], "real.png");
        assert_eq!(record.to_value()["author"], "x");
    }

    #[test]
    fn test_serializes_flat() {
        let record = DecodedRecord::without_metadata("2024-01-01T00:00:00.000Z".into(), "a.png".into());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"timestamp": "2024-01-01T00:00:00.000Z", "filename": "a.png", "metadata": {}})
        );
        let back: DecodedRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_participants_skip_entries_without_id() {
        let fields = object(json!({
            "players": [
                {"id": "usr_a", "displayName": "Alice"},
                {"displayName": "Ghost"},
                {"id": "", "displayName": "Empty"},
                {"id": "usr_b"}
            ]
        }));
        let record = DecodedRecord::new("2024-01-01T00:00:00Z".into(), "a.png".into(), fields);
        let players = record.participants().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].display_name.as_deref(), Some("Alice"));
        assert_eq!(players[1].id, "usr_b");
        assert_eq!(players[1].display_name, None);
    }

    #[test]
    fn test_participants_numeric_ids() {
        let fields = object(json!({
            "players": [
                {"id": 42, "displayName": "Numbered"},
                {"id": 0},
                {"id": true},
                {"id": null}
            ]
        }));
        let record = DecodedRecord::new("2024-01-01T00:00:00Z".into(), "a.png".into(), fields);
        let players = record.participants().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "42");
        assert_eq!(players[0].display_name.as_deref(), Some("Numbered"));
    }

    #[test]
    fn test_participants_absent() {
        let record = DecodedRecord::without_metadata("2024-01-01T00:00:00Z".into(), "a.png".into());
        assert_eq!(record.participants(), None);
    }

    #[test]
    fn test_non_object_payload_is_decode_error() {
        let mut png = crate::chunk::PNG_SIGNATURE.to_vec();
        let payload = b"Description\0\0\0\0\0[1,2]";
        png.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        png.extend_from_slice(b"iTXt");
        png.extend_from_slice(payload);
        png.extend_from_slice(&[0, 0, 0, 0]);

        let err = decode_png(&png, "a.png", &Utc::now()).unwrap_err();
        assert_eq!(err.raw_payload(), Some("[1,2]"));
    }
}
