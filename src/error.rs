//! Lensgraph error types.
//!
//! All errors are typed and provide root cause information.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Lensgraph operations.
#[derive(Error, Debug)]
pub enum LensError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Container signature mismatch or broken chunk framing.
    #[error("Invalid PNG format: {message}")]
    Format {
        /// What was wrong with the container.
        message: String,
    },

    /// Text envelope or JSON payload could not be decoded.
    #[error("Failed to parse metadata: {message}")]
    Decode {
        /// The decode error message.
        message: String,
        /// The raw payload text, lossily decoded.
        raw: String,
    },

    /// Persisted metadata document could not be (de)serialized.
    #[error("JSON error for path {path}: {source}")]
    Json {
        /// The document path.
        path: PathBuf,
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Cooperative cancellation was observed.
    #[error("Generation stopped")]
    Stopped,

    /// Required configuration is missing or malformed.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// The validation error message.
        message: String,
    },

    /// A date bound could not be parsed.
    #[error("Invalid date '{value}': expected YYYY-MM or YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl LensError {
    /// Build a format error from any message.
    pub fn format(message: impl Into<String>) -> Self {
        LensError::Format {
            message: message.into(),
        }
    }

    /// Build an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LensError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable identifier used in structured CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            LensError::Io { .. } => "IoError",
            LensError::Format { .. } => "FormatError",
            LensError::Decode { .. } => "DecodeError",
            LensError::Json { .. } => "JsonError",
            LensError::Stopped => "Stopped",
            LensError::InvalidConfig { .. } => "InvalidConfig",
            LensError::InvalidDate { .. } => "InvalidDate",
            LensError::Other(_) => "Other",
        }
    }

    /// Path associated with the error, if any.
    pub fn file_path(&self) -> Option<&std::path::Path> {
        match self {
            LensError::Io { path, .. } | LensError::Json { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }

    /// Raw payload for decode failures.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            LensError::Decode { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }

    /// Remediation hint for the user.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LensError::Format { .. } => Some("Only PNG screenshots are supported"),
            LensError::Decode { .. } => {
                Some("The iTXt chunk must hold a JSON document; see the raw payload")
            }
            LensError::InvalidConfig { .. } => {
                Some("Pass both --images and --metadata directories")
            }
            LensError::InvalidDate { .. } => Some("Use a month such as 2024-03"),
            LensError::Stopped => Some("Partial output was removed; run generate again"),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LensError {
    fn from(err: std::io::Error) -> Self {
        LensError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

/// Result type alias for Lensgraph operations.
pub type Result<T> = std::result::Result<T, LensError>;
