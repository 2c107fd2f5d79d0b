//! Progress events relayed to the transport layer.

use serde::Serialize;

/// One step of a generation run, emitted in processing order.
///
/// Serializes internally tagged, e.g. `{"type":"progress","current":3,...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// File list is known.
    Start {
        /// Number of files to process.
        total: usize,
    },
    /// One file finished, successfully or not.
    Progress {
        /// 1-based index of the file.
        current: usize,
        /// Number of files in the run.
        total: usize,
        /// Relative path of the file.
        file: String,
        /// Failure message when this file could not be processed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Run ended: either a tally or `stopped`.
    Complete {
        /// Files attempted.
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
        /// Files decoded and written.
        #[serde(skip_serializing_if = "Option::is_none")]
        successful: Option<usize>,
        /// Files that failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        failed: Option<usize>,
        /// Set when the run was cancelled.
        #[serde(skip_serializing_if = "Option::is_none")]
        stopped: Option<bool>,
    },
    /// Run aborted by a directory-level failure.
    Error {
        /// Error message.
        error: String,
    },
}

impl ProgressEvent {
    /// Terminal event for a cancelled run.
    pub fn stopped() -> Self {
        ProgressEvent::Complete {
            total: None,
            successful: None,
            failed: None,
            stopped: Some(true),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }
}
