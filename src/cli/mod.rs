//! Command-line interface for Lensgraph.
//!
//! This module handles argument parsing and output payloads only.
//! NO extraction or graph logic is performed here.

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Lensgraph: screenshot metadata extraction and co-occurrence graphs.
#[derive(Parser, Debug)]
#[command(name = "lensgraph")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available Lensgraph commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Extract metadata from every screenshot, streaming progress as JSON lines.
    Generate {
        /// Root directory of the screenshots.
        #[arg(short, long, value_name = "DIR")]
        images: PathBuf,

        /// Output directory for metadata documents (cleared first).
        #[arg(short, long, value_name = "DIR")]
        metadata: PathBuf,
    },

    /// Decode a single screenshot and print its record.
    Inspect {
        /// Path to the PNG file.
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List persisted metadata documents.
    Files {
        /// Metadata directory written by `generate`.
        #[arg(short, long, value_name = "DIR")]
        metadata: PathBuf,
    },

    /// Show the earliest and latest capture months.
    Range {
        /// Metadata directory written by `generate`.
        #[arg(short, long, value_name = "DIR")]
        metadata: PathBuf,
    },

    /// Build the co-occurrence graph from persisted metadata.
    Graph {
        /// Metadata directory written by `generate`.
        #[arg(short, long, value_name = "DIR")]
        metadata: PathBuf,

        /// Inclusive lower bound (YYYY-MM or YYYY-MM-DD).
        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        /// Inclusive upper bound (YYYY-MM or YYYY-MM-DD).
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
    },
}

/// Parse command-line arguments.
///
/// This function is the entry point for CLI argument parsing.
/// It returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload containing only the message.
    pub fn message_only(message: String) -> Self {
        Self {
            status: "ok",
            message,
            data: None,
        }
    }

    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (FormatError, DecodeError, ...).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Raw embedded text for decode failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Optional hint for remediation steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a LensError instance.
    pub fn from_error(error: &crate::LensError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
                raw: error.raw_payload().map(str::to_string),
                hint: error.hint().map(str::to_string),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_graph_bounds_are_optional() {
        let cli = Cli::try_parse_from(["lensgraph", "graph", "--metadata", "out"]).unwrap();
        match cli.command {
            Commands::Graph { from, to, .. } => {
                assert!(from.is_none());
                assert!(to.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_error_payload_carries_raw_text() {
        let err = crate::LensError::Decode {
            message: "expected value".into(),
            raw: "{not json".into(),
        };
        let payload = serde_json::to_value(CliErrorPayload::from_error(&err)).unwrap();
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error"]["kind"], "DecodeError");
        assert_eq!(payload["error"]["raw"], "{not json");
    }
}
