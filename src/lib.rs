//! Lensgraph: screenshot metadata extraction and social co-occurrence graphs.
//!
//! This library reads the JSON document embedded in the iTXt chunk of PNG
//! screenshots, persists one document per image, and derives a weighted
//! graph of identities that appear together.

#![warn(missing_docs)]
// env_logger and clap are used by src/main.rs (binary)
#![expect(unused_crate_dependencies)]

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod pipeline;
pub mod scan;
pub mod store;

/// Re-export common error types for convenience.
pub use error::{LensError, Result};

/// Re-export graph types for convenience.
pub use graph::{Graph, GraphBuilder};

/// Re-export pipeline types for convenience.
pub use pipeline::{BatchPipeline, MetadataGenerator, ProgressEvent, StopHandle};

/// Lensgraph version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
