//! Lensgraph CLI binary
//!
//! This is the main entry point for the lensgraph command-line interface.
//! The CLI is a thin adapter over existing APIs - NO logic is implemented here.

use lensgraph::cli::{CliErrorPayload, CliSuccessPayload, Commands};
use lensgraph::LensError;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = lensgraph::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
    }

    // Execute command
    let result = match cli.command {
        Commands::Generate { images, metadata } => execute_generate(&images, &metadata),
        Commands::Inspect { file } => execute_inspect(&file),
        Commands::Files { metadata } => execute_files(&metadata),
        Commands::Range { metadata } => execute_range(&metadata),
        Commands::Graph { metadata, from, to } => {
            execute_graph(&metadata, from.as_deref(), to.as_deref())
        }
    };

    // Handle result
    match result {
        Ok(Some(payload)) => {
            print_json(&payload);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            let payload = CliErrorPayload::from_error(&e);
            match serde_json::to_string(&payload) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("Error: {}", e),
            }
            ExitCode::from(1)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

fn to_data<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, LensError> {
    serde_json::to_value(value)
        .map_err(|e| LensError::Other(format!("Failed to serialize output: {}", e)))
}

/// Execute the generate command.
///
/// Streams every progress event as one JSON line on stdout. The final
/// `complete` or `error` event ends the stream.
fn execute_generate(
    images: &Path,
    metadata: &Path,
) -> Result<Option<CliSuccessPayload>, LensError> {
    use lensgraph::config::Config;
    use lensgraph::MetadataGenerator;

    let config = Config::new(images, metadata)?;
    let mut generator = MetadataGenerator::new(config);
    generator.generate(|event| print_json(&event))?;
    Ok(None)
}

/// Execute the inspect command.
fn execute_inspect(file: &Path) -> Result<Option<CliSuccessPayload>, LensError> {
    let record = lensgraph::metadata::decode_file(file)?;
    Ok(Some(CliSuccessPayload::with_data(
        format!("Decoded {}", file.display()),
        record.to_value(),
    )))
}

/// Execute the files command.
fn execute_files(metadata: &Path) -> Result<Option<CliSuccessPayload>, LensError> {
    let store = lensgraph::store::MetadataStore::new(metadata);
    let files = store.list_documents()?;
    Ok(Some(CliSuccessPayload::with_data(
        format!("{} metadata files found", files.len()),
        json!(files),
    )))
}

/// Execute the range command.
fn execute_range(metadata: &Path) -> Result<Option<CliSuccessPayload>, LensError> {
    let store = lensgraph::store::MetadataStore::new(metadata);
    let range = store.date_range()?;
    let message = match (&range.start, &range.end) {
        (Some(start), Some(end)) => format!("Captures from {} to {}", start, end),
        _ => "No dated captures".to_string(),
    };
    Ok(Some(CliSuccessPayload::with_data(message, to_data(&range)?)))
}

/// Execute the graph command.
///
/// Loads every document, applies the optional date window and builds the
/// graph relative to the current time.
fn execute_graph(
    metadata: &Path,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<CliSuccessPayload>, LensError> {
    use lensgraph::graph::DateRange;
    use lensgraph::GraphBuilder;

    let range = DateRange::from_bounds(from, to)?;
    let store = lensgraph::store::MetadataStore::new(metadata);
    let records = store.load_everything()?;
    if records.is_empty() {
        return Ok(Some(CliSuccessPayload::message_only(
            "No metadata files; run generate first".to_string(),
        )));
    }

    let graph = GraphBuilder::new(chrono::Utc::now())
        .with_range(range)
        .build(&records);
    Ok(Some(CliSuccessPayload::with_data(
        format!(
            "{} nodes and {} links created",
            graph.nodes.len(),
            graph.edges.len()
        ),
        to_data(&graph)?,
    )))
}
