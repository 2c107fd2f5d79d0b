//! Batch metadata extraction.
//!
//! Drives the decoder over every screenshot beneath the image root, one file
//! at a time, writing one JSON document per image into a mirror of the source
//! tree. Cancellation is cooperative and checked between files.

pub mod event;
pub mod generator;

pub use event::ProgressEvent;
pub use generator::{GenerationOutcome, MetadataGenerator, Summary};

use crate::config::{Config, ConfigUpdate};
use crate::error::{LensError, Result};
use crate::metadata::{decode_file, DecodedRecord};
use crate::scan::{find_images, SourceFile};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing started yet.
    Idle,
    /// Output prepared, enumerating files.
    Scanning,
    /// Processing files.
    Running,
    /// Every file was attempted.
    Completed,
    /// Cancelled at a file boundary.
    Stopped,
    /// Directory setup or scan failed.
    Failed,
}

#[derive(Debug, Default)]
struct RunFlags {
    running: AtomicBool,
    stop: AtomicBool,
}

/// Out-of-band stop control shared with a pipeline.
///
/// Cloning is cheap; every clone controls the same pipeline.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flags: Arc<RunFlags>,
}

impl StopHandle {
    /// Request a stop at the next file boundary.
    ///
    /// Ignored when no run is in flight.
    pub fn stop(&self) {
        if self.flags.running.load(Ordering::SeqCst) {
            self.flags.stop.store(true, Ordering::SeqCst);
        }
    }

    /// Whether a stop has been requested for the current run.
    pub fn is_stopped(&self) -> bool {
        self.flags.stop.load(Ordering::SeqCst)
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    fn begin(&self) {
        self.flags.stop.store(false, Ordering::SeqCst);
        self.flags.running.store(true, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.flags.running.store(false, Ordering::SeqCst);
        self.flags.stop.store(false, Ordering::SeqCst);
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Relative path of the source image.
    pub file: String,
    /// Whether the document was written.
    pub success: bool,
    /// Decoded record on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DecodedRecord>,
    /// Failure message otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sequential extractor over one image root.
#[derive(Debug)]
pub struct BatchPipeline {
    config: Config,
    stop: StopHandle,
    state: PipelineState,
}

impl BatchPipeline {
    /// Create an idle pipeline.
    pub fn new(config: Config) -> Self {
        BatchPipeline {
            config,
            stop: StopHandle::default(),
            state: PipelineState::Idle,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply a partial configuration update.
    ///
    /// # Errors
    /// * `LensError::InvalidConfig` - the updated directories overlap
    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<()> {
        self.config.update(update)
    }

    /// Handle for stopping this pipeline from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Make sure the output root exists and holds nothing from earlier runs.
    ///
    /// A plain file occupying the output path is removed.
    pub fn initialize(&mut self) -> Result<()> {
        match self.prepare_output() {
            Ok(()) => {
                log::info!(
                    "Metadata directory initialized: {}",
                    self.config.metadata_dir().display()
                );
                self.state = PipelineState::Scanning;
                Ok(())
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    fn prepare_output(&self) -> Result<()> {
        let dir = self.config.metadata_dir();
        match fs::symlink_metadata(dir) {
            Ok(meta) if !meta.is_dir() => {
                fs::remove_file(dir).map_err(|e| LensError::io(dir, e))?;
                log::info!("Existing file at metadata path was removed: {}", dir.display());
            }
            Ok(_) => self.clear_output()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(LensError::io(dir, e)),
        }
        fs::create_dir_all(dir).map_err(|e| LensError::io(dir, e))
    }

    /// Remove everything beneath the output root, keeping the root itself.
    pub fn clear_output(&self) -> Result<()> {
        let dir = self.config.metadata_dir();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(LensError::io(dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| LensError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| LensError::io(&path, e))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path).map_err(|e| LensError::io(&path, e))?;
            } else {
                fs::remove_file(&path).map_err(|e| LensError::io(&path, e))?;
            }
        }

        log::info!("Existing metadata directory cleared: {}", dir.display());
        Ok(())
    }

    /// Where the document for `relative` (an image path) is written.
    pub fn output_path_for(&self, relative: &Path) -> PathBuf {
        self.config.metadata_dir().join(relative).with_extension("json")
    }

    /// Decode one image and write its document.
    pub fn process_file(&self, file: &SourceFile) -> Result<DecodedRecord> {
        log::debug!("Processing image: {}", file.full_path.display());
        let record = decode_file(&file.full_path)?;

        let output_path = self.output_path_for(&file.relative_path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| LensError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&record).map_err(|e| LensError::Json {
            path: output_path.clone(),
            source: e,
        })?;
        fs::write(&output_path, json).map_err(|e| LensError::io(&output_path, e))?;
        log::debug!("Saved metadata to: {}", output_path.display());

        Ok(record)
    }

    /// Scan the image root and process every file in order.
    ///
    /// Emits `start` once the file list is known, then one `progress` event per
    /// file. A file that fails is recorded and the run continues.
    ///
    /// # Errors
    /// * `LensError::Stopped` - a stop was requested; the output root may hold
    ///   partial results and must be cleared by the caller
    /// * any error from scanning the image root
    pub fn run<F>(&mut self, mut on_progress: F) -> Result<Vec<FileOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        self.stop.begin();
        let result = self.run_files(&mut on_progress);
        self.stop.finish();

        self.state = match &result {
            Ok(_) => PipelineState::Completed,
            Err(LensError::Stopped) => PipelineState::Stopped,
            Err(_) => PipelineState::Failed,
        };
        if let Err(e) = &result {
            log::error!("Error in batch run: {}", e);
        }
        result
    }

    fn run_files<F>(&mut self, on_progress: &mut F) -> Result<Vec<FileOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        self.state = PipelineState::Scanning;
        log::info!("Starting directory scan at: {}", self.config.image_dir().display());
        let files = find_images(self.config.image_dir())?;
        let total = files.len();

        self.state = PipelineState::Running;
        on_progress(ProgressEvent::Start { total });

        let mut outcomes = Vec::with_capacity(total);
        for (index, file) in files.iter().enumerate() {
            if self.stop.is_stopped() {
                log::info!("Stop requested after {} of {} files", index, total);
                return Err(LensError::Stopped);
            }

            let display = file.display_path();
            log::info!("Processing file ({}/{}): {}", index + 1, total, display);

            match self.process_file(file) {
                Ok(record) => {
                    outcomes.push(FileOutcome {
                        file: display.clone(),
                        success: true,
                        metadata: Some(record),
                        error: None,
                    });
                    on_progress(ProgressEvent::Progress {
                        current: index + 1,
                        total,
                        file: display,
                        error: None,
                    });
                }
                Err(e) => {
                    let message = format!(
                        "Failed to process image {}: {}",
                        file.relative_path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| display.clone()),
                        e
                    );
                    log::error!("Error processing {}: {}", display, e);
                    if let Some(raw) = e.raw_payload() {
                        log::error!("Raw payload of {}: {}", display, raw);
                    }
                    outcomes.push(FileOutcome {
                        file: display.clone(),
                        success: false,
                        metadata: None,
                        error: Some(message.clone()),
                    });
                    on_progress(ProgressEvent::Progress {
                        current: index + 1,
                        total,
                        file: display,
                        error: Some(message),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}
