//! Generation driver.
//!
//! Wraps a [`BatchPipeline`] run with output preparation, cleanup after a
//! stop, and the terminal event of the stream.

use super::{BatchPipeline, FileOutcome, ProgressEvent, StopHandle};
use crate::config::{Config, ConfigUpdate};
use crate::error::{LensError, Result};
use serde::Serialize;

/// Tally of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Files attempted.
    pub total: usize,
    /// Files decoded and written.
    pub successful: usize,
    /// Files that failed.
    pub failed: usize,
    /// Per-file outcomes in processing order.
    pub details: Vec<FileOutcome>,
}

impl Summary {
    /// Tally per-file outcomes.
    pub fn from_outcomes(details: Vec<FileOutcome>) -> Self {
        let successful = details.iter().filter(|o| o.success).count();
        Summary {
            total: details.len(),
            successful,
            failed: details.len() - successful,
            details,
        }
    }

    /// The `complete` event for this tally.
    pub fn to_event(&self) -> ProgressEvent {
        ProgressEvent::Complete {
            total: Some(self.total),
            successful: Some(self.successful),
            failed: Some(self.failed),
            stopped: None,
        }
    }
}

/// How a generation run ended.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// Every file was attempted.
    Completed(Summary),
    /// Cancelled; the output root was emptied.
    Stopped,
}

/// Runs generation end to end and reports through one event stream.
#[derive(Debug)]
pub struct MetadataGenerator {
    pipeline: BatchPipeline,
}

impl MetadataGenerator {
    /// Create a generator for `config`.
    pub fn new(config: Config) -> Self {
        MetadataGenerator {
            pipeline: BatchPipeline::new(config),
        }
    }

    /// Underlying pipeline.
    pub fn pipeline(&self) -> &BatchPipeline {
        &self.pipeline
    }

    /// Apply a partial configuration update.
    ///
    /// # Errors
    /// * `LensError::InvalidConfig` - the updated directories overlap
    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<()> {
        self.pipeline.update_config(update)
    }

    /// Handle for stopping the current run.
    pub fn stop_handle(&self) -> StopHandle {
        self.pipeline.stop_handle()
    }

    /// Whether a run is in flight.
    pub fn is_generating(&self) -> bool {
        self.pipeline.stop.is_running()
    }

    /// Prepare the output root, extract every image and emit the final event.
    ///
    /// On a stop request the partially written output is removed and a
    /// `complete` event with `stopped: true` is emitted. Directory-level
    /// failures emit an `error` event and are returned.
    pub fn generate<F>(&mut self, mut on_event: F) -> Result<GenerationOutcome>
    where
        F: FnMut(ProgressEvent),
    {
        let result = self
            .pipeline
            .initialize()
            .and_then(|()| self.pipeline.run(&mut on_event));

        match result {
            Ok(outcomes) => {
                let summary = Summary::from_outcomes(outcomes);
                log::info!(
                    "Generation completed: {} of {} files succeeded",
                    summary.successful,
                    summary.total
                );
                on_event(summary.to_event());
                Ok(GenerationOutcome::Completed(summary))
            }
            Err(LensError::Stopped) => {
                if let Err(e) = self.pipeline.clear_output() {
                    log::error!("Failed to clear metadata after stop: {}", e);
                    on_event(ProgressEvent::Error {
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                log::info!("Generation stopped; partial metadata removed");
                on_event(ProgressEvent::stopped());
                Ok(GenerationOutcome::Stopped)
            }
            Err(e) => {
                log::error!("Error generating metadata: {}", e);
                on_event(ProgressEvent::Error {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
