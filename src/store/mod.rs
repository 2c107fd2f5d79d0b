//! Access to persisted metadata documents.
//!
//! Reads back what a generation run wrote: listing, single reads, bulk loads
//! with a small fixed worker pool, and month-level date queries.

use crate::error::{LensError, Result};
use crate::metadata::DecodedRecord;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Worker threads used by [`MetadataStore::load_all`].
pub const LOAD_CONCURRENCY: usize = 5;

/// Earliest and latest capture months in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeSummary {
    /// Whether the output root exists.
    pub exists: bool,
    /// Whether any document exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_files: Option<bool>,
    /// Whether any document carries a parseable timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_valid_dates: Option<bool>,
    /// Earliest month, `YYYY-MM`.
    pub start: Option<String>,
    /// Latest month, `YYYY-MM`.
    pub end: Option<String>,
}

/// Read-only view over an output root.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    /// Open a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MetadataStore { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `.json` document beneath the root, relative and sorted.
    pub fn list_documents(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|e| LensError::io(&dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| LensError::io(&dir, e))?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|e| LensError::io(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "json") {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        found.push(to_forward_slashes(rel));
                    }
                }
            }
        }

        found.sort();
        Ok(found)
    }

    /// Parse one document.
    ///
    /// # Errors
    /// * `LensError::InvalidConfig` - `relative` escapes the root
    /// * `LensError::Io` / `LensError::Json` - unreadable or malformed document
    pub fn read_document(&self, relative: &str) -> Result<DecodedRecord> {
        let path = self.resolve(relative)?;
        let data = fs::read_to_string(&path).map_err(|e| LensError::io(&path, e))?;
        serde_json::from_str(&data).map_err(|e| LensError::Json { path, source: e })
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(LensError::InvalidConfig {
                message: format!("Document path must stay inside the metadata root: {}", relative),
            });
        }
        Ok(self.root.join(rel))
    }

    /// Read many documents with [`LOAD_CONCURRENCY`] workers.
    ///
    /// Workers claim the next index from a shared counter. Documents that fail
    /// to load are logged and left out; result order is unspecified.
    pub fn load_all(&self, files: &[String]) -> Vec<DecodedRecord> {
        let next = AtomicUsize::new(0);
        let loaded = Mutex::new(Vec::with_capacity(files.len()));
        let workers = LOAD_CONCURRENCY.min(files.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(file) = files.get(index) else {
                        break;
                    };
                    match self.read_document(file) {
                        Ok(record) => match loaded.lock() {
                            Ok(mut records) => records.push(record),
                            Err(poisoned) => poisoned.into_inner().push(record),
                        },
                        Err(e) => log::error!("Error fetching file {}: {}", file, e),
                    }
                });
            }
        });

        let records = loaded.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        log::info!("Loaded {} of {} metadata documents", records.len(), files.len());
        records
    }

    /// Every document in the store.
    pub fn load_everything(&self) -> Result<Vec<DecodedRecord>> {
        let files = self.list_documents()?;
        Ok(self.load_all(&files))
    }

    /// Earliest and latest capture month over all documents.
    pub fn date_range(&self) -> Result<DateRangeSummary> {
        if !self.root.is_dir() {
            return Ok(DateRangeSummary {
                exists: false,
                has_files: None,
                has_valid_dates: None,
                start: None,
                end: None,
            });
        }

        let files = self.list_documents()?;
        if files.is_empty() {
            return Ok(DateRangeSummary {
                exists: true,
                has_files: Some(false),
                has_valid_dates: None,
                start: None,
                end: None,
            });
        }

        let mut months: Vec<String> = self
            .load_all(&files)
            .iter()
            .filter_map(DecodedRecord::captured_at)
            .map(|ts| month_key(&ts))
            .collect();
        months.sort();

        Ok(DateRangeSummary {
            exists: true,
            has_files: Some(true),
            has_valid_dates: Some(!months.is_empty()),
            start: months.first().cloned(),
            end: months.last().cloned(),
        })
    }

    /// Documents captured within the inclusive `YYYY-MM` month range.
    pub fn filter_by_months(&self, start: &str, end: &str) -> Result<Vec<String>> {
        let mut matched = Vec::new();
        for file in self.list_documents()? {
            let month = match self.read_document(&file) {
                Ok(record) => record.captured_at().map(|ts| month_key(&ts)),
                Err(e) => {
                    log::warn!("Skipping unreadable document {}: {}", file, e);
                    None
                }
            };
            if let Some(month) = month {
                if month.as_str() >= start && month.as_str() <= end {
                    matched.push(file);
                }
            }
        }
        Ok(matched)
    }
}

fn month_key(ts: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
