//! Run configuration.

use crate::error::{LensError, Result};
use std::path::{Component, Path, PathBuf};

/// Directories a generation run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    image_dir: PathBuf,
    metadata_dir: PathBuf,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// New screenshot root.
    pub image_dir: Option<PathBuf>,
    /// New output root.
    pub metadata_dir: Option<PathBuf>,
}

impl Config {
    /// Create a configuration; both directories are required.
    pub fn new(image_dir: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Result<Self> {
        let image_dir = image_dir.into();
        let metadata_dir = metadata_dir.into();

        if image_dir.as_os_str().is_empty() || metadata_dir.as_os_str().is_empty() {
            return Err(LensError::InvalidConfig {
                message: "Required configuration missing: image and metadata directories"
                    .to_string(),
            });
        }
        validate_disjoint(&image_dir, &metadata_dir)?;

        Ok(Config {
            image_dir,
            metadata_dir,
        })
    }

    /// Screenshot root.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Output root for decoded documents.
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Apply a partial update. Empty paths are ignored.
    ///
    /// # Errors
    /// * `LensError::InvalidConfig` - the resulting directories overlap; the
    ///   configuration is left unchanged
    pub fn update(&mut self, update: ConfigUpdate) -> Result<()> {
        let image_dir = update
            .image_dir
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| self.image_dir.clone());
        let metadata_dir = update
            .metadata_dir
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| self.metadata_dir.clone());

        validate_disjoint(&image_dir, &metadata_dir)?;
        self.image_dir = image_dir;
        self.metadata_dir = metadata_dir;
        Ok(())
    }
}

/// The output root is cleared before every run, so it must neither equal nor
/// nest with the screenshot root.
fn validate_disjoint(image_dir: &Path, metadata_dir: &Path) -> Result<()> {
    let images = normalize(image_dir)?;
    let metadata = normalize(metadata_dir)?;

    if images == metadata {
        return Err(LensError::InvalidConfig {
            message: format!(
                "Metadata directory must differ from image directory: {}",
                image_dir.display()
            ),
        });
    }
    if images.starts_with(&metadata) || metadata.starts_with(&images) {
        return Err(LensError::InvalidConfig {
            message: format!(
                "Image directory {} and metadata directory {} must not contain each other",
                image_dir.display(),
                metadata_dir.display()
            ),
        });
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
