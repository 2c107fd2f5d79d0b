//! Screenshot discovery.
//!
//! Recursively collects `.png` files beneath a root, keeping each file's path
//! relative to that root. Unreadable directories are logged and skipped.

use crate::error::{LensError, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};

/// Extension of eligible source files (matched case-insensitively).
pub const IMAGE_EXTENSION: &str = "png";

/// A discovered source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path to the file.
    pub full_path: PathBuf,
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
}

impl SourceFile {
    /// Relative path with forward slashes, as reported in progress events.
    pub fn display_path(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Find every image file beneath `root`.
///
/// Ordering follows directory enumeration and is not guaranteed.
///
/// # Errors
/// * `LensError::Other` - the root cannot be turned into a search pattern
pub fn find_images(root: &Path) -> Result<Vec<SourceFile>> {
    log::info!("Scanning directory: {}", root.display());

    // glob strips `.` components from what it yields, so match against the
    // same form.
    let root = strip_cur_dir(root);
    let root_str = root
        .to_str()
        .ok_or_else(|| LensError::Other(format!("Invalid UTF-8 in path: {:?}", root)))?;
    let pattern = if root_str.is_empty() {
        format!("**/*.{}", IMAGE_EXTENSION)
    } else {
        format!(
            "{}/**/*.{}",
            Pattern::escape(root_str.trim_end_matches('/')),
            IMAGE_EXTENSION
        )
    };

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob_with(&pattern, options)
        .map_err(|e| LensError::Other(format!("Invalid scan pattern '{}': {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping unreadable path {}: {}", e.path().display(), e.error());
                continue;
            }
        };

        if !path.is_file() {
            continue;
        }

        let relative_path = match path.strip_prefix(&root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                log::warn!("Skipping {}: not under {}", path.display(), root.display());
                continue;
            }
        };

        log::debug!("Found PNG file: {}", path.display());
        files.push(SourceFile {
            full_path: path,
            relative_path,
        });
    }

    log::info!("Found {} PNG files in total", files.len());
    Ok(files)
}

fn strip_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
