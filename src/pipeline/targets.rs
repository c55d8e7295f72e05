//! Target resolution: overlay discovery and single-root mode.
//!
//! A target pairs one document root with one destination index. Overlay mode
//! maps each immediate subdirectory of the base directory to an index of the
//! same name; single-root mode is a one-element target list.

use crate::config::{Config, ConfigError};
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// One unit of work: a document root paired with its destination index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTarget {
    /// Directory whose documents feed this target.
    pub root: PathBuf,
    /// Name of the destination index.
    pub index: String,
}

/// List overlay subdirectories of `base`, sorted by name.
///
/// Only immediate subdirectories count; files and anything deeper are the
/// Document Loader's business. An empty list is not an error, the caller
/// reports it and exits cleanly. A missing base directory is.
pub fn resolve_overlays(base: &Path) -> Result<Vec<IngestTarget>, ConfigError> {
    if !base.is_dir() {
        return Err(ConfigError::MissingDirectory(base.to_path_buf()));
    }

    let entries = fs::read_dir(base).map_err(|source| ConfigError::UnreadableDirectory {
        path: base.to_path_buf(),
        source,
    })?;

    let mut targets = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping overlay with non-UTF-8 name");
            continue;
        };
        targets.push(IngestTarget {
            index: name.to_string(),
            root: path,
        });
    }
    targets.sort_by(|a, b| a.index.cmp(&b.index));
    Ok(targets)
}

/// Build the single-root target list from configuration.
///
/// The configured documents directory must exist; this is the fail-fast
/// "directory not found" path of single-index mode.
pub fn resolve_single(config: &Config) -> Result<Vec<IngestTarget>, ConfigError> {
    if !config.docs_dir.is_dir() {
        return Err(ConfigError::MissingDirectory(config.docs_dir.clone()));
    }
    Ok(vec![IngestTarget {
        root: config.docs_dir.clone(),
        index: config.es_index.clone(),
    }])
}
