//! Document discovery and text extraction.
//!
//! The loader walks a directory tree, classifies files by extension, and
//! extracts `(text, metadata)` fragments per file type. Failures stay local:
//! a file that cannot be read or parsed contributes zero fragments and one
//! recorded warning, never an aborted run.

mod pdf;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File formats the loader understands, derived from the lower-cased extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Paged PDF document.
    Pdf,
    /// Plain text or Markdown.
    Text,
    /// JSON document, array or scalar.
    Json,
}

impl SourceKind {
    /// Classify a path by extension; `None` means the file is ignored entirely.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Provenance metadata attached to every fragment and stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentMetadata {
    /// Origin path of the fragment.
    pub source: String,
    /// 1-based page index, present only for PDF pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// 0-based array index, present only for JSON array elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<usize>,
}

impl FragmentMetadata {
    /// Metadata for a fragment covering a whole file.
    pub(crate) fn whole_file(path: &Path) -> Self {
        Self {
            source: path.display().to_string(),
            page: None,
            item: None,
        }
    }

    /// Metadata for one PDF page.
    pub(crate) fn page(path: &Path, page: u32) -> Self {
        Self {
            source: path.display().to_string(),
            page: Some(page),
            item: None,
        }
    }

    /// Metadata for one JSON array element.
    pub(crate) fn item(path: &Path, item: usize) -> Self {
        Self {
            source: path.display().to_string(),
            page: None,
            item: Some(item),
        }
    }
}

/// One unit of extracted text plus provenance, prior to chunking.
///
/// Invariant: the trimmed text of a fragment is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Extracted text.
    pub text: String,
    /// Provenance carried through chunking into the index.
    pub metadata: FragmentMetadata,
}

/// Per-file failure recorded while loading, without aborting the walk.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// File (or directory entry) that failed.
    pub path: PathBuf,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Fragments and warnings gathered from one directory walk.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Extracted fragments in deterministic walk order.
    pub fragments: Vec<Fragment>,
    /// Files skipped with their failure reasons.
    pub warnings: Vec<LoadWarning>,
}

/// Errors that abort loading before any file is visited.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The requested root directory does not exist.
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// Failure reading or parsing a single file.
#[derive(Debug, Error)]
enum FileError {
    /// Filesystem read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// PDF could not be opened or decoded.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    /// JSON could not be parsed or re-serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recursively load every supported file under `root`.
///
/// Files are visited in lexicographic order per directory so fragment order
/// is stable across runs. Unsupported extensions are skipped without a
/// warning; unreadable or malformed files are skipped with one.
pub fn load_documents(root: &Path) -> Result<LoadOutcome, LoaderError> {
    if !root.is_dir() {
        return Err(LoaderError::RootNotFound(root.to_path_buf()));
    }

    let mut outcome = LoadOutcome::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn_and_record(&mut outcome, path, error.to_string());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(kind) = SourceKind::from_path(path) else {
            continue;
        };
        match read_file(path, kind) {
            Ok(fragments) => outcome.fragments.extend(fragments),
            Err(error) => warn_and_record(&mut outcome, path.to_path_buf(), error.to_string()),
        }
    }
    Ok(outcome)
}

fn warn_and_record(outcome: &mut LoadOutcome, path: PathBuf, reason: String) {
    tracing::warn!(path = %path.display(), reason = %reason, "Skipping unreadable file");
    outcome.warnings.push(LoadWarning { path, reason });
}

fn read_file(path: &Path, kind: SourceKind) -> Result<Vec<Fragment>, FileError> {
    match kind {
        SourceKind::Pdf => pdf::read_pdf(path),
        SourceKind::Text => read_text(path),
        SourceKind::Json => read_json(path),
    }
}

/// Whole-file text extraction with lossy UTF-8 decoding.
fn read_text(path: &Path) -> Result<Vec<Fragment>, FileError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Fragment {
        text: text.into_owned(),
        metadata: FragmentMetadata::whole_file(path),
    }])
}

/// JSON extraction: one fragment per array element, or one for the whole
/// document when the top level is not an array.
fn read_json(path: &Path) -> Result<Vec<Fragment>, FileError> {
    let bytes = fs::read(path)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;

    let mut fragments = Vec::new();
    match value {
        serde_json::Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                // Elements that fail to re-serialize are skipped individually,
                // keeping their neighbours and their array positions intact.
                let Ok(text) = serde_json::to_string(&item) else {
                    tracing::warn!(path = %path.display(), item = index, "Skipping unserializable JSON element");
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }
                fragments.push(Fragment {
                    text,
                    metadata: FragmentMetadata::item(path, index),
                });
            }
        }
        other => {
            let text = serde_json::to_string(&other)?;
            if !text.trim().is_empty() {
                fragments.push(Fragment {
                    text,
                    metadata: FragmentMetadata::whole_file(path),
                });
            }
        }
    }
    Ok(fragments)
}
