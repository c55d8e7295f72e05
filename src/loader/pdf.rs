//! Paged PDF text extraction.

use super::{FileError, Fragment, FragmentMetadata};
use lopdf::Document;
use std::path::Path;

/// Extract one fragment per page carrying non-empty text.
///
/// Page numbers are 1-based. A page whose text is empty or whitespace after
/// extraction yields no fragment; a page whose content streams cannot be
/// decoded is dropped the same way rather than failing the whole file.
pub(super) fn read_pdf(path: &Path) -> Result<Vec<Fragment>, FileError> {
    let document = Document::load(path)?;
    let mut fragments = Vec::new();
    for (page_number, _object_id) in document.get_pages() {
        let text = match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!(
                    path = %path.display(),
                    page = page_number,
                    error = %error,
                    "Page text extraction failed"
                );
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        fragments.push(Fragment {
            text,
            metadata: FragmentMetadata::page(path, page_number),
        });
    }
    Ok(fragments)
}
