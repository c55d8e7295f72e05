//! Boundary-aware text chunking.
//!
//! Fragments are split into character-bounded windows before embedding.
//! Highlights:
//!
//! - Boundary ladder: each cut prefers the earliest-listed boundary (paragraph
//!   break, line break, space) whose last occurrence still fits the window,
//!   falling back to the next boundary type only when the preferred one is
//!   absent; the empty-string entry means "split anywhere".
//! - Verbatim chunks: every chunk is an exact substring of the input, so
//!   concatenating chunks with overlaps removed reconstructs the original
//!   text byte for byte.
//! - Overlap: consecutive chunks share a configurable tail of the previous
//!   chunk so spans around boundaries remain visible to retrieval.

use super::types::ChunkingError;

/// Default boundary ladder, ordered from most to least preferred.
pub const DEFAULT_BOUNDARIES: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into character-bounded chunks along preferred boundaries.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    boundaries: Vec<String>,
}

impl Chunker {
    /// Build a chunker with the default boundary ladder.
    ///
    /// `chunk_size` is the maximum chunk length in characters; `chunk_overlap`
    /// is the number of trailing characters repeated at the start of the next
    /// chunk and must be strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        Self::with_boundaries(chunk_size, chunk_overlap, &DEFAULT_BOUNDARIES)
    }

    /// Build a chunker with an explicit ordered boundary list.
    pub fn with_boundaries(
        chunk_size: usize,
        chunk_overlap: usize,
        boundaries: &[&str],
    ) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                chunk_size,
                chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            boundaries: boundaries.iter().map(|b| (*b).to_string()).collect(),
        })
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    ///
    /// Every chunk is a verbatim substring of `text`. A run with no usable
    /// boundary is only emitted oversized when the boundary list lacks the
    /// empty-string fallback; with the default ladder no chunk ever exceeds
    /// the budget. Returns an empty vector for empty input.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let offsets = char_offsets(text);
        let total = offsets.len() - 1;
        if total <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        // Char index up to which text has already been emitted; cuts at or
        // before this point would add no new content.
        let mut covered = 0;
        loop {
            let window_end = (start + self.chunk_size).min(total);
            if window_end == total {
                chunks.push(text[offsets[start]..].to_string());
                break;
            }
            let cut = self.select_cut(text, &offsets, start, window_end, covered);
            chunks.push(text[offsets[start]..offsets[cut]].to_string());
            if cut == total {
                break;
            }
            covered = cut;
            start = cut.saturating_sub(self.chunk_overlap).max(start + 1);
        }
        chunks
    }

    /// Pick the char index to cut at, preferring the earliest-listed boundary
    /// whose last in-window occurrence both fits and extends past `covered`.
    /// When nothing fits and no "split anywhere" fallback is configured, the
    /// cut runs past the window to the first boundary beyond it (or the end of
    /// the text), passing an indivisible run through oversized.
    fn select_cut(
        &self,
        text: &str,
        offsets: &[usize],
        start: usize,
        window_end: usize,
        covered: usize,
    ) -> usize {
        let window = &text[offsets[start]..offsets[window_end]];
        for boundary in &self.boundaries {
            if boundary.is_empty() {
                return window_end;
            }
            if let Some(position) = window.rfind(boundary.as_str()) {
                let cut = char_index(offsets, offsets[start] + position + boundary.len());
                if cut > covered {
                    return cut;
                }
            }
        }

        let tail = &text[offsets[start]..];
        self.boundaries
            .iter()
            .filter(|boundary| !boundary.is_empty())
            .filter_map(|boundary| {
                tail.match_indices(boundary.as_str())
                    .map(|(position, _)| offsets[start] + position + boundary.len())
                    .find(|&cut_byte| cut_byte > offsets[window_end])
            })
            .min()
            .map(|cut_byte| char_index(offsets, cut_byte))
            .unwrap_or(offsets.len() - 1)
    }
}

/// Byte offset of every char boundary in `text`, plus the total length.
fn char_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    offsets.push(text.len());
    offsets
}

/// Map a byte offset lying on a char boundary back to its char index.
fn char_index(offsets: &[usize], byte: usize) -> usize {
    offsets.partition_point(|&offset| offset < byte)
}
