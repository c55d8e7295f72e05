//! Core data types and error definitions for the ingestion pipeline.

use crate::elastic::ElasticError;
use thiserror::Error;

/// Errors produced while splitting fragment text into bounded chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunking configured an impossible length budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for new content in every chunk.
    #[error("chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Configured maximum chunk length.
        chunk_size: usize,
        /// Configured overlap length.
        chunk_overlap: usize,
    },
}

/// Summary of a single target produced by [`crate::pipeline::IngestService::run`].
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    /// Destination index name.
    pub index: String,
    /// Number of fragments extracted from the target's documents.
    pub fragments: usize,
    /// Number of chunks produced from those fragments.
    pub chunks: usize,
    /// Number of documents inserted into the index.
    pub inserted: usize,
    /// Number of bulk requests issued.
    pub batches: usize,
    /// Number of files skipped with a warning during loading.
    pub skipped_files: usize,
}

/// Record of a target that aborted with a service-level error.
#[derive(Debug)]
pub struct FailedTarget {
    /// Destination index name of the aborted target.
    pub index: String,
    /// Error that stopped the target.
    pub error: ElasticError,
}

/// Aggregated report for a completed run across all targets.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Targets that ran to completion, in processing order.
    pub completed: Vec<TargetOutcome>,
    /// Targets that aborted, in processing order.
    pub failed: Vec<FailedTarget>,
}

impl RunSummary {
    /// Total number of documents inserted across all completed targets.
    pub fn total_inserted(&self) -> usize {
        self.completed.iter().map(|outcome| outcome.inserted).sum()
    }

    /// True when every target ran to completion.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
