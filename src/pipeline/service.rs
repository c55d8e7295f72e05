//! Ingestion orchestrator driving load, chunk, batch-insert, and refresh
//! for each target in order.

use crate::config::Config;
use crate::elastic::{ElasticError, ElasticService};
use crate::embedding::EmbeddingClient;
use crate::loader::{self, FragmentMetadata, LoadOutcome, LoaderError};
use crate::pipeline::chunking::Chunker;
use crate::pipeline::targets::IngestTarget;
use crate::pipeline::types::{ChunkingError, FailedTarget, RunSummary, TargetOutcome};

/// Cumulative progress is reported at every Nth batch and at the last one.
const PROGRESS_EVERY_BATCHES: usize = 5;

/// Coordinates the full ingestion pipeline per target: document loading,
/// chunking, embedding, batched insertion, and the closing refresh.
///
/// The service borrows the long-lived embedding client and Elasticsearch
/// connection so every target of a run reuses the same handles. Targets are
/// processed strictly in order; a failed target is recorded and skipped
/// without touching the ones before or after it.
pub struct IngestService<'a> {
    embedder: &'a (dyn EmbeddingClient + Send + Sync),
    elastic: &'a ElasticService,
    chunker: Chunker,
    batch_size: usize,
}

impl<'a> IngestService<'a> {
    /// Build the orchestrator from configuration and shared service handles.
    pub fn new(
        config: &Config,
        embedder: &'a (dyn EmbeddingClient + Send + Sync),
        elastic: &'a ElasticService,
    ) -> Result<Self, ChunkingError> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            embedder,
            elastic,
            chunker,
            batch_size: config.batch_size,
        })
    }

    /// Process every target in order and report the aggregated outcome.
    pub async fn run(&self, targets: &[IngestTarget]) -> RunSummary {
        let mut summary = RunSummary::default();
        for target in targets {
            tracing::info!(
                index = %target.index,
                root = %target.root.display(),
                "Processing target"
            );
            match self.ingest_target(target).await {
                Ok(outcome) => {
                    tracing::info!(
                        index = %outcome.index,
                        fragments = outcome.fragments,
                        chunks = outcome.chunks,
                        inserted = outcome.inserted,
                        skipped_files = outcome.skipped_files,
                        "Target complete"
                    );
                    summary.completed.push(outcome);
                }
                Err(error) => {
                    tracing::error!(index = %target.index, error = %error, "Target aborted");
                    summary.failed.push(FailedTarget {
                        index: target.index.clone(),
                        error,
                    });
                }
            }
        }
        summary
    }

    async fn ingest_target(&self, target: &IngestTarget) -> Result<TargetOutcome, ElasticError> {
        let loaded = match loader::load_documents(&target.root) {
            Ok(outcome) => outcome,
            Err(LoaderError::RootNotFound(path)) => {
                // Overlay directories listed at startup can vanish before we
                // reach them; that degrades to an empty target, not a failure.
                tracing::warn!(
                    index = %target.index,
                    root = %path.display(),
                    "Target root disappeared; nothing to ingest"
                );
                LoadOutcome::default()
            }
        };

        let fragment_count = loaded.fragments.len();
        if fragment_count == 0 {
            tracing::info!(index = %target.index, "No documents found; index left untouched");
            return Ok(TargetOutcome {
                index: target.index.clone(),
                fragments: 0,
                chunks: 0,
                inserted: 0,
                batches: 0,
                skipped_files: loaded.warnings.len(),
            });
        }
        tracing::info!(
            index = %target.index,
            fragments = fragment_count,
            skipped_files = loaded.warnings.len(),
            "Documents loaded"
        );

        let mut texts: Vec<String> = Vec::new();
        let mut metadatas: Vec<FragmentMetadata> = Vec::new();
        for fragment in &loaded.fragments {
            for chunk in self.chunker.chunk(&fragment.text) {
                texts.push(chunk);
                metadatas.push(fragment.metadata.clone());
            }
        }
        let total_chunks = texts.len();
        tracing::info!(index = %target.index, chunks = total_chunks, "Chunks prepared");

        let mut store = self.elastic.open_index(self.embedder, &target.index);
        let batch_count = total_chunks.div_ceil(self.batch_size);
        let mut inserted = 0;
        let batches = texts
            .chunks(self.batch_size)
            .zip(metadatas.chunks(self.batch_size));
        for (batch_index, (text_batch, metadata_batch)) in batches.enumerate() {
            inserted += store.insert_batch(text_batch, metadata_batch).await?;
            let batch_number = batch_index + 1;
            if batch_number % PROGRESS_EVERY_BATCHES == 0 || batch_number == batch_count {
                tracing::info!(
                    index = %target.index,
                    inserted,
                    total = total_chunks,
                    "Batch progress"
                );
            }
        }

        store.refresh().await?;

        Ok(TargetOutcome {
            index: target.index.clone(),
            fragments: fragment_count,
            chunks: total_chunks,
            inserted,
            batches: batch_count,
            skipped_files: loaded.warnings.len(),
        })
    }
}
