//! Ingestion pipeline orchestration.

pub mod chunking;
pub mod service;
pub mod targets;
pub mod types;

pub use chunking::Chunker;
pub use service::IngestService;
pub use targets::{IngestTarget, resolve_overlays, resolve_single};
pub use types::{ChunkingError, FailedTarget, RunSummary, TargetOutcome};
