#![deny(missing_docs)]

//! Core library for the esingest document pipeline.

/// Environment-driven configuration management.
pub mod config;
/// Elasticsearch REST client and vector store integration.
pub mod elastic;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Document discovery and text extraction.
pub mod loader;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion pipeline orchestration.
pub mod pipeline;
