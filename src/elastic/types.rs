//! Shared types used by the Elasticsearch client and vector store.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while interacting with Elasticsearch.
#[derive(Debug, Error)]
pub enum ElasticError {
    /// Endpoint URL failed to parse or normalize.
    #[error("Invalid Elasticsearch URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Elasticsearch responded with an unexpected status code.
    #[error("Unexpected Elasticsearch response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Elasticsearch.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A bulk request was accepted but rejected one or more documents.
    #[error("Bulk insert rejected {failed} of {total} documents: {reason}")]
    BulkItemsFailed {
        /// Number of rejected documents.
        failed: usize,
        /// Number of documents in the request.
        total: usize,
        /// First rejection reason reported by the backend.
        reason: String,
    },
    /// A configured CA certificate file could not be read.
    #[error("Failed to read CA certificate {path}: {source}")]
    CaCertificate {
        /// Path of the unreadable certificate file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Document metadata could not be serialized for insertion.
    #[error("Failed to serialize document metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    /// Embedding the batch failed inside the vector store.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
}

/// Cluster identity returned by the root endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    /// Cluster name reported by the backend.
    pub cluster_name: String,
    /// Version block carrying the release number.
    pub version: ClusterVersion,
}

/// Version block nested in the root endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterVersion {
    /// Release number, e.g. `8.14.1`.
    pub number: String,
}

#[derive(Deserialize)]
pub(crate) struct BulkResponse {
    pub(crate) errors: bool,
    pub(crate) items: Vec<BulkItem>,
}

#[derive(Deserialize)]
pub(crate) struct BulkItem {
    pub(crate) index: Option<BulkItemDetail>,
}

#[derive(Deserialize)]
pub(crate) struct BulkItemDetail {
    pub(crate) status: u16,
    pub(crate) error: Option<Value>,
}
