//! Elasticsearch REST client and vector store integration.

pub mod client;
pub mod store;
pub mod tls;
pub mod types;

pub use client::ElasticService;
pub use store::VectorStore;
pub use tls::TlsPolicy;
pub use types::{ClusterInfo, ClusterVersion, ElasticError};
