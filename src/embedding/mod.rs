//! Embedding client abstraction and the HTTP adapter for the embedding service.

use crate::config::Config;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// HTTP transport failed before a response arrived.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Service answered with a non-success status.
    #[error("Embedding service returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code of the response.
        status: reqwest::StatusCode,
        /// Response body captured for diagnostics.
        body: String,
    },
    /// Service returned a different number of vectors than texts sent.
    #[error("Embedding count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch {
        /// Number of texts in the request.
        sent: usize,
        /// Number of vectors in the response.
        received: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce one embedding vector per input string, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// HTTP client for a `text-embeddings-inference` style service.
///
/// The service exposes `POST /embed` taking `{"inputs": [...]}` and answering
/// with a JSON array of float vectors in input order.
pub struct TeiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

impl TeiClient {
    /// Construct a client for the embedding service at `base_url`.
    ///
    /// The model identifier is fixed server-side; it is kept here for
    /// diagnostics only.
    pub fn new(base_url: &str, model: &str) -> Result<Self, EmbeddingClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("esingest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingClient for TeiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, texts = texts.len(), "Requesting embeddings");
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { inputs: texts })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::UnexpectedStatus { status, body });
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingClientError::CountMismatch {
                sent: texts.len(),
                received: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

/// Build the embedding client described by the configuration.
pub fn build_embedding_client(
    config: &Config,
) -> Result<Box<dyn EmbeddingClient + Send + Sync>, EmbeddingClientError> {
    let client = TeiClient::new(&config.embed_url, &config.embed_model)?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_input_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embed")
                    .json_body(serde_json::json!({"inputs": ["first", "second"]}));
                then.status(200)
                    .json_body(serde_json::json!([[0.1, 0.2], [0.3, 0.4]]));
            })
            .await;

        let client = TeiClient::new(&server.base_url(), "test-model").unwrap();
        let vectors = client.embed(&texts(&["first", "second"])).await.unwrap();

        mock.assert_async().await;
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn embed_skips_request_for_empty_input() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let client = TeiClient::new(&server.base_url(), "test-model").unwrap();
        let vectors = client.embed(&[]).await.unwrap();

        assert!(vectors.is_empty());
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn embed_surfaces_service_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(503).body("model loading");
            })
            .await;

        let client = TeiClient::new(&server.base_url(), "test-model").unwrap();
        let error = client.embed(&texts(&["first"])).await.unwrap_err();

        assert!(matches!(
            error,
            EmbeddingClientError::UnexpectedStatus { status, ref body }
                if status.as_u16() == 503 && body == "model loading"
        ));
    }

    #[tokio::test]
    async fn embed_rejects_mismatched_vector_count() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(serde_json::json!([[0.5, 0.5]]));
            })
            .await;

        let client = TeiClient::new(&server.base_url(), "test-model").unwrap();
        let error = client.embed(&texts(&["first", "second"])).await.unwrap_err();

        assert!(matches!(
            error,
            EmbeddingClientError::CountMismatch {
                sent: 2,
                received: 1,
            }
        ));
    }
}
