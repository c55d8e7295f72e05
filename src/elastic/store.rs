//! Vector store binding one named index to the shared connection.

use crate::elastic::client::ElasticService;
use crate::elastic::types::ElasticError;
use crate::embedding::EmbeddingClient;
use serde::Serialize;

/// Insert handle for one destination index.
///
/// Multiple stores may share a single [`ElasticService`] connection. Each
/// store provisions its index lazily on first insert, sizing the dense-vector
/// mapping from the first embedding it sees, so an index is never created for
/// a target that contributes no documents.
pub struct VectorStore<'a> {
    service: &'a ElasticService,
    embedder: &'a (dyn EmbeddingClient + Send + Sync),
    index: String,
    provisioned: bool,
}

impl ElasticService {
    /// Bind subsequent inserts to the named index.
    pub fn open_index<'a>(
        &'a self,
        embedder: &'a (dyn EmbeddingClient + Send + Sync),
        index: &str,
    ) -> VectorStore<'a> {
        VectorStore {
            service: self,
            embedder,
            index: index.to_string(),
            provisioned: false,
        }
    }
}

impl VectorStore<'_> {
    /// Destination index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Embed `texts` and append them to the index with their metadata.
    ///
    /// Returns the number of documents inserted.
    pub async fn insert_batch<M: Serialize>(
        &mut self,
        texts: &[String],
        metadatas: &[M],
    ) -> Result<usize, ElasticError> {
        debug_assert_eq!(texts.len(), metadatas.len());
        if texts.is_empty() {
            return Ok(0);
        }

        let vectors = self.embedder.embed(texts).await?;
        if !self.provisioned {
            let dims = vectors.first().map_or(0, Vec::len);
            self.service.ensure_index(&self.index, dims).await?;
            self.provisioned = true;
        }
        self.service
            .bulk_insert(&self.index, texts, &vectors, metadatas)
            .await
    }

    /// Make inserted documents visible to subsequent searches.
    pub async fn refresh(&self) -> Result<(), ElasticError> {
        self.service.refresh(&self.index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingClientError;
    use async_trait::async_trait;
    use httpmock::{Method::HEAD, Method::POST, Method::PUT, MockServer};
    use serde_json::json;

    struct StubEmbedder {
        dims: usize,
    }

    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(position, _)| vec![position as f32; self.dims])
                .collect())
        }
    }

    fn service_for(server: &MockServer) -> ElasticService {
        ElasticService {
            client: reqwest::Client::builder()
                .user_agent("esingest-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_batch_provisions_index_once() {
        let server = MockServer::start_async().await;
        let head = server
            .mock_async(|when, then| {
                when.method(HEAD).path("/notes");
                then.status(404);
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/notes")
                    .json_body_partial(r#"{"mappings": {"properties": {"vector": {"dims": 2}}}}"#);
                then.status(200).json_body(json!({ "acknowledged": true }));
            })
            .await;
        let bulk = server
            .mock_async(|when, then| {
                when.method(POST).path("/notes/_bulk");
                then.status(200).json_body(json!({
                    "errors": false,
                    "items": [{ "index": { "status": 201 } }]
                }));
            })
            .await;

        let service = service_for(&server);
        let embedder = StubEmbedder { dims: 2 };
        let mut store = service.open_index(&embedder, "notes");

        let first = store
            .insert_batch(&["one".to_string()], &[json!({ "source": "a.txt" })])
            .await
            .expect("first batch");
        let second = store
            .insert_batch(&["two".to_string()], &[json!({ "source": "a.txt" })])
            .await
            .expect("second batch");

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(head.hits_async().await, 1);
        assert_eq!(put.hits_async().await, 1);
        assert_eq!(bulk.hits_async().await, 2);
    }

    #[tokio::test]
    async fn insert_batch_skips_empty_input_without_traffic() {
        let server = MockServer::start_async().await;
        let service = service_for(&server);
        let embedder = StubEmbedder { dims: 2 };
        let mut store = service.open_index(&embedder, "notes");

        let inserted = store
            .insert_batch::<serde_json::Value>(&[], &[])
            .await
            .expect("empty batch");
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn refresh_targets_bound_index() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/notes/_refresh");
                then.status(200).json_body(json!({ "_shards": { "failed": 0 } }));
            })
            .await;

        let service = service_for(&server);
        let embedder = StubEmbedder { dims: 2 };
        let store = service.open_index(&embedder, "notes");
        store.refresh().await.expect("refresh");

        mock.assert_async().await;
    }
}
