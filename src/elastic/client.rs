//! HTTP client wrapper for interacting with Elasticsearch.

use crate::config::Config;
use crate::elastic::tls::TlsPolicy;
use crate::elastic::types::{BulkResponse, ClusterInfo, ElasticError};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Lightweight HTTP client for Elasticsearch operations.
///
/// One service instance is shared read-only across all targets of a run;
/// construction performs no network traffic.
pub struct ElasticService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl ElasticService {
    /// Construct a client from the connection parameters in the configuration.
    pub fn connect(config: &Config) -> Result<Self, ElasticError> {
        let base_url = normalize_base_url(&config.es_url).map_err(ElasticError::InvalidUrl)?;
        let policy = TlsPolicy::resolve(config);
        tracing::debug!(
            url = %base_url,
            tls = policy.label(),
            timeout_secs = config.es_timeout_secs,
            "Initialized Elasticsearch HTTP client"
        );

        let builder = Client::builder()
            .user_agent(concat!("esingest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.es_timeout_secs));
        let client = policy.apply(builder)?.build()?;

        Ok(Self {
            client,
            base_url,
            username: config.es_user.clone(),
            password: config.es_pass.clone(),
        })
    }

    /// Fetch cluster identity from the root endpoint.
    pub async fn info(&self) -> Result<ClusterInfo, ElasticError> {
        let response = self.request(Method::GET, "").send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ElasticError::UnexpectedStatus { status, body });
        }
        Ok(response.json().await?)
    }

    /// Create an index with the standard chunk mapping only when it is missing.
    pub async fn ensure_index(&self, index: &str, dims: usize) -> Result<(), ElasticError> {
        if self.index_exists(index).await? {
            return Ok(());
        }

        tracing::debug!(index, dims, "Creating index");
        self.create_index(index, dims).await
    }

    /// Create an index mapping chunk text, a dense vector of `dims`
    /// dimensions, and a dynamic metadata object.
    pub async fn create_index(&self, index: &str, dims: usize) -> Result<(), ElasticError> {
        let body = json!({
            "mappings": {
                "properties": {
                    "text": { "type": "text" },
                    "vector": {
                        "type": "dense_vector",
                        "dims": dims,
                        "index": true,
                        "similarity": "cosine"
                    },
                    "metadata": { "type": "object", "dynamic": true }
                }
            }
        });

        let response = self.request(Method::PUT, index).json(&body).send().await?;
        self.ensure_success(response, || {
            tracing::debug!(index, "Index created");
        })
        .await
    }

    /// Append documents to `index` via one `_bulk` request.
    ///
    /// No identity key is supplied with the actions, so re-running the same
    /// input appends duplicate entries; that is the pipeline's contract.
    /// Returns the number of documents inserted.
    pub async fn bulk_insert<M: Serialize>(
        &self,
        index: &str,
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[M],
    ) -> Result<usize, ElasticError> {
        debug_assert_eq!(texts.len(), vectors.len());
        debug_assert_eq!(texts.len(), metadatas.len());
        if texts.is_empty() {
            return Ok(0);
        }

        let mut body = String::new();
        for ((text, vector), metadata) in texts.iter().zip(vectors).zip(metadatas) {
            let metadata = serde_json::to_value(metadata)?;
            let document = json!({
                "text": text,
                "vector": vector,
                "metadata": metadata,
            });
            body.push_str("{\"index\":{}}\n");
            body.push_str(&document.to_string());
            body.push('\n');
        }

        let response = self
            .request(Method::POST, &format!("{index}/_bulk"))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ElasticError::UnexpectedStatus { status, body };
            tracing::error!(index, error = %error, "Bulk insert failed");
            return Err(error);
        }

        let report: BulkResponse = response.json().await?;
        if report.errors {
            return Err(bulk_failure(index, &report));
        }
        Ok(texts.len())
    }

    /// Make just-inserted documents visible to subsequent searches.
    pub async fn refresh(&self, index: &str) -> Result<(), ElasticError> {
        let response = self
            .request(Method::POST, &format!("{index}/_refresh"))
            .send()
            .await?;
        self.ensure_success(response, || {
            tracing::debug!(index, "Index refreshed");
        })
        .await
    }

    async fn index_exists(&self, index: &str) -> Result<bool, ElasticError> {
        let response = self.request(Method::HEAD, index).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = ElasticError::UnexpectedStatus { status, body };
                tracing::error!(index, error = %error, "Index existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), ElasticError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ElasticError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Elasticsearch request failed");
            Err(error)
        }
    }
}

fn bulk_failure(index: &str, report: &BulkResponse) -> ElasticError {
    let failures: Vec<&Value> = report
        .items
        .iter()
        .filter_map(|item| item.index.as_ref())
        .filter(|detail| detail.error.is_some() || detail.status >= 400)
        .filter_map(|detail| detail.error.as_ref())
        .collect();
    let reason = failures
        .first()
        .map(|error| {
            error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());
    let error = ElasticError::BulkItemsFailed {
        failed: failures.len(),
        total: report.items.len(),
        reason,
    };
    tracing::error!(index, error = %error, "Bulk insert rejected items");
    error
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::HEAD, Method::POST, Method::PUT, MockServer};

    fn service_for(server: &MockServer) -> ElasticService {
        ElasticService {
            client: Client::builder()
                .user_agent("esingest-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        }
    }

    #[tokio::test]
    async fn info_parses_cluster_identity() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).json_body(json!({
                    "name": "node-1",
                    "cluster_name": "docker-cluster",
                    "version": { "number": "8.14.1" },
                    "tagline": "You Know, for Search"
                }));
            })
            .await;

        let service = service_for(&server);
        let info = service.info().await.expect("cluster info");

        mock.assert_async().await;
        assert_eq!(info.cluster_name, "docker-cluster");
        assert_eq!(info.version.number, "8.14.1");
    }

    #[tokio::test]
    async fn ensure_index_creates_only_missing_indexes() {
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
                    .json_body_partial(r#"{"mappings": {"properties": {"vector": {"dims": 3}}}}"#);
                then.status(200)
                    .json_body(json!({ "acknowledged": true, "index": "notes" }));
            })
            .await;

        let service = service_for(&server);
        service.ensure_index("notes", 3).await.expect("ensure");

        head.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn ensure_index_skips_creation_when_present() {
        let server = MockServer::start_async().await;
        let head = server
            .mock_async(|when, then| {
                when.method(HEAD).path("/notes");
                then.status(200);
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/notes");
                then.status(200);
            })
            .await;

        let service = service_for(&server);
        service.ensure_index("notes", 3).await.expect("ensure");

        head.assert_async().await;
        assert_eq!(put.hits_async().await, 0);
    }

    #[tokio::test]
    async fn bulk_insert_sends_ndjson_actions() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/notes/_bulk")
                    .header("content-type", "application/x-ndjson")
                    .body_contains("{\"index\":{}}")
                    .body_contains("hello world");
                then.status(200).json_body(json!({
                    "errors": false,
                    "items": [
                        { "index": { "status": 201 } },
                        { "index": { "status": 201 } }
                    ]
                }));
            })
            .await;

        let service = service_for(&server);
        let texts = vec!["hello world".to_string(), "second chunk".to_string()];
        let vectors = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let metadatas = vec![
            json!({ "source": "a.txt" }),
            json!({ "source": "a.txt" }),
        ];
        let inserted = service
            .bulk_insert("notes", &texts, &vectors, &metadatas)
            .await
            .expect("bulk insert");

        mock.assert_async().await;
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn bulk_insert_reports_rejected_items() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/notes/_bulk");
                then.status(200).json_body(json!({
                    "errors": true,
                    "items": [
                        { "index": { "status": 201 } },
                        { "index": {
                            "status": 400,
                            "error": {
                                "type": "mapper_parsing_exception",
                                "reason": "failed to parse field [vector]"
                            }
                        } }
                    ]
                }));
            })
            .await;

        let service = service_for(&server);
        let texts = vec!["one".to_string(), "two".to_string()];
        let vectors = vec![vec![0.1], vec![0.2]];
        let metadatas = vec![json!({}), json!({})];
        let error = service
            .bulk_insert("notes", &texts, &vectors, &metadatas)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ElasticError::BulkItemsFailed { failed: 1, total: 2, ref reason }
                if reason == "failed to parse field [vector]"
        ));
    }

    #[tokio::test]
    async fn refresh_targets_named_index() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/notes/_refresh");
                then.status(200).json_body(json!({ "_shards": { "failed": 0 } }));
            })
            .await;

        let service = service_for(&server);
        service.refresh("notes").await.expect("refresh");

        mock.assert_async().await;
    }

    #[test]
    fn normalize_base_url_strips_trailing_path_slashes() {
        let url = normalize_base_url("https://search.local:9200/es///").expect("url");
        assert_eq!(url, "https://search.local:9200/es");
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn format_endpoint_joins_cleanly() {
        assert_eq!(
            format_endpoint("http://host:9200/", "/notes/_bulk"),
            "http://host:9200/notes/_bulk"
        );
    }
}
