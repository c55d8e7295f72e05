use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// A configured directory does not exist on disk.
    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),
    /// A configured directory exists but could not be listed.
    #[error("Failed to read directory {path}: {source}")]
    UnreadableDirectory {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Runtime configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding documents in single-index mode.
    pub docs_dir: PathBuf,
    /// Base directory whose immediate subdirectories are overlays in multi-index mode.
    pub data_base_dir: PathBuf,
    /// Number of chunks inserted per bulk request.
    pub batch_size: usize,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Embedding model identifier reported to the embedding service.
    pub embed_model: String,
    /// Base URL of the embedding service.
    pub embed_url: String,
    /// Elasticsearch endpoint URL.
    pub es_url: String,
    /// Elasticsearch username for basic authentication.
    pub es_user: String,
    /// Elasticsearch password for basic authentication.
    pub es_pass: String,
    /// Destination index name in single-index mode.
    pub es_index: String,
    /// Whether to verify the Elasticsearch TLS certificate chain.
    pub es_verify: bool,
    /// Path to a CA certificate file used for TLS verification.
    pub es_ca_path: Option<PathBuf>,
    /// Base64-encoded CA certificate used when no file path is available.
    pub es_ca_base64: Option<String>,
    /// Request timeout for Elasticsearch calls, in seconds.
    pub es_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let batch_size: usize = load_env_or("BATCH_SIZE", "128")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BATCH_SIZE".to_string()))?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue("BATCH_SIZE".to_string()));
        }
        Ok(Self {
            docs_dir: PathBuf::from(load_env_or("DOCS_DIR", "ingest/data/docs")),
            data_base_dir: PathBuf::from(load_env_or("DATA_BASE_DIR", "ingest/data")),
            batch_size,
            chunk_size: load_env_or("CHUNK_SIZE", "800")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CHUNK_SIZE".to_string()))?,
            chunk_overlap: load_env_or("CHUNK_OVERLAP", "120")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CHUNK_OVERLAP".to_string()))?,
            embed_model: load_env_or("EMBED_MODEL", "sentence-transformers/all-MiniLM-L6-v2"),
            embed_url: load_env_or("EMBED_URL", "http://127.0.0.1:8080"),
            es_url: load_env("ES_URL")?,
            es_user: load_env("ES_USER")?,
            es_pass: load_env("ES_PASS")?,
            es_index: load_env_or("ES_INDEX", "your_index_name"),
            es_verify: parse_bool("ES_VERIFY", &load_env_or("ES_VERIFY", "false"))?,
            es_ca_path: load_env_optional("ES_CA_PATH").map(PathBuf::from),
            es_ca_base64: load_env_optional("ES_CA_BASE64"),
            es_timeout_secs: load_env_or("ES_TIMEOUT_SECS", "60")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ES_TIMEOUT_SECS".to_string()))?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}
