//! TLS policy resolution for the Elasticsearch connection.
//!
//! The policy ladder, in priority order: verification disabled, CA file on
//! disk, inline base64 CA material, platform trust store. Resolution itself
//! never touches the network, so it is testable without a backend.

use crate::config::Config;
use crate::elastic::types::ElasticError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::PathBuf;

/// How the HTTP client validates the backend's TLS certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Accept any certificate without validation (self-signed deployments).
    Insecure,
    /// Verify against a CA certificate file on disk.
    CaFile(PathBuf),
    /// Verify against PEM bytes decoded from inline configuration.
    CaPem(Vec<u8>),
    /// Verify using the platform trust store.
    Default,
}

impl TlsPolicy {
    /// Resolve the policy from configuration.
    ///
    /// A base64 blob that fails to decode degrades to the platform trust
    /// store with a warning; the connection may then fail certificate
    /// validation later, which is surfaced rather than swallowed.
    pub fn resolve(config: &Config) -> Self {
        if !config.es_verify {
            return Self::Insecure;
        }
        if let Some(path) = &config.es_ca_path
            && path.exists()
        {
            return Self::CaFile(path.clone());
        }
        if let Some(encoded) = &config.es_ca_base64 {
            match BASE64.decode(encoded.trim()) {
                Ok(pem) => return Self::CaPem(pem),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        "Failed to decode ES_CA_BASE64; falling back to system trust store"
                    );
                }
            }
        }
        Self::Default
    }

    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insecure => "insecure",
            Self::CaFile(_) => "ca-file",
            Self::CaPem(_) => "ca-inline",
            Self::Default => "system",
        }
    }

    /// Apply the policy to a client builder, loading CA material as needed.
    pub(crate) fn apply(
        self,
        builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder, ElasticError> {
        match self {
            Self::Insecure => Ok(builder.danger_accept_invalid_certs(true)),
            Self::CaFile(path) => {
                let pem = std::fs::read(&path)
                    .map_err(|source| ElasticError::CaCertificate { path, source })?;
                let certificate = reqwest::Certificate::from_pem(&pem)?;
                Ok(builder.add_root_certificate(certificate))
            }
            Self::CaPem(pem) => {
                let certificate = reqwest::Certificate::from_pem(&pem)?;
                Ok(builder.add_root_certificate(certificate))
            }
            Self::Default => Ok(builder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> Config {
        Config {
            docs_dir: PathBuf::from("ingest/data/docs"),
            data_base_dir: PathBuf::from("ingest/data"),
            batch_size: 128,
            chunk_size: 800,
            chunk_overlap: 120,
            embed_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            embed_url: "http://127.0.0.1:8080".to_string(),
            es_url: "https://search.local:9200".to_string(),
            es_user: "elastic".to_string(),
            es_pass: "changeme".to_string(),
            es_index: "your_index_name".to_string(),
            es_verify: true,
            es_ca_path: None,
            es_ca_base64: None,
            es_timeout_secs: 60,
        }
    }

    #[test]
    fn disabled_verification_wins_over_ca_material() {
        let mut config = base_config();
        config.es_verify = false;
        config.es_ca_path = Some(PathBuf::from("/tmp/ca.pem"));
        config.es_ca_base64 = Some("aGVsbG8=".to_string());
        assert_eq!(TlsPolicy::resolve(&config), TlsPolicy::Insecure);
    }

    #[test]
    fn existing_ca_file_is_preferred() {
        let mut ca_file = tempfile::NamedTempFile::new().unwrap();
        ca_file.write_all(b"-----BEGIN CERTIFICATE-----\n").unwrap();

        let mut config = base_config();
        config.es_ca_path = Some(ca_file.path().to_path_buf());
        config.es_ca_base64 = Some("aGVsbG8=".to_string());
        assert_eq!(
            TlsPolicy::resolve(&config),
            TlsPolicy::CaFile(ca_file.path().to_path_buf())
        );
    }

    #[test]
    fn missing_ca_file_falls_back_to_inline_material() {
        let pem = b"-----BEGIN CERTIFICATE-----\n".to_vec();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&pem);

        let mut config = base_config();
        config.es_ca_path = Some(PathBuf::from("/definitely/not/there.pem"));
        config.es_ca_base64 = Some(encoded);
        assert_eq!(TlsPolicy::resolve(&config), TlsPolicy::CaPem(pem));
    }

    #[test]
    fn undecodable_inline_material_degrades_to_system_trust() {
        let mut config = base_config();
        config.es_ca_base64 = Some("!!! not base64 !!!".to_string());
        assert_eq!(TlsPolicy::resolve(&config), TlsPolicy::Default);
    }

    #[test]
    fn no_ca_material_uses_system_trust() {
        assert_eq!(TlsPolicy::resolve(&base_config()), TlsPolicy::Default);
    }
}
