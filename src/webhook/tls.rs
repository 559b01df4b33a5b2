//! TLS material for the webhook listener
//!
//! The API server only talks to admission webhooks over HTTPS. The serving
//! certificate and key are read from a directory, usually a mounted
//! `kubernetes.io/tls` Secret, as `tls.crt` and `tls.key`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::info;

use crate::error::{Error, Result};

pub const CERT_FILE: &str = "tls.crt";
pub const KEY_FILE: &str = "tls.key";

/// TLS configuration for the webhook server
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TlsConfig {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// `tls.crt` and `tls.key` inside `dir`.
    pub fn from_cert_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(CERT_FILE), dir.join(KEY_FILE))
    }

    /// Read and parse the certificate chain and private key.
    pub async fn load(&self) -> Result<RustlsConfig> {
        let cert_pem = tokio::fs::read(&self.cert_path).await.map_err(|e| {
            Error::TlsError(format!(
                "Failed to read certificate {}: {e}",
                self.cert_path.display()
            ))
        })?;
        let key_pem = tokio::fs::read(&self.key_path).await.map_err(|e| {
            Error::TlsError(format!(
                "Failed to read private key {}: {e}",
                self.key_path.display()
            ))
        })?;

        let server_config = build_server_config(&cert_pem, &key_pem)?;
        info!(cert = %self.cert_path.display(), "Loaded webhook serving certificate");

        Ok(RustlsConfig::from_config(server_config))
    }
}

/// Build a rustls server config from PEM encoded material.
pub fn build_server_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<rustls::ServerConfig>> {
    let certs = CertificateDer::pem_slice_iter(cert_pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::TlsError(format!("Failed to parse certificates: {e}")))?;
    if certs.is_empty() {
        return Err(Error::TlsError("No certificates found".to_string()));
    }

    let key = PrivateKeyDer::from_pem_slice(key_pem)
        .map_err(|e| Error::TlsError(format!("Failed to parse private key: {e}")))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsError(format!("Failed to select protocol versions: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| Error::TlsError(format!("Failed to create server config: {e}")))?;
    server_config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(server_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed() -> (String, String) {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        (certified.cert.pem(), certified.key_pair.serialize_pem())
    }

    #[test]
    fn builds_config_from_self_signed_pair() {
        let (cert, key) = self_signed();
        let config = build_server_config(cert.as_bytes(), key.as_bytes()).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn rejects_empty_certificate() {
        let (_, key) = self_signed();
        assert!(matches!(
            build_server_config(b"", key.as_bytes()),
            Err(Error::TlsError(_))
        ));
    }

    #[test]
    fn rejects_missing_key() {
        let (cert, _) = self_signed();
        assert!(matches!(
            build_server_config(cert.as_bytes(), b""),
            Err(Error::TlsError(_))
        ));
    }

    #[tokio::test]
    async fn loads_pair_from_cert_dir() {
        let (cert, key) = self_signed();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CERT_FILE), cert).unwrap();
        std::fs::write(dir.path().join(KEY_FILE), key).unwrap();

        let tls = TlsConfig::from_cert_dir(dir.path());
        assert_eq!(tls.cert_path, dir.path().join("tls.crt"));
        assert!(tls.load().await.is_ok());
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = TlsConfig::from_cert_dir(dir.path()).load().await.unwrap_err();
        assert!(err.to_string().contains("tls.crt"), "got: {err}");
    }
}
