//! TLS trust material for outbound node connections.

use std::path::Path;

use tonic::transport::{Certificate, ClientTlsConfig};

use crate::error::{Error, Result};

/// Trust anchors and optional server-name override for one node.
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// PEM bundles, concatenated when handed to the transport.
    pub trust_anchors: Vec<Vec<u8>>,
    /// Name matched against the server certificate instead of the dialed host.
    pub server_name_override: Option<String>,
}

impl TlsSettings {
    pub fn new(trust_anchors: Vec<Vec<u8>>, server_name_override: Option<String>) -> Self {
        Self {
            trust_anchors,
            server_name_override,
        }
    }

    /// Collect trust anchors from an optional file and an optional inline PEM.
    ///
    /// Returns `None` when neither source is set, meaning the node is dialed
    /// in plaintext.
    pub fn from_sources(
        ca_path: Option<&Path>,
        ca_pem: Option<&str>,
        server_name_override: Option<String>,
    ) -> Result<Option<Self>> {
        let mut anchors = Vec::new();

        if let Some(path) = ca_path {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read {}: {}", path.display(), e)))?;
            anchors.push(pem);
        }
        if let Some(pem) = ca_pem {
            anchors.push(pem.as_bytes().to_vec());
        }

        if anchors.is_empty() {
            if server_name_override.is_some() {
                return Err(Error::Tls(
                    "server name override requires trust anchors".to_string(),
                ));
            }
            return Ok(None);
        }

        for pem in &anchors {
            if count_certificates(pem)? == 0 {
                return Err(Error::Tls("trust bundle contains no certificates".to_string()));
            }
        }

        Ok(Some(Self::new(anchors, server_name_override)))
    }

    /// Transport-level TLS configuration.
    pub fn client_config(&self) -> ClientTlsConfig {
        let bundle = self.trust_anchors.concat();
        let mut config = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(bundle));
        if let Some(name) = &self.server_name_override {
            config = config.domain_name(name.clone());
        }
        config
    }
}

/// Number of certificates in a PEM bundle.
pub fn count_certificates(pem: &[u8]) -> Result<usize> {
    let mut reader = pem;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("invalid PEM: {}", e)))?;
    Ok(certs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sources_means_plaintext() {
        let settings = TlsSettings::from_sources(None, None, None).unwrap();
        assert!(settings.is_none());
    }

    #[test]
    fn test_override_without_anchors_rejected() {
        let err = TlsSettings::from_sources(None, None, Some("peer0.org1".into())).unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn test_bundle_without_certificates_rejected() {
        let err = TlsSettings::from_sources(None, Some("not a pem"), None).unwrap_err();
        assert!(err.to_string().contains("no certificates"));
    }

    #[test]
    fn test_inline_and_file_anchors_combined() {
        let pem = include_str!("../../tests/fixtures/ca.pem");
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ca.pem");
        let settings = TlsSettings::from_sources(Some(&path), Some(pem), Some("peer0.org1".into()))
            .unwrap()
            .unwrap();

        assert_eq!(settings.trust_anchors.len(), 2);
        assert_eq!(count_certificates(&settings.trust_anchors.concat()).unwrap(), 2);
        assert_eq!(settings.server_name_override.as_deref(), Some("peer0.org1"));
    }

    #[test]
    fn test_missing_ca_file() {
        let err = TlsSettings::from_sources(
            Some(Path::new("/nonexistent/ca.pem")),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }
}
