//! X.509 identity with a P-256 signing key.
//!
//! # Security
//! - Private keys come from a PEM file or the `LEDGER_SUBMIT_PRIVATE_KEY`
//!   environment variable
//! - Keys are never logged or serialized

use std::fmt;
use std::path::Path;

use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use prost::Message;

use crate::config::schema::IdentityConfig;
use crate::error::{Error, Result};
use crate::net::tls::count_certificates;
use crate::protos::msp::SerializedIdentity;
use crate::tx::signer::{signer_error, Signer};

/// Environment variable holding a PEM private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_SUBMIT_PRIVATE_KEY";

/// Member identity: MSP id, certificate and the matching private key.
pub struct X509Identity {
    msp_id: String,
    cert_pem: Vec<u8>,
    key: SigningKey,
}

impl X509Identity {
    pub fn new(msp_id: impl Into<String>, cert_pem: Vec<u8>, key: SigningKey) -> Self {
        Self {
            msp_id: msp_id.into(),
            cert_pem,
            key,
        }
    }

    /// Parse a certificate and a PKCS#8 or SEC1 PEM private key.
    pub fn from_pem(msp_id: impl Into<String>, cert_pem: Vec<u8>, key_pem: &str) -> Result<Self> {
        if count_certificates(&cert_pem)? == 0 {
            return Err(Error::Signer("certificate PEM contains no certificate".into()));
        }
        let key = parse_key(key_pem)?;
        let identity = Self::new(msp_id, cert_pem, key);
        tracing::info!(msp_id = %identity.msp_id, "identity loaded");
        Ok(identity)
    }

    /// Load certificate and key from files.
    pub fn from_files(
        msp_id: impl Into<String>,
        cert_path: &Path,
        key_path: &Path,
    ) -> Result<Self> {
        let cert_pem = read(cert_path)?;
        let key_pem = String::from_utf8(read(key_path)?)
            .map_err(|_| Error::Signer(format!("{} is not PEM text", key_path.display())))?;
        Self::from_pem(msp_id, cert_pem, &key_pem)
    }

    /// Load the certificate from a file and the key from the environment.
    pub fn from_env(msp_id: impl Into<String>, cert_path: &Path) -> Result<Self> {
        let key_pem = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            Error::Signer(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;
        Self::from_pem(msp_id, read(cert_path)?, &key_pem)
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let cert_path = Path::new(&config.cert_path);
        match &config.key_path {
            Some(key_path) => {
                Self::from_files(config.msp_id.clone(), cert_path, Path::new(key_path))
            }
            None => Self::from_env(config.msp_id.clone(), cert_path),
        }
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }
}

impl fmt::Debug for X509Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X509Identity")
            .field("msp_id", &self.msp_id)
            .finish_non_exhaustive()
    }
}

impl Signer for X509Identity {
    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.cert_pem.clone(),
        }
        .encode_to_vec())
    }

    /// ECDSA over SHA-256, low-S, DER encoded.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self.key.try_sign(message).map_err(signer_error)?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

fn parse_key(pem: &str) -> Result<SigningKey> {
    if let Ok(key) = SigningKey::from_pkcs8_pem(pem) {
        return Ok(key);
    }
    SecretKey::from_sec1_pem(pem)
        .map(|secret| SigningKey::from(&secret))
        .map_err(|_| Error::Signer("Invalid private key format".into()))
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Signer(format!("failed to read {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::VerifyingKey;
    use p256::pkcs8::{EncodePrivateKey, LineEnding};
    use rand::rngs::OsRng;

    // Self-signed P-256 certificate, unrelated to the generated keys.
    const CERT_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIBeTCCAR+gAwIBAgIUUf8Ki3LGlACVqWAk+2suLmjn3pgwCgYIKoZIzj0EAwIw
EjEQMA4GA1UEAwwHb3JnMS1jYTAeFw0yNjEwMTkwMDUxMDVaFw0zNjEwMTYwMDUx
MDVaMBIxEDAOBgNVBAMMB29yZzEtY2EwWTATBgcqhkjOPQIBBggqhkjOPQMBBwNC
AAQXmpKBlUaB7SuL4KnmJqkxAwL7J7gNmgws0AitqKRI67RbFnD/fOgylKB9hoO6
NccLNHCLyymX9V/v1b0qy0/ro1MwUTAdBgNVHQ4EFgQUvQ1IOT419QMUxYs+eX8K
21eMe7QwHwYDVR0jBBgwFoAUvQ1IOT419QMUxYs+eX8K21eMe7QwDwYDVR0TAQH/
BAUwAwEB/zAKBggqhkjOPQQDAgNIADBFAiAh+QfEFaEKxkb484+HucRvam8X252y
dJg5weWK2hYpCQIhAOwPwPBsToeEtJTK0qxfM9VzCiqEFggh/l0g2M/Z69eQ
-----END CERTIFICATE-----
";

    fn identity() -> (X509Identity, VerifyingKey) {
        let secret = SecretKey::random(&mut OsRng);
        let pem = secret.to_pkcs8_pem(LineEnding::LF).unwrap();
        let id = X509Identity::from_pem("Org1MSP", CERT_PEM.as_bytes().to_vec(), &pem).unwrap();
        let verifying = VerifyingKey::from(&SigningKey::from(&secret));
        (id, verifying)
    }

    #[test]
    fn test_serialize_embeds_msp_and_cert() {
        let (id, _) = identity();
        let decoded = SerializedIdentity::decode(id.serialize().unwrap().as_slice()).unwrap();
        assert_eq!(decoded.mspid, "Org1MSP");
        assert_eq!(decoded.id_bytes, CERT_PEM.as_bytes());
    }

    #[test]
    fn test_signature_verifies_and_is_low_s() {
        let (id, verifying) = identity();
        let message = b"proposal bytes";
        let der = id.sign(message).unwrap();

        let signature = Signature::from_der(&der).unwrap();
        assert!(signature.normalize_s().is_none());
        assert!(verifying.verify(message, &signature).is_ok());
    }

    #[test]
    fn test_rejects_garbage_key() {
        let err =
            X509Identity::from_pem("Org1MSP", CERT_PEM.as_bytes().to_vec(), "nope").unwrap_err();
        assert!(err.to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_rejects_missing_certificate() {
        let err = X509Identity::from_pem("Org1MSP", b"no cert".to_vec(), "nope").unwrap_err();
        assert!(err.to_string().contains("no certificate"));
    }

    #[test]
    fn test_debug_hides_key() {
        let (id, _) = identity();
        let rendered = format!("{:?}", id);
        assert!(rendered.contains("Org1MSP"));
        assert!(!rendered.contains("key"));
    }
}
