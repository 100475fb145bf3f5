//! Signing identities.
//!
//! # Data Flow
//! ```text
//! IdentityConfig { msp_id, cert_path, key_path? }
//!     → x509.rs (cert PEM + P-256 key from file or env)
//!     → X509Identity: tx::Signer
//!     → serialize() = SerializedIdentity { mspid, PEM cert }
//!     → sign(bytes) = DER ECDSA-SHA256, low-S
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees `tx::Signer`; any other key store can stand in
//! - Encrypted keystores are left to the embedding application

pub mod x509;

pub use x509::{X509Identity, PRIVATE_KEY_ENV_VAR};
