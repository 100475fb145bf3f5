//! Signing capability consumed by the pipeline.

use std::sync::Arc;

use crate::error::{Error, Result};

/// Identity that can embed itself as a creator and sign bytes.
///
/// The pipeline never inspects the algorithm behind `sign`; any wallet or
/// key store able to provide these two operations can drive a submission.
pub trait Signer: Send + Sync {
    /// Serialized identity placed in every `creator` field.
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Detached signature over `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

impl<S: Signer + ?Sized> Signer for Arc<S> {
    fn serialize(&self) -> Result<Vec<u8>> {
        (**self).serialize()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        (**self).sign(message)
    }
}

/// Map any displayable signer failure into the crate error.
pub fn signer_error(e: impl std::fmt::Display) -> Error {
    Error::Signer(e.to_string())
}
