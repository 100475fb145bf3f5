//! Transaction artifacts: proposals, envelopes and seek requests.
//!
//! # Data Flow
//! ```text
//! Signer + channel + contract + args
//!     → proposal.rs  build_proposal → (Proposal, tx_id)
//!     → proposal.rs  sign_proposal  → SignedProposal (sent to every peer)
//!
//! Proposal + endorsements + Signer
//!     → envelope.rs  build_envelope → Envelope (sent to an orderer)
//!
//! channel + SeekInfo + Signer
//!     → seek.rs      seek_envelope  → Envelope (opens a deliver stream)
//! ```
//!
//! # Design Decisions
//! - Pure functions: nothing here performs I/O
//! - The signer is a two-method capability; algorithms stay behind it
//! - tx_id = hex(SHA-256(nonce || creator)), 24-byte nonce per proposal

pub mod envelope;
pub mod proposal;
pub mod seek;
pub mod signer;

pub use envelope::{build_envelope, decode_transaction, TransactionSummary};
pub use proposal::{build_proposal, compute_tx_id, sign_proposal, ContractId};
pub use seek::seek_envelope;
pub use signer::Signer;

#[cfg(test)]
pub(crate) mod testing {
    use prost::Message;
    use sha2::{Digest, Sha256};

    use super::Signer;
    use crate::error::Result;
    use crate::protos::msp::SerializedIdentity;

    /// Deterministic signer: the "signature" is SHA-256(msp id || message).
    pub struct StaticSigner {
        msp_id: String,
    }

    impl StaticSigner {
        pub fn new(msp_id: &str) -> Self {
            Self {
                msp_id: msp_id.to_string(),
            }
        }
    }

    impl Signer for StaticSigner {
        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(SerializedIdentity {
                mspid: self.msp_id.clone(),
                id_bytes: format!("cert-{}", self.msp_id).into_bytes(),
            }
            .encode_to_vec())
        }

        fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
            let mut hasher = Sha256::new();
            hasher.update(self.msp_id.as_bytes());
            hasher.update(message);
            Ok(hasher.finalize().to_vec())
        }
    }
}
