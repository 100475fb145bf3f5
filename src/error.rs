//! Error definitions for the submission pipeline.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::protos::common::Status;

/// Errors that can occur while endorsing, ordering or confirming a transaction.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection to a node could not be established.
    #[error("failed to connect to {address}: {reason}")]
    Unreachable { address: String, reason: String },

    /// An RPC to a node failed at the transport or gRPC layer.
    #[error("rpc to {address} failed: {source}")]
    Transport {
        address: String,
        #[source]
        source: tonic::Status,
    },

    /// A peer answered the proposal with a status outside [200, 400).
    #[error("proposal rejected by {address} with status {status}: {message}")]
    EndorsementRejected {
        address: String,
        status: i32,
        message: String,
    },

    /// No peer returned a usable endorsement.
    #[error("endorsement failed on all peers: {0}")]
    EndorsementFailed(ErrorList),

    /// The authoritative endorsement did not carry the exact success status.
    #[error("proposal {tx_id} returned status {status}: {message}")]
    ProposalStatus {
        tx_id: String,
        status: i32,
        message: String,
    },

    /// An orderer acknowledged the envelope with a non-success status.
    #[error("broadcast to {address} returned status {}: {info}", status_name(.status))]
    BroadcastRejected {
        address: String,
        status: i32,
        info: String,
    },

    /// No orderer accepted the envelope.
    #[error("broadcast of txid {tx_id} failed on all orderers: {errors}")]
    BroadcastFailed { tx_id: String, errors: ErrorList },

    /// A deliver stream ended with a status message.
    #[error("deliver from {address} completed with status {}", status_name(.status))]
    DeliverStatus { address: String, status: i32 },

    /// A node sent a message of the wrong shape.
    #[error("unexpected {kind} response from {address}")]
    UnexpectedResponse { address: String, kind: &'static str },

    /// A stream ended before the expected message arrived.
    #[error("stream from {address} closed")]
    StreamClosed { address: String },

    /// A subscription was torn down by its owner.
    #[error("subscription to {address} cancelled")]
    Cancelled { address: String },

    /// No peer reported the transaction before the deadline.
    #[error("timed out after {timeout:?} waiting for txid {tx_id} on all peers: {errors}")]
    ListenTimeout {
        tx_id: String,
        timeout: Duration,
        errors: ErrorList,
    },

    /// Every peer subscription failed before the transaction was seen.
    #[error("failed to receive txid {tx_id} on all peers: {errors}")]
    ListenFailedAllPeers { tx_id: String, errors: ErrorList },

    /// An envelope was requested without any endorsement.
    #[error("at least one proposal response is required")]
    NoEndorsements,

    /// Endorsers disagree on the simulated result.
    #[error("proposal response payloads do not match")]
    PayloadMismatch,

    /// The envelope signer is not the proposal creator.
    #[error("signer must be the same as the one referenced in the proposal header")]
    CreatorMismatch,

    /// A protocol message could not be encoded or decoded.
    #[error("marshal error: {0}")]
    Marshal(String),

    /// The signing identity failed to serialize or sign.
    #[error("signer error: {0}")]
    Signer(String),

    /// TLS material could not be used.
    #[error("tls error: {0}")]
    Tls(String),

    /// The client was assembled with missing or invalid settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Marshal(e.to_string())
    }
}

fn status_name(code: &i32) -> String {
    Status::describe(*code)
}

/// Result type for submission operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ordered collection of per-node failures.
#[derive(Debug, Default)]
pub struct ErrorList(pub Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }
}

impl From<Vec<Error>> for ErrorList {
    fn from(errors: Vec<Error>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no errors recorded");
        }
        write!(f, "multiple errors: ")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "[{}] {}", i, err)?;
        }
        Ok(())
    }
}
