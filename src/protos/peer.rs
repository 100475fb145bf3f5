//! `protos` package: proposals, endorsements, transactions and deliver events.

use std::collections::HashMap;

use super::common;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedProposal {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Proposal {
    /// Serialized `common::Header`.
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// Serialized `ChaincodeProposalPayload`.
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub extension: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeHeaderExtension {
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeProposalPayload {
    /// Serialized `ChaincodeInvocationSpec`.
    #[prost(bytes = "vec", tag = "1")]
    pub input: Vec<u8>,
    /// Private inputs; never copied into the transaction.
    #[prost(map = "string, bytes", tag = "2")]
    pub transient_map: HashMap<String, Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
    #[prost(map = "string, bytes", tag = "2")]
    pub decorations: HashMap<String, Vec<u8>>,
    #[prost(bool, tag = "3")]
    pub is_init: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChaincodeType {
    Undefined = 0,
    Golang = 1,
    Node = 2,
    Car = 3,
    Java = 4,
}

impl ChaincodeType {
    /// Resolve a contract runtime by name, case-insensitively.
    ///
    /// Unknown names map to `Undefined`, which lets the peer pick the
    /// runtime recorded for the installed contract.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GOLANG" => ChaincodeType::Golang,
            "NODE" => ChaincodeType::Node,
            "CAR" => ChaincodeType::Car,
            "JAVA" => ChaincodeType::Java,
            _ => ChaincodeType::Undefined,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeSpec {
    #[prost(enumeration = "ChaincodeType", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposalResponse {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "4")]
    pub response: Option<Response>,
    /// Serialized `ProposalResponsePayload`; must match across endorsers.
    #[prost(bytes = "vec", tag = "5")]
    pub payload: Vec<u8>,
    #[prost(message, optional, tag = "6")]
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    /// Status reported by the contract, 0 when the response is missing.
    pub fn status(&self) -> i32 {
        self.response.as_ref().map(|r| r.status).unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.response.as_ref().map(|r| r.message.as_str()).unwrap_or_default()
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposalResponsePayload {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub extension: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endorsement {
    /// Serialized identity of the endorsing peer.
    #[prost(bytes = "vec", tag = "1")]
    pub endorser: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(message, repeated, tag = "1")]
    pub actions: Vec<TransactionAction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionAction {
    /// Serialized `common::SignatureHeader` of the proposal.
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// Serialized `ChaincodeActionPayload`.
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeActionPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub chaincode_proposal_payload: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub action: Option<ChaincodeEndorsedAction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeEndorsedAction {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_response_payload: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub endorsements: Vec<Endorsement>,
}

/// Final outcome the committing peers attach to a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TxValidationCode {
    Valid = 0,
    NilEnvelope = 1,
    BadPayload = 2,
    BadCommonHeader = 3,
    BadCreatorSignature = 4,
    InvalidEndorserTransaction = 5,
    InvalidConfigTransaction = 6,
    UnsupportedTxPayload = 7,
    BadProposalTxid = 8,
    DuplicateTxid = 9,
    EndorsementPolicyFailure = 10,
    MvccReadConflict = 11,
    PhantomReadConflict = 12,
    UnknownTxType = 13,
    TargetChainNotFound = 14,
    MarshalTxError = 15,
    NilTxaction = 16,
    ExpiredChaincode = 17,
    ChaincodeVersionConflict = 18,
    BadHeaderExtension = 19,
    BadChannelHeader = 20,
    BadResponsePayload = 21,
    BadRwset = 22,
    IllegalWriteset = 23,
    InvalidWriteset = 24,
    InvalidChaincode = 25,
    NotValidated = 254,
    InvalidOtherReason = 255,
}

impl TxValidationCode {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            TxValidationCode::Valid => "VALID",
            TxValidationCode::NilEnvelope => "NIL_ENVELOPE",
            TxValidationCode::BadPayload => "BAD_PAYLOAD",
            TxValidationCode::BadCommonHeader => "BAD_COMMON_HEADER",
            TxValidationCode::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            TxValidationCode::InvalidEndorserTransaction => "INVALID_ENDORSER_TRANSACTION",
            TxValidationCode::InvalidConfigTransaction => "INVALID_CONFIG_TRANSACTION",
            TxValidationCode::UnsupportedTxPayload => "UNSUPPORTED_TX_PAYLOAD",
            TxValidationCode::BadProposalTxid => "BAD_PROPOSAL_TXID",
            TxValidationCode::DuplicateTxid => "DUPLICATE_TXID",
            TxValidationCode::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            TxValidationCode::MvccReadConflict => "MVCC_READ_CONFLICT",
            TxValidationCode::PhantomReadConflict => "PHANTOM_READ_CONFLICT",
            TxValidationCode::UnknownTxType => "UNKNOWN_TX_TYPE",
            TxValidationCode::TargetChainNotFound => "TARGET_CHAIN_NOT_FOUND",
            TxValidationCode::MarshalTxError => "MARSHAL_TX_ERROR",
            TxValidationCode::NilTxaction => "NIL_TXACTION",
            TxValidationCode::ExpiredChaincode => "EXPIRED_CHAINCODE",
            TxValidationCode::ChaincodeVersionConflict => "CHAINCODE_VERSION_CONFLICT",
            TxValidationCode::BadHeaderExtension => "BAD_HEADER_EXTENSION",
            TxValidationCode::BadChannelHeader => "BAD_CHANNEL_HEADER",
            TxValidationCode::BadResponsePayload => "BAD_RESPONSE_PAYLOAD",
            TxValidationCode::BadRwset => "BAD_RWSET",
            TxValidationCode::IllegalWriteset => "ILLEGAL_WRITESET",
            TxValidationCode::InvalidWriteset => "INVALID_WRITESET",
            TxValidationCode::InvalidChaincode => "INVALID_CHAINCODE",
            TxValidationCode::NotValidated => "NOT_VALIDATED",
            TxValidationCode::InvalidOtherReason => "INVALID_OTHER_REASON",
        }
    }
}

impl std::fmt::Display for TxValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str_name())
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilteredBlock {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(uint64, tag = "2")]
    pub number: u64,
    #[prost(message, repeated, tag = "4")]
    pub filtered_transactions: Vec<FilteredTransaction>,
}

/// Per-transaction notification without the block payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilteredTransaction {
    #[prost(string, tag = "1")]
    pub txid: String,
    #[prost(enumeration = "common::HeaderType", tag = "2")]
    pub r#type: i32,
    #[prost(enumeration = "TxValidationCode", tag = "3")]
    pub tx_validation_code: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeliverResponse {
    #[prost(oneof = "deliver_response::Type", tags = "1, 2, 3")]
    pub r#type: Option<deliver_response::Type>,
}

pub mod deliver_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(enumeration = "super::common::Status", tag = "1")]
        Status(i32),
        #[prost(message, tag = "2")]
        Block(super::common::Block),
        #[prost(message, tag = "3")]
        FilteredBlock(super::FilteredBlock),
    }
}
