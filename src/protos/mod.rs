//! Ledger wire protocol messages.
//!
//! # Data Flow
//! ```text
//! tx::proposal  → peer::Proposal / peer::SignedProposal → protos.Endorser
//! tx::envelope  → common::Envelope                      → orderer.AtomicBroadcast
//! tx::seek      → orderer::SeekInfo in common::Envelope → protos.Deliver
//! protos.Deliver → peer::DeliverResponse (Block | FilteredBlock | Status)
//! ```
//!
//! # Design Decisions
//! - Field numbers and package names follow the ledger's published protobuf
//!   schema so that nodes decode these messages unchanged
//! - Only the messages the client touches are declared
//! - Messages nest inside each other as serialized bytes exactly where the
//!   schema does (headers, payloads, extensions)

pub mod common;
pub mod msp;
pub mod orderer;
pub mod peer;
