//! Transaction submission and confirmation for a permissioned ledger.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──invoke/query──▶ submit::Client
//!                               │
//!                  ┌────────────┼─────────────────────┐
//!                  ▼            ▼                     ▼
//!              tx::proposal  node::Peer ×N      node::Orderer ×M
//!              tx::envelope  (endorse, fan-out)  (broadcast, fallback)
//!                               │
//!                               ▼
//!                        submit::TxListener
//!                  one deliver task per peer, first match wins
//!                               │
//!                               ▼
//!                        TxValidationCode
//!
//!   net::GatewayConnection: one lazily dialed gRPC channel per node
//!   lifecycle::CancelSignal: stops per-peer tasks when the race ends
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod net;
pub mod node;
pub mod observability;
pub mod protos;
pub mod submit;
pub mod tx;

pub use config::schema::SubmitConfig;
pub use error::{Error, ErrorList, Result};
pub use identity::X509Identity;
pub use node::{Orderer, OrdererClient, Peer, PeerClient};
pub use protos::peer::TxValidationCode;
pub use submit::{Client, TxListener, TxOutcome};
pub use tx::{ContractId, Signer};
