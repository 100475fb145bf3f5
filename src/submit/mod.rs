//! Submission coordinator and confirmation listener.
//!
//! # Data Flow
//! ```text
//! Client::invoke(args)
//!     → tx::build_proposal + sign_proposal        (Proposed)
//!     → Peer::send_proposal on every peer at once  (Endorsed, ≥1 success)
//!     → first success must be exactly 200
//!     → tx::build_envelope from all successes
//!     → Orderer::broadcast, first to accept wins   (Broadcast)
//!     → TxListener::wait, first peer to report wins (Confirmed)
//!     → TxValidationCode
//!
//! Client::query(args)
//!     → proposal → all peers → payload of first exact-200 response
//! ```
//!
//! # Design Decisions
//! - Every stage failure is terminal for the call; callers retry with a new
//!   call and therefore a new transaction id
//! - Per-node errors are kept in order and reported together once every
//!   alternative is exhausted
//! - Endorsement fans out concurrently; orderers are a fallback list

pub mod client;
pub mod listener;

pub use client::{Client, ClientBuilder, TxOutcome};
pub use listener::{TxListener, DEFAULT_EVENT_TIMEOUT};
