//! Node clients: validators (peers) and sequencers (orderers).
//!
//! # Data Flow
//! ```text
//! SignedProposal → Peer::send_proposal → ProposalResponse (status in [200, 400))
//! Envelope       → Orderer::broadcast  → SUCCESS ack on a reused stream
//! seek Envelope  → Peer::deliver / deliver_filtered / Orderer::deliver
//!                → DeliverStream<T>
//!                → deliver.rs task → result channel / error channel
//! ```
//!
//! # Design Decisions
//! - `Peer` and `Orderer` are traits so the coordinator can run against
//!   in-memory nodes
//! - Each deliver call opens its own stream; the broadcast stream is cached
//!   per orderer and dropped after any failure
//! - A status message ends a deliver stream and is reported as its error

pub mod deliver;
pub mod orderer;
pub mod peer;

pub use deliver::{
    spawn_subscription, subscribe_blocks, subscribe_filtered, DeliverStream, Subscription,
};
pub use orderer::{Orderer, OrdererClient};
pub use peer::{Peer, PeerClient};
