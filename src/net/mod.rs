//! Network layer: one gRPC connection per remote node.
//!
//! # Data Flow
//! ```text
//! NodeConfig { address, trust anchors, name override }
//!     → tls.rs (collect PEM anchors, build ClientTlsConfig)
//!     → gateway.rs (Endpoint → Channel, dialed on first use, then cached)
//!     → rpc.rs (Endorser / Deliver / AtomicBroadcast stubs over the Channel)
//! ```
//!
//! # Design Decisions
//! - Lazy dial: building a client never touches the network
//! - One cached channel per address; tonic multiplexes calls over it
//! - No retry or backoff at this layer; failures surface as `Unreachable`

pub mod gateway;
pub mod rpc;
pub mod tls;

pub use gateway::{GatewayConnection, DEFAULT_CONNECT_TIMEOUT};
pub use tls::TlsSettings;
