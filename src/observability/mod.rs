//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! submit / node / net produce:
//!     → tracing events (stage transitions, per-node failures)
//!     → metrics.rs (endorsement, broadcast, confirmation counters)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, json or pretty)
//!     → whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary installs the log subscriber
//! - No metrics exporter is bundled; without a recorder the calls are no-ops

pub mod logging;
pub mod metrics;
