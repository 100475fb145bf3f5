//! Lifecycle management for background subscription tasks.
//!
//! # Data Flow
//! ```text
//! Listener starts
//!     → CancelSignal::new()
//!     → one subscribe() per peer task
//!
//! Listener resolves (match, all-failed, timeout) or is dropped
//!     → trigger() → every per-peer receive loop exits
//!     → deliver streams dropped → RPCs cancelled on the wire
//! ```
//!
//! # Design Decisions
//! - Broadcast channel rather than a flag: tasks blocked in a receive wake up
//! - Drop guard cancels on early return and on future abandonment

pub mod cancel;

pub use cancel::{CancelOnDrop, CancelSignal};
