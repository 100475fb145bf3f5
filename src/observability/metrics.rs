//! Pipeline metrics.
//!
//! # Metrics
//! - `ledger_endorsements_total` (counter): proposals sent, by peer and outcome
//! - `ledger_broadcasts_total` (counter): envelopes sent, by orderer and outcome
//! - `ledger_confirmations_total` (counter): listener resolutions, by outcome
//! - `ledger_invoke_duration_seconds` (histogram): end-to-end invoke latency

use std::time::Duration;

pub const ENDORSEMENTS_TOTAL: &str = "ledger_endorsements_total";
pub const BROADCASTS_TOTAL: &str = "ledger_broadcasts_total";
pub const CONFIRMATIONS_TOTAL: &str = "ledger_confirmations_total";
pub const INVOKE_DURATION_SECONDS: &str = "ledger_invoke_duration_seconds";

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Record one endorsement attempt.
pub fn record_endorsement(peer: &str, ok: bool) {
    ::metrics::counter!(
        ENDORSEMENTS_TOTAL,
        "peer" => peer.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record one broadcast attempt.
pub fn record_broadcast(orderer: &str, ok: bool) {
    ::metrics::counter!(
        BROADCASTS_TOTAL,
        "orderer" => orderer.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record how a confirmation wait ended: a validation code name,
/// `timeout` or `failed`.
pub fn record_confirmation(result: &'static str) {
    ::metrics::counter!(CONFIRMATIONS_TOTAL, "outcome" => result).increment(1);
}

pub fn record_invoke_duration(elapsed: Duration) {
    ::metrics::histogram!(INVOKE_DURATION_SECONDS).record(elapsed.as_secs_f64());
}
