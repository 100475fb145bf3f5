//! Confirmation listener: races filtered-block subscriptions for one txid.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{Error, ErrorList, Result};
use crate::lifecycle::{CancelOnDrop, CancelSignal};
use crate::node::{spawn_subscription, Peer};
use crate::observability::metrics;
use crate::protos::orderer::SeekInfo;
use crate::protos::peer::{FilteredBlock, FilteredTransaction};
use crate::tx::{seek_envelope, Signer};

/// Default bound on waiting for a commit event.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for the commit event of one transaction on a set of peers.
///
/// Every peer gets its own task reading a tail subscription from the newest
/// block. The first peer to report the transaction decides the outcome;
/// a failing peer only removes itself from the race. When the wait ends,
/// for any reason, all remaining subscriptions are cancelled.
pub struct TxListener {
    channel: String,
    tx_id: String,
    peers: Vec<Arc<dyn Peer>>,
    signer: Arc<dyn Signer>,
    timeout: Duration,
}

impl TxListener {
    pub fn new(
        channel: impl Into<String>,
        tx_id: impl Into<String>,
        peers: Vec<Arc<dyn Peer>>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            channel: channel.into(),
            tx_id: tx_id.into(),
            peers,
            signer,
            timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Block until a peer reports the transaction, every peer fails, or the
    /// timeout elapses.
    pub async fn wait(&self) -> Result<FilteredTransaction> {
        let peer_count = self.peers.len();
        if peer_count == 0 {
            return Err(Error::ListenFailedAllPeers {
                tx_id: self.tx_id.clone(),
                errors: ErrorList::new(),
            });
        }

        let seek = seek_envelope(&self.channel, &SeekInfo::tail(), Some(self.signer.as_ref()))?;
        let (results_tx, mut results) = mpsc::channel(peer_count);
        let (errors_tx, mut errors) = mpsc::channel(peer_count);
        let cancel = CancelOnDrop(CancelSignal::new());

        for peer in &self.peers {
            let peer = Arc::clone(peer);
            let seek = seek.clone();
            let target = self.tx_id.clone();
            spawn_subscription(
                peer.address().to_string(),
                async move { peer.deliver_filtered(seek).await },
                move |block: FilteredBlock| find_tx(&target, block),
                results_tx.clone(),
                errors_tx.clone(),
                cancel.0.subscribe(),
            );
        }
        drop(results_tx);
        drop(errors_tx);

        tracing::debug!(
            tx_id = %self.tx_id,
            peers = peer_count,
            timeout_ms = self.timeout.as_millis() as u64,
            "waiting for commit event"
        );

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);
        let mut failures = ErrorList::new();

        loop {
            tokio::select! {
                biased;

                Some(tx) = results.recv() => {
                    let code = tx.tx_validation_code();
                    tracing::info!(tx_id = %self.tx_id, code = %code, "commit event received");
                    metrics::record_confirmation(code.as_str_name());
                    return Ok(tx);
                }
                Some(err) = errors.recv() => {
                    tracing::warn!(tx_id = %self.tx_id, error = %err, "peer subscription failed");
                    failures.push(err);
                    if failures.len() == peer_count {
                        metrics::record_confirmation("failed");
                        return Err(Error::ListenFailedAllPeers {
                            tx_id: self.tx_id.clone(),
                            errors: failures,
                        });
                    }
                }
                _ = &mut deadline => {
                    tracing::warn!(
                        tx_id = %self.tx_id,
                        failed_peers = failures.len(),
                        "timed out waiting for commit event"
                    );
                    metrics::record_confirmation("timeout");
                    return Err(Error::ListenTimeout {
                        tx_id: self.tx_id.clone(),
                        timeout: self.timeout,
                        errors: failures,
                    });
                }
            }
        }
    }
}

/// Stop at the first transaction in `block` with id `target`.
fn find_tx(
    target: &str,
    block: FilteredBlock,
) -> ControlFlow<FilteredTransaction, Option<FilteredTransaction>> {
    match block
        .filtered_transactions
        .into_iter()
        .find(|tx| tx.txid == target)
    {
        Some(tx) => ControlFlow::Break(tx),
        None => ControlFlow::Continue(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protos::peer::TxValidationCode;

    fn filtered(ids: &[&str]) -> FilteredBlock {
        FilteredBlock {
            channel_id: "ch".into(),
            number: 1,
            filtered_transactions: ids
                .iter()
                .map(|id| FilteredTransaction {
                    txid: id.to_string(),
                    tx_validation_code: TxValidationCode::Valid as i32,
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_find_tx_matches_exact_id() {
        match find_tx("b", filtered(&["a", "b", "c"])) {
            ControlFlow::Break(tx) => assert_eq!(tx.txid, "b"),
            ControlFlow::Continue(_) => panic!("expected a match"),
        }
    }

    #[test]
    fn test_find_tx_skips_other_blocks() {
        assert!(matches!(
            find_tx("z", filtered(&["a", "b"])),
            ControlFlow::Continue(None)
        ));
        assert!(matches!(find_tx("z", filtered(&[])), ControlFlow::Continue(None)));
    }
}
