//! Shared in-memory nodes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use prost::Message;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use ledger_submit::node::DeliverStream;
use ledger_submit::protos::common::{Block, Envelope, HeaderType, Status};
use ledger_submit::protos::msp::SerializedIdentity;
use ledger_submit::protos::peer::{
    Endorsement, FilteredBlock, FilteredTransaction, ProposalResponse, Response, SignedProposal,
    TxValidationCode,
};
use ledger_submit::tx::{decode_transaction, TransactionSummary};
use ledger_submit::{ContractId, Error, Orderer, Peer, Result, Signer};

pub const CHANNEL: &str = "mychannel";

pub fn contract() -> ContractId {
    ContractId::new("basic", "1.0", ledger_submit::protos::peer::ChaincodeType::Golang)
}

pub fn args(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}

/// Deterministic signer: the "signature" is SHA-256(msp id || message).
pub struct TestSigner {
    msp_id: String,
}

impl TestSigner {
    pub fn new(msp_id: &str) -> Arc<Self> {
        Arc::new(Self {
            msp_id: msp_id.to_string(),
        })
    }
}

impl Signer for TestSigner {
    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: format!("cert-{}", self.msp_id).into_bytes(),
        }
        .encode_to_vec())
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut hasher = Sha256::new();
        hasher.update(self.msp_id.as_bytes());
        hasher.update(message);
        Ok(hasher.finalize().to_vec())
    }
}

/// Committed transactions, as filtered blocks, shared by mock nodes.
pub struct MockLedger {
    blocks: Mutex<Vec<FilteredBlock>>,
    events: broadcast::Sender<FilteredBlock>,
    code: Mutex<TxValidationCode>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            blocks: Mutex::new(Vec::new()),
            events,
            code: Mutex::new(TxValidationCode::Valid),
        })
    }

    /// Validation code given to later commits.
    pub fn set_code(&self, code: TxValidationCode) {
        *self.code.lock().unwrap() = code;
    }

    pub fn commit(&self, tx_id: &str) {
        let code = *self.code.lock().unwrap();
        let mut blocks = self.blocks.lock().unwrap();
        let block = filtered_block(blocks.len() as u64, tx_id, code);
        blocks.push(block.clone());
        let _ = self.events.send(block);
    }

    pub fn committed(&self) -> Vec<String> {
        self.blocks
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.filtered_transactions.iter().map(|t| t.txid.clone()))
            .collect()
    }

    /// Newest block, then every later one.
    pub fn tail(&self) -> DeliverStream<FilteredBlock> {
        let blocks = self.blocks.lock().unwrap();
        let rx = self.events.subscribe();
        let newest: Vec<Result<FilteredBlock>> =
            blocks.last().cloned().map(Ok).into_iter().collect();
        let live = BroadcastStream::new(rx).filter_map(|item| async move { item.ok().map(Ok) });
        stream::iter(newest).chain(live).boxed()
    }
}

pub fn filtered_block(number: u64, tx_id: &str, code: TxValidationCode) -> FilteredBlock {
    FilteredBlock {
        channel_id: CHANNEL.to_string(),
        number,
        filtered_transactions: vec![FilteredTransaction {
            txid: tx_id.to_string(),
            r#type: HeaderType::EndorserTransaction as i32,
            tx_validation_code: code as i32,
        }],
    }
}

/// How a mock peer answers proposals.
#[derive(Clone)]
pub enum Endorse {
    /// Respond with this status and query payload.
    Respond(i32, Vec<u8>),
    Unreachable,
}

/// How a mock peer serves filtered blocks.
#[derive(Clone)]
pub enum Deliver {
    Ledger(Arc<MockLedger>),
    /// Emit these blocks after a delay, then stay open.
    After(Duration, Vec<FilteredBlock>),
    /// Stay open without sending anything.
    Hang,
    /// Refuse to open the stream.
    Unreachable,
    /// Answer with a deliver status and end.
    Status(i32),
}

/// Counts stream drops so tests can observe cancellation.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockPeer {
    address: String,
    endorse: Endorse,
    deliver: Deliver,
    pub proposals: AtomicUsize,
    pub streams_opened: AtomicUsize,
    pub streams_dropped: Arc<AtomicUsize>,
    pub seeks: Mutex<Vec<Envelope>>,
}

impl MockPeer {
    pub fn new(address: &str, endorse: Endorse, deliver: Deliver) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            endorse,
            deliver,
            proposals: AtomicUsize::new(0),
            streams_opened: AtomicUsize::new(0),
            streams_dropped: Arc::new(AtomicUsize::new(0)),
            seeks: Mutex::new(Vec::new()),
        })
    }

    pub fn endorsing(address: &str, ledger: &Arc<MockLedger>) -> Arc<Self> {
        Self::new(
            address,
            Endorse::Respond(200, b"result".to_vec()),
            Deliver::Ledger(Arc::clone(ledger)),
        )
    }

    pub fn listening(address: &str, deliver: Deliver) -> Arc<Self> {
        Self::new(address, Endorse::Unreachable, deliver)
    }

    fn unreachable(&self) -> Error {
        Error::Unreachable {
            address: self.address.clone(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl Peer for MockPeer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn process_proposal(&self, _proposal: &SignedProposal) -> Result<ProposalResponse> {
        self.proposals.fetch_add(1, Ordering::SeqCst);
        match &self.endorse {
            Endorse::Respond(status, payload) => Ok(ProposalResponse {
                response: Some(Response {
                    status: *status,
                    message: format!("status {}", status),
                    payload: payload.clone(),
                }),
                payload: b"simulation".to_vec(),
                endorsement: Some(Endorsement {
                    endorser: self.address.as_bytes().to_vec(),
                    signature: b"endorsed".to_vec(),
                }),
                ..Default::default()
            }),
            Endorse::Unreachable => Err(self.unreachable()),
        }
    }

    async fn deliver(&self, _seek: Envelope) -> Result<DeliverStream<Block>> {
        Err(self.unreachable())
    }

    async fn deliver_filtered(&self, seek: Envelope) -> Result<DeliverStream<FilteredBlock>> {
        self.seeks.lock().unwrap().push(seek);
        let inner: DeliverStream<FilteredBlock> = match &self.deliver {
            Deliver::Unreachable => return Err(self.unreachable()),
            Deliver::Ledger(ledger) => ledger.tail(),
            Deliver::After(delay, blocks) => {
                let delay = *delay;
                let blocks = blocks.clone();
                stream::once(async move {
                    tokio::time::sleep(delay).await;
                    stream::iter(blocks.into_iter().map(Ok))
                })
                .flatten()
                .chain(stream::pending())
                .boxed()
            }
            Deliver::Hang => stream::pending().boxed(),
            Deliver::Status(status) => {
                let error = Error::DeliverStatus {
                    address: self.address.clone(),
                    status: *status,
                };
                stream::iter([Err(error)]).boxed()
            }
        };
        self.streams_opened.fetch_add(1, Ordering::SeqCst);

        let guard = DropCounter(Arc::clone(&self.streams_dropped));
        Ok(inner
            .map(move |item| {
                let _guard = &guard;
                item
            })
            .boxed())
    }
}

/// How a mock orderer answers broadcasts.
#[derive(Clone)]
pub enum Accept {
    Commit(Arc<MockLedger>),
    Reject(Status),
    Unreachable,
}

pub struct MockOrderer {
    address: String,
    accept: Accept,
    pub broadcasts: AtomicUsize,
    pub received: Mutex<Vec<TransactionSummary>>,
}

impl MockOrderer {
    pub fn new(address: &str, accept: Accept) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            accept,
            broadcasts: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Orderer for MockOrderer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn broadcast(&self, envelope: &Envelope) -> Result<()> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        match &self.accept {
            Accept::Commit(ledger) => {
                let summary = decode_transaction(envelope)?;
                ledger.commit(&summary.tx_id);
                self.received.lock().unwrap().push(summary);
                Ok(())
            }
            Accept::Reject(status) => Err(Error::BroadcastRejected {
                address: self.address.clone(),
                status: *status as i32,
                info: "rejected".to_string(),
            }),
            Accept::Unreachable => Err(Error::Unreachable {
                address: self.address.clone(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    async fn deliver(&self, _seek: Envelope) -> Result<DeliverStream<Block>> {
        Ok(stream::empty().boxed())
    }
}
