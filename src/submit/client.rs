//! Submission coordinator: endorse, order, confirm.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use super::listener::{TxListener, DEFAULT_EVENT_TIMEOUT};
use crate::config::schema::{NodeConfig, SubmitConfig};
use crate::error::{Error, ErrorList, Result};
use crate::net::TlsSettings;
use crate::node::{Orderer, OrdererClient, Peer, PeerClient};
use crate::observability::metrics;
use crate::protos::common::Envelope;
use crate::protos::peer::{ChaincodeType, ProposalResponse, SignedProposal, TxValidationCode};
use crate::tx::{build_envelope, build_proposal, sign_proposal, ContractId, Signer};

/// Exact status a response must carry to be authoritative.
const STATUS_OK: i32 = 200;

/// Result of a confirmed invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_id: String,
    pub code: TxValidationCode,
}

impl TxOutcome {
    pub fn is_valid(&self) -> bool {
        self.code == TxValidationCode::Valid
    }
}

/// Submits transactions to a fixed set of peers and orderers.
///
/// Each `invoke` runs Proposed → Endorsed → Broadcast → Confirmed and stops
/// at the first stage that fails. Nothing is retried; a new call uses a new
/// nonce and therefore a new transaction id.
pub struct Client {
    signer: Arc<dyn Signer>,
    peers: Vec<Arc<dyn Peer>>,
    orderers: Vec<Arc<dyn Orderer>>,
    channel: String,
    contract: ContractId,
    event_timeout: Duration,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client with gRPC peers and orderers from validated config.
    ///
    /// No connection is made until the first call.
    pub fn from_config(config: &SubmitConfig, signer: Arc<dyn Signer>) -> Result<Self> {
        let connect_timeout = config.timeouts.connect();
        let mut builder = Self::builder()
            .signer(signer)
            .channel(config.channel.clone())
            .contract(ContractId::new(
                config.contract.name.clone(),
                config.contract.version.clone(),
                ChaincodeType::from_name(&config.contract.kind),
            ))
            .event_timeout(config.timeouts.event());

        for node in &config.peers {
            let tls = node_tls(node)?;
            builder = builder.peer(Arc::new(PeerClient::connect_lazy(
                node.address.clone(),
                tls,
                connect_timeout,
            )));
        }
        for node in &config.orderers {
            let tls = node_tls(node)?;
            builder = builder.orderer(Arc::new(OrdererClient::connect_lazy(
                node.address.clone(),
                tls,
                connect_timeout,
            )));
        }
        builder.build()
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Submit a transaction and return its validation code.
    pub async fn invoke(&self, args: &[Vec<u8>]) -> Result<TxValidationCode> {
        Ok(self.submit(args, HashMap::new()).await?.code)
    }

    /// Submit a transaction with private transient data.
    pub async fn submit(
        &self,
        args: &[Vec<u8>],
        transient: HashMap<String, Vec<u8>>,
    ) -> Result<TxOutcome> {
        let started = Instant::now();
        let result = self.run_invoke(args, transient).await;
        metrics::record_invoke_duration(started.elapsed());
        result
    }

    async fn run_invoke(
        &self,
        args: &[Vec<u8>],
        transient: HashMap<String, Vec<u8>>,
    ) -> Result<TxOutcome> {
        let (proposal, tx_id) =
            build_proposal(self.signer.as_ref(), &self.channel, &self.contract, transient, args)?;
        let signed = sign_proposal(self.signer.as_ref(), &proposal)?;

        let responses = self.endorse(&signed).await?;
        require_ok(&tx_id, &responses[0])?;
        tracing::info!(tx_id = %tx_id, endorsements = responses.len(), "proposal endorsed");

        let envelope = build_envelope(&proposal, self.signer.as_ref(), &responses)?;
        self.broadcast(&tx_id, &envelope).await?;

        let tx = self.listener(&tx_id).wait().await?;
        let code = tx.tx_validation_code();
        Ok(TxOutcome { tx_id, code })
    }

    /// Evaluate a transaction on the peers without ordering it.
    ///
    /// Returns the payload of the first peer, in configured order, whose
    /// response status is exactly 200.
    pub async fn query(&self, args: &[Vec<u8>]) -> Result<Vec<u8>> {
        let (proposal, tx_id) = build_proposal(
            self.signer.as_ref(),
            &self.channel,
            &self.contract,
            HashMap::new(),
            args,
        )?;
        let signed = sign_proposal(self.signer.as_ref(), &proposal)?;

        let responses = self.endorse(&signed).await?;
        let Some(response) = responses.iter().find(|r| r.status() == STATUS_OK) else {
            let first = &responses[0];
            return Err(Error::ProposalStatus {
                tx_id,
                status: first.status(),
                message: first.message().to_string(),
            });
        };
        tracing::debug!(tx_id = %tx_id, "query answered");
        Ok(response
            .response
            .as_ref()
            .map(|r| r.payload.clone())
            .unwrap_or_default())
    }

    /// Listener for `tx_id` over this client's peers.
    pub fn listener(&self, tx_id: &str) -> TxListener {
        TxListener::new(
            self.channel.clone(),
            tx_id,
            self.peers.clone(),
            Arc::clone(&self.signer),
        )
        .with_timeout(self.event_timeout)
    }

    /// Send the proposal to every peer at once.
    ///
    /// Successful responses come back in configured peer order; an error is
    /// returned only when no peer succeeded.
    async fn endorse(&self, signed: &SignedProposal) -> Result<Vec<ProposalResponse>> {
        let attempts = join_all(self.peers.iter().map(|peer| async move {
            let result = peer.send_proposal(signed).await;
            metrics::record_endorsement(peer.address(), result.is_ok());
            if let Err(e) = &result {
                tracing::warn!(peer = %peer.address(), error = %e, "endorsement failed");
            }
            result
        }))
        .await;

        let mut responses = Vec::with_capacity(attempts.len());
        let mut errors = ErrorList::new();
        for attempt in attempts {
            match attempt {
                Ok(response) => responses.push(response),
                Err(e) => errors.push(e),
            }
        }

        if responses.is_empty() {
            return Err(Error::EndorsementFailed(errors));
        }
        Ok(responses)
    }

    /// Try orderers in configured order until one accepts.
    async fn broadcast(&self, tx_id: &str, envelope: &Envelope) -> Result<()> {
        let mut errors = ErrorList::new();
        for (i, orderer) in self.orderers.iter().enumerate() {
            match orderer.broadcast(envelope).await {
                Ok(()) => {
                    metrics::record_broadcast(orderer.address(), true);
                    tracing::info!(
                        tx_id = %tx_id,
                        orderer = %orderer.address(),
                        "envelope accepted"
                    );
                    return Ok(());
                }
                Err(e) => {
                    metrics::record_broadcast(orderer.address(), false);
                    tracing::warn!(
                        tx_id = %tx_id,
                        orderer_idx = i,
                        orderer = %orderer.address(),
                        error = %e,
                        "broadcast failed, trying next orderer"
                    );
                    errors.push(e);
                }
            }
        }
        Err(Error::BroadcastFailed {
            tx_id: tx_id.to_string(),
            errors,
        })
    }
}

fn require_ok(tx_id: &str, response: &ProposalResponse) -> Result<()> {
    if response.status() != STATUS_OK {
        return Err(Error::ProposalStatus {
            tx_id: tx_id.to_string(),
            status: response.status(),
            message: response.message().to_string(),
        });
    }
    Ok(())
}

fn node_tls(node: &NodeConfig) -> Result<Option<TlsSettings>> {
    TlsSettings::from_sources(
        node.tls_ca_path.as_deref().map(Path::new),
        node.tls_ca_pem.as_deref(),
        node.server_name_override.clone(),
    )
}

/// Assembles a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    signer: Option<Arc<dyn Signer>>,
    peers: Vec<Arc<dyn Peer>>,
    orderers: Vec<Arc<dyn Orderer>>,
    channel: Option<String>,
    contract: Option<ContractId>,
    event_timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn peer(mut self, peer: Arc<dyn Peer>) -> Self {
        self.peers.push(peer);
        self
    }

    pub fn orderer(mut self, orderer: Arc<dyn Orderer>) -> Self {
        self.orderers.push(orderer);
        self
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn contract(mut self, contract: ContractId) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client> {
        let signer = self
            .signer
            .ok_or_else(|| Error::InvalidConfig("a signer is required".into()))?;
        if self.peers.is_empty() {
            return Err(Error::InvalidConfig("at least one peer is required".into()));
        }
        if self.orderers.is_empty() {
            return Err(Error::InvalidConfig("at least one orderer is required".into()));
        }
        let channel = self
            .channel
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::InvalidConfig("a channel is required".into()))?;
        let contract = self
            .contract
            .filter(|c| !c.name.is_empty())
            .ok_or_else(|| Error::InvalidConfig("a contract is required".into()))?;

        Ok(Client {
            signer,
            peers: self.peers,
            orderers: self.orderers,
            channel,
            contract,
            event_timeout: self.event_timeout.unwrap_or(DEFAULT_EVENT_TIMEOUT),
        })
    }
}
