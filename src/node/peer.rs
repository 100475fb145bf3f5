//! Validator (peer) client.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;

use super::deliver::DeliverStream;
use crate::error::{Error, Result};
use crate::net::rpc::{DeliverClient, EndorserClient};
use crate::net::{GatewayConnection, TlsSettings};
use crate::protos::common::{Block, Envelope};
use crate::protos::peer::{
    deliver_response, DeliverResponse, FilteredBlock, ProposalResponse, SignedProposal,
};

/// A node that endorses proposals and serves block events.
#[async_trait]
pub trait Peer: Send + Sync {
    fn address(&self) -> &str;

    /// Raw endorsement RPC; the response status is not inspected.
    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse>;

    /// Endorse `proposal`, accepting only statuses in [200, 400).
    async fn send_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse> {
        let response = self.process_proposal(proposal).await?;
        let status = response.status();
        if !(200..400).contains(&status) {
            return Err(Error::EndorsementRejected {
                address: self.address().to_string(),
                status,
                message: response.message().to_string(),
            });
        }
        Ok(response)
    }

    /// Full blocks selected by the seek envelope.
    async fn deliver(&self, seek: Envelope) -> Result<DeliverStream<Block>>;

    /// Filtered blocks selected by the seek envelope.
    async fn deliver_filtered(&self, seek: Envelope) -> Result<DeliverStream<FilteredBlock>>;
}

/// gRPC client for one peer over a cached connection.
#[derive(Debug)]
pub struct PeerClient {
    gateway: GatewayConnection,
}

impl PeerClient {
    pub fn new(gateway: GatewayConnection) -> Self {
        Self { gateway }
    }

    /// Client for `address`, dialed lazily on first call.
    pub fn connect_lazy(
        address: impl Into<String>,
        tls: Option<TlsSettings>,
        connect_timeout: Duration,
    ) -> Self {
        Self::new(GatewayConnection::new(address, tls).with_connect_timeout(connect_timeout))
    }

    pub fn gateway(&self) -> &GatewayConnection {
        &self.gateway
    }

    fn transport(&self, source: tonic::Status) -> Error {
        Error::Transport {
            address: self.gateway.address().to_string(),
            source,
        }
    }
}

/// Seek request that stays open after its single message.
///
/// The deliver service reads the seek, then streams until the range is
/// exhausted; ending the request side early is not needed.
fn seek_request(seek: Envelope) -> impl futures_util::Stream<Item = Envelope> + Send + 'static {
    stream::iter([seek]).chain(stream::pending())
}

fn block_event(
    address: &str,
    item: std::result::Result<DeliverResponse, tonic::Status>,
) -> Result<Block> {
    match classify(address, item)? {
        deliver_response::Type::Block(block) => Ok(block),
        _ => Err(Error::UnexpectedResponse {
            address: address.to_string(),
            kind: "filtered block",
        }),
    }
}

fn filtered_event(
    address: &str,
    item: std::result::Result<DeliverResponse, tonic::Status>,
) -> Result<FilteredBlock> {
    match classify(address, item)? {
        deliver_response::Type::FilteredBlock(block) => Ok(block),
        _ => Err(Error::UnexpectedResponse {
            address: address.to_string(),
            kind: "block",
        }),
    }
}

/// Transport errors and status messages end the stream.
fn classify(
    address: &str,
    item: std::result::Result<DeliverResponse, tonic::Status>,
) -> Result<deliver_response::Type> {
    let response = item.map_err(|source| Error::Transport {
        address: address.to_string(),
        source,
    })?;
    match response.r#type {
        Some(deliver_response::Type::Status(status)) => Err(Error::DeliverStatus {
            address: address.to_string(),
            status,
        }),
        Some(event) => Ok(event),
        None => Err(Error::UnexpectedResponse {
            address: address.to_string(),
            kind: "empty",
        }),
    }
}

#[async_trait]
impl Peer for PeerClient {
    fn address(&self) -> &str {
        self.gateway.address()
    }

    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse> {
        let channel = self.gateway.dial().await?;
        let response = EndorserClient::new(channel)
            .process_proposal(proposal.clone())
            .await
            .map_err(|e| self.transport(e))?;
        Ok(response.into_inner())
    }

    async fn deliver(&self, seek: Envelope) -> Result<DeliverStream<Block>> {
        let channel = self.gateway.dial().await?;
        let responses = DeliverClient::new(channel)
            .deliver(seek_request(seek))
            .await
            .map_err(|e| self.transport(e))?
            .into_inner();
        let address = self.address().to_string();
        Ok(responses.map(move |item| block_event(&address, item)).boxed())
    }

    async fn deliver_filtered(&self, seek: Envelope) -> Result<DeliverStream<FilteredBlock>> {
        let channel = self.gateway.dial().await?;
        let responses = DeliverClient::new(channel)
            .deliver_filtered(seek_request(seek))
            .await
            .map_err(|e| self.transport(e))?
            .into_inner();
        let address = self.address().to_string();
        Ok(responses.map(move |item| filtered_event(&address, item)).boxed())
    }
}
