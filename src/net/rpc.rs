//! gRPC stubs for the endorser, deliver and atomic broadcast services.
//!
//! Written in the shape `tonic-build` emits, against the hand-maintained
//! messages in `crate::protos`.

use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{IntoRequest, IntoStreamingRequest, Response, Status};

use crate::protos::common::Envelope;
use crate::protos::orderer::{self, BroadcastResponse};
use crate::protos::peer::{self, ProposalResponse, SignedProposal};

async fn ready(inner: &mut tonic::client::Grpc<Channel>) -> Result<(), Status> {
    inner
        .ready()
        .await
        .map_err(|e| Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e)))
}

/// Client for `protos.Endorser`.
#[derive(Debug, Clone)]
pub struct EndorserClient {
    inner: tonic::client::Grpc<Channel>,
}

impl EndorserClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn process_proposal(
        &mut self,
        request: impl IntoRequest<SignedProposal>,
    ) -> Result<Response<ProposalResponse>, Status> {
        ready(&mut self.inner).await?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/protos.Endorser/ProcessProposal");
        self.inner.unary(request.into_request(), path, codec).await
    }
}

/// Client for the peer's `protos.Deliver` service.
#[derive(Debug, Clone)]
pub struct DeliverClient {
    inner: tonic::client::Grpc<Channel>,
}

impl DeliverClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Full blocks.
    pub async fn deliver(
        &mut self,
        request: impl IntoStreamingRequest<Message = Envelope>,
    ) -> Result<Response<Streaming<peer::DeliverResponse>>, Status> {
        ready(&mut self.inner).await?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/protos.Deliver/Deliver");
        self.inner
            .streaming(request.into_streaming_request(), path, codec)
            .await
    }

    /// Filtered blocks: transaction ids and validation codes only.
    pub async fn deliver_filtered(
        &mut self,
        request: impl IntoStreamingRequest<Message = Envelope>,
    ) -> Result<Response<Streaming<peer::DeliverResponse>>, Status> {
        ready(&mut self.inner).await?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/protos.Deliver/DeliverFiltered");
        self.inner
            .streaming(request.into_streaming_request(), path, codec)
            .await
    }
}

/// Client for `orderer.AtomicBroadcast`.
#[derive(Debug, Clone)]
pub struct AtomicBroadcastClient {
    inner: tonic::client::Grpc<Channel>,
}

impl AtomicBroadcastClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn broadcast(
        &mut self,
        request: impl IntoStreamingRequest<Message = Envelope>,
    ) -> Result<Response<Streaming<BroadcastResponse>>, Status> {
        ready(&mut self.inner).await?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/orderer.AtomicBroadcast/Broadcast");
        self.inner
            .streaming(request.into_streaming_request(), path, codec)
            .await
    }

    pub async fn deliver(
        &mut self,
        request: impl IntoStreamingRequest<Message = Envelope>,
    ) -> Result<Response<Streaming<orderer::DeliverResponse>>, Status> {
        ready(&mut self.inner).await?;
        let codec = ProstCodec::default();
        let path = PathAndQuery::from_static("/orderer.AtomicBroadcast/Deliver");
        self.inner
            .streaming(request.into_streaming_request(), path, codec)
            .await
    }
}
