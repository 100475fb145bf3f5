//! Sequencer (orderer) client.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tonic::codec::Streaming;

use super::deliver::DeliverStream;
use crate::error::{Error, Result};
use crate::net::rpc::AtomicBroadcastClient;
use crate::net::{GatewayConnection, TlsSettings};
use crate::protos::common::{Block, Envelope, Status};
use crate::protos::orderer::{deliver_response, BroadcastResponse, DeliverResponse};

/// How long to wait for the status that trails a single-block delivery.
const TRAILING_STATUS_WAIT: Duration = Duration::from_secs(1);

/// A node that orders transactions and serves blocks.
#[async_trait]
pub trait Orderer: Send + Sync {
    fn address(&self) -> &str;

    /// Submit `envelope`; succeeds only on a SUCCESS acknowledgement.
    async fn broadcast(&self, envelope: &Envelope) -> Result<()>;

    /// Blocks selected by the seek envelope.
    async fn deliver(&self, seek: Envelope) -> Result<DeliverStream<Block>>;

    /// The first block selected by the seek envelope.
    ///
    /// A status arriving before any block is an error. The status that
    /// follows the block is read and discarded.
    async fn deliver_block(&self, seek: Envelope) -> Result<Block> {
        let mut blocks = self.deliver(seek).await?;
        match blocks.next().await {
            Some(Ok(block)) => {
                let _ = tokio::time::timeout(TRAILING_STATUS_WAIT, blocks.next()).await;
                Ok(block)
            }
            Some(Err(err)) => Err(err),
            None => Err(Error::StreamClosed {
                address: self.address().to_string(),
            }),
        }
    }
}

/// Open bidirectional broadcast stream, reused across calls.
struct BroadcastSession {
    requests: mpsc::Sender<Envelope>,
    acks: Streaming<BroadcastResponse>,
}

/// gRPC client for one orderer over a cached connection.
pub struct OrdererClient {
    gateway: GatewayConnection,
    session: Mutex<Option<BroadcastSession>>,
}

impl OrdererClient {
    pub fn new(gateway: GatewayConnection) -> Self {
        Self {
            gateway,
            session: Mutex::new(None),
        }
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

    fn closed(&self) -> Error {
        Error::StreamClosed {
            address: self.gateway.address().to_string(),
        }
    }

    /// Open a broadcast stream with `first` already queued.
    ///
    /// The envelope is queued before the call so the server has a message to
    /// answer when the response headers are awaited.
    async fn open_session(&self, first: &Envelope) -> Result<BroadcastSession> {
        let channel = self.gateway.dial().await?;
        let (requests, rx) = mpsc::channel(16);
        requests.send(first.clone()).await.map_err(|_| self.closed())?;

        let acks = AtomicBroadcastClient::new(channel)
            .broadcast(ReceiverStream::new(rx))
            .await
            .map_err(|e| self.transport(e))?
            .into_inner();
        tracing::debug!(address = %self.address(), "broadcast stream opened");
        Ok(BroadcastSession { requests, acks })
    }

    async fn read_ack(&self, session: &mut BroadcastSession) -> Result<()> {
        let ack = session
            .acks
            .message()
            .await
            .map_err(|e| self.transport(e))?
            .ok_or_else(|| self.closed())?;
        check_ack(self.address(), ack)
    }

    async fn exchange(
        &self,
        session: Option<BroadcastSession>,
        envelope: &Envelope,
    ) -> Result<BroadcastSession> {
        let mut session = match session {
            Some(session) => {
                session
                    .requests
                    .send(envelope.clone())
                    .await
                    .map_err(|_| self.closed())?;
                session
            }
            None => self.open_session(envelope).await?,
        };
        self.read_ack(&mut session).await?;
        Ok(session)
    }
}

#[async_trait]
impl Orderer for OrdererClient {
    fn address(&self) -> &str {
        self.gateway.address()
    }

    async fn broadcast(&self, envelope: &Envelope) -> Result<()> {
        let mut guard = self.session.lock().await;
        // A failed exchange drops the session; the next call reopens it.
        let session = self.exchange(guard.take(), envelope).await?;
        *guard = Some(session);
        Ok(())
    }

    async fn deliver(&self, seek: Envelope) -> Result<DeliverStream<Block>> {
        let channel = self.gateway.dial().await?;
        let responses = AtomicBroadcastClient::new(channel)
            .deliver(stream::iter([seek]).chain(stream::pending()))
            .await
            .map_err(|e| self.transport(e))?
            .into_inner();
        let address = self.address().to_string();
        Ok(responses
            .map(move |item| block_event(&address, item))
            .boxed())
    }
}

/// Only an exact SUCCESS acknowledgement accepts the envelope.
fn check_ack(address: &str, ack: BroadcastResponse) -> Result<()> {
    if ack.status != Status::Success as i32 {
        return Err(Error::BroadcastRejected {
            address: address.to_string(),
            status: ack.status,
            info: ack.info,
        });
    }
    Ok(())
}

fn block_event(
    address: &str,
    item: std::result::Result<DeliverResponse, tonic::Status>,
) -> Result<Block> {
    let response = item.map_err(|source| Error::Transport {
        address: address.to_string(),
        source,
    })?;
    match response.r#type {
        Some(deliver_response::Type::Block(block)) => Ok(block),
        Some(deliver_response::Type::Status(status)) => Err(Error::DeliverStatus {
            address: address.to_string(),
            status,
        }),
        None => Err(Error::UnexpectedResponse {
            address: address.to_string(),
            kind: "empty",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protos::common::BlockHeader;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    struct ScriptedOrderer(Vec<Result<Block>>);

    #[async_trait]
    impl Orderer for ScriptedOrderer {
        fn address(&self) -> &str {
            "orderer0:7050"
        }

        async fn broadcast(&self, _: &Envelope) -> Result<()> {
            Ok(())
        }

        async fn deliver(&self, _: Envelope) -> Result<DeliverStream<Block>> {
            let items: Vec<Result<Block>> = self
                .0
                .iter()
                .map(|r| match r {
                    Ok(b) => Ok(b.clone()),
                    Err(_) => Err(Error::DeliverStatus {
                        address: "orderer0:7050".into(),
                        status: 404,
                    }),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn block(number: u64) -> Block {
        Block {
            header: Some(BlockHeader {
                number,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deliver_block_returns_first_block() {
        let orderer = ScriptedOrderer(vec![Ok(block(5))]);
        let got = orderer.deliver_block(Envelope::default()).await.unwrap();
        assert_eq!(got.number(), 5);
    }

    #[tokio::test]
    async fn test_deliver_block_status_first_is_error() {
        let orderer = ScriptedOrderer(vec![Err(Error::NoEndorsements)]);
        assert!(matches!(
            orderer.deliver_block(Envelope::default()).await,
            Err(Error::DeliverStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_deliver_block_empty_stream() {
        let orderer = ScriptedOrderer(Vec::new());
        assert!(matches!(
            orderer.deliver_block(Envelope::default()).await,
            Err(Error::StreamClosed { .. })
        ));
    }

    #[test]
    fn test_success_status_still_terminates() {
        let item = Ok(DeliverResponse {
            r#type: Some(deliver_response::Type::Status(200)),
        });
        assert!(matches!(
            block_event("orderer0", item),
            Err(Error::DeliverStatus { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_broadcast_to_unreachable_orderer() {
        let client = OrdererClient::connect_lazy("127.0.0.1:1", None, Duration::from_millis(500));
        let err = client.broadcast(&Envelope::default()).await.unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
        assert!(client.session.lock().await.is_none());
    }

    fn ack(status: Status) -> BroadcastResponse {
        BroadcastResponse {
            status: status as i32,
            info: "from orderer".into(),
        }
    }

    #[test]
    fn test_check_ack_accepts_success() {
        assert!(check_ack("orderer0:7050", ack(Status::Success)).is_ok());
    }

    #[test]
    fn test_check_ack_rejects_other_statuses() {
        for status in [Status::BadRequest, Status::ServiceUnavailable] {
            match check_ack("orderer0:7050", ack(status)) {
                Err(Error::BroadcastRejected {
                    address,
                    status: got,
                    info,
                }) => {
                    assert_eq!(address, "orderer0:7050");
                    assert_eq!(got, status as i32);
                    assert_eq!(info, "from orderer");
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    /// Accepts TCP connections and answers with bytes that are not HTTP/2.
    async fn start_garbage_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _ = socket.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn test_failed_exchange_drops_session() {
        let address = start_garbage_backend().await;
        let client = OrdererClient::connect_lazy(address, None, Duration::from_secs(2));

        for _ in 0..2 {
            let envelope = Envelope::default();
            let broadcast = client.broadcast(&envelope);
            let result = tokio::time::timeout(Duration::from_secs(5), broadcast)
                .await
                .unwrap();
            assert!(result.is_err());
            assert!(client.session.lock().await.is_none());
        }
    }
}
