//! Lazily dialed, cached transport connection to one node.

use std::time::Duration;

use tokio::sync::OnceCell;
use tonic::transport::{Channel, Endpoint};

use super::tls::TlsSettings;
use crate::error::{Error, Result};

/// Default bound on establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One reusable connection to one node address.
///
/// The first `dial` establishes the channel; later calls return a clone of
/// the same channel. Concurrent first calls are serialized by the cell, so
/// a connection may be shared across tasks. A failed dial leaves the cell
/// empty and is reported immediately; nothing is retried here.
#[derive(Debug)]
pub struct GatewayConnection {
    address: String,
    tls: Option<TlsSettings>,
    connect_timeout: Duration,
    channel: OnceCell<Channel>,
}

impl GatewayConnection {
    pub fn new(address: impl Into<String>, tls: Option<TlsSettings>) -> Self {
        Self {
            address: address.into(),
            tls,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            channel: OnceCell::new(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Whether a channel has already been established.
    pub fn is_connected(&self) -> bool {
        self.channel.initialized()
    }

    /// Return the cached channel, dialing on first use.
    pub async fn dial(&self) -> Result<Channel> {
        let channel = self.channel.get_or_try_init(|| self.connect()).await?;
        Ok(channel.clone())
    }

    /// Endpoint with scheme, timeout and TLS applied.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let uri = if self.address.contains("://") {
            self.address.clone()
        } else if self.tls.is_some() {
            format!("https://{}", self.address)
        } else {
            format!("http://{}", self.address)
        };

        let mut endpoint = Endpoint::from_shared(uri)
            .map_err(|e| self.unreachable(e))?
            .connect_timeout(self.connect_timeout);

        if let Some(tls) = &self.tls {
            endpoint = endpoint
                .tls_config(tls.client_config())
                .map_err(|e| Error::Tls(format!("{}: {}", self.address, e)))?;
        }
        Ok(endpoint)
    }

    async fn connect(&self) -> Result<Channel> {
        let endpoint = self.endpoint()?;
        tracing::debug!(
            address = %self.address,
            tls = self.tls.is_some(),
            "dialing node"
        );
        let channel = endpoint.connect().await.map_err(|e| {
            tracing::warn!(address = %self.address, error = %e, "dial failed");
            self.unreachable(e)
        })?;
        tracing::info!(address = %self.address, "connected to node");
        Ok(channel)
    }

    fn unreachable(&self, e: impl std::fmt::Display) -> Error {
        Error::Unreachable {
            address: self.address.clone(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[test]
    fn test_plaintext_scheme() {
        let gw = GatewayConnection::new("localhost:7051", None);
        let endpoint = gw.endpoint().unwrap();
        assert_eq!(endpoint.uri().scheme_str(), Some("http"));
        assert!(!gw.is_connected());
    }

    #[test]
    fn test_explicit_scheme_kept() {
        let gw = GatewayConnection::new("http://10.0.0.1:7050", None);
        let endpoint = gw.endpoint().unwrap();
        assert_eq!(endpoint.uri().host(), Some("10.0.0.1"));
    }

    #[test]
    fn test_invalid_address_unreachable() {
        let gw = GatewayConnection::new("bad address with spaces", None);
        assert!(matches!(gw.endpoint(), Err(Error::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_dial_failure_is_not_cached() {
        // Port 1 on loopback refuses connections.
        let gw = GatewayConnection::new("127.0.0.1:1", None)
            .with_connect_timeout(Duration::from_millis(500));
        assert!(matches!(gw.dial().await, Err(Error::Unreachable { .. })));
        assert!(!gw.is_connected());
    }

    #[tokio::test]
    async fn test_repeated_dial_reuses_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        let gw = GatewayConnection::new(addr.to_string(), None)
            .with_connect_timeout(Duration::from_secs(2));
        gw.dial().await.unwrap();
        gw.dial().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(gw.is_connected());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }
}
