//! Node Connection Module
//!
//! Connects to a blockchain node over WebSocket or Unix IPC socket, subscribes
//! to pending transaction hashes and fetches full transactions by hash.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::TxHash;
use alloy::providers::{Provider, ProviderBuilder, RootProvider, WsConnect};
use alloy::pubsub::PubSubFrontend;
use alloy::transports::ipc::IpcConnect;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::record::TransactionRecord;

/// Connection timeout in milliseconds
pub const CONNECTION_TIMEOUT_MS: u64 = 5000;

/// Errors that can occur while talking to the node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    #[error("IPC socket not found at path: {0}")]
    SocketNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Failed to fetch transaction: {0}")]
    Fetch(String),
}

/// Where the node is reachable. Only persistent transports can carry
/// subscriptions, so plain HTTP is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `ws://` or `wss://` URL, possibly with an access key in the path
    Ws(Url),
    /// Local IPC socket path, with `~/` already expanded
    Ipc(String),
}

impl FromStr for Endpoint {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SourceError::InvalidEndpoint("Endpoint cannot be empty".to_string()));
        }

        if !s.contains("://") {
            return Ok(Endpoint::Ipc(expand_path(s)));
        }

        // The parse error alone; the endpoint string may carry a credential
        let url = Url::parse(s).map_err(|e| SourceError::InvalidEndpoint(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(Endpoint::Ws(url)),
            "http" | "https" => Err(SourceError::UnsupportedEndpoint(
                "HTTP cannot stream pending transactions, use ws:// or wss://".to_string(),
            )),
            other => Err(SourceError::UnsupportedEndpoint(format!("scheme '{}'", other))),
        }
    }
}

impl Endpoint {
    /// Endpoint with path, query and credentials stripped, safe for logs
    pub fn redacted(&self) -> String {
        match self {
            Endpoint::Ws(url) => {
                let host = url.host_str().unwrap_or_default();
                match url.port() {
                    Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                    None => format!("{}://{}", url.scheme(), host),
                }
            }
            Endpoint::Ipc(path) => path.clone(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Expand ~ to home directory in path
pub fn expand_path(path: &str) -> String {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

/// Connect to the node behind `endpoint`
///
/// Returns a pubsub-capable provider, or an error if the node cannot be
/// reached within `timeout_ms`
pub async fn connect(
    endpoint: &Endpoint,
    timeout_ms: u64,
) -> Result<RootProvider<PubSubFrontend>, SourceError> {
    if let Endpoint::Ipc(path) = endpoint {
        if !Path::new(path).exists() {
            return Err(SourceError::SocketNotFound(path.clone()));
        }
    }

    info!("Connecting to node at {}", endpoint);

    let connecting = async {
        match endpoint {
            Endpoint::Ws(url) => ProviderBuilder::new().on_ws(WsConnect::new(url.as_str())).await,
            Endpoint::Ipc(path) => {
                let ipc: IpcConnect<String> = IpcConnect::new(path.clone());
                ProviderBuilder::new().on_ipc(ipc).await
            }
        }
    };

    let provider = tokio::time::timeout(Duration::from_millis(timeout_ms), connecting)
        .await
        .map_err(|_| SourceError::Timeout(timeout_ms))?
        .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

    info!("Successfully connected to node");
    Ok(provider)
}

/// One notification from the pending transaction subscription
pub type PendingEvent = Result<TxHash, SourceError>;

/// Subscribe to hashes of transactions entering the node's mempool
pub async fn subscribe_pending(
    provider: &RootProvider<PubSubFrontend>,
) -> Result<impl Stream<Item = PendingEvent> + Send, SourceError> {
    let subscription = provider
        .subscribe_pending_transactions()
        .await
        .map_err(|e| SourceError::SubscriptionFailed(e.to_string()))?;

    info!("Subscribed to pending transactions");
    Ok(pending_events(subscription.into_result_stream()))
}

/// Turn raw subscription notifications into pending events
///
/// A notification that does not deserialize into a hash becomes
/// `SourceError::SubscriptionFailed` instead of being dropped, so the
/// listener can account for it and move on.
pub fn pending_events<N>(notifications: N) -> impl Stream<Item = PendingEvent>
where
    N: Stream<Item = Result<TxHash, serde_json::Error>>,
{
    notifications.map(|notification| {
        notification.map_err(|e| SourceError::SubscriptionFailed(e.to_string()))
    })
}

/// Lookup of full transactions by hash
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch a transaction, `Ok(None)` if the node no longer knows it
    async fn fetch(&self, hash: TxHash) -> Result<Option<TransactionRecord>, SourceError>;
}

/// `TransactionSource` backed by `eth_getTransactionByHash` on a live node
#[derive(Clone)]
pub struct NodeSource {
    provider: RootProvider<PubSubFrontend>,
}

impl NodeSource {
    pub fn new(provider: RootProvider<PubSubFrontend>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TransactionSource for NodeSource {
    async fn fetch(&self, hash: TxHash) -> Result<Option<TransactionRecord>, SourceError> {
        let tx = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))?;
        Ok(tx.map(TransactionRecord::from))
    }
}
