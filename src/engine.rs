/// Engine
///
/// Seam to the TON Connect protocol engine. The engine owns handshake
/// cryptography and session persistence; this crate only hands it the
/// transport it should do its I/O with.
///
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::gateway;
use crate::listener::{self, ErrorHandler, LineHandler, ListenerOutcome};
use crate::storage::RemoteStorage;
use crate::types::{
    ConnectionOptions, GatewayMessage, SendTransactionRequest, SendTransactionResult,
    StatusChange, WalletConfig,
};

pub type StatusHandler = Arc<dyn Fn(StatusChange) + Send + Sync>;

#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    fn on_status_change(&self, handler: StatusHandler);

    fn is_connected(&self) -> bool;

    /// Address of the connected account, if any.
    fn account_address(&self) -> Option<String>;

    /// Returns the universal link the wallet should open.
    async fn connect(&self, wallet: &WalletConfig) -> Result<String>;

    async fn send_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<SendTransactionResult>;

    async fn disconnect(&self) -> Result<()>;

    async fn restore_connection(&self) -> Result<bool>;

    fn pause_connection(&self);

    fn unpause_connection(&self);

    fn parse_injected_provider_message(&self, message: &str);
}

pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        options: ConnectionOptions,
        storage: RemoteStorage,
        transport: BridgeTransport,
    ) -> Result<Arc<dyn ProtocolEngine>>;
}

/// Bridge I/O the engine drives. Both calls return immediately; the work
/// runs on the tokio runtime.
#[derive(Clone, Debug, Default)]
pub struct BridgeTransport {
    client: Client,
}

impl BridgeTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn listen_events(
        &self,
        token: CancellationToken,
        url: &str,
        on_line: LineHandler,
        on_error: ErrorHandler,
    ) -> JoinHandle<ListenerOutcome> {
        listener::activate_http(self.client.clone(), url.to_string(), token, on_line, on_error)
    }

    pub fn send_gateway_message(&self, message: GatewayMessage) -> JoinHandle<Result<()>> {
        gateway::dispatch(self.client.clone(), message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    // Nothing listens on port 1, the connection is refused right away
    const CLOSED_BRIDGE: &str = "http://127.0.0.1:1/bridge";

    #[tokio::test]
    async fn test_listen_events_reports_open_failure() {
        let transport = BridgeTransport::default();
        let errors = Arc::new(Mutex::new(0));
        let lines = Arc::new(Mutex::new(0));
        let (e, l) = (errors.clone(), lines.clone());

        let handle = transport.listen_events(
            CancellationToken::new(),
            &format!("{CLOSED_BRIDGE}/events?client_id=a3f1c2"),
            Box::new(move |_| *l.lock().unwrap() += 1),
            Box::new(move |_| *e.lock().unwrap() += 1),
        );

        assert_eq!(handle.await.unwrap(), ListenerOutcome::Failed);
        assert_eq!(*errors.lock().unwrap(), 1);
        assert_eq!(*lines.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listen_events_cancelled_before_open() {
        let transport = BridgeTransport::default();
        let token = CancellationToken::new();
        token.cancel();

        let handle = transport.listen_events(
            token,
            CLOSED_BRIDGE,
            Box::new(|_| panic!("no lines expected")),
            Box::new(|_| panic!("no error expected")),
        );

        assert_eq!(handle.await.unwrap(), ListenerOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_send_gateway_message_failure() {
        let transport = BridgeTransport::default();
        let message =
            GatewayMessage::new(CLOSED_BRIDGE, "a3f1c2", "9be0d4", "", b"AQIDBA==".to_vec());

        let result = transport.send_gateway_message(message).await.unwrap();
        assert!(matches!(result, Err(crate::Error::Reqwest(_))));
    }
}
