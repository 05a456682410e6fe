/// Controller
///
/// Session controller in front of the protocol engine. Sequences
/// connect, restore, pause, disconnect and transaction sends, and reports
/// every outcome as a `ConnectionEvent`. Failures never escape a public
/// operation: they are logged and surface as `None`, `false`, or an event
/// with `success: false`.
///
use std::sync::{Arc, Mutex, RwLock};

use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::SdkConfig;
use crate::constants::TRANSACTION_VALIDITY_SECS;
use crate::deep_link::DeepLinkOpener;
use crate::engine::{BridgeTransport, EngineFactory, ProtocolEngine};
use crate::error::{Error, Result};
use crate::events::{ConnectionEvent, EventBus};
use crate::storage::{KeyValueStore, RemoteStorage};
use crate::types::{
    ConnectionOptions, SendTransactionRequest, SendTransactionResult, StatusChange,
    TransactionMessage, WalletConfig,
};
use crate::utils::{addresses_match, escape_uri, to_nanotons, unix_timestamp};
use crate::wallets::fetch_wallets_configs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Connecting,
    Connected,
    Paused,
    Disconnected,
}

/// Cheap to clone handle, all clones drive the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    config: RwLock<SdkConfig>,
    storage: RemoteStorage,
    factory: Box<dyn EngineFactory>,
    opener: Arc<dyn DeepLinkOpener>,
    client: Client,
    engine: RwLock<Option<Arc<dyn ProtocolEngine>>>,
    options: RwLock<Option<ConnectionOptions>>,
    wallets: RwLock<Vec<WalletConfig>>,
    state: Mutex<SessionState>,
    events: EventBus,
}

impl SessionController {
    pub fn new(
        config: SdkConfig,
        factory: impl EngineFactory + 'static,
        store: Arc<dyn KeyValueStore>,
        opener: Arc<dyn DeepLinkOpener>,
    ) -> Self {
        Self::with_client(config, factory, store, opener, Client::new())
    }

    pub fn with_client(
        config: SdkConfig,
        factory: impl EngineFactory + 'static,
        store: Arc<dyn KeyValueStore>,
        opener: Arc<dyn DeepLinkOpener>,
        client: Client,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                storage: RemoteStorage::new(store),
                factory: Box::new(factory),
                opener,
                client,
                engine: RwLock::new(None),
                options: RwLock::new(None),
                wallets: RwLock::new(vec![]),
                state: Mutex::new(SessionState::Uninitialized),
                events: EventBus::default(),
            }),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionState::Uninitialized)
    }

    pub fn config(&self) -> SdkConfig {
        self.inner
            .config
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn options(&self) -> Option<ConnectionOptions> {
        self.inner.options.read().ok()?.clone()
    }

    /// Wallets from the last successful `load_wallets_configs`.
    pub fn supported_wallets(&self) -> Vec<WalletConfig> {
        self.inner
            .wallets
            .read()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_connected())
    }

    /// Whether hosts should serve wallet icons from their local cache.
    pub fn use_cached_wallets_icons(&self) -> bool {
        self.config().use_cached_wallets_icons
    }

    /// Builds the engine and restores the previous session. Returns `false`
    /// (and never emits `Initialized`) when no manifest url is configured.
    pub async fn initialize(&self) -> bool {
        self.set_state(SessionState::Initializing);

        let config = self.config();
        let Some(manifest_url) = config.manifest_url() else {
            log::error!(
                "Failed to initialize Uniton Connect SDK: {}",
                Error::ManifestNotResolved
            );
            self.set_state(SessionState::Uninitialized);
            return false;
        };

        self.disable_web_wallets();

        let options = config.connection_options(manifest_url);
        let transport = BridgeTransport::new(self.inner.client.clone());

        let engine = match self.inner.factory.create(
            options.clone(),
            self.inner.storage.clone(),
            transport,
        ) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("Failed to create TON Connect instance: {e}");
                self.set_state(SessionState::Uninitialized);
                return false;
            }
        };

        if let Ok(mut slot) = self.inner.options.write() {
            *slot = Some(options);
        }
        if let Ok(mut slot) = self.inner.engine.write() {
            *slot = Some(engine.clone());
        }

        let weak = Arc::downgrade(&self.inner);
        engine.on_status_change(Arc::new(move |change| {
            if let Some(inner) = weak.upgrade() {
                SessionController { inner }.handle_status_change(change);
            }
        }));

        self.set_state(SessionState::Ready);

        self.restore_connection().await;

        self.emit(ConnectionEvent::Initialized);
        log::info!("SDK successfully initialized");
        true
    }

    pub async fn restore_connection(&self) -> bool {
        if !self.config().restore_connection_on_start {
            self.inner.storage.clear_session();
            self.emit(ConnectionEvent::ConnectionRestored(false));
            return false;
        }

        let Some(engine) = self.require_engine() else {
            self.emit(ConnectionEvent::ConnectionRestored(false));
            return false;
        };

        let restored = match engine.restore_connection().await {
            Ok(restored) => restored,
            Err(e) => {
                log::error!("Failed to restore connection: {e}");
                false
            }
        };

        if restored && engine.is_connected() {
            self.set_state(SessionState::Connected);
        }

        self.emit(ConnectionEvent::ConnectionRestored(restored));
        log::info!("Connection restored with status: {restored}");
        restored
    }

    /// Starts a connection over whichever bridge `wallet` has, preferring
    /// the HTTP bridge. Returns the link handed to the wallet.
    pub async fn connect(&self, wallet: &WalletConfig) -> Option<String> {
        if wallet.has_http_bridge() {
            let Some(universal_url) = wallet.universal_url.as_deref() else {
                log::warn!(
                    "The wallet {} has an HTTP bridge but no universal url, the deeplink connection was terminated.",
                    wallet.name
                );
                return None;
            };
            self.set_state(SessionState::Connecting);
            let link = escape_uri(universal_url);
            self.open_deep_link(&link);
            Some(link)
        } else if wallet.has_js_bridge() {
            self.generate_connect_url(wallet).await
        } else {
            log::warn!(
                "The wallet {} has neither an HTTP nor a JavaScript bridge, the connection was terminated.",
                wallet.name
            );
            None
        }
    }

    pub fn connect_via_http_bridge(&self, wallet: &WalletConfig, connect_url: &str) {
        if !wallet.has_http_bridge() {
            log::warn!(
                "The specified wallet configuration has no HTTP bridge detected, \
                 the deeplink connection was terminated."
            );
            return;
        }

        self.set_state(SessionState::Connecting);
        self.open_deep_link(&escape_uri(connect_url));
    }

    pub async fn connect_via_js_bridge(&self, wallet: &WalletConfig) -> Option<String> {
        if !wallet.has_js_bridge() {
            log::warn!(
                "The specified wallet configuration has no JavaScript bridge detected, \
                 the deeplink connection was terminated."
            );
            return None;
        }

        self.generate_connect_url(wallet).await
    }

    pub async fn generate_connect_url(&self, wallet: &WalletConfig) -> Option<String> {
        let engine = self.require_engine()?;

        self.set_state(SessionState::Connecting);
        match engine.connect(wallet).await {
            Ok(url) => Some(url),
            Err(e) => {
                match e {
                    Error::WalletAlreadyConnected => log::error!("Error: {e}"),
                    _ => log::error!(
                        "Failed to connect to the wallet due to the following reason: {e}"
                    ),
                }
                self.settle_state();
                None
            }
        }
    }

    /// Sends `amount` TON to `recipient` through the connected wallet.
    ///
    /// Sending to the connected account itself is refused without any
    /// event. Every other outcome ends with exactly one
    /// `TransactionFinished`.
    pub async fn send_transaction(&self, wallet: &WalletConfig, recipient: &str, amount: f64) {
        log::info!(
            "Created a request to send a TON to the recipient: {recipient} in amount {amount}"
        );

        let Some(engine) = self.require_engine() else {
            self.finish_transaction(None, false);
            return;
        };

        if engine
            .account_address()
            .is_some_and(|own| addresses_match(recipient, &own))
        {
            log::warn!("Transaction canceled because the recipient and sender addresses match");
            return;
        }

        let request = match transaction_request(recipient, amount) {
            Ok(request) => request,
            Err(e) => {
                log::error!("Failed to send tokens due to the following reason: {e}");
                self.finish_transaction(None, false);
                return;
            }
        };

        if let Some(universal_url) = wallet.universal_url.as_deref() {
            self.open_deep_link(universal_url);
        }

        match engine.send_transaction(request).await {
            Ok(result) => {
                log::info!("Transaction successfully completed, Boc: {}", result.boc);
                self.finish_transaction(Some(result), true);
            }
            Err(e @ Error::WalletNotConnected) => {
                log::error!("{e}");
                self.finish_transaction(None, false);
            }
            Err(e) => {
                log::error!("Failed to send tokens due to the following reason: {e}");
                self.finish_transaction(None, false);
            }
        }
    }

    pub async fn disconnect(&self) {
        let engine = match self.engine() {
            Some(engine) if engine.is_connected() => engine,
            _ => {
                log::error!("No connected wallets are detected for disconnection");
                return;
            }
        };

        match engine.disconnect().await {
            Ok(()) => self.set_state(SessionState::Disconnected),
            Err(e @ (Error::WalletNotConnected | Error::Protocol(_))) => {
                log::error!("Error: {e}");
            }
            Err(e) => log::error!(
                "The previously connected wallet could not be disconnected due to the following reason: {e}"
            ),
        }
    }

    pub fn pause(&self) {
        let Some(engine) = self.require_engine() else {
            return;
        };

        engine.pause_connection();
        self.set_state(SessionState::Paused);
        self.emit(ConnectionEvent::ConnectionPaused);
    }

    pub fn unpause(&self) {
        let Some(engine) = self.require_engine() else {
            return;
        };

        engine.unpause_connection();
        self.settle_state();
        self.emit(ConnectionEvent::ConnectionUnpaused);
    }

    /// Forwards a message from an injected (JS bridge) wallet provider.
    pub fn on_injected_wallet_message(&self, message: &str) {
        if let Some(engine) = self.require_engine() {
            engine.parse_injected_provider_message(message);
        }
    }

    /// Fetches the wallets list in the background. `on_loaded` only runs on
    /// success; the list also becomes `supported_wallets()`.
    pub fn load_wallets_configs<F>(&self, source_url: &str, on_loaded: F) -> JoinHandle<()>
    where
        F: FnOnce(Vec<WalletConfig>) + Send + 'static,
    {
        let this = self.clone();
        let source_url = source_url.to_string();

        tokio::spawn(async move {
            match fetch_wallets_configs(&this.inner.client, &source_url).await {
                Ok(wallets) => {
                    if let Ok(mut slot) = this.inner.wallets.write() {
                        *slot = wallets.clone();
                    }
                    on_loaded(wallets);
                }
                Err(e) => log::error!("HTTP Error with message: {e}"),
            }
        })
    }

    fn handle_status_change(&self, change: StatusChange) {
        match change {
            StatusChange::Wallet(wallet) => {
                if self.is_connected() {
                    self.set_state(SessionState::Connected);
                } else {
                    self.inner.storage.clear_session();
                    self.set_state(SessionState::Disconnected);
                    self.emit(ConnectionEvent::Disconnected);
                    log::info!(
                        "Connection to the wallet has been successfully disconnected, \
                         the storage of the previous session has been cleaned up"
                    );
                }
                self.emit(ConnectionEvent::ConnectionFinished(wallet));
            }
            StatusChange::Error(message) => {
                if self.state() == SessionState::Connecting {
                    self.set_state(SessionState::Ready);
                }
                self.emit(ConnectionEvent::ConnectionFailed(message));
            }
        }
    }

    fn disable_web_wallets(&self) {
        if let Ok(mut config) = self.inner.config.write() {
            if config.use_web_wallets {
                config.use_web_wallets = false;
                log::warn!(
                    "The 'use_web_wallets' option was automatically disabled, \
                     injected wallets are not supported yet."
                );
            }
        }
    }

    fn engine(&self) -> Option<Arc<dyn ProtocolEngine>> {
        self.inner.engine.read().ok()?.clone()
    }

    fn require_engine(&self) -> Option<Arc<dyn ProtocolEngine>> {
        let engine = self.engine();
        if engine.is_none() {
            log::error!("{}", Error::NotInitialized);
        }
        engine
    }

    fn open_deep_link(&self, url: &str) {
        self.inner.opener.open(url);
    }

    fn finish_transaction(&self, result: Option<SendTransactionResult>, success: bool) {
        self.emit(ConnectionEvent::TransactionFinished { result, success });
    }

    fn emit(&self, event: ConnectionEvent) {
        self.inner.events.emit(event);
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut current) = self.inner.state.lock() {
            *current = state;
        }
    }

    /// Back to `Connected` or `Ready` depending on the engine.
    fn settle_state(&self) {
        let state = if self.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Ready
        };
        self.set_state(state);
    }
}

// TODO: multi-message transactions, once the wallet side semantics are settled
fn transaction_request(recipient: &str, amount: f64) -> Result<SendTransactionRequest> {
    let nanotons = to_nanotons(amount)?;

    Ok(SendTransactionRequest {
        valid_until: unix_timestamp() + TRANSACTION_VALIDITY_SECS,
        messages: vec![TransactionMessage {
            address: recipient.to_string(),
            amount: nanotons.to_string(),
        }],
    })
}
