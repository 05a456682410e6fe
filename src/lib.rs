//! # uniton-connect
//!
//! Session bridge coordination for [TON Connect](https://github.com/ton-blockchain/ton-connect)
//! wallets, independent of any game engine host.
//!
//! ## Features
//! - Wallets list loading and normalization, one config per bridge
//! - Cancellable SSE bridge listener
//! - Bridge gateway message sender
//! - Session controller: connect, restore, pause, disconnect, send TON
//!
//! The protocol engine (handshake, session crypto) is supplied by the host
//! through [`engine::EngineFactory`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let controller = SessionController::new(
//!     SdkConfig::test(),
//!     MyEngineFactory::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LogOpener),
//! );
//! let mut events = controller.subscribe();
//!
//! if controller.initialize().await {
//!     controller.load_wallets_configs(SUPPORTED_WALLETS_LINK, |wallets| {
//!         println!("{} wallets", wallets.len());
//!     });
//! }
//!
//! while let Some(event) = events.recv().await {
//!     println!("event: {event:?}");
//! }
//! ```
//!
//! ## License
//! MIT OR Apache-2.0

pub mod config;
pub mod constants;
pub mod controller;
pub mod deep_link;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod listener;
pub mod logging;
pub mod storage;
pub mod types;
pub mod utils;
pub mod wallets;

#[cfg(test)]
mod test_server;

/// Exposed for easy access
pub use config::SdkConfig;
pub use controller::{SessionController, SessionState};
pub use error::Error;
pub use events::ConnectionEvent;
