/// Types
///
/// Wallets list entries, normalized wallet configs, bridge envelopes and the
/// TON Connect transaction payloads exchanged with the protocol engine.
///
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BRIDGE_MESSAGE_TTL, BRIDGE_POST_PATH};

/// Entry of the public wallets list (`wallets-v2.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletProviderData {
    pub app_name: String,
    pub name: String,
    pub image: String,
    pub about_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_url: Option<String>,
    #[serde(default)]
    pub bridge: Vec<BridgeDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeDescriptor {
    #[serde(rename = "sse")]
    ServerSentEvents {
        #[serde(default)]
        url: String,
    },

    #[serde(rename = "js")]
    JavaScriptInjected {
        #[serde(default)]
        key: String,
    },

    #[serde(other)]
    Unknown,
}

impl BridgeDescriptor {
    pub fn kind(&self) -> BridgeKind {
        match self {
            BridgeDescriptor::ServerSentEvents { .. } => BridgeKind::ServerSentEvents,
            BridgeDescriptor::JavaScriptInjected { .. } => BridgeKind::JavaScriptInjected,
            BridgeDescriptor::Unknown => BridgeKind::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeKind {
    #[serde(rename = "sse")]
    ServerSentEvents,

    #[serde(rename = "js")]
    JavaScriptInjected,

    #[serde(rename = "unknown")]
    Unknown,
}

impl Display for BridgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&serde_plain::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for BridgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_plain::from_str(s).map_err(|_| format!("unknown bridge type: {s}").into())
    }
}

/// Normalized connection descriptor, one per bridge of a wallet provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub name: String,
    pub image: String,
    pub about_url: String,
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_bridge_key: Option<String>,
}

impl WalletConfig {
    pub fn has_http_bridge(&self) -> bool {
        self.bridge_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    pub fn has_js_bridge(&self) -> bool {
        self.js_bridge_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    pub fn bridge_kind(&self) -> BridgeKind {
        if self.has_http_bridge() {
            BridgeKind::ServerSentEvents
        } else if self.has_js_bridge() {
            BridgeKind::JavaScriptInjected
        } else {
            BridgeKind::Unknown
        }
    }
}

/// Options handed to the protocol engine at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    #[serde(rename = "manifestUrl")]
    pub manifest_url: String,
    #[serde(rename = "walletsListSource")]
    pub wallets_list_source: String,
    #[serde(rename = "walletsListCacheTTLMs")]
    pub wallets_list_cache_ttl_ms: u64,
}

/// Outbound bridge message, scoped to a single send attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayMessage {
    pub bridge_url: String,
    pub post_path: String,
    pub session_id: String,
    pub receiver: String,
    pub ttl: u64,
    pub topic: String,
    pub message: Vec<u8>,
}

impl GatewayMessage {
    /// Message to the bridge's default `message` endpoint with the default ttl.
    pub fn new(
        bridge_url: &str,
        session_id: &str,
        receiver: &str,
        topic: &str,
        message: Vec<u8>,
    ) -> Self {
        Self {
            bridge_url: bridge_url.to_string(),
            post_path: BRIDGE_POST_PATH.to_string(),
            session_id: session_id.to_string(),
            receiver: receiver.to_string(),
            ttl: BRIDGE_MESSAGE_TTL,
            topic: topic.to_string(),
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionMessage {
    pub address: String,
    /// Nanotons as a decimal string
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    #[serde(rename = "validUntil")]
    pub valid_until: i64,
    pub messages: Vec<TransactionMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionResult {
    pub boc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub chain: String,
    #[serde(rename = "walletStateInit", default)]
    pub wallet_state_init: String,
    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    #[serde(rename = "appName")]
    pub app_name: String,
    #[serde(rename = "appVersion")]
    pub app_version: String,
    #[serde(rename = "maxProtocolVersion")]
    pub max_protocol_version: u32,
}

/// Connected wallet as reported by the protocol engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub device: DeviceInfo,
    pub provider: String,
    pub account: Account,
}

/// Status notification pushed by the protocol engine.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusChange {
    Wallet(Option<Wallet>),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wallet_provider() {
        let raw = r#"{
            "app_name": "tonkeeper",
            "name": "Tonkeeper",
            "image": "https://tonkeeper.com/assets/tonconnect-icon.png",
            "tondns": "tonkeeper.ton",
            "about_url": "https://tonkeeper.com",
            "universal_url": "https://app.tonkeeper.com/ton-connect",
            "deepLink": "tonkeeper-tc://",
            "bridge": [
                {"type": "sse", "url": "https://bridge.tonapi.io/bridge"},
                {"type": "js", "key": "tonkeeper"}
            ],
            "platforms": ["ios", "android", "chrome", "firefox", "macos"]
        }"#;

        let decoded: WalletProviderData = serde_json::from_str(raw).unwrap();

        assert_eq!(decoded.name, "Tonkeeper");
        assert_eq!(
            decoded.universal_url.as_deref(),
            Some("https://app.tonkeeper.com/ton-connect")
        );
        assert_eq!(
            decoded.bridge,
            vec![
                BridgeDescriptor::ServerSentEvents {
                    url: "https://bridge.tonapi.io/bridge".to_string()
                },
                BridgeDescriptor::JavaScriptInjected {
                    key: "tonkeeper".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_decode_unknown_bridge_kind() {
        let raw = r#"[{"type": "websocket", "url": "wss://example"}, {"type": "js", "key": "x"}]"#;
        let decoded: Vec<BridgeDescriptor> = serde_json::from_str(raw).unwrap();

        assert_eq!(decoded[0], BridgeDescriptor::Unknown);
        assert_eq!(decoded[1].kind(), BridgeKind::JavaScriptInjected);
    }

    #[test]
    fn test_decode_bridge_without_address() {
        let raw = r#"[{"type": "sse"}, {"type": "js"}]"#;
        let decoded: Vec<BridgeDescriptor> = serde_json::from_str(raw).unwrap();

        assert_eq!(
            decoded,
            vec![
                BridgeDescriptor::ServerSentEvents { url: String::new() },
                BridgeDescriptor::JavaScriptInjected { key: String::new() },
            ]
        );
    }

    #[test]
    fn test_bridge_kind_plain() {
        assert_eq!(BridgeKind::ServerSentEvents.to_string(), "sse");
        assert_eq!("js".parse::<BridgeKind>().unwrap(), BridgeKind::JavaScriptInjected);
        assert!("carrier-pigeon".parse::<BridgeKind>().is_err());
    }

    #[test]
    fn test_encode_send_transaction_request() {
        let request = SendTransactionRequest {
            valid_until: 1744205603,
            messages: vec![TransactionMessage {
                address: "EQDPwEk-cnQXEfFaaNVXywpbKACUMwVRupkgWjhr_f4UrpH_".to_string(),
                amount: "10000000".to_string(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "validUntil": 1744205603,
                "messages": [{
                    "address": "EQDPwEk-cnQXEfFaaNVXywpbKACUMwVRupkgWjhr_f4UrpH_",
                    "amount": "10000000"
                }]
            })
        );
    }

    #[test]
    fn test_wallet_config_bridge_kind() {
        let mut config = WalletConfig {
            bridge_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.bridge_kind(), BridgeKind::Unknown);

        config.js_bridge_key = Some("tonkeeper".to_string());
        assert!(!config.has_http_bridge());
        assert_eq!(config.bridge_kind(), BridgeKind::JavaScriptInjected);
    }
}
