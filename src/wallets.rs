/// Wallets
///
/// Turns wallets list entries into one `WalletConfig` per supported bridge.
///
use reqwest::Client;

use crate::constants::WALLET_WITH_TRAILING_SLASH_BRIDGE;
use crate::error::{Error, Result};
use crate::types::{BridgeDescriptor, WalletConfig, WalletProviderData};

pub fn parse_wallets_configs(wallets: &[WalletProviderData]) -> Vec<WalletConfig> {
    let mut loaded = Vec::new();

    for wallet in wallets {
        let base = WalletConfig {
            name: wallet.name.clone(),
            image: wallet.image.clone(),
            about_url: wallet.about_url.clone(),
            app_name: wallet.app_name.clone(),
            ..Default::default()
        };

        for bridge in &wallet.bridge {
            match bridge {
                BridgeDescriptor::ServerSentEvents { url } => {
                    let bridge_url = if wallet.name == WALLET_WITH_TRAILING_SLASH_BRIDGE {
                        url.trim_end_matches('/').to_string()
                    } else {
                        url.clone()
                    };
                    if bridge_url.is_empty() {
                        log::warn!("Skipping SSE bridge without url for wallet {}", wallet.name);
                        continue;
                    }

                    loaded.push(WalletConfig {
                        bridge_url: Some(bridge_url),
                        universal_url: wallet.universal_url.clone(),
                        js_bridge_key: None,
                        ..base.clone()
                    });
                }
                BridgeDescriptor::JavaScriptInjected { key } if key.is_empty() => {
                    log::warn!("Skipping JS bridge without key for wallet {}", wallet.name);
                }
                BridgeDescriptor::JavaScriptInjected { key } => {
                    loaded.push(WalletConfig {
                        js_bridge_key: Some(key.clone()),
                        bridge_url: None,
                        ..base.clone()
                    });
                }
                BridgeDescriptor::Unknown => {}
            }
        }
    }

    loaded
}

/// Downloads the wallets list from `source_url` and normalizes it.
pub async fn fetch_wallets_configs(client: &Client, source_url: &str) -> Result<Vec<WalletConfig>> {
    let response = client.get(source_url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        });
    }

    let text = response.text().await?;
    let wallets: Vec<WalletProviderData> = serde_json::from_str(&text)?;

    log::debug!(
        "Wallet list config after load: {}",
        serde_json::to_string(&wallets)?
    );

    Ok(parse_wallets_configs(&wallets))
}
