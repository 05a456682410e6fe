use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_DATA_FILE_NAME, SUPPORTED_WALLETS_LINK, TEST_APP_URL, WALLETS_LIST_CACHE_TTL_MS,
};
use crate::error::Result;
use crate::types::ConnectionOptions;
use crate::utils::manifest_link;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Use the bundled test manifest instead of `dapp`
    pub test_mode: bool,
    pub debug_mode: bool,
    pub restore_connection_on_start: bool,
    /// Injected wallets, not supported yet; forced off at initialization
    pub use_web_wallets: bool,
    pub use_cached_wallets_icons: bool,
    pub wallets_list: WalletsListConfig,
    pub dapp: Option<DAppConfig>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            debug_mode: false,
            restore_connection_on_start: true,
            use_web_wallets: false,
            use_cached_wallets_icons: false,
            wallets_list: WalletsListConfig::default(),
            dapp: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletsListConfig {
    pub source_link: String,
    /// Milliseconds
    pub cached_time_to_live: u64,
}

impl Default for WalletsListConfig {
    fn default() -> Self {
        Self {
            source_link: SUPPORTED_WALLETS_LINK.to_string(),
            cached_time_to_live: WALLETS_LIST_CACHE_TTL_MS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DAppConfig {
    pub url: String,
    pub manifest_file_name: String,
    pub name: String,
    pub icon: String,
}

impl SdkConfig {
    pub fn test() -> Self {
        Self {
            test_mode: true,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn manifest_url(&self) -> Option<String> {
        if self.test_mode {
            return Some(manifest_link(TEST_APP_URL, APP_DATA_FILE_NAME));
        }

        let dapp = self.dapp.as_ref()?;
        if dapp.url.trim().is_empty() {
            return None;
        }

        let file_name = if dapp.manifest_file_name.trim().is_empty() {
            APP_DATA_FILE_NAME
        } else {
            dapp.manifest_file_name.trim()
        };
        Some(manifest_link(dapp.url.trim(), file_name))
    }

    pub fn connection_options(&self, manifest_url: String) -> ConnectionOptions {
        ConnectionOptions {
            manifest_url,
            wallets_list_source: self.wallets_list.source_link.clone(),
            wallets_list_cache_ttl_ms: self.wallets_list.cached_time_to_live,
        }
    }
}
