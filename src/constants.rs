// https://github.com/ton-connect/sdk/blob/main/packages/sdk/src/storage/bridge-connection-storage.ts
pub const STORAGE_PREFIX: &str = "ton-connect-storage_bridge-";
pub const KEY_CONNECTION: &str = "connection";
pub const KEY_LAST_EVENT_ID: &str = "lastEventId";

pub const TEST_APP_URL: &str = "https://mrveit.github.io/Veittech-UnitonConnect";
pub const APP_DATA_FILE_NAME: &str = "dAppData.json";

pub const SUPPORTED_WALLETS_LINK: &str =
    "https://raw.githubusercontent.com/ton-blockchain/wallets-list/main/wallets-v2.json";
pub const WALLETS_LIST_CACHE_TTL_MS: u64 = 24 * 60 * 60 * 1000; // ONE_DAY

// Its wallets list entry ships the SSE bridge url with a trailing slash
pub const WALLET_WITH_TRAILING_SLASH_BRIDGE: &str = "MyTonWallet";

pub const BRIDGE_POST_PATH: &str = "message";
pub const BRIDGE_MESSAGE_TTL: u64 = 300;

pub const HEADER_VALUE_TEXT_EVENT_STREAM: &str = "text/event-stream";
pub const HEADER_VALUE_TEXT_PLAIN: &str = "text/plain";

pub const TRANSACTION_VALIDITY_SECS: i64 = 600;
pub const NANOTONS_PER_TON: f64 = 1_000_000_000.0;
