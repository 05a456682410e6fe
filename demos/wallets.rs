use reqwest::Client;
use uniton_connect::{constants::SUPPORTED_WALLETS_LINK, logging, wallets};

#[tokio::main]
async fn main() {
    logging::init(true);

    // Any list in the wallets-v2.json format works, e.g. a self hosted one
    let source = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SUPPORTED_WALLETS_LINK.to_string());

    let configs = wallets::fetch_wallets_configs(&Client::new(), &source)
        .await
        .expect("failed to load wallets list");

    for config in configs {
        println!(
            "{:<24} {:<4} {}",
            config.name,
            config.bridge_kind(),
            config
                .bridge_url
                .as_deref()
                .or(config.js_bridge_key.as_deref())
                .unwrap_or_default()
        );
    }
}
