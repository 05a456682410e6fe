use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;
use url::Url;

use crate::constants::HEADER_VALUE_TEXT_PLAIN;
use crate::error::{Error, Result};
use crate::types::GatewayMessage;

// https://github.com/ton-blockchain/ton-connect/blob/main/bridge.md#sending-messages
pub fn gateway_url(message: &GatewayMessage) -> Result<Url> {
    let base = format!(
        "{}/{}",
        message.bridge_url.trim_end_matches('/'),
        message.post_path.trim_start_matches('/')
    );
    let mut url = Url::parse(&base)?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &message.session_id)
            .append_pair("to", &message.receiver)
            .append_pair("ttl", &message.ttl.to_string());
        if !message.topic.is_empty() {
            query.append_pair("topic", &message.topic);
        }
    }

    Ok(url)
}

/// Posts `message` to the bridge once, no retries.
pub async fn send(client: &Client, message: &GatewayMessage) -> Result<()> {
    let url = gateway_url(message)?;

    let response = client
        .post(url)
        .header(CONTENT_TYPE, HEADER_VALUE_TEXT_PLAIN)
        .body(message.message.clone())
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            log::error!(
                "Failed to send Gateway message with error: {e}, response code: {:?}",
                e.status().map(|s| s.as_u16())
            );
            return Err(e.into());
        }
    };

    let status = response.status();
    if !status.is_success() {
        let reason = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        log::error!(
            "Failed to send Gateway message with error: {reason}, response code: {}",
            status.as_u16()
        );
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            reason,
        });
    }

    log::debug!("Gateway message successfully sent");
    Ok(())
}

pub fn dispatch(client: Client, message: GatewayMessage) -> JoinHandle<Result<()>> {
    tokio::spawn(async move { send(&client, &message).await })
}
