use time::OffsetDateTime;
use url::Url;

use crate::{constants::NANOTONS_PER_TON, error::Error};

pub fn unix_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub fn manifest_link(app_url: &str, manifest_file_name: &str) -> String {
    format!("{}/{}", app_url.trim_end_matches('/'), manifest_file_name)
}

/// Percent-encodes characters that are not allowed in a URI, keeps the
/// reserved ones. Input that does not parse as a URL is returned as is.
pub fn escape_uri(input: &str) -> String {
    match Url::parse(input.trim()) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::warn!("deep link is not a valid url ({e}), opening it unescaped");
            input.to_string()
        }
    }
}

/// TON to nanotons, rounded to the nearest nanoton.
pub fn to_nanotons(amount: f64) -> Result<u64, Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    let nanotons = (amount * NANOTONS_PER_TON).round();
    if nanotons > u64::MAX as f64 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(nanotons as u64)
}

pub fn addresses_match(recipient: &str, own: &str) -> bool {
    let own = own.trim();
    !own.is_empty() && recipient.trim() == own
}
