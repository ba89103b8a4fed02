use std::time::Duration;

use crate::core::error::BridgeError;
use crate::infra::config::HttpSettings;

/// Build the outbound reqwest client with the configured timeouts.
pub fn make_http_client(settings: &HttpSettings) -> Result<reqwest::Client, BridgeError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
        .timeout(Duration::from_millis(settings.timeout_ms))
        .build()?;
    Ok(client)
}
