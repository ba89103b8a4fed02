//! Remote fetch tool backed by the shared outbound HTTP client.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::tool::{Tool, ToolArgs, ToolError, ToolInvocation, ToolResult};

pub struct WebFetchTool {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl WebFetchTool {
    pub fn new(client: reqwest::Client, max_response_bytes: usize) -> Self {
        Self {
            client,
            max_response_bytes,
        }
    }
}

impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> Option<&str> {
        Some("Fetch the body of an http(s) URL")
    }

    fn build(&self, args: ToolArgs) -> Result<Box<dyn ToolInvocation>, ToolError> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ToolError::Validation("missing required field: url".into()))?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::Validation(format!(
                "only http(s) URLs are supported: {url}"
            )));
        }
        Ok(Box::new(WebFetchInvocation {
            client: self.client.clone(),
            url,
            max_response_bytes: self.max_response_bytes,
        }))
    }
}

#[derive(Debug)]
struct WebFetchInvocation {
    client: reqwest::Client,
    url: String,
    max_response_bytes: usize,
}

#[async_trait]
impl ToolInvocation for WebFetchInvocation {
    async fn execute(&self, cancel: CancellationToken) -> Result<ToolResult, ToolError> {
        tracing::debug!(url = %self.url, "web_fetch");
        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ToolError::Execution(format!("fetch of {} cancelled", self.url)));
            }
            response = self.client.get(&self.url).send() => response,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("request failed: {e}"))),
        };
        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::error(format!(
                "{} returned HTTP {status}",
                self.url
            )));
        }

        match response.text().await {
            Ok(mut body) => {
                if body.len() > self.max_response_bytes {
                    let mut cut = self.max_response_bytes;
                    while !body.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    body.truncate(cut);
                }
                Ok(ToolResult::text(body))
            }
            Err(e) => Ok(ToolResult::error(format!("failed to read body: {e}"))),
        }
    }
}
