use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Untyped argument bag handed to a tool. Tools validate what they need in
/// [`Tool::build`]; nothing is checked up front.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error a tool reports as part of a completed call, as opposed to a
/// [`ToolError`] aborting the call outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultError {
    pub message: String,
}

/// Outcome of an executed invocation. `llm_content` is either plain text or
/// a structured value; when `error` is set the content is ignored by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub llm_content: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolResultError>,
}

impl ToolResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            llm_content: serde_json::Value::String(content.into()),
            error: None,
        }
    }

    pub fn json(content: serde_json::Value) -> Self {
        Self {
            llm_content: content,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            llm_content: serde_json::Value::Null,
            error: Some(ToolResultError {
                message: message.into(),
            }),
        }
    }
}

/// A named capability of the quill CLI. `build` binds an argument bag into a
/// ready-to-run invocation; argument validation happens there.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn build(&self, args: ToolArgs) -> Result<Box<dyn ToolInvocation>, ToolError>;
}

/// An argument-bound instance of a tool. The token is owned by the caller;
/// invocations must not trigger it themselves.
#[async_trait]
pub trait ToolInvocation: Send + Sync + std::fmt::Debug {
    async fn execute(&self, cancel: CancellationToken) -> Result<ToolResult, ToolError>;
}
