//! MCP server integration (stdio) for the quill CLI.
//!
//! Exposes every tool in the registry as a protocol endpoint of the same
//! name. The bridge owns no tool logic: a call is forwarded through the
//! tool's `build` → `execute` path and the outcome is mapped to the
//! protocol response shape. Nothing a tool does can take the server down.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{serve_server, ErrorData as McpError, ServerHandler};
use tokio_util::sync::CancellationToken;

use crate::core::content;
use crate::core::tool::{Tool, ToolError};
use crate::tools::registry::ToolRegistry;

pub const SERVER_NAME: &str = "quill";

/// Used when version resolution yields nothing.
const FALLBACK_VERSION: &str = "unknown";

/// TODO: derive per-tool input schemas once the tools publish them; until
/// then every endpoint advertises an open, unconstrained object.
fn open_object_schema() -> Arc<JsonObject> {
    let mut schema = JsonObject::new();
    schema.insert("type".into(), serde_json::Value::String("object".into()));
    Arc::new(schema)
}

/// Single normalization point for errors escaping a tool's build/execute.
fn normalize_error(err: &ToolError) -> String {
    err.to_string()
}

pub struct ToolBridge {
    tools: Vec<Arc<dyn Tool>>,
    listing: Vec<McpTool>,
    identity: Implementation,
}

impl ToolBridge {
    /// Captures one endpoint per registry tool, in registry order. Emits a
    /// diagnostic line per registered tool; an empty registry emits none.
    pub fn new(registry: &ToolRegistry, version: Option<String>) -> Self {
        let version = version.unwrap_or_else(|| FALLBACK_VERSION.to_string());

        let mut tools = Vec::with_capacity(registry.len());
        let mut listing = Vec::with_capacity(registry.len());
        for tool in registry.all() {
            let description = match tool.description() {
                Some(d) if !d.is_empty() => d.to_string(),
                _ => format!("A tool from the {SERVER_NAME} CLI: {}", tool.name()),
            };
            listing.push(McpTool::new(
                tool.name().to_string(),
                description,
                open_object_schema(),
            ));
            tracing::info!(tool = %tool.name(), "registered tool");
            tools.push(tool.clone());
        }

        Self {
            tools,
            listing,
            identity: Implementation {
                name: SERVER_NAME.into(),
                version,
                ..Default::default()
            },
        }
    }

    pub fn tool_entries(&self) -> &[McpTool] {
        &self.listing
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Resolve the endpoint and run its callback. Unknown names are a
    /// protocol error; everything a resolved tool does maps to a response.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .find(name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {name}"), None))?;
        Ok(Self::invoke(tool.as_ref(), arguments.unwrap_or_default()).await)
    }

    async fn invoke(tool: &dyn Tool, args: JsonObject) -> CallToolResult {
        metrics::counter!("bridge_tool_calls_total", "tool" => tool.name().to_string())
            .increment(1);

        let outcome = match tool.build(args) {
            // The token is wired through but never triggered here: the
            // bridge offers no caller-driven cancellation.
            Ok(invocation) => invocation.execute(CancellationToken::new()).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                if let Some(err) = result.error {
                    tracing::debug!(tool = %tool.name(), error = %err.message, "tool reported failure");
                    metrics::counter!("bridge_tool_errors_total", "tool" => tool.name().to_string())
                        .increment(1);
                    CallToolResult::error(vec![Content::text(format!("Error: {}", err.message))])
                } else {
                    CallToolResult::success(vec![Content::text(content::render(
                        &result.llm_content,
                    ))])
                }
            }
            Err(e) => {
                let message = normalize_error(&e);
                tracing::warn!(tool = %tool.name(), error = %message, "tool failed");
                metrics::counter!("bridge_tool_errors_total", "tool" => tool.name().to_string())
                    .increment(1);
                CallToolResult::error(vec![Content::text(format!("Internal Error: {message}"))])
            }
        }
    }
}

impl ServerHandler for ToolBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: self.identity.clone(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.listing.clone(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}

/// Serve the bridge over stdin/stdout until the peer disconnects. Stdout
/// carries protocol frames only; diagnostics stay on stderr.
pub async fn serve_stdio(bridge: ToolBridge) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let running = serve_server(bridge, (stdin, stdout)).await?;
    running.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::{ToolArgs, ToolInvocation, ToolResult};
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};

    /// Scripted tool covering every outcome the bridge has to map.
    enum Behavior {
        Text(&'static str),
        Json(JsonValue),
        ReportError(&'static str),
        FailBuild(&'static str),
        FailExecute(&'static str),
        EchoArgs,
    }

    struct FakeTool {
        name: &'static str,
        description: Option<&'static str>,
        behavior: Behavior,
    }

    #[derive(Debug)]
    struct FakeInvocation {
        result: Result<ToolResult, ToolError>,
    }

    impl Tool for FakeTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> Option<&str> {
            self.description
        }
        fn build(&self, args: ToolArgs) -> Result<Box<dyn ToolInvocation>, ToolError> {
            let result = match &self.behavior {
                Behavior::Text(s) => Ok(ToolResult::text(*s)),
                Behavior::Json(v) => Ok(ToolResult::json(v.clone())),
                Behavior::ReportError(m) => Ok(ToolResult::error(*m)),
                Behavior::FailBuild(m) => return Err(ToolError::Validation((*m).into())),
                Behavior::FailExecute(m) => Err(ToolError::Execution((*m).into())),
                Behavior::EchoArgs => Ok(ToolResult::json(JsonValue::Object(args))),
            };
            Ok(Box::new(FakeInvocation { result }))
        }
    }

    #[async_trait]
    impl ToolInvocation for FakeInvocation {
        async fn execute(&self, _cancel: CancellationToken) -> Result<ToolResult, ToolError> {
            match &self.result {
                Ok(r) => Ok(r.clone()),
                Err(ToolError::Execution(m)) => Err(ToolError::Execution(m.clone())),
                Err(ToolError::Validation(m)) => Err(ToolError::Validation(m.clone())),
                Err(ToolError::Io(e)) => Err(ToolError::Execution(e.to_string())),
            }
        }
    }

    fn registry_of(tools: Vec<FakeTool>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(Arc::new(tool));
        }
        registry
    }

    fn bridge_with(behavior: Behavior) -> ToolBridge {
        let registry = registry_of(vec![FakeTool {
            name: "subject",
            description: Some("tool under test"),
            behavior,
        }]);
        ToolBridge::new(&registry, Some("1.2.3".into()))
    }

    fn response_json(result: &CallToolResult) -> JsonValue {
        serde_json::to_value(result).unwrap()
    }

    fn is_flagged_error(v: &JsonValue) -> bool {
        v["isError"].as_bool().unwrap_or(false)
    }

    #[tokio::test]
    async fn every_tool_is_exposed_exactly_once() {
        let registry = registry_of(vec![
            FakeTool {
                name: "alpha",
                description: Some("first"),
                behavior: Behavior::Text("a"),
            },
            FakeTool {
                name: "beta",
                description: Some("second"),
                behavior: Behavior::Text("b"),
            },
        ]);
        let bridge = ToolBridge::new(&registry, Some("1.2.3".into()));
        let names: Vec<&str> = bridge
            .tool_entries()
            .iter()
            .map(|t| t.name.as_ref())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn text_content_passes_through_verbatim() {
        let bridge = bridge_with(Behavior::Text("hello"));
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["type"], "text");
        assert_eq!(v["content"][0]["text"], "hello");
        assert!(!is_flagged_error(&v));
    }

    #[tokio::test]
    async fn structured_content_is_encoded_to_text() {
        let bridge = bridge_with(Behavior::Json(json!({"a": 1})));
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], r#"{"a":1}"#);
        assert!(!is_flagged_error(&v));
    }

    #[tokio::test]
    async fn reported_failure_gets_the_error_prefix() {
        let bridge = bridge_with(Behavior::ReportError("bad input"));
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], "Error: bad input");
        assert!(is_flagged_error(&v));
    }

    #[tokio::test]
    async fn build_failure_gets_the_internal_error_prefix() {
        let bridge = bridge_with(Behavior::FailBuild("boom"));
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], "Internal Error: Validation error: boom");
        assert!(is_flagged_error(&v));
    }

    #[tokio::test]
    async fn execute_failure_gets_the_internal_error_prefix() {
        let bridge = bridge_with(Behavior::FailExecute("boom"));
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], "Internal Error: Execution error: boom");
        assert!(is_flagged_error(&v));
    }

    #[tokio::test]
    async fn missing_arguments_default_to_an_empty_map() {
        let bridge = bridge_with(Behavior::EchoArgs);
        let result = bridge.dispatch("subject", None).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], "{}");
    }

    #[tokio::test]
    async fn arguments_are_forwarded_untouched() {
        let bridge = bridge_with(Behavior::EchoArgs);
        let mut args = JsonObject::new();
        args.insert("text".into(), json!("value"));
        let result = bridge.dispatch("subject", Some(args)).await.unwrap();
        let v = response_json(&result);
        assert_eq!(v["content"][0]["text"], r#"{"text":"value"}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_protocol_error() {
        let bridge = bridge_with(Behavior::Text("x"));
        let err = bridge.dispatch("does.not.exist", None).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("does.not.exist"));
    }

    #[test]
    fn empty_registry_exposes_nothing() {
        let bridge = ToolBridge::new(&ToolRegistry::new(), Some("1.2.3".into()));
        assert!(bridge.tool_entries().is_empty());
    }

    #[test]
    fn missing_description_gets_a_generated_default() {
        let registry = registry_of(vec![FakeTool {
            name: "undocumented",
            description: None,
            behavior: Behavior::Text("x"),
        }]);
        let bridge = ToolBridge::new(&registry, Some("1.2.3".into()));
        let description = bridge.tool_entries()[0]
            .description
            .as_deref()
            .unwrap()
            .to_string();
        assert!(description.contains("undocumented"));
        assert!(description.contains(SERVER_NAME));
    }

    #[test]
    fn empty_description_gets_a_generated_default() {
        let registry = registry_of(vec![FakeTool {
            name: "blank",
            description: Some(""),
            behavior: Behavior::Text("x"),
        }]);
        let bridge = ToolBridge::new(&registry, Some("1.2.3".into()));
        let description = bridge.tool_entries()[0].description.as_deref().unwrap();
        assert!(description.contains("blank"));
    }

    #[test]
    fn endpoints_advertise_an_open_object_schema() {
        let bridge = bridge_with(Behavior::Text("x"));
        let schema = &bridge.tool_entries()[0].input_schema;
        assert_eq!(schema.get("type").and_then(|v| v.as_str()), Some("object"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn identity_carries_name_and_version() {
        let bridge = bridge_with(Behavior::Text("x"));
        let info = bridge.get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.server_info.version, "1.2.3");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn version_falls_back_to_the_fixed_literal() {
        let bridge = ToolBridge::new(&ToolRegistry::new(), None);
        assert_eq!(bridge.get_info().server_info.version, FALLBACK_VERSION);
    }
}
