//! Filesystem tools rooted at the workspace directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::core::tool::{Tool, ToolArgs, ToolError, ToolInvocation, ToolResult};

/// Resolve a user-supplied relative path against the workspace root.
/// Absolute paths and `..` traversal are refused before any I/O happens.
fn resolve_in_root(root: &Path, rel: &str) -> Result<PathBuf, ToolError> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(ToolError::Validation(format!(
            "path must be relative to the workspace: {rel}"
        )));
    }
    if rel_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ToolError::Validation(format!(
            "path escapes the workspace: {rel}"
        )));
    }
    Ok(root.join(rel_path))
}

fn required_str(args: &ToolArgs, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| ToolError::Validation(format!("missing required field: {key}")))
}

pub struct ReadFileTool {
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> Option<&str> {
        Some("Read a UTF-8 text file from the workspace")
    }

    fn build(&self, args: ToolArgs) -> Result<Box<dyn ToolInvocation>, ToolError> {
        let rel = required_str(&args, "path")?;
        let path = resolve_in_root(&self.root, &rel)?;
        Ok(Box::new(ReadFileInvocation { rel, path }))
    }
}

#[derive(Debug)]
struct ReadFileInvocation {
    rel: String,
    path: PathBuf,
}

#[async_trait]
impl ToolInvocation for ReadFileInvocation {
    async fn execute(&self, _cancel: CancellationToken) -> Result<ToolResult, ToolError> {
        tracing::debug!(path = %self.rel, "read_file");
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(ToolResult::text(content)),
            Err(e) => Ok(ToolResult::error(format!(
                "cannot read {}: {e}",
                self.rel
            ))),
        }
    }
}

pub struct ListDirectoryTool {
    root: PathBuf,
}

impl ListDirectoryTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> Option<&str> {
        Some("List the entries of a workspace directory")
    }

    fn build(&self, args: ToolArgs) -> Result<Box<dyn ToolInvocation>, ToolError> {
        let rel = match args.get("path") {
            Some(v) => v
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| ToolError::Validation("field 'path' must be a string".into()))?,
            None => ".".to_owned(),
        };
        let path = resolve_in_root(&self.root, &rel)?;
        Ok(Box::new(ListDirectoryInvocation { rel, path }))
    }
}

#[derive(Serialize)]
struct DirEntryInfo {
    name: String,
    kind: &'static str,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

#[derive(Debug)]
struct ListDirectoryInvocation {
    rel: String,
    path: PathBuf,
}

#[async_trait]
impl ToolInvocation for ListDirectoryInvocation {
    async fn execute(&self, _cancel: CancellationToken) -> Result<ToolResult, ToolError> {
        tracing::debug!(path = %self.rel, "list_directory");
        let mut reader = match tokio::fs::read_dir(&self.path).await {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "cannot list {}: {e}",
                    self.rel
                )))
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            let kind = if meta.is_dir() {
                "dir"
            } else if meta.is_file() {
                "file"
            } else {
                "other"
            };
            let modified = meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                size: meta.len(),
                modified,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let entries = serde_json::to_value(entries)
            .map_err(|e| ToolError::Execution(format!("encode listing: {e}")))?;
        Ok(ToolResult::json(json!({ "entries": entries })))
    }
}
