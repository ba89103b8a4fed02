use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::core::error::BridgeError;
use crate::core::tool::Tool;
use crate::infra::runtime::limits;
use crate::tools::fs::{ListDirectoryTool, ReadFileTool};
use crate::tools::registry::ToolRegistry;
use crate::tools::web::WebFetchTool;

pub const SETTINGS_FILE: &str = "quill.toml";

/// Merged settings: defaults, overlaid by `quill.toml` from the working
/// directory, overlaid by `QUILL_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workspace: WorkspaceSettings,
    pub http: HttpSettings,
    pub tools: ToolSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
            timeout_ms: 6_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub exclude: Vec<String>,
    pub web: WebToolSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebToolSettings {
    pub max_response_bytes: usize,
}

impl Default for WebToolSettings {
    fn default() -> Self {
        Self {
            max_response_bytes: 100_000,
        }
    }
}

impl Settings {
    pub fn load(dir: &Path) -> Result<Self, BridgeError> {
        let path = dir.join(SETTINGS_FILE);
        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|source| BridgeError::SettingsParse {
                path: path.clone(),
                source,
            })?
        } else {
            Settings::default()
        };
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("QUILL_WORKSPACE_ROOT") {
            if !root.trim().is_empty() {
                self.workspace.root = Some(PathBuf::from(root));
            }
        }
        if let Ok(ms) = std::env::var("QUILL_HTTP_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                self.http.timeout_ms = ms;
            }
        }
        if let Ok(list) = std::env::var("QUILL_TOOL_EXCLUDE") {
            self.tools.exclude.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned),
            );
        }
    }
}

/// Options for building a [`Config`]. Everything optional stays absent by
/// default; the bridge never runs interactively.
#[derive(Debug, Clone, Default)]
pub struct ConfigParams {
    pub workspace_root: Option<PathBuf>,
    pub version: Option<String>,
    pub interactive: bool,
}

/// Runtime configuration: the single source of the tool registry and of
/// version information.
pub struct Config {
    settings: Settings,
    params: ConfigParams,
    cwd: PathBuf,
}

impl Config {
    pub fn new(settings: Settings, params: ConfigParams, cwd: PathBuf) -> Self {
        Self {
            settings,
            params,
            cwd,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_interactive(&self) -> bool {
        self.params.interactive
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.params
            .workspace_root
            .clone()
            .or_else(|| self.settings.workspace.root.clone())
            .unwrap_or_else(|| self.cwd.clone())
    }

    pub fn version(&self) -> Option<String> {
        self.params
            .version
            .clone()
            .or_else(|| Some(env!("CARGO_PKG_VERSION").to_owned()))
    }

    /// Builds the registry of built-in tools, honoring the exclude list.
    pub fn create_tool_registry(&self) -> Result<ToolRegistry, BridgeError> {
        let root = self.workspace_root();
        let client = limits::make_http_client(&self.settings.http)?;
        let builtins: Vec<Arc<dyn Tool>> = vec![
            Arc::new(ReadFileTool::new(root.clone())),
            Arc::new(ListDirectoryTool::new(root)),
            Arc::new(WebFetchTool::new(
                client,
                self.settings.tools.web.max_response_bytes,
            )),
        ];

        let mut registry = ToolRegistry::new();
        for tool in builtins {
            if self.settings.tools.exclude.iter().any(|n| n == tool.name()) {
                tracing::debug!(tool = %tool.name(), "tool excluded by settings");
                continue;
            }
            registry.register(tool);
        }
        Ok(registry)
    }
}
