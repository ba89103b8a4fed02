use crate::infra::config::{Config, ConfigParams, Settings};
use crate::infra::mcp::{self, ToolBridge};

/// Startup sequence for the stdio bridge. Strictly sequential; any failure
/// here propagates and aborts the process.
pub async fn run_bridge() -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    // Everything optional stays absent; the bridge never prompts.
    let params = ConfigParams::default();
    let config = Config::new(settings, params, cwd);

    let registry = config.create_tool_registry()?;
    let bridge = ToolBridge::new(&registry, config.version());

    tracing::info!(
        tools = registry.len(),
        interactive = config.is_interactive(),
        "BOOT quill-mcp-bridge (stdio)"
    );

    mcp::serve_stdio(bridge).await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

/// Shared setup for the non-serving admin commands.
pub fn load_config() -> anyhow::Result<Config> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    Ok(Config::new(settings, ConfigParams::default(), cwd))
}
