use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::infra::boot;

#[derive(Parser)]
#[command(name = "quill-mcp-bridge")]
#[command(about = "Expose the quill CLI's built-in tools over MCP stdio")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the tool bridge on stdin/stdout (default when omitted)
    Serve,
    /// Print the tools the bridge would expose
    Tools,
    /// Validate configuration without serving
    Check,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => match boot::run_bridge().await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Bridge failed: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Tools => match list_tools() {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Could not list tools: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Check => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn list_tools() -> anyhow::Result<()> {
    let config = boot::load_config()?;
    let registry = config.create_tool_registry()?;
    if registry.is_empty() {
        println!("(no tools registered)");
        return Ok(());
    }
    for tool in registry.all() {
        match tool.description() {
            Some(d) if !d.is_empty() => println!("{:<18} {d}", tool.name()),
            _ => println!("{}", tool.name()),
        }
    }
    Ok(())
}

fn validate_config() -> anyhow::Result<()> {
    let config = boot::load_config()?;
    let root = config.workspace_root();
    if !root.is_dir() {
        anyhow::bail!("workspace root is not a directory: {}", root.display());
    }
    config.create_tool_registry()?;
    Ok(())
}
