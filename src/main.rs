use std::process::ExitCode;

use quill_mcp_bridge::{cli, infra};

#[tokio::main]
async fn main() -> ExitCode {
    infra::logging::init();
    cli::run().await
}
