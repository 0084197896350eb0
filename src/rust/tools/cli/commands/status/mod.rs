#![cfg(feature = "cli")]

use anyhow::{Context, Result};
use clap::Args;

use crate::tools::cli::state::{CliContext, EngineArgs};

#[derive(Debug, Clone, Args)]
pub struct StatusCommand {
    /// Unlock the audio context before reporting
    #[arg(long, default_value_t = false)]
    pub unlock: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Prints only JSON so the output can be piped
pub async fn execute(command: StatusCommand, ctx: &CliContext) -> Result<()> {
    let cli_engine = ctx.build_engine(&command.engine, false)?;
    let engine = &cli_engine.engine;

    if command.unlock {
        engine.unlock().await;
    }

    let status = serde_json::to_string_pretty(&engine.status())
        .context("failed to serialize engine status")?;
    println!("{status}");
    Ok(())
}
