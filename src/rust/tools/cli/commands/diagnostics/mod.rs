#![cfg(feature = "cli")]

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::tools::cli::io::write_output;
use crate::tools::cli::state::{CliContext, EngineArgs};

#[derive(Debug, Clone, Args)]
pub struct DiagnosticsCommand {
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also warm up the common chord clips
    #[arg(long, default_value_t = false)]
    pub preload: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub async fn execute(command: DiagnosticsCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();
    // Stdout carries the report, so events are only echoed when writing to a file
    let cli_engine = ctx.build_engine(&command.engine, command.output.is_some())?;
    let engine = &cli_engine.engine;

    let mode = engine.auto_detect_mode();
    let unlocked = engine.unlock().await;
    if command.preload {
        engine.preload_common();
    }

    let report = engine.export_diagnostics();
    match &command.output {
        Some(path) => {
            write_output(path, report.as_bytes())?;
            logger.log_with_details(
                crate::tools::logger::LogLevel::Success,
                format!("Diagnostics written to {}", path.display()),
                [
                    format!("backend: {}", mode.label()),
                    format!("unlocked: {unlocked}"),
                ],
            );
        }
        None => println!("{report}"),
    }
    Ok(())
}
