// Parent `tools` module controls `cli` gating; avoid duplicating crate-level cfg here.
mod commands;
pub mod io;
pub mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::diagnostics::DiagnosticsCommand;
use commands::play::PlayCommand;
use commands::progression::ProgressionCommand;
use commands::render::RenderCommand;
use commands::status::StatusCommand;
use state::CliContext;

#[derive(Parser, Debug)]
#[command(name = "strumkit")]
#[command(
    version,
    about = "🎸 Strumkit – make a sound for this chord, whatever the audio device allows."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play notes, frequencies, a chord name or a fingering
    Play(PlayCommand),
    /// Play a list of chords one after another
    Progression(ProgressionCommand),
    /// Render a chord clip to a WAV file
    Render(RenderCommand),
    /// Print the engine status as JSON
    Status(StatusCommand),
    /// Probe the audio device and export the diagnostics report
    Diagnostics(DiagnosticsCommand),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = CliContext::new();
    // The engine is single-threaded (Rc/RefCell), so everything runs on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Play(command) => commands::play::execute(command, &ctx).await?,
            Commands::Progression(command) => {
                commands::progression::execute(command, &ctx).await?
            }
            Commands::Render(command) => commands::render::execute(command, &ctx)?,
            Commands::Status(command) => commands::status::execute(command, &ctx).await?,
            Commands::Diagnostics(command) => {
                commands::diagnostics::execute(command, &ctx).await?
            }
        }
        Ok(())
    })
}
