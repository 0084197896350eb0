#![cfg(feature = "cli")]

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;

use crate::engine::audio::PlayOptions;
use crate::services::progression::play_progression;
use crate::tools::cli::commands::play::hold_time;
use crate::tools::cli::state::{CliContext, CliEngine, EngineArgs};

#[derive(Debug, Clone, Args)]
pub struct ProgressionCommand {
    /// Chord names in playing order ("C G Am F")
    #[arg(required = true)]
    pub chords: Vec<String>,

    /// Pause between chords in milliseconds (defaults to the config value)
    #[arg(long = "gap-ms")]
    pub gap_ms: Option<u64>,

    /// Stagger note onsets like a strum
    #[arg(long, default_value_t = false)]
    pub strum: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub async fn execute(command: ProgressionCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();
    let CliEngine { engine, recording } = ctx.build_engine(&command.engine, true)?;

    let gap = command
        .gap_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| engine.config().progression.gap());
    let chords: Vec<String> = command
        .chords
        .iter()
        .flat_map(|c| c.split_whitespace())
        .map(str::to_string)
        .collect();

    logger.action(format!(
        "Playing {} chords, {} ms apart",
        chords.len(),
        gap.as_millis()
    ));
    let outcome = play_progression(
        &engine,
        &chords,
        gap,
        PlayOptions {
            strum: command.strum,
        },
    )
    .await;

    for result in outcome.chords.iter().filter(|r| !r.played) {
        logger.warn(format!("No sound for {}", result.chord));
    }
    if outcome.played_count() == 0 {
        bail!("no chord in the progression produced sound");
    }

    if recording.is_none() {
        tokio::time::sleep(hold_time(&engine)).await;
    }
    logger.success(format!(
        "Played {}/{} chords via {}",
        outcome.played_count(),
        outcome.chords.len(),
        engine.mode().label()
    ));
    Ok(())
}
