#![cfg(feature = "cli")]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;

use crate::engine::audio::renderer::render_clip;
use crate::engine::chords::ChordName;
use crate::tools::cli::io::write_output;
use crate::tools::cli::state::{CliContext, EngineArgs};
use crate::utils::wav_parser::inspect_wav;

#[derive(Debug, Clone, Args)]
pub struct RenderCommand {
    /// Chord name to render ("Am7", "C major")
    pub chord: String,

    /// Destination WAV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Clip length in seconds (kept between 1.5 and 2)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Octave of the chord root (defaults to the config value)
    #[arg(long)]
    pub octave: Option<i8>,

    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,
}

/// Rendering needs no audio device, so no engine is built
pub fn execute(command: RenderCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();
    let args = EngineArgs {
        config_dir: command.config_dir.clone(),
        ..EngineArgs::default()
    };
    let mut config = ctx.load_config(&args)?;
    if let Some(duration) = command.duration {
        config.clip.duration_secs = duration;
    }

    let chord = ChordName::parse(&command.chord)
        .with_context(|| format!("cannot render {:?}", command.chord))?;
    let octave = command.octave.unwrap_or(config.clip.root_octave);
    let notes = chord.notes(octave);
    let frequencies = chord.frequencies(octave);

    let clip = render_clip(&command.chord, &frequencies, config.clip.duration())?;
    write_output(&command.output, &clip.bytes)?;

    let info = inspect_wav(&clip.bytes).map_err(|e| anyhow!(e))?;
    logger.log_with_details(
        crate::tools::logger::LogLevel::Success,
        format!("Rendered {} to {}", command.chord, command.output.display()),
        [
            format!("notes: {}", notes.join(" ")),
            format!(
                "{} Hz, {} bit, {:.2}s",
                info.sample_rate,
                info.bits_per_sample,
                info.duration_secs()
            ),
        ],
    );
    Ok(())
}
