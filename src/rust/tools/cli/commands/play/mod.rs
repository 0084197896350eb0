#![cfg(feature = "cli")]

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;

use crate::engine::audio::frequency::parse_note_to_midi;
use crate::engine::audio::{PlayOptions, PlayTarget};
use crate::engine::chords::FretPosition;
use crate::tools::cli::state::{CliContext, CliEngine, EngineArgs};

#[derive(Debug, Clone, Args)]
pub struct PlayCommand {
    /// Note names ("C4 E4 G4"), frequencies in Hz, or a single chord name ("F#m7")
    #[arg(required_unless_present = "frets")]
    pub target: Vec<String>,

    /// Guitar fingering from low E to high E, e.g. "x32010" or "x-3-2-0-1-0"
    #[arg(long, conflicts_with = "target")]
    pub frets: Option<String>,

    /// Stagger note onsets like a strum
    #[arg(long, default_value_t = false)]
    pub strum: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub async fn execute(command: PlayCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();
    let CliEngine { engine, recording } = ctx.build_engine(&command.engine, true)?;
    let options = PlayOptions {
        strum: command.strum,
    };

    let played = match &command.frets {
        Some(shape) => {
            let positions = parse_frets(shape)?;
            logger.action(format!("Playing fingering {shape}"));
            engine.play_positions(&positions, options).await
        }
        None => {
            let target = parse_target(&command.target)?;
            logger.action(format!("Playing {}", target.describe()));
            engine.play(&target, options).await
        }
    };

    if !played {
        bail!("no sound could be produced; run `strumkit diagnostics` for details");
    }

    match recording {
        Some(recording) => {
            let log = recording.log();
            logger.log_with_details(
                crate::tools::logger::LogLevel::Success,
                format!("Dry run via {}", engine.mode().label()),
                [
                    format!("voices scheduled: {}", log.voices.len()),
                    format!("clips triggered: {}", log.clip_plays.len()),
                ],
            );
        }
        None => {
            // Keep the process (and its output stream) alive until the chord rings out
            tokio::time::sleep(hold_time(&engine)).await;
            logger.success(format!("Played via {}", engine.mode().label()));
        }
    }
    Ok(())
}

pub(crate) fn hold_time(engine: &crate::engine::audio::AudioEngine) -> Duration {
    let config = engine.config();
    let secs = config.live.duration_secs.max(config.clip.duration()) + 0.25;
    Duration::from_secs_f64(secs)
}

/// All note names, all numbers, or one chord name
pub fn parse_target(args: &[String]) -> Result<PlayTarget> {
    let words: Vec<String> = args
        .iter()
        .flat_map(|a| a.split([' ', ',']))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        bail!("nothing to play");
    }

    if words.iter().all(|w| parse_note_to_midi(w).is_ok()) {
        return Ok(PlayTarget::Notes(words));
    }

    let numbers: Option<Vec<f32>> = words.iter().map(|w| w.parse::<f32>().ok()).collect();
    if let Some(frequencies) = numbers {
        return Ok(PlayTarget::Frequencies(frequencies));
    }

    Ok(PlayTarget::Chord(args.join(" ")))
}

/// "x32010" or "x-3-2-0-1-0", low E string first
pub fn parse_frets(shape: &str) -> Result<Vec<FretPosition>> {
    let tokens: Vec<&str> = if shape.contains('-') {
        shape.split('-').collect()
    } else {
        shape
            .char_indices()
            .map(|(i, c)| &shape[i..i + c.len_utf8()])
            .collect()
    };
    if tokens.len() != 6 {
        bail!("expected 6 strings in fingering {shape:?}, found {}", tokens.len());
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let string = 6 - i as u8;
            let fret = match token.trim() {
                "x" | "X" => -1,
                value => value
                    .parse::<i8>()
                    .map_err(|_| anyhow::anyhow!("invalid fret {value:?} on string {string}"))?,
            };
            Ok(FretPosition::new(string, fret))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_note_names_become_notes() {
        let target = parse_target(&words(&["C4", "E4", "G4"])).unwrap();
        assert_eq!(target, PlayTarget::Notes(words(&["C4", "E4", "G4"])));
    }

    #[test]
    fn test_numbers_become_frequencies() {
        let target = parse_target(&words(&["220", "277.18"])).unwrap();
        assert_eq!(target, PlayTarget::Frequencies(vec![220.0, 277.18]));
    }

    #[test]
    fn test_anything_else_is_a_chord_name() {
        let target = parse_target(&words(&["C", "major"])).unwrap();
        assert_eq!(target, PlayTarget::Chord("C major".to_string()));
    }

    #[test]
    fn test_compact_and_dashed_fingerings() {
        let compact = parse_frets("x32010").unwrap();
        let dashed = parse_frets("x-3-2-0-1-0").unwrap();
        assert_eq!(compact, dashed);
        assert_eq!(compact[0], FretPosition::new(6, -1));
        assert_eq!(compact[5], FretPosition::new(1, 0));

        assert!(parse_frets("x3201").is_err());
        assert!(parse_frets("x3201q").is_err());
    }
}
