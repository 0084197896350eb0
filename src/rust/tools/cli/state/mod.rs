#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::engine::audio::AudioEngine;
use crate::engine::host::native::NativeHost;
use crate::engine::host::{AudioHost, RecordingHost, RecordingScript};
use crate::platform::config::EngineConfig;
use crate::shared::diagnostics::Verbosity;
use crate::tools::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    #[default]
    Auto,
    Live,
    Clip,
}

/// Options shared by every command that builds an engine
#[derive(Debug, Clone, Default, Args)]
pub struct EngineArgs {
    /// Directory holding strumkit.toml or strumkit.json (defaults to the current directory)
    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,

    /// Backend selection
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// Record what would be played instead of opening an audio device
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Echo every diagnostics event
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Echo errors only
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Engine plus the recording host behind it when running dry
pub struct CliEngine {
    pub engine: AudioEngine,
    pub recording: Option<Rc<RecordingHost>>,
}

#[derive(Clone)]
pub struct CliContext {
    logger: Arc<Logger>,
}

impl CliContext {
    pub fn new() -> Self {
        Self {
            logger: Arc::new(Logger::new()),
        }
    }

    pub fn logger(&self) -> Arc<Logger> {
        Arc::clone(&self.logger)
    }

    pub fn load_config(&self, args: &EngineArgs) -> Result<EngineConfig> {
        let root = match &args.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("failed to read the current directory")?,
        };
        let mut config = EngineConfig::load(&root)
            .with_context(|| format!("failed to load config from {}", root.display()))?;

        if args.verbose {
            config.diagnostics.verbosity = Verbosity::Verbose;
        } else if args.quiet {
            config.diagnostics.verbosity = Verbosity::Quiet;
        }
        Ok(config)
    }

    /// Build an engine on the native host (or a recording host for dry runs).
    /// `echo` routes diagnostics through the logger.
    pub fn build_engine(&self, args: &EngineArgs, echo: bool) -> Result<CliEngine> {
        let config = self.load_config(args)?;

        let recording = args
            .dry_run
            .then(|| Rc::new(RecordingHost::with_tokio(RecordingScript::default())));
        let host: Rc<dyn AudioHost> = match &recording {
            Some(recording) => recording.clone(),
            None => Rc::new(NativeHost::new()),
        };

        let engine = AudioEngine::new(host, config);
        if echo {
            engine.diagnostics().set_echo(self.logger.echo());
        }
        match args.mode {
            ModeArg::Auto => {}
            ModeArg::Live => {
                engine.force_live_mode();
            }
            ModeArg::Clip => {
                engine.force_clip_mode();
            }
        }

        Ok(CliEngine { engine, recording })
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
