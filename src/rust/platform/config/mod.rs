use std::time::Duration;

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::audio::synth::Waveform;
use crate::engine::host::{GraphOptions, LatencyHint};
use crate::shared::diagnostics::Verbosity;

pub const CONFIG_FILE_STEM: &str = "strumkit";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub unlock: UnlockSection,
    pub live: LiveSection,
    pub clip: ClipSection,
    pub diagnostics: DiagnosticsSection,
    pub progression: ProgressionSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggressiveness {
    /// Aggressive on restricted environments, standard elsewhere
    #[default]
    Auto,
    Standard,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockSection {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub in_flight_timeout_ms: u64,
    pub resume_timeout_ms: u64,
    pub playback_resume_timeout_ms: u64,
    pub test_tone_timeout_ms: u64,
    pub settle_ms: u64,
    pub aggressive_resume_attempts: u32,
    pub aggressiveness: Aggressiveness,
    /// Skip user-agent detection and force the restricted verdict
    pub restricted_override: Option<bool>,
    pub sample_rate: u32,
    pub latency_hint: LatencyHint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSection {
    pub duration_secs: f64,
    pub strum_delay_secs: f64,
    pub strum_volume: f32,
    pub chord_volume: f32,
    pub attack_secs: f64,
    pub waveform: Waveform,
    pub lowpass: bool,
    pub await_completion: bool,
    pub completion_timeout_ms: u64,
    /// Octave used when a chord name is voiced on the live backend
    pub voicing_octave: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSection {
    pub duration_secs: f64,
    pub pool_size: usize,
    pub max_pooled_keys: usize,
    pub volume: f32,
    pub root_octave: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSection {
    pub capacity: usize,
    pub verbosity: Verbosity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSection {
    pub gap_ms: u64,
}

impl Default for UnlockSection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_timeout_ms: 8_000,
            in_flight_timeout_ms: 10_000,
            resume_timeout_ms: 3_000,
            playback_resume_timeout_ms: 2_000,
            test_tone_timeout_ms: 2_000,
            settle_ms: 100,
            aggressive_resume_attempts: 5,
            aggressiveness: Aggressiveness::Auto,
            restricted_override: None,
            sample_rate: 44_100,
            latency_hint: LatencyHint::Interactive,
        }
    }
}

impl Default for LiveSection {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            strum_delay_secs: 0.08,
            strum_volume: 0.1,
            chord_volume: 0.08,
            attack_secs: 0.02,
            waveform: Waveform::Sawtooth,
            lowpass: true,
            await_completion: false,
            completion_timeout_ms: 3_000,
            voicing_octave: 3,
        }
    }
}

impl Default for ClipSection {
    fn default() -> Self {
        Self {
            duration_secs: 1.5,
            pool_size: 3,
            max_pooled_keys: 32,
            volume: 0.7,
            root_octave: 4,
        }
    }
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            capacity: 200,
            verbosity: Verbosity::Normal,
        }
    }
}

impl Default for ProgressionSection {
    fn default() -> Self {
        Self { gap_ms: 1_500 }
    }
}

impl UnlockSection {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn in_flight_timeout(&self) -> Duration {
        Duration::from_millis(self.in_flight_timeout_ms)
    }

    pub fn resume_timeout(&self) -> Duration {
        Duration::from_millis(self.resume_timeout_ms)
    }

    pub fn playback_resume_timeout(&self) -> Duration {
        Duration::from_millis(self.playback_resume_timeout_ms)
    }

    pub fn test_tone_timeout(&self) -> Duration {
        Duration::from_millis(self.test_tone_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            sample_rate: self.sample_rate.max(8_000),
            latency_hint: self.latency_hint,
        }
    }
}

impl LiveSection {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}

impl ClipSection {
    /// Clips are kept between 1.5 and 2 seconds
    pub fn duration(&self) -> f64 {
        self.duration_secs.clamp(1.5, 2.0)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size.max(1)
    }

    pub fn max_pooled_keys(&self) -> usize {
        self.max_pooled_keys.max(1)
    }
}

impl DiagnosticsSection {
    pub fn capacity(&self) -> usize {
        self.capacity.max(1)
    }
}

impl ProgressionSection {
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid JSON config")
    }

    /// Load `strumkit.toml` or `strumkit.json` from `root`, then from the
    /// user config directory. No file means defaults.
    #[cfg(feature = "cli")]
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        match find_config(root.as_ref()) {
            Some(path) => load_config_by_path(&path),
            None => Ok(EngineConfig::default()),
        }
    }
}

#[cfg(feature = "cli")]
fn find_config(root: &Path) -> Option<PathBuf> {
    let mut dirs_to_check = vec![root.to_path_buf()];
    if let Some(user_dir) = dirs::config_dir() {
        dirs_to_check.push(user_dir.join(CONFIG_FILE_STEM));
    }

    // TOML wins over JSON when both exist
    dirs_to_check.iter().find_map(|dir| {
        ["toml", "json"]
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_FILE_STEM}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(feature = "cli")]
fn load_config_by_path(path: &Path) -> Result<EngineConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&raw).with_context(|| format!("invalid TOML config: {}", path.display()))
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON config: {}", path.display()))
    }
}

#[cfg(test)]
#[path = "test_config.rs"]
mod tests;
