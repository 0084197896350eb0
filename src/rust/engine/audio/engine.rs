//! Public entry point: one `AudioEngine` per session
//!
//! Wires the context manager, both backends and the dispatcher around a
//! single host and diagnostics log. Every public playback call answers with a
//! `bool`; the reason for a `false` is in the diagnostics log.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::context::{ContextManager, ContextSnapshot};
use super::dispatcher::{BackendMode, HybridDispatcher};
use super::environment::{Capabilities, EnvironmentProbe};
use super::playback::{ClipBackend, ClipPoolStats, ClipSource, LiveBackend};
use super::request::ChordRequest;
use crate::engine::chords::{ChordName, FretPosition, positions_to_notes};
use crate::engine::host::{AudioHost, ContextState};
use crate::platform::config::EngineConfig;
use crate::shared::debugger::DebugTimer;
use crate::shared::diagnostics::Diagnostics;

/// Chords warmed up by `preload_common`
pub const COMMON_CHORDS: [&str; 9] = ["C", "G", "Am", "F", "D", "Em", "A", "E", "Dm"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum PlayTarget {
    Notes(Vec<String>),
    Frequencies(Vec<f32>),
    Chord(String),
}

impl PlayTarget {
    pub fn describe(&self) -> String {
        match self {
            PlayTarget::Notes(notes) => notes.join(" "),
            PlayTarget::Frequencies(freqs) => format!("{freqs:?} Hz"),
            PlayTarget::Chord(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayOptions {
    pub strum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub session_id: String,
    pub backend_mode: BackendMode,
    pub forced_mode: bool,
    pub context_state: ContextState,
    pub is_unlocked: bool,
    pub pooled_key_count: usize,
    pub pooled_player_count: usize,
    pub transient_player_count: usize,
    pub max_pooled_keys: usize,
    /// Scheduled live voices cannot be cut short
    pub live_stop_supported: bool,
    pub capabilities: Capabilities,
    pub context: ContextSnapshot,
    pub diagnostics_entries: usize,
}

pub struct AudioEngine {
    host: Rc<dyn AudioHost>,
    config: EngineConfig,
    diagnostics: Rc<Diagnostics>,
    probe: Rc<EnvironmentProbe>,
    context: ContextManager,
    dispatcher: HybridDispatcher,
    session_id: String,
}

impl AudioEngine {
    pub fn new(host: Rc<dyn AudioHost>, config: EngineConfig) -> Self {
        let diagnostics = Rc::new(Diagnostics::new(
            config.diagnostics.capacity(),
            config.diagnostics.verbosity,
        ));
        Self::with_diagnostics(host, config, diagnostics)
    }

    /// Same as `new`, sharing a log the caller already holds (and may have
    /// attached an echo to)
    pub fn with_diagnostics(
        host: Rc<dyn AudioHost>,
        config: EngineConfig,
        diagnostics: Rc<Diagnostics>,
    ) -> Self {
        let probe = Rc::new(EnvironmentProbe::new(
            host.clone(),
            diagnostics.clone(),
            config.unlock.restricted_override,
        ));
        let context = ContextManager::new(
            host.clone(),
            config.unlock.clone(),
            diagnostics.clone(),
            probe.clone(),
        );
        let live = Rc::new(LiveBackend::new(
            host.clone(),
            context.clone(),
            probe.clone(),
            diagnostics.clone(),
            config.live.clone(),
        ));
        let clip = Rc::new(ClipBackend::new(
            host.clone(),
            probe.clone(),
            diagnostics.clone(),
            config.clip.clone(),
        ));
        let dispatcher = HybridDispatcher::new(live, clip, diagnostics.clone());
        let session_id = uuid::Uuid::new_v4().to_string();

        diagnostics.info_with("ENGINE", "Audio engine created", &json!({ "sessionId": session_id }));

        Self {
            host,
            config,
            diagnostics,
            probe,
            context,
            dispatcher,
            session_id,
        }
    }

    pub fn host(&self) -> &Rc<dyn AudioHost> {
        &self.host
    }

    pub fn diagnostics(&self) -> &Rc<Diagnostics> {
        &self.diagnostics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> BackendMode {
        self.dispatcher.mode()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn play(&self, target: &PlayTarget, options: PlayOptions) -> bool {
        let timer = DebugTimer::new("play", self.host.now_ms());
        let played = match target {
            PlayTarget::Chord(name) => self.play_chord(name, options).await,
            PlayTarget::Notes(notes) => {
                let request = ChordRequest::from_names(notes.iter().cloned(), options.strum);
                self.dispatcher.play(&request).await
            }
            PlayTarget::Frequencies(freqs) => {
                let request = ChordRequest::from_frequencies(freqs.clone(), options.strum);
                self.dispatcher.play(&request).await
            }
        };

        let data = json!({
            "target": target.describe(),
            "strum": options.strum,
            "mode": self.dispatcher.mode(),
            "elapsedMs": timer.elapsed_ms(self.host.now_ms()),
        });
        if played {
            self.diagnostics.info_with("ENGINE", "Play request handled", &data);
        } else {
            self.diagnostics
                .error_with("ENGINE", "Play request produced no sound", &data);
        }
        played
    }

    /// Clip by chord name first, then the dispatcher with the chord's notes.
    /// A forced mode skips the clip shortcut.
    async fn play_chord(&self, name: &str, options: PlayOptions) -> bool {
        let clip = self.dispatcher.clip();
        if !self.dispatcher.is_forced()
            && clip.is_supported()
            && clip.play(&ClipSource::ChordName(name.to_string())).await
        {
            return true;
        }

        let chord = match ChordName::parse(name) {
            Ok(chord) => chord,
            Err(e) => {
                self.diagnostics.error_with(
                    "ENGINE",
                    "Chord name could not be resolved",
                    &json!({ "chord": name, "error": e.to_string() }),
                );
                return false;
            }
        };

        let request = ChordRequest::from_names(
            chord.notes(self.config.live.voicing_octave),
            options.strum,
        )
        .with_root(name.trim());
        self.dispatcher.play(&request).await
    }

    /// Plays a guitar fingering in standard tuning
    pub async fn play_positions(&self, positions: &[FretPosition], options: PlayOptions) -> bool {
        let mapped = positions_to_notes(positions);
        if !mapped.dropped.is_empty() {
            self.diagnostics.warn_with(
                "ENGINE",
                "Fret positions outside the note table were dropped",
                &mapped.dropped,
            );
        }
        if mapped.notes.is_empty() {
            self.diagnostics
                .error_with("ENGINE", "Fingering has no playable strings", &mapped);
            return false;
        }

        self.play(&PlayTarget::Notes(mapped.notes), options).await
    }

    pub fn preload(&self, key: &str) -> bool {
        match self
            .dispatcher
            .clip()
            .preload(&ClipSource::ChordName(key.to_string()))
        {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics.warn_with(
                    "ENGINE",
                    "Preload failed",
                    &json!({ "key": key, "error": e.to_string() }),
                );
                false
            }
        }
    }

    /// Returns how many of the common chords were preloaded
    pub fn preload_common(&self) -> usize {
        let loaded = COMMON_CHORDS
            .iter()
            .filter(|chord| self.preload(chord))
            .count();
        self.diagnostics.info_with(
            "ENGINE",
            "Common chords preloaded",
            &json!({ "loaded": loaded, "requested": COMMON_CHORDS.len() }),
        );
        loaded
    }

    pub fn stop_all(&self) -> usize {
        self.dispatcher.stop_all()
    }

    pub async fn unlock(&self) -> bool {
        self.context.unlock().await
    }

    pub async fn suspend(&self) -> bool {
        self.report("Suspend failed", self.context.suspend().await)
    }

    pub async fn close(&self) -> bool {
        self.report("Close failed", self.context.close().await)
    }

    pub fn force_live_mode(&self) -> BackendMode {
        self.dispatcher.force_live_mode();
        self.dispatcher.mode()
    }

    pub fn force_clip_mode(&self) -> BackendMode {
        self.dispatcher.force_clip_mode();
        self.dispatcher.mode()
    }

    pub fn auto_detect_mode(&self) -> BackendMode {
        self.dispatcher.auto_detect_mode()
    }

    pub fn status(&self) -> EngineStatus {
        let context = self.context.snapshot();
        let pools: ClipPoolStats = self.dispatcher.clip().stats();

        EngineStatus {
            session_id: self.session_id.clone(),
            backend_mode: self.dispatcher.mode(),
            forced_mode: self.dispatcher.is_forced(),
            context_state: context.state,
            is_unlocked: context.is_unlocked,
            pooled_key_count: pools.pooled_keys,
            pooled_player_count: pools.pooled_players,
            transient_player_count: pools.transient_players,
            max_pooled_keys: pools.max_pooled_keys,
            live_stop_supported: false,
            capabilities: self.probe.capabilities(),
            context,
            diagnostics_entries: self.diagnostics.len(),
        }
    }

    /// Device info, status and the whole log as pretty JSON
    pub fn export_diagnostics(&self) -> String {
        let status = self.status();
        match self.diagnostics.export(&self.probe.environment(), &status) {
            Ok(report) => report,
            Err(e) => {
                self.diagnostics.error_with(
                    "ENGINE",
                    "Diagnostics export failed",
                    &json!({ "error": e.to_string() }),
                );
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }

    pub fn clear_diagnostics(&self) {
        self.diagnostics.clear();
    }

    fn report(&self, message: &str, result: super::error::AudioResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics
                    .error_with("CONTEXT", message, &json!({ "error": e.to_string() }));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "test_engine.rs"]
mod tests;
