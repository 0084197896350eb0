//! Backend A: oscillator chains scheduled on the live graph

use std::rc::Rc;

use futures::future::join_all;
use serde_json::json;

use crate::engine::audio::context::ContextManager;
use crate::engine::audio::deadline::{Raced, race};
use crate::engine::audio::environment::EnvironmentProbe;
use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::renderer::{plan_live_voices, self_test_voice};
use crate::engine::audio::request::ChordRequest;
use crate::engine::host::{AudioHost, ContextState};
use crate::platform::config::LiveSection;
use crate::shared::debugger::DebugTimer;
use crate::shared::diagnostics::Diagnostics;

pub struct LiveBackend {
    host: Rc<dyn AudioHost>,
    context: ContextManager,
    probe: Rc<EnvironmentProbe>,
    diagnostics: Rc<Diagnostics>,
    config: LiveSection,
}

impl LiveBackend {
    pub fn new(
        host: Rc<dyn AudioHost>,
        context: ContextManager,
        probe: Rc<EnvironmentProbe>,
        diagnostics: Rc<Diagnostics>,
        config: LiveSection,
    ) -> Self {
        Self {
            host,
            context,
            probe,
            diagnostics,
            config,
        }
    }

    /// `true` once every voice is scheduled
    pub async fn play(&self, request: &ChordRequest) -> bool {
        let timer = DebugTimer::new("live playback", self.host.now_ms());
        match self.try_play(request).await {
            Ok(voices) => {
                self.diagnostics.info_with(
                    "LIVE",
                    "Chord playback started",
                    &json!({
                        "notes": request.describe(),
                        "voices": voices,
                        "strum": request.strum,
                        "elapsedMs": timer.elapsed_ms(self.host.now_ms()),
                    }),
                );
                true
            }
            Err(e) => {
                self.diagnostics.error_with(
                    "LIVE",
                    "Live playback failed",
                    &json!({ "notes": request.describe(), "error": e.to_string(), "kind": e.kind() }),
                );
                false
            }
        }
    }

    pub async fn try_play(&self, request: &ChordRequest) -> AudioResult<usize> {
        // Resolve before touching the graph
        let resolved = request.resolve()?;
        if !resolved.dropped.is_empty() {
            self.diagnostics.warn_with(
                "LIVE",
                "Dropped notes missing from the frequency table",
                &resolved.dropped,
            );
        }

        let handle = self.context.get_or_create_context()?;
        let restricted = self.probe.is_restricted();

        if restricted && (!self.context.is_unlocked() || handle.state() != ContextState::Running) {
            self.diagnostics.info("LIVE", "Restricted environment, unlocking before playback");
            if !self.context.unlock().await {
                return Err(self.context.last_error().unwrap_or(AudioError::UnlockTimeout {
                    attempt: self.context.attempt_count(),
                    max_attempts: self.context.max_attempts(),
                }));
            }
        }

        // A failed aggressive unlock may have replaced the graph
        let handle = self.context.get_or_create_context()?;
        match self.context.resume_for_playback(&handle).await {
            Ok(ContextState::Running) => {}
            Ok(ContextState::Suspended) if restricted => {
                self.diagnostics
                    .warn("LIVE", "Graph still suspended, scheduling anyway");
            }
            Ok(state) => {
                return Err(AudioError::PlaybackRejected(format!(
                    "graph is {}",
                    state.label()
                )));
            }
            Err(e) if restricted => {
                self.diagnostics.warn_with(
                    "LIVE",
                    "Playback resume failed, scheduling anyway",
                    &json!({ "error": e.to_string() }),
                );
            }
            Err(e) => return Err(e),
        }

        let graph = handle.graph();
        let voices = plan_live_voices(
            &resolved.frequencies,
            request.strum,
            graph.current_time(),
            &self.config,
        );
        let count = voices.len();

        let mut endings = Vec::with_capacity(count);
        for voice in voices {
            if self.diagnostics.is_verbose() {
                self.diagnostics.info_with("LIVE", "Scheduling voice", &voice);
            }
            endings.push(graph.schedule_voice(voice)?);
        }

        if self.config.await_completion {
            let outcome = race(
                &*self.host,
                "chord completion",
                self.config.completion_timeout(),
                join_all(endings),
            )
            .await;
            if let Raced::TimedOut { bound, .. } = outcome {
                self.diagnostics.warn_with(
                    "LIVE",
                    "Chord did not report completion in time",
                    &json!({ "boundMs": bound.as_millis() as u64 }),
                );
            }
        }

        Ok(count)
    }

    /// Schedules one silent voice to prove the graph accepts work at all
    pub fn self_test(&self) -> AudioResult<()> {
        let handle = self.context.get_or_create_context()?;
        let graph = handle.graph();
        graph.schedule_voice(self_test_voice(graph.current_time()))?;
        Ok(())
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }
}
