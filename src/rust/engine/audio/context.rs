//! Context lifecycle and the unlock protocol
//!
//! `ContextManager` owns the single live graph for the session. Unlock
//! attempts are serialized: concurrent callers join the attempt already in
//! flight instead of starting their own, and the attempt counter never passes
//! the configured maximum until an explicit reset.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde::Serialize;
use serde_json::json;

use super::deadline::{Raced, race};
use super::environment::EnvironmentProbe;
use super::error::{AudioError, AudioResult};
use super::renderer::test_tone_voice;
use super::synth::Waveform;
use crate::engine::host::{AudioHost, ContextState, LiveGraph};
use crate::platform::config::{Aggressiveness, UnlockSection};
use crate::shared::debugger::DebugTimer;
use crate::shared::diagnostics::{Diagnostics, iso_timestamp};

const STANDARD_TEST_TONES: [(Waveform, f32); 1] = [(Waveform::Sine, 440.0)];
const AGGRESSIVE_TEST_TONES: [(Waveform, f32); 4] = [
    (Waveform::Sine, 440.0),
    (Waveform::Square, 880.0),
    (Waveform::Sawtooth, 220.0),
    (Waveform::Triangle, 660.0),
];

/// The single live graph plus when it was created
#[derive(Clone)]
pub struct ContextHandle {
    graph: Rc<dyn LiveGraph>,
    created_at_ms: f64,
}

impl ContextHandle {
    pub fn graph(&self) -> &Rc<dyn LiveGraph> {
        &self.graph
    }

    pub fn state(&self) -> ContextState {
        self.graph.state()
    }

    pub fn created_at_ms(&self) -> f64 {
        self.created_at_ms
    }
}

type PendingUnlock = Shared<LocalBoxFuture<'static, bool>>;

struct InFlight {
    generation: u64,
    future: PendingUnlock,
}

#[derive(Default)]
struct UnlockState {
    is_unlocked: bool,
    attempt_count: u32,
    in_flight: Option<InFlight>,
    generation: u64,
    last_error: Option<AudioError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub state: ContextState,
    pub created_at: Option<String>,
    pub current_time: Option<f64>,
    pub sample_rate: Option<u32>,
    pub base_latency: Option<f64>,
    pub output_latency: Option<f64>,
    pub is_unlocked: bool,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub unlock_in_flight: bool,
    pub restricted: bool,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct ContextManager {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    host: Rc<dyn AudioHost>,
    config: UnlockSection,
    diagnostics: Rc<Diagnostics>,
    probe: Rc<EnvironmentProbe>,
    handle: RefCell<Option<ContextHandle>>,
    unlock: RefCell<UnlockState>,
}

impl ContextManager {
    pub fn new(
        host: Rc<dyn AudioHost>,
        config: UnlockSection,
        diagnostics: Rc<Diagnostics>,
        probe: Rc<EnvironmentProbe>,
    ) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                host,
                config,
                diagnostics,
                probe,
                handle: RefCell::new(None),
                unlock: RefCell::new(UnlockState::default()),
            }),
        }
    }

    /// Returns the existing handle, or creates one when there is none or the
    /// previous one was closed.
    pub fn get_or_create_context(&self) -> AudioResult<ContextHandle> {
        self.inner.get_or_create()
    }

    pub fn handle(&self) -> Option<ContextHandle> {
        self.inner.handle.borrow().clone()
    }

    pub fn detect_restricted_environment(&self) -> bool {
        self.inner.probe.is_restricted()
    }

    pub fn state(&self) -> ContextState {
        self.inner.current_state()
    }

    pub fn is_unlocked(&self) -> bool {
        self.inner.unlock.borrow().is_unlocked
    }

    pub fn attempt_count(&self) -> u32 {
        self.inner.unlock.borrow().attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.inner.config.max_attempts()
    }

    pub fn last_error(&self) -> Option<AudioError> {
        self.inner.unlock.borrow().last_error.clone()
    }

    /// Never fails: any unrecoverable problem resolves to `false` and is
    /// recorded in the diagnostics log.
    pub async fn unlock(&self) -> bool {
        let inner = &self.inner;
        let diagnostics = &inner.diagnostics;
        diagnostics.info("UNLOCK", "Audio unlock requested");

        if inner.unlock.borrow().is_unlocked && inner.current_state() == ContextState::Running {
            diagnostics.info("UNLOCK", "Already unlocked and running");
            return true;
        }

        let existing = inner
            .unlock
            .borrow()
            .in_flight
            .as_ref()
            .map(|f| (f.generation, f.future.clone()));

        if let Some((generation, pending)) = existing {
            diagnostics.info("UNLOCK", "Unlock already in progress, waiting");
            match race(
                &*inner.host,
                "existing unlock",
                inner.config.in_flight_timeout(),
                pending,
            )
            .await
            {
                Raced::Completed(result) => return result,
                Raced::TimedOut { operation, bound } => {
                    diagnostics.error_with(
                        "UNLOCK",
                        "Existing unlock timed out, starting a fresh attempt",
                        &json!({ "operation": operation, "boundMs": bound.as_millis() as u64 }),
                    );
                    inner.clear_in_flight(generation);
                }
            }
        }

        let max_attempts = inner.config.max_attempts();
        let (attempt, generation) = {
            let mut state = inner.unlock.borrow_mut();
            if state.attempt_count >= max_attempts {
                let unlocked = state.is_unlocked;
                if !unlocked {
                    state.last_error = Some(AudioError::UnlockExhausted {
                        attempts: state.attempt_count,
                    });
                }
                drop(state);
                diagnostics.warn_with(
                    "UNLOCK",
                    "Max unlock attempts reached",
                    &json!({ "maxAttempts": max_attempts, "isUnlocked": unlocked }),
                );
                return unlocked;
            }
            state.attempt_count += 1;
            state.generation += 1;
            (state.attempt_count, state.generation)
        };

        let future = ContextInner::run_attempt(inner.clone(), attempt, generation)
            .boxed_local()
            .shared();
        inner.unlock.borrow_mut().in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });

        future.await
    }

    /// Bring a suspended graph back before scheduling, bounded by the
    /// playback resume timeout.
    pub async fn resume_for_playback(&self, handle: &ContextHandle) -> AudioResult<ContextState> {
        let inner = &self.inner;
        let graph = handle.graph();
        let before = graph.state();
        if !matches!(before, ContextState::Suspended | ContextState::Interrupted) {
            return Ok(before);
        }

        inner.diagnostics.info_with(
            "RESUME",
            "Resuming graph before playback",
            &json!({ "state": before }),
        );
        race(
            &*inner.host,
            "playback resume",
            inner.config.playback_resume_timeout(),
            graph.resume(),
        )
        .await
        .flatten()?;

        Ok(graph.state())
    }

    pub async fn suspend(&self) -> AudioResult<()> {
        let Some(handle) = self.handle() else {
            return Ok(());
        };
        self.inner.diagnostics.info("CONTEXT", "Suspending audio graph");
        race(
            &*self.inner.host,
            "graph suspend",
            self.inner.config.resume_timeout(),
            handle.graph().suspend(),
        )
        .await
        .flatten()
    }

    /// Tear the handle down; the next request creates a fresh one with a
    /// fresh unlock budget.
    pub async fn close(&self) -> AudioResult<()> {
        let handle = self.inner.handle.borrow_mut().take();
        self.reset_unlock_state();

        let Some(handle) = handle else {
            return Ok(());
        };
        self.inner.diagnostics.info("CONTEXT", "Closing audio graph");
        race(
            &*self.inner.host,
            "graph close",
            self.inner.config.resume_timeout(),
            handle.graph().close(),
        )
        .await
        .flatten()
    }

    pub fn reset_unlock_state(&self) {
        let mut state = self.inner.unlock.borrow_mut();
        let generation = state.generation + 1;
        *state = UnlockState {
            generation,
            ..UnlockState::default()
        };
        drop(state);
        self.inner.diagnostics.info("UNLOCK", "Unlock state reset");
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        let handle = self.handle();
        let unlock = self.inner.unlock.borrow();
        let latency = handle.as_ref().map(|h| h.graph().latency());

        ContextSnapshot {
            state: handle
                .as_ref()
                .map(|h| h.state())
                .unwrap_or(ContextState::Uninstantiated),
            created_at: handle.as_ref().map(|h| iso_timestamp(h.created_at_ms())),
            current_time: handle.as_ref().map(|h| h.graph().current_time()),
            sample_rate: handle.as_ref().map(|h| h.graph().sample_rate()),
            base_latency: latency.and_then(|l| l.base_latency),
            output_latency: latency.and_then(|l| l.output_latency),
            is_unlocked: unlock.is_unlocked,
            attempt_count: unlock.attempt_count,
            max_attempts: self.inner.config.max_attempts(),
            unlock_in_flight: unlock.in_flight.is_some(),
            restricted: self.inner.probe.is_restricted(),
            last_error: unlock.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

impl ContextInner {
    fn current_state(&self) -> ContextState {
        self.handle
            .borrow()
            .as_ref()
            .map(|h| h.state())
            .unwrap_or(ContextState::Uninstantiated)
    }

    fn get_or_create(&self) -> AudioResult<ContextHandle> {
        if let Some(handle) = self.handle.borrow().as_ref() {
            if handle.state() != ContextState::Closed {
                return Ok(handle.clone());
            }
        }

        self.diagnostics.info("CONTEXT", "Creating new audio graph");
        let options = self.config.graph_options();
        let graph = match self.host.create_graph(&options) {
            Ok(graph) => graph,
            Err(e) => {
                self.diagnostics.error_with(
                    "CONTEXT",
                    "Failed to create audio graph",
                    &json!({ "error": e.to_string(), "kind": e.kind() }),
                );
                return Err(e);
            }
        };

        let handle = ContextHandle {
            graph,
            created_at_ms: self.host.now_ms(),
        };
        self.diagnostics.info_with(
            "CONTEXT",
            "Audio graph created",
            &json!({
                "state": handle.state(),
                "sampleRate": handle.graph().sample_rate(),
                "latency": handle.graph().latency(),
                "latencyHint": options.latency_hint,
            }),
        );

        *self.handle.borrow_mut() = Some(handle.clone());
        Ok(handle)
    }

    fn is_aggressive(&self) -> bool {
        match self.config.aggressiveness {
            Aggressiveness::Auto => self.probe.is_restricted(),
            Aggressiveness::Standard => false,
            Aggressiveness::Aggressive => true,
        }
    }

    fn clear_in_flight(&self, generation: u64) {
        let mut state = self.unlock.borrow_mut();
        if state.in_flight.as_ref().map(|f| f.generation) == Some(generation) {
            state.in_flight = None;
        }
    }

    async fn run_attempt(self: Rc<Self>, attempt: u32, generation: u64) -> bool {
        let timer = DebugTimer::new("unlock", self.host.now_ms());
        let max_attempts = self.config.max_attempts();
        let aggressive = self.is_aggressive();
        let restricted = self.probe.is_restricted();

        self.diagnostics.info_with(
            "UNLOCK",
            format!("Unlock attempt {attempt}/{max_attempts}"),
            &json!({ "aggressive": aggressive, "restricted": restricted }),
        );

        let outcome = race(
            &*self.host,
            "audio unlock attempt",
            self.config.attempt_timeout(),
            self.attempt_body(aggressive),
        )
        .await;

        let result = match outcome.flatten() {
            Ok(state) => {
                let accepted = state == ContextState::Running
                    || (restricted && state == ContextState::Suspended);
                if accepted {
                    Ok(state)
                } else {
                    Err((
                        AudioError::UnlockTimeout {
                            attempt,
                            max_attempts,
                        },
                        Some(state),
                    ))
                }
            }
            Err(AudioError::Timeout { .. }) => Err((
                AudioError::UnlockTimeout {
                    attempt,
                    max_attempts,
                },
                None,
            )),
            Err(e) => Err((e, None)),
        };

        let elapsed_ms = timer.elapsed_ms(self.host.now_ms());
        if self.unlock.borrow().generation != generation {
            self.diagnostics.warn_with(
                "UNLOCK",
                "Unlock state was reset during the attempt, outcome discarded",
                &json!({ "attempt": attempt, "succeeded": result.is_ok(), "elapsedMs": elapsed_ms }),
            );
            return false;
        }

        let unlocked = match result {
            Ok(state) => {
                {
                    let mut unlock = self.unlock.borrow_mut();
                    unlock.is_unlocked = true;
                    unlock.last_error = None;
                }
                self.diagnostics.info_with(
                    "UNLOCK",
                    "Audio unlocked",
                    &json!({ "state": state, "attempt": attempt, "elapsedMs": elapsed_ms }),
                );
                true
            }
            Err((error, state)) => {
                {
                    let mut unlock = self.unlock.borrow_mut();
                    unlock.is_unlocked = false;
                    unlock.last_error = Some(error.clone());
                }
                self.diagnostics.error_with(
                    "UNLOCK",
                    "Audio unlock failed",
                    &json!({
                        "error": error.to_string(),
                        "kind": error.kind(),
                        "state": state,
                        "elapsedMs": elapsed_ms,
                    }),
                );
                if aggressive {
                    self.discard_handle().await;
                }
                false
            }
        };

        self.clear_in_flight(generation);
        unlocked
    }

    async fn attempt_body(&self, aggressive: bool) -> AudioResult<ContextState> {
        let handle = self.get_or_create()?;
        let graph = handle.graph().clone();

        self.diagnostics.info_with(
            "UNLOCK",
            "Graph state before unlock",
            &json!({ "state": graph.state(), "currentTime": graph.current_time() }),
        );

        if aggressive {
            let rounds = self.config.aggressive_resume_attempts.max(1);
            for round in 1..=rounds {
                if graph.state() == ContextState::Running {
                    break;
                }
                // A hung resume does not settle by asking again
                if !self.resume_bounded(graph.as_ref(), round).await {
                    break;
                }
            }
        } else if matches!(
            graph.state(),
            ContextState::Suspended | ContextState::Interrupted
        ) {
            self.resume_bounded(graph.as_ref(), 1).await;
        }

        let tones: &[(Waveform, f32)] = if aggressive {
            &AGGRESSIVE_TEST_TONES
        } else {
            &STANDARD_TEST_TONES
        };
        for &(waveform, frequency) in tones {
            self.play_test_tone(graph.as_ref(), waveform, frequency).await;
        }

        self.host.sleep(self.config.settle()).await;

        let state = graph.state();
        self.diagnostics.info_with(
            "UNLOCK",
            "Graph state after unlock",
            &json!({ "state": state, "currentTime": graph.current_time() }),
        );
        Ok(state)
    }

    /// Failure or timeout here is logged and the attempt carries on.
    /// Returns `false` when the resume hit its bound.
    async fn resume_bounded(&self, graph: &dyn LiveGraph, round: u32) -> bool {
        let outcome = race(
            &*self.host,
            "graph resume",
            self.config.resume_timeout(),
            graph.resume(),
        )
        .await
        .flatten();

        match outcome {
            Ok(()) => {
                self.diagnostics.info_with(
                    "RESUME",
                    "Resume completed",
                    &json!({ "round": round, "state": graph.state() }),
                );
                true
            }
            Err(e) => {
                let timed_out = matches!(e, AudioError::Timeout { .. });
                self.diagnostics.warn_with(
                    "RESUME",
                    "Resume failed, continuing",
                    &json!({ "round": round, "error": e.to_string(), "timedOut": timed_out }),
                );
                !timed_out
            }
        }
    }

    async fn play_test_tone(&self, graph: &dyn LiveGraph, waveform: Waveform, frequency: f32) {
        let voice = test_tone_voice(graph.current_time(), waveform, frequency);
        let ended = match graph.schedule_voice(voice) {
            Ok(ended) => ended,
            Err(e) => {
                self.diagnostics.warn_with(
                    "TEST_TONE",
                    "Test tone could not be scheduled",
                    &json!({ "waveform": waveform, "error": e.to_string() }),
                );
                return;
            }
        };

        let outcome = race(
            &*self.host,
            "test tone",
            self.config.test_tone_timeout(),
            ended,
        )
        .await;
        if let Raced::TimedOut { bound, .. } = outcome {
            self.diagnostics.warn_with(
                "TEST_TONE",
                "Test tone did not report completion",
                &json!({ "waveform": waveform, "boundMs": bound.as_millis() as u64 }),
            );
        } else if self.diagnostics.is_verbose() {
            self.diagnostics.info_with(
                "TEST_TONE",
                "Test tone completed",
                &json!({ "waveform": waveform, "frequency": frequency }),
            );
        }
    }

    /// A failed aggressive attempt drops the handle so the next one starts
    /// from a fresh graph.
    async fn discard_handle(&self) {
        let handle = self.handle.borrow_mut().take();
        if let Some(handle) = handle {
            self.diagnostics.warn("CONTEXT", "Closing graph after failed unlock");
            let _ = race(
                &*self.host,
                "graph close",
                self.config.resume_timeout(),
                handle.graph().close(),
            )
            .await;
        }
    }
}

#[cfg(test)]
#[path = "test_context.rs"]
mod tests;
