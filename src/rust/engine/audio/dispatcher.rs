//! Picks a playback backend for the session
//!
//! The choice is made once by `initialize` and cached until a force call or
//! `auto_detect_mode` changes it.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::playback::{ClipBackend, ClipSource, LiveBackend};
use super::request::ChordRequest;
use crate::shared::diagnostics::Diagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendMode {
    #[default]
    Unresolved,
    LiveSynthesis,
    RenderedClip,
}

impl BackendMode {
    pub fn label(self) -> &'static str {
        match self {
            BackendMode::Unresolved => "unresolved",
            BackendMode::LiveSynthesis => "live-synthesis",
            BackendMode::RenderedClip => "rendered-clip",
        }
    }
}

pub struct HybridDispatcher {
    live: Rc<LiveBackend>,
    clip: Rc<ClipBackend>,
    diagnostics: Rc<Diagnostics>,
    mode: Cell<BackendMode>,
    forced: Cell<bool>,
    /// Live self-test has passed for the current graph
    verified: Cell<bool>,
}

impl HybridDispatcher {
    pub fn new(live: Rc<LiveBackend>, clip: Rc<ClipBackend>, diagnostics: Rc<Diagnostics>) -> Self {
        Self {
            live,
            clip,
            diagnostics,
            mode: Cell::new(BackendMode::Unresolved),
            forced: Cell::new(false),
            verified: Cell::new(false),
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.mode.get()
    }

    pub fn is_forced(&self) -> bool {
        self.forced.get()
    }

    pub fn live(&self) -> &Rc<LiveBackend> {
        &self.live
    }

    pub fn clip(&self) -> &Rc<ClipBackend> {
        &self.clip
    }

    /// Resolve the backend, running the live self-test when it has not passed
    /// yet. A forced clip mode is returned untouched.
    pub fn initialize(&self) -> BackendMode {
        match self.mode.get() {
            BackendMode::RenderedClip => return BackendMode::RenderedClip,
            BackendMode::LiveSynthesis if self.verified.get() => {
                return BackendMode::LiveSynthesis;
            }
            _ => {}
        }

        let mode = match self.live.self_test() {
            Ok(()) => {
                self.verified.set(true);
                BackendMode::LiveSynthesis
            }
            Err(e) => {
                self.diagnostics.warn_with(
                    "DISPATCH",
                    "Live self-test failed, using rendered clips",
                    &json!({ "error": e.to_string(), "kind": e.kind(), "forced": self.forced.get() }),
                );
                self.forced.set(false);
                BackendMode::RenderedClip
            }
        };

        self.mode.set(mode);
        self.diagnostics
            .info_with("DISPATCH", "Backend resolved", &json!({ "mode": mode }));
        mode
    }

    /// Plays through the resolved backend. A live failure falls through to
    /// the clip backend before reporting `false`.
    pub async fn play(&self, request: &ChordRequest) -> bool {
        match self.initialize() {
            BackendMode::LiveSynthesis => {
                if self.live.play(request).await {
                    return true;
                }
                self.diagnostics
                    .warn("DISPATCH", "Live playback failed, trying rendered clip");
                self.clip.play(&ClipSource::Request(request.clone())).await
            }
            BackendMode::RenderedClip | BackendMode::Unresolved => {
                self.clip.play(&ClipSource::Request(request.clone())).await
            }
        }
    }

    pub fn force_live_mode(&self) {
        self.mode.set(BackendMode::LiveSynthesis);
        self.forced.set(true);
        self.verified.set(false);
        self.diagnostics.info("DISPATCH", "Live synthesis forced");
    }

    pub fn force_clip_mode(&self) {
        self.mode.set(BackendMode::RenderedClip);
        self.forced.set(true);
        self.diagnostics.info("DISPATCH", "Rendered clips forced");
    }

    /// Drop every cached decision, including the unlock budget, and detect again
    pub fn auto_detect_mode(&self) -> BackendMode {
        self.mode.set(BackendMode::Unresolved);
        self.forced.set(false);
        self.verified.set(false);
        self.live.context().reset_unlock_state();
        self.diagnostics.info("DISPATCH", "Auto-detecting backend");
        self.initialize()
    }

    /// Silences pooled and transient clips. Oscillators already scheduled on
    /// the live graph keep playing until their envelope ends.
    pub fn stop_all(&self) -> usize {
        let stopped = self.clip.stop_all();
        if self.mode.get() == BackendMode::LiveSynthesis {
            self.diagnostics.info(
                "DISPATCH",
                "Scheduled live voices are left to finish their envelope",
            );
        }
        stopped
    }
}

#[cfg(test)]
#[path = "test_dispatcher.rs"]
mod tests;
