//! Platform seam for the audio engine
//!
//! The engine never talks to a sound API directly. Everything that touches a
//! device, a clock or a media element goes through these traits, so the same
//! unlock/playback logic runs against rodio, the browser, or a scripted
//! recording host in tests.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::engine::audio::environment::EnvironmentInfo;
use crate::engine::audio::error::AudioResult;
use crate::engine::audio::renderer::RenderedClip;
use crate::engine::audio::synth::{Envelope, Waveform};

pub mod recording;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub mod native;

pub use recording::{
    ClipBehavior, RecordingHost, RecordingLog, RecordingScript, ResumeBehavior, VoiceEnd,
};

/// Lifecycle of the live processing graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Uninstantiated,
    Suspended,
    Running,
    Closed,
    /// Reported by some mobile environments when another app takes the device
    Interrupted,
}

impl ContextState {
    pub fn label(self) -> &'static str {
        match self {
            ContextState::Uninstantiated => "uninstantiated",
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
            ContextState::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyHint {
    #[default]
    Interactive,
    Balanced,
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphOptions {
    pub sample_rate: u32,
    pub latency_hint: LatencyHint,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            latency_hint: LatencyHint::Interactive,
        }
    }
}

/// Latency figures as reported by the host, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyInfo {
    pub base_latency: Option<f64>,
    pub output_latency: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowpassFilter {
    pub cutoff: f32,
    pub q: f32,
}

/// One oscillator chain: oscillator -> gain (-> lowpass) -> output.
/// Times are in graph seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub frequency: f32,
    pub waveform: Waveform,
    pub start_at: f64,
    pub stop_at: f64,
    pub envelope: Envelope,
    pub filter: Option<LowpassFilter>,
}

/// Resolves once the voice's oscillator has ended
pub type VoiceEnded = LocalBoxFuture<'static, ()>;

/// Answer of a basic media element codec probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipSupport {
    Probably,
    Maybe,
    No,
}

impl ClipSupport {
    pub fn is_playable(self) -> bool {
        !matches!(self, ClipSupport::No)
    }
}

#[async_trait(?Send)]
pub trait AudioHost {
    fn environment(&self) -> EnvironmentInfo;

    /// Wall clock in milliseconds since the Unix epoch
    fn now_ms(&self) -> f64;

    async fn sleep(&self, duration: Duration);

    /// Fails with `NotSupported` when the host has no audio API at all
    fn create_graph(&self, options: &GraphOptions) -> AudioResult<Rc<dyn LiveGraph>>;

    fn clip_support(&self) -> ClipSupport;

    fn create_clip_player(&self, clip: &RenderedClip, volume: f32)
    -> AudioResult<Rc<dyn ClipPlayer>>;

    /// Freshly constructed player used for the restricted-environment retry.
    /// Hosts without a distinct construction path reuse the pooled one.
    fn create_single_shot_player(
        &self,
        clip: &RenderedClip,
        volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        self.create_clip_player(clip, volume)
    }
}

#[async_trait(?Send)]
pub trait LiveGraph {
    fn state(&self) -> ContextState;
    fn sample_rate(&self) -> u32;
    fn current_time(&self) -> f64;
    fn latency(&self) -> LatencyInfo;

    async fn resume(&self) -> AudioResult<()>;
    async fn suspend(&self) -> AudioResult<()>;
    async fn close(&self) -> AudioResult<()>;

    fn schedule_voice(&self, voice: Voice) -> AudioResult<VoiceEnded>;
}

#[async_trait(?Send)]
pub trait ClipPlayer {
    /// Paused, ended, or never started
    fn is_idle(&self) -> bool;
    fn rewind(&self);
    async fn play(&self) -> AudioResult<()>;
    fn stop(&self);
}
