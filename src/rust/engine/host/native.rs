//! rodio-backed host for the command line
//!
//! Desktop output devices have no autoplay restriction, so graphs start
//! running. Each voice is rendered sample by sample by a `VoiceSource` mixed
//! into the default output stream; clips are decoded from memory into a
//! fresh `Sink` per trigger.

use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use rodio::cpal::traits::HostTrait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{
    AudioHost, ClipPlayer, ClipSupport, ContextState, GraphOptions, LatencyInfo, LiveGraph, Voice,
    VoiceEnded,
};
use crate::engine::audio::environment::EnvironmentInfo;
use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::renderer::RenderedClip;
use crate::engine::audio::synth::{Envelope, Waveform};
use crate::shared::diagnostics::system_now_ms;

type Output = (OutputStream, OutputStreamHandle);

fn open_output() -> AudioResult<Output> {
    OutputStream::try_default()
        .map_err(|e| AudioError::NotSupported(format!("no default audio output: {e}")))
}

#[derive(Default)]
pub struct NativeHost {
    /// Shared by every clip player; opened on first use
    clip_output: RefCell<Option<Output>>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn clip_handle(&self) -> AudioResult<OutputStreamHandle> {
        let mut output = self.clip_output.borrow_mut();
        if output.is_none() {
            *output = Some(open_output()?);
        }
        output
            .as_ref()
            .map(|(_, handle)| handle.clone())
            .ok_or_else(|| AudioError::Host("clip output unavailable".into()))
    }
}

#[async_trait(?Send)]
impl AudioHost for NativeHost {
    fn environment(&self) -> EnvironmentInfo {
        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        let has_audio_api = rodio::cpal::default_host()
            .default_output_device()
            .is_some();

        EnvironmentInfo {
            user_agent: format!("strumkit/{} ({os}; {arch})", env!("CARGO_PKG_VERSION")),
            platform: format!("{os} {arch}"),
            vendor: String::new(),
            max_touch_points: 0,
            language: std::env::var("LANG").unwrap_or_default(),
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1),
            timezone: std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string()),
            has_audio_api,
            ..Default::default()
        }
    }

    fn now_ms(&self) -> f64 {
        system_now_ms()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }

    fn create_graph(&self, options: &GraphOptions) -> AudioResult<Rc<dyn LiveGraph>> {
        let (stream, handle) = open_output()?;
        Ok(Rc::new(NativeGraph {
            output: RefCell::new(Some((stream, handle))),
            state: Cell::new(ContextState::Running),
            sample_rate: options.sample_rate,
            started: Instant::now(),
        }))
    }

    fn clip_support(&self) -> ClipSupport {
        ClipSupport::Probably
    }

    fn create_clip_player(
        &self,
        clip: &RenderedClip,
        volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        Ok(Rc::new(NativeClipPlayer {
            handle: self.clip_handle()?,
            bytes: clip.bytes.clone(),
            volume,
            sink: RefCell::new(None),
        }))
    }
}

pub struct NativeGraph {
    output: RefCell<Option<Output>>,
    state: Cell<ContextState>,
    sample_rate: u32,
    started: Instant,
}

#[async_trait(?Send)]
impl LiveGraph for NativeGraph {
    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn latency(&self) -> LatencyInfo {
        LatencyInfo::default()
    }

    async fn resume(&self) -> AudioResult<()> {
        if self.state.get() == ContextState::Closed {
            return Err(AudioError::Host("cannot resume a closed graph".into()));
        }
        self.state.set(ContextState::Running);
        Ok(())
    }

    async fn suspend(&self) -> AudioResult<()> {
        if self.state.get() != ContextState::Closed {
            self.state.set(ContextState::Suspended);
        }
        Ok(())
    }

    async fn close(&self) -> AudioResult<()> {
        self.output.borrow_mut().take();
        self.state.set(ContextState::Closed);
        Ok(())
    }

    fn schedule_voice(&self, voice: Voice) -> AudioResult<VoiceEnded> {
        let output = self.output.borrow();
        let (_, handle) = output
            .as_ref()
            .ok_or_else(|| AudioError::Host("graph is closed".into()))?;

        let now = self.current_time();
        let remaining = (voice.stop_at - now).max(0.0);
        let source = VoiceSource::new(voice, now, self.sample_rate);
        handle
            .play_raw(source)
            .map_err(|e| AudioError::Host(format!("failed to start voice: {e}")))?;

        Ok(tokio::time::sleep(Duration::from_secs_f64(remaining)).boxed_local())
    }
}

/// Oscillator -> gain envelope -> optional one-pole lowpass, in graph time
struct VoiceSource {
    frequency: f32,
    waveform: Waveform,
    envelope: Envelope,
    start_at: f64,
    origin: f64,
    sample_rate: u32,
    index: usize,
    total: usize,
    lowpass: Option<f32>,
    last: f32,
}

impl VoiceSource {
    fn new(voice: Voice, now: f64, sample_rate: u32) -> Self {
        let total = ((voice.stop_at - now).max(0.0) * sample_rate as f64).ceil() as usize;
        let lowpass = voice.filter.map(|filter| {
            let dt = 1.0 / sample_rate as f32;
            let rc = 1.0 / (2.0 * std::f32::consts::PI * filter.cutoff.max(1.0));
            dt / (rc + dt)
        });

        Self {
            frequency: voice.frequency,
            waveform: voice.waveform,
            envelope: voice.envelope,
            start_at: voice.start_at,
            origin: now,
            sample_rate,
            index: 0,
            total,
            lowpass,
            last: 0.0,
        }
    }
}

impl Iterator for VoiceSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total {
            return None;
        }
        let t = self.origin + self.index as f64 / self.sample_rate as f64;
        self.index += 1;

        if t < self.start_at {
            return Some(0.0);
        }
        let raw = self.waveform.sample(self.frequency, t - self.start_at) * self.envelope.value_at(t);
        let out = match self.lowpass {
            Some(alpha) => self.last + alpha * (raw - self.last),
            None => raw,
        };
        self.last = out;
        Some(out)
    }
}

impl Source for VoiceSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total - self.index)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.total as f64 / self.sample_rate as f64,
        ))
    }
}

pub struct NativeClipPlayer {
    handle: OutputStreamHandle,
    bytes: Arc<[u8]>,
    volume: f32,
    sink: RefCell<Option<Sink>>,
}

#[async_trait(?Send)]
impl ClipPlayer for NativeClipPlayer {
    fn is_idle(&self) -> bool {
        self.sink
            .borrow()
            .as_ref()
            .is_none_or(|sink| sink.empty())
    }

    fn rewind(&self) {
        // A finished sink cannot seek back; the next play builds a new one
        if self.is_idle() {
            self.sink.borrow_mut().take();
        }
    }

    async fn play(&self) -> AudioResult<()> {
        let decoder = Decoder::new(Cursor::new(self.bytes.clone()))
            .map_err(|e| AudioError::PlaybackRejected(format!("clip could not be decoded: {e}")))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AudioError::PlaybackRejected(format!("failed to create audio sink: {e}")))?;
        sink.set_volume(self.volume);
        sink.append(decoder);
        *self.sink.borrow_mut() = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        if let Some(sink) = self.sink.borrow_mut().take() {
            sink.stop();
        }
    }
}
