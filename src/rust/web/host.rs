//! Browser host: Web Audio graph plus `<audio>` elements for clips

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use js_sys::{Array, Promise, Reflect, Uint8Array};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioContext, AudioContextOptions, AudioContextState, AudioParam, BiquadFilterType, Blob,
    BlobPropertyBag, HtmlAudioElement, OscillatorType, Url,
};

use crate::engine::audio::environment::EnvironmentInfo;
use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::renderer::RenderedClip;
use crate::engine::audio::synth::{Envelope, GainStep, Waveform};
use crate::engine::host::{
    AudioHost, ClipPlayer, ClipSupport, ContextState, GraphOptions, LatencyHint, LatencyInfo,
    LiveGraph, Voice, VoiceEnded,
};

fn host_error(context: &str, value: JsValue) -> AudioError {
    AudioError::Host(format!("{context}: {}", describe(&value)))
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

#[derive(Default)]
pub struct WebHost;

impl WebHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl AudioHost for WebHost {
    fn environment(&self) -> EnvironmentInfo {
        let Some(window) = web_sys::window() else {
            return EnvironmentInfo::default();
        };
        let navigator = window.navigator();
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let screen = window.screen().ok();
        let timezone = js_sys::Intl::DateTimeFormat::new(&Array::new(), &js_sys::Object::new())
            .resolved_options();
        let has_audio_api = Reflect::has(&window, &JsValue::from_str("AudioContext")).unwrap_or(false)
            || Reflect::has(&window, &JsValue::from_str("webkitAudioContext")).unwrap_or(false);

        EnvironmentInfo {
            user_agent: navigator.user_agent().unwrap_or_default(),
            platform: navigator.platform().unwrap_or_default(),
            vendor: navigator.vendor(),
            max_touch_points: navigator.max_touch_points().max(0) as u32,
            language: navigator.language().unwrap_or_default(),
            hardware_concurrency: navigator.hardware_concurrency() as u32,
            window_size: format!(
                "{}x{}",
                dimension(window.inner_width()),
                dimension(window.inner_height())
            ),
            screen_size: screen
                .map(|s| {
                    format!(
                        "{}x{}",
                        s.width().unwrap_or_default(),
                        s.height().unwrap_or_default()
                    )
                })
                .unwrap_or_default(),
            pixel_ratio: window.device_pixel_ratio(),
            timezone: Reflect::get(&timezone, &JsValue::from_str("timeZone"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default(),
            has_audio_api,
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    async fn sleep(&self, duration: Duration) {
        let millis = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn create_graph(&self, options: &GraphOptions) -> AudioResult<Rc<dyn LiveGraph>> {
        let config = AudioContextOptions::new();
        let hint = match options.latency_hint {
            LatencyHint::Interactive => "interactive",
            LatencyHint::Balanced => "balanced",
            LatencyHint::Playback => "playback",
        };
        config.set_latency_hint(&JsValue::from_str(hint));
        config.set_sample_rate(options.sample_rate as f32);

        let context = AudioContext::new_with_context_options(&config)
            .map_err(|e| AudioError::NotSupported(describe(&e)))?;
        Ok(Rc::new(WebGraph { context }))
    }

    fn clip_support(&self) -> ClipSupport {
        let Ok(probe) = HtmlAudioElement::new() else {
            return ClipSupport::No;
        };
        match probe.can_play_type(crate::engine::audio::encoders::CLIP_MIME_TYPE).as_str() {
            "probably" => ClipSupport::Probably,
            "maybe" => ClipSupport::Maybe,
            _ => ClipSupport::No,
        }
    }

    fn create_clip_player(
        &self,
        clip: &RenderedClip,
        volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        let url = blob_url(clip)?;
        let element = HtmlAudioElement::new_with_src(&url)
            .map_err(|e| host_error("audio element", e))?;
        element.set_preload("auto");
        element.set_volume(volume as f64);
        Ok(Rc::new(WebClipPlayer { element, url }))
    }

    /// Bare element, source assigned after construction and loaded explicitly
    fn create_single_shot_player(
        &self,
        clip: &RenderedClip,
        volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        let url = blob_url(clip)?;
        let element = HtmlAudioElement::new().map_err(|e| host_error("audio element", e))?;
        element.set_src(&url);
        element.set_volume(volume as f64);
        element.load();
        Ok(Rc::new(WebClipPlayer { element, url }))
    }
}

fn blob_url(clip: &RenderedClip) -> AudioResult<String> {
    let bytes = Uint8Array::from(&clip.bytes[..]);
    let parts = Array::of1(&bytes);
    let properties = BlobPropertyBag::new();
    properties.set_type(clip.mime_type());
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &properties)
        .map_err(|e| host_error("clip blob", e))?;
    Url::create_object_url_with_blob(&blob).map_err(|e| host_error("clip url", e))
}

pub struct WebGraph {
    context: AudioContext,
}

fn apply_envelope(param: &AudioParam, envelope: &Envelope) -> Result<(), JsValue> {
    for step in envelope.steps() {
        match *step {
            GainStep::Set { value, at } => param.set_value_at_time(value, at)?,
            GainStep::LinearTo { value, at } => param.linear_ramp_to_value_at_time(value, at)?,
            GainStep::ExponentialTo { value, at } => {
                param.exponential_ramp_to_value_at_time(value, at)?
            }
        };
    }
    Ok(())
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

impl WebGraph {
    fn build_voice(&self, voice: &Voice) -> Result<Promise, JsValue> {
        let ctx = &self.context;
        let oscillator = ctx.create_oscillator()?;
        oscillator.set_type(oscillator_type(voice.waveform));
        oscillator
            .frequency()
            .set_value_at_time(voice.frequency, voice.start_at)?;

        let gain = ctx.create_gain()?;
        apply_envelope(&gain.gain(), &voice.envelope)?;
        oscillator.connect_with_audio_node(&gain)?;

        match voice.filter {
            Some(filter) => {
                let lowpass = ctx.create_biquad_filter()?;
                lowpass.set_type(BiquadFilterType::Lowpass);
                lowpass.frequency().set_value(filter.cutoff);
                lowpass.q().set_value(filter.q);
                gain.connect_with_audio_node(&lowpass)?;
                lowpass.connect_with_audio_node(&ctx.destination())?;
            }
            None => {
                gain.connect_with_audio_node(&ctx.destination())?;
            }
        }

        let ended = Promise::new(&mut |resolve, _reject| {
            oscillator.set_onended(Some(&resolve));
        });
        oscillator.start_with_when(voice.start_at)?;
        oscillator.stop_with_when(voice.stop_at)?;
        Ok(ended)
    }
}

#[async_trait(?Send)]
impl LiveGraph for WebGraph {
    fn state(&self) -> ContextState {
        match self.context.state() {
            AudioContextState::Running => ContextState::Running,
            AudioContextState::Suspended => ContextState::Suspended,
            AudioContextState::Closed => ContextState::Closed,
            // Safari reports "interrupted" after a phone call or lock
            _ => ContextState::Interrupted,
        }
    }

    fn sample_rate(&self) -> u32 {
        self.context.sample_rate() as u32
    }

    fn current_time(&self) -> f64 {
        self.context.current_time()
    }

    fn latency(&self) -> LatencyInfo {
        let read = |name: &str| {
            Reflect::get(&self.context, &JsValue::from_str(name))
                .ok()
                .and_then(|v| v.as_f64())
        };
        LatencyInfo {
            base_latency: read("baseLatency"),
            output_latency: read("outputLatency"),
        }
    }

    async fn resume(&self) -> AudioResult<()> {
        let promise = self.context.resume().map_err(|e| host_error("resume", e))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| host_error("resume", e))
    }

    async fn suspend(&self) -> AudioResult<()> {
        let promise = self.context.suspend().map_err(|e| host_error("suspend", e))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| host_error("suspend", e))
    }

    async fn close(&self) -> AudioResult<()> {
        let promise = self.context.close().map_err(|e| host_error("close", e))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| host_error("close", e))
    }

    fn schedule_voice(&self, voice: Voice) -> AudioResult<VoiceEnded> {
        let ended = self
            .build_voice(&voice)
            .map_err(|e| host_error("oscillator chain", e))?;
        Ok(JsFuture::from(ended).map(|_| ()).boxed_local())
    }
}

pub struct WebClipPlayer {
    element: HtmlAudioElement,
    url: String,
}

#[async_trait(?Send)]
impl ClipPlayer for WebClipPlayer {
    fn is_idle(&self) -> bool {
        self.element.paused() || self.element.ended()
    }

    fn rewind(&self) {
        self.element.set_current_time(0.0);
    }

    async fn play(&self) -> AudioResult<()> {
        let promise = self
            .element
            .play()
            .map_err(|e| AudioError::PlaybackRejected(describe(&e)))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| AudioError::PlaybackRejected(describe(&e)))
    }

    fn stop(&self) {
        let _ = self.element.pause();
        self.element.set_current_time(0.0);
    }
}

impl Drop for WebClipPlayer {
    fn drop(&mut self) {
        let _ = self.element.pause();
        let _ = Url::revoke_object_url(&self.url);
    }
}
