//! Tone rendering
//!
//! Two strategies share this module: planning oscillator voices for a live
//! graph, and synthesizing a short decaying clip into WAV bytes.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::Serialize;

use super::encoders::{CLIP_MIME_TYPE, CLIP_SAMPLE_RATE, encode_wav_mono16};
use super::error::AudioResult;
use super::synth::{Envelope, Waveform, exponential_decay, time_to_samples};
use crate::engine::host::{LowpassFilter, Voice};
use crate::platform::config::LiveSection;

/// Decay target of a rendered clip, reached on its last sample
pub const CLIP_DECAY_FLOOR: f64 = 0.0005;
/// Peak of the summed partials before the envelope
pub const CLIP_PEAK: f32 = 0.8;

const FADE_IN_SECS: f64 = 0.005;
const TAIL_TAPER_SECS: f64 = 0.01;

/// Inaudible probe used by the unlock protocol
pub const TEST_TONE_GAIN: f32 = 0.001;
pub const TEST_TONE_SECS: f64 = 0.1;

/// Root-note partials of the single-shot retry clip (ratio, amplitude)
const SINGLE_SHOT_PARTIALS: [(f32, f32); 3] = [(1.0, 0.4), (1.25, 0.2), (1.5, 0.15)];

/// One oscillator chain per note. Strummed notes start `strum_delay_secs`
/// apart; every note ends at `now + duration_secs`.
pub fn plan_live_voices(frequencies: &[f32], strum: bool, now: f64, live: &LiveSection) -> Vec<Voice> {
    let end = now + live.duration_secs.max(0.05);
    let volume = if strum {
        live.strum_volume
    } else {
        live.chord_volume
    };

    frequencies
        .iter()
        .enumerate()
        .map(|(i, &frequency)| {
            let offset = if strum {
                i as f64 * live.strum_delay_secs
            } else {
                0.0
            };
            let start = (now + offset).min(end - 0.05).max(now);
            Voice {
                frequency,
                waveform: live.waveform,
                start_at: start,
                stop_at: end,
                envelope: Envelope::pluck(start, end, volume, live.attack_secs),
                filter: live.lowpass.then(|| LowpassFilter {
                    cutoff: frequency * 3.0,
                    q: 1.0,
                }),
            }
        })
        .collect()
}

pub fn test_tone_voice(now: f64, waveform: Waveform, frequency: f32) -> Voice {
    Voice {
        frequency,
        waveform,
        start_at: now,
        stop_at: now + TEST_TONE_SECS,
        envelope: Envelope::constant(TEST_TONE_GAIN, now),
        filter: None,
    }
}

/// Zero-gain voice used to prove the graph accepts scheduling at all
pub fn self_test_voice(now: f64) -> Voice {
    Voice {
        frequency: 440.0,
        waveform: Waveform::Sine,
        start_at: now,
        stop_at: now + 0.01,
        envelope: Envelope::constant(0.0, now),
        filter: None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedClip {
    pub key: String,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
    pub sample_count: usize,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

impl RenderedClip {
    pub fn mime_type(&self) -> &'static str {
        CLIP_MIME_TYPE
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Sum of sines under an exponential decay that lands on the floor at the
/// last sample. The partial amplitudes are normalized to `CLIP_PEAK`.
pub fn render_partials(partials: &[(f32, f32)], duration: f64, sample_rate: u32) -> Vec<f32> {
    let total = time_to_samples(duration, sample_rate);
    if total == 0 || partials.is_empty() {
        return Vec::new();
    }

    let amplitude_sum: f32 = partials.iter().map(|(_, a)| a.abs()).sum();
    let scale = if amplitude_sum > 0.0 {
        CLIP_PEAK / amplitude_sum
    } else {
        0.0
    };

    let last = (total - 1).max(1) as f64 / sample_rate as f64;
    let fade_in = time_to_samples(FADE_IN_SECS, sample_rate).max(1);
    let taper = time_to_samples(TAIL_TAPER_SECS, sample_rate).max(1);

    (0..total)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let mut sample = 0.0_f64;
            for &(freq, amp) in partials {
                sample += (2.0 * PI * freq as f64 * t).sin() * amp as f64;
            }

            let mut envelope = exponential_decay(t, last, CLIP_DECAY_FLOOR);
            if i < fade_in {
                envelope *= i as f64 / fade_in as f64;
            }
            let remaining = total - 1 - i;
            if remaining < taper {
                envelope *= remaining as f64 / taper as f64;
            }

            (sample * envelope * scale as f64) as f32
        })
        .collect()
}

/// One fundamental per note; the first note is the root and also gets
/// its second and third harmonics.
pub fn render_chord_samples(frequencies: &[f32], duration: f64, sample_rate: u32) -> Vec<f32> {
    let mut partials: Vec<(f32, f32)> = frequencies.iter().map(|&f| (f, 1.0)).collect();
    if let Some(&root) = frequencies.first() {
        partials.push((root * 2.0, 0.5));
        partials.push((root * 3.0, 0.25));
    }
    render_partials(&partials, duration, sample_rate)
}

pub fn render_clip(key: &str, frequencies: &[f32], duration: f64) -> AudioResult<RenderedClip> {
    let samples = render_chord_samples(frequencies, duration, CLIP_SAMPLE_RATE);
    finish_clip(key, samples)
}

/// Simplified root-only clip for the restricted-environment retry
pub fn render_single_shot(key: &str, root_frequency: f32, duration: f64) -> AudioResult<RenderedClip> {
    let partials: Vec<(f32, f32)> = SINGLE_SHOT_PARTIALS
        .iter()
        .map(|&(ratio, amp)| (root_frequency * ratio, amp))
        .collect();
    let samples = render_partials(&partials, duration, CLIP_SAMPLE_RATE);
    finish_clip(key, samples)
}

fn finish_clip(key: &str, samples: Vec<f32>) -> AudioResult<RenderedClip> {
    let bytes = encode_wav_mono16(&samples, CLIP_SAMPLE_RATE)?;
    Ok(RenderedClip {
        key: key.to_string(),
        bytes: Arc::from(bytes),
        sample_count: samples.len(),
        sample_rate: CLIP_SAMPLE_RATE,
        duration_secs: samples.len() as f64 / CLIP_SAMPLE_RATE as f64,
    })
}

#[cfg(test)]
#[path = "test_renderer.rs"]
mod tests;
