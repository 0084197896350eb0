/// Audio synthesis utilities - oscillators and gain envelopes
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Level treated as inaudible at the end of an envelope
pub const SILENCE_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    #[default]
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Generate a single sample from an oscillator
    pub fn sample(self, frequency: f32, time: f64) -> f32 {
        let cycles = frequency as f64 * time;
        let value = match self {
            Waveform::Sine => (2.0 * PI * cycles).sin(),
            Waveform::Square => {
                if (2.0 * PI * cycles).sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            // Sawtooth: -1 to 1
            Waveform::Sawtooth => 2.0 * (cycles - (cycles + 0.5).floor()),
            Waveform::Triangle => (2.0 * (2.0 * cycles.fract() - 1.0)).abs() * 2.0 - 1.0,
        };
        value as f32
    }
}

/// One automation event on a gain parameter, in graph time (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GainStep {
    Set { value: f32, at: f64 },
    LinearTo { value: f32, at: f64 },
    ExponentialTo { value: f32, at: f64 },
}

impl GainStep {
    pub fn at(&self) -> f64 {
        match *self {
            GainStep::Set { at, .. } | GainStep::LinearTo { at, .. } | GainStep::ExponentialTo { at, .. } => at,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            GainStep::Set { value, .. }
            | GainStep::LinearTo { value, .. }
            | GainStep::ExponentialTo { value, .. } => value,
        }
    }
}

/// Gain automation timeline, evaluated the way an audio param evaluates
/// set/linear-ramp/exponential-ramp events.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    steps: Vec<GainStep>,
}

impl Envelope {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn set(mut self, value: f32, at: f64) -> Self {
        self.steps.push(GainStep::Set { value, at });
        self
    }

    pub fn linear_to(mut self, value: f32, at: f64) -> Self {
        self.steps.push(GainStep::LinearTo { value, at });
        self
    }

    /// Exponential ramps cannot target zero; the value is floored just above it.
    pub fn exponential_to(mut self, value: f32, at: f64) -> Self {
        self.steps.push(GainStep::ExponentialTo {
            value: value.max(1e-4),
            at,
        });
        self
    }

    /// Plucked-string shape: silent at `start`, linear attack to `peak`,
    /// optional early dip, exponential decay to the silence floor at `end`.
    pub fn pluck(start: f64, end: f64, peak: f32, attack: f64) -> Self {
        let attack_end = (start + attack).min(end);
        let mut envelope = Envelope::new().set(0.0, start).linear_to(peak, attack_end);
        let dip_at = start + 0.1;
        if dip_at < end - 0.05 && dip_at > attack_end {
            envelope = envelope.exponential_to(peak * 0.7, dip_at);
        }
        envelope.exponential_to(SILENCE_FLOOR, end)
    }

    /// Constant gain, used for silent self-test voices
    pub fn constant(value: f32, at: f64) -> Self {
        Envelope::new().set(value, at)
    }

    pub fn steps(&self) -> &[GainStep] {
        &self.steps
    }

    pub fn peak(&self) -> f32 {
        self.steps.iter().map(|s| s.value()).fold(0.0, f32::max)
    }

    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_value = 0.0_f32;
        let mut prev_time = self.steps.first().map(|s| s.at()).unwrap_or(0.0);

        for step in &self.steps {
            let at = step.at();
            if time < at {
                return match *step {
                    GainStep::Set { .. } => prev_value,
                    GainStep::LinearTo { value, .. } => {
                        let span = (at - prev_time).max(f64::EPSILON);
                        let progress = ((time - prev_time) / span).clamp(0.0, 1.0) as f32;
                        prev_value + (value - prev_value) * progress
                    }
                    GainStep::ExponentialTo { value, .. } => {
                        let span = (at - prev_time).max(f64::EPSILON);
                        let progress = ((time - prev_time) / span).clamp(0.0, 1.0);
                        let from = prev_value.max(1e-4) as f64;
                        (from * (value as f64 / from).powf(progress)) as f32
                    }
                };
            }
            prev_value = step.value();
            prev_time = at;
        }

        prev_value
    }
}

/// Exponential decay reaching `floor` exactly at `duration`
pub fn exponential_decay(time: f64, duration: f64, floor: f64) -> f64 {
    if duration <= 0.0 {
        return floor;
    }
    let rate = (1.0 / floor).ln() / duration;
    (-rate * time).exp()
}

/// Convert time in seconds to samples
pub fn time_to_samples(time_seconds: f64, sample_rate: u32) -> usize {
    (time_seconds * sample_rate as f64).round() as usize
}

#[cfg(test)]
#[path = "test_synth.rs"]
mod tests;
