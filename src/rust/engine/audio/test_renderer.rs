use super::*;
use crate::utils::wav_parser::{inspect_wav, pcm16_samples};

/// 16-bit magnitude treated as silence (about 0.001 normalized)
const SILENCE_THRESHOLD: i16 = 32;

#[test]
fn test_simultaneous_voices_share_start_and_end() {
    let live = LiveSection::default();
    let voices = plan_live_voices(&[261.63, 329.63, 392.0], false, 1.0, &live);

    assert_eq!(voices.len(), 3);
    for voice in &voices {
        assert_eq!(voice.start_at, 1.0);
        assert_eq!(voice.stop_at, 3.0);
        assert_eq!(voice.envelope.peak(), live.chord_volume);
        assert_eq!(voice.waveform, Waveform::Sawtooth);
        assert_eq!(voice.filter.unwrap().cutoff, voice.frequency * 3.0);
    }
}

#[test]
fn test_strummed_voices_are_staggered_and_end_together() {
    let live = LiveSection::default();
    let voices = plan_live_voices(&[82.41, 110.0, 146.83, 196.0], true, 0.0, &live);

    for (i, voice) in voices.iter().enumerate() {
        assert!((voice.start_at - i as f64 * 0.08).abs() < 1e-9);
        assert_eq!(voice.stop_at, 2.0);
        assert_eq!(voice.envelope.peak(), live.strum_volume);
    }
}

#[test]
fn test_lowpass_can_be_disabled() {
    let live = LiveSection {
        lowpass: false,
        ..LiveSection::default()
    };
    let voices = plan_live_voices(&[440.0], false, 0.0, &live);
    assert!(voices[0].filter.is_none());
}

#[test]
fn test_rendered_clip_header_matches_contract() {
    let clip = render_clip("C major", &[261.63, 329.63, 392.0], 1.5).unwrap();
    let info = inspect_wav(&clip.bytes).unwrap();

    assert_eq!(info.audio_format, 1);
    assert_eq!(info.channels, 1);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.sample_rate, 44_100);
    assert_eq!(info.data_len as usize, 2 * clip.sample_count);
    assert_eq!(clip.sample_count, 66_150);
    assert_eq!(clip.byte_len(), 44 + 2 * 66_150);
    assert_eq!(clip.mime_type(), "audio/wav");
}

#[test]
fn test_rendered_clip_ends_in_silence() {
    for duration in [1.5, 2.0] {
        let clip = render_clip("Am", &[220.0, 261.63, 329.63], duration).unwrap();
        let samples = pcm16_samples(&clip.bytes).unwrap();
        let tail = time_to_samples(0.005, 44_100);

        assert!(
            samples[samples.len() - tail..]
                .iter()
                .all(|s| s.abs() <= SILENCE_THRESHOLD),
            "tail not silent for {duration}s clip"
        );
    }
}

#[test]
fn test_rendered_clip_is_audible_and_unclipped() {
    let samples = render_chord_samples(&[261.63, 329.63, 392.0], 1.5, 44_100);
    let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.1);
    assert!(peak <= CLIP_PEAK);
}

#[test]
fn test_single_shot_clip_ends_in_silence() {
    let clip = render_single_shot("G", 392.0, 1.5).unwrap();
    let samples = pcm16_samples(&clip.bytes).unwrap();
    assert_eq!(samples.len(), 66_150);
    assert!(samples.last().unwrap().abs() <= SILENCE_THRESHOLD);
}

#[test]
fn test_test_tone_is_inaudible() {
    let voice = test_tone_voice(2.0, Waveform::Sine, 440.0);
    assert_eq!(voice.envelope.value_at(2.05), TEST_TONE_GAIN);
    assert!((voice.stop_at - 2.1).abs() < 1e-9);
}
