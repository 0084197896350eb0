use super::*;

#[test]
fn test_oscillator_sine() {
    let sample = Waveform::Sine.sample(440.0, 0.0);
    assert!((sample - 0.0).abs() < 0.01);
}

#[test]
fn test_oscillator_square() {
    let sample = Waveform::Square.sample(440.0, 0.0);
    assert!((sample - 1.0).abs() < 0.01);
}

#[test]
fn test_sawtooth_stays_in_range() {
    for i in 0..1000 {
        let s = Waveform::Sawtooth.sample(110.0, i as f64 / 44_100.0);
        assert!((-1.0..=1.0).contains(&s));
    }
}

#[test]
fn test_pluck_envelope_shape() {
    let env = Envelope::pluck(1.0, 3.0, 0.1, 0.02);

    assert_eq!(env.value_at(0.5), 0.0);
    assert!((env.value_at(1.01) - 0.05).abs() < 0.005, "mid-attack");
    assert!((env.value_at(1.02) - 0.1).abs() < 1e-6, "attack peak");
    assert!(env.value_at(2.0) < 0.07);
    assert!((env.value_at(3.0) - SILENCE_FLOOR).abs() < 1e-6);
    assert!((env.value_at(10.0) - SILENCE_FLOOR).abs() < 1e-6);
}

#[test]
fn test_short_pluck_skips_dip() {
    let env = Envelope::pluck(0.0, 0.1, 0.5, 0.01);
    assert_eq!(env.steps().len(), 3);
    assert_eq!(env.peak(), 0.5);
}

#[test]
fn test_exponential_ramp_floors_zero_target() {
    let env = Envelope::new().set(1.0, 0.0).exponential_to(0.0, 1.0);
    assert!(env.value_at(1.0) > 0.0);
}

#[test]
fn test_exponential_decay_hits_floor_at_end() {
    let end = exponential_decay(1.5, 1.5, 0.001);
    assert!((end - 0.001).abs() < 1e-9);
    assert!((exponential_decay(0.0, 1.5, 0.001) - 1.0).abs() < 1e-12);
}

#[test]
fn test_time_to_samples() {
    assert_eq!(time_to_samples(1.5, 44_100), 66_150);
    assert_eq!(time_to_samples(0.25, 44_100), 11_025);
}
