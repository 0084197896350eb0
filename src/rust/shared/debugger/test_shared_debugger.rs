use super::*;

#[test]
fn test_debug_timer() {
    let timer = DebugTimer::new("unlock", 1_000.0);
    assert_eq!(timer.label(), "unlock");
    assert_eq!(timer.elapsed_ms(1_250.5), 250.5);
}

#[test]
fn test_debug_timer_never_negative() {
    let timer = DebugTimer::new("clock skew", 1_000.0);
    assert_eq!(timer.elapsed_ms(900.0), 0.0);
}
