use super::*;

#[test]
fn quarter_note_at_120_bpm_is_half_a_second() {
    let ctx = TempoContext::with_tempo_bpm(480, 120.0).unwrap();
    assert_eq!(ctx.secs_per_tick(), 0.5 / 480.0);
    assert_eq!(ctx.ticks_to_secs(480), 0.5);
    assert_eq!(ctx.ticks_to_secs(960) - ctx.ticks_to_secs(480), 0.5);
    assert_eq!(ctx.ticks_to_secs(0), 0.0);
}

#[test]
fn default_tempo_is_120() {
    let ctx = TempoContext::new(96).unwrap();
    assert_eq!(ctx.tempo_bpm, DEFAULT_TEMPO_BPM);
    assert_eq!(ctx.tempo_events, 0);
    assert_eq!(ctx.ticks_to_secs(96), 0.5);
}

#[test]
fn tempo_changes_scale_time() {
    assert_eq!(ticks_to_secs(480, 480, 60.0), 1.0);
    assert_eq!(ticks_to_secs(240, 480, 240.0), 0.125);
}

#[test]
fn micros_per_quarter_converts() {
    assert_eq!(micros_per_quarter_to_bpm(500_000), 120.0);
    assert_eq!(micros_per_quarter_to_bpm(1_000_000), 60.0);
}

#[test]
fn invalid_contexts_are_rejected() {
    assert!(TempoContext::new(0).is_err());
    assert!(TempoContext::with_tempo_bpm(480, 0.0).is_err());
    assert!(TempoContext::with_tempo_bpm(480, f64::INFINITY).is_err());
}

#[test]
fn observe_overwrites_and_counts() {
    let mut ctx = TempoContext::new(480).unwrap();
    ctx.observe(90.0);
    ctx.observe(140.0);
    assert_eq!(ctx.tempo_bpm, 140.0);
    assert_eq!(ctx.tempo_events, 2);
}
