use super::*;
use crate::midi::decoder::decode;
use crate::midi::event::{EventStream, RawEvent};
use crate::timeline::model::LaneKey;

fn timeline(stream: &EventStream) -> Timeline {
    decode(stream).unwrap().into_timeline().0
}

/// resolution 480 @ 120 BPM: 960 ticks per second.
fn note(start_ticks: u32, len_ticks: u32, pitch: u8) -> Vec<(u64, RawEvent)> {
    vec![
        (u64::from(start_ticks), RawEvent::note_on(0, pitch, 100)),
        (
            u64::from(start_ticks + len_ticks),
            RawEvent::note_off(0, pitch),
        ),
    ]
}

/// Turn absolute-tick events into a delta-coded track (stable by tick).
fn track(mut events: Vec<(u64, RawEvent)>) -> Vec<RawEvent> {
    events.sort_by_key(|(tick, _)| *tick);
    let mut last = 0;
    events
        .into_iter()
        .map(|(tick, mut ev)| {
            ev.delta = (tick - last) as u32;
            last = tick;
            ev
        })
        .collect()
}

/// Deterministic pseudo-random, non-overlapping-per-pitch notes across a few pitches.
fn busy_timeline(seed: u64) -> Timeline {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };
    let mut events = Vec::new();
    for pitch in 50..58u8 {
        let mut at = next() % 500;
        for _ in 0..40 {
            let len = 30 + next() % 900;
            events.extend(note(at, len, pitch));
            at += len + next() % 700;
        }
    }
    timeline(&EventStream::new(480).with_track(track(events)))
}

fn ptr_set(notes: &[&NoteInterval]) -> Vec<*const NoteInterval> {
    let mut v: Vec<_> = notes.iter().map(|n| *n as *const NoteInterval).collect();
    v.sort();
    v
}

#[test]
fn extents_must_have_positive_width() {
    assert!(WindowExtents::new(1.0, 1.0).is_ok());
    assert!(WindowExtents::new(-0.5, 1.0).is_ok());
    assert!(matches!(
        WindowExtents::new(1.0, -1.0),
        Err(RollError::Config(_))
    ));
    assert!(WindowExtents::new(0.0, 0.0).is_err());
    assert!(WindowExtents::new(f64::NAN, 1.0).is_err());
}

#[test]
fn visible_notes_satisfy_window_invariant() {
    let tl = busy_timeline(7);
    let extents = WindowExtents::new(1.0, 2.0).unwrap();
    let clock = FrameClock::new(0.0, 40.0, Fps::new(24, 1).unwrap()).unwrap();
    let mut sweep = WindowSweep::new(&tl, extents);

    let mut saw_any = false;
    for (_, t) in clock.iter() {
        let set = sweep.advance(t).unwrap();
        for n in &set.notes {
            assert!(n.start_time < set.window.right);
            assert!(n.end_time >= set.window.left);
        }
        saw_any |= !set.is_empty();
    }
    assert!(saw_any);
}

#[test]
fn sweep_matches_brute_force_scan() {
    let tl = busy_timeline(42);
    let extents = WindowExtents::new(0.75, 1.5).unwrap();
    let clock = FrameClock::new(0.0, 30.0, Fps::new(30, 1).unwrap()).unwrap();
    let mut sweep = WindowSweep::new(&tl, extents);

    for (_, t) in clock.iter() {
        let set = sweep.advance(t).unwrap();
        let window = extents.around(t);
        let expected: Vec<&NoteInterval> = tl.notes().filter(|n| window.shows(n)).collect();
        assert_eq!(ptr_set(&set.notes), ptr_set(&expected), "t = {t}");
    }
}

#[test]
fn pruned_notes_never_reappear() {
    let tl = busy_timeline(3);
    let extents = WindowExtents::new(0.5, 0.5).unwrap();
    let clock = FrameClock::new(0.0, 35.0, Fps::new(25, 1).unwrap()).unwrap();
    let mut sweep = WindowSweep::new(&tl, extents);

    let mut previous = sweep.cursors().to_vec();
    for (_, t) in clock.iter() {
        let set = sweep.advance(t).unwrap();
        let cursors = sweep.cursors().to_vec();
        for (lane_idx, (&before, &after)) in previous.iter().zip(cursors.iter()).enumerate() {
            assert!(after >= before, "cursor moved backwards");
            let lane = &tl.lanes()[lane_idx];
            let pruned = &lane.notes()[..after];
            for n in &set.notes {
                assert!(!pruned.iter().any(|p| std::ptr::eq(p, *n)));
            }
        }
        previous = cursors;
    }
    let total: usize = previous.iter().sum();
    assert!(total > 0);
}

#[test]
fn collect_stops_at_first_note_past_right_edge() {
    let mut events = note(0, 480, 60);
    events.extend(note(9600, 480, 60));
    let tl = timeline(&EventStream::new(480).with_track(track(events)));
    let mut sweep = WindowSweep::new(&tl, WindowExtents::new(1.0, 1.0).unwrap());

    let set = sweep.advance(0.0).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.notes[0].start_ticks, 0);
    assert_eq!(sweep.cursors(), &[0]);

    // 2.0 s later the first note (ends 0.5 s) has left the window and is pruned.
    let set = sweep.advance(2.0).unwrap();
    assert!(set.is_empty());
    assert_eq!(sweep.cursors(), &[1]);

    let set = sweep.advance(9.5).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.notes[0].start_ticks, 9600);
}

#[test]
fn nested_retrigger_is_filtered_while_outer_note_holds_cursor() {
    // Outer 0..4 s, inner 0.5..1 s on the same pitch.
    let stream = EventStream::new(480).with_track(vec![
        RawEvent::note_on(0, 60, 100),
        RawEvent::note_on(480, 60, 100),
        RawEvent::note_off(480, 60),
        RawEvent::note_off(2880, 60),
    ]);
    let tl = timeline(&stream);
    let lane = tl.lane(LaneKey { track: 0, pitch: 60 }).unwrap();
    assert_eq!(lane[1].end_time, 1.0);

    let mut sweep = WindowSweep::new(&tl, WindowExtents::new(0.5, 0.5).unwrap());
    let set = sweep.advance(3.0).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.notes[0].start_ticks, 0);
    assert_eq!(sweep.cursors(), &[0]);
}

#[test]
fn going_backwards_fails_until_reset() {
    let tl = busy_timeline(1);
    let mut sweep = WindowSweep::new(&tl, WindowExtents::new(1.0, 1.0).unwrap());
    assert!(sweep.advance(20.0).is_ok());
    assert!(matches!(sweep.advance(1.0), Err(RollError::Render(_))));
    assert!(sweep.advance(f64::NAN).is_err());

    sweep.reset();
    assert!(sweep.cursors().iter().all(|&c| c == 0));
    let early = sweep.advance(1.0).unwrap();
    let expected = tl
        .notes()
        .filter(|n| WindowExtents::new(1.0, 1.0).unwrap().around(1.0).shows(n))
        .count();
    assert_eq!(early.len(), expected);
}

#[test]
fn empty_timeline_yields_empty_sets() {
    let tl = timeline(&EventStream::new(480).with_track(vec![RawEvent::note_off(0, 60)]));
    let mut sweep = WindowSweep::new(&tl, WindowExtents::new(1.0, 1.0).unwrap());
    assert!(sweep.advance(0.0).unwrap().is_empty());
    assert!(sweep.cursors().is_empty());
}

#[test]
fn frame_clock_counts_and_times() {
    let clock = FrameClock::new(0.0, 2.0, Fps::new(30, 1).unwrap()).unwrap();
    assert_eq!(clock.frame_count(), 60);
    assert_eq!(clock.range().len_frames(), 60);
    assert_eq!(clock.time_of(FrameIndex(15)), 0.5);

    let clock = FrameClock::new(1.25, 2.0, Fps::new(10, 1).unwrap()).unwrap();
    assert_eq!(clock.frame_count(), 8);
    let times: Vec<f64> = clock.iter().map(|(_, t)| t).collect();
    assert_eq!(times.first(), Some(&1.25));
    assert!(times.iter().all(|&t| t < 2.0));

    assert!(FrameClock::new(2.0, 2.0, Fps::new(30, 1).unwrap()).is_err());
    assert!(FrameClock::new(0.0, f64::INFINITY, Fps::new(30, 1).unwrap()).is_err());
}
