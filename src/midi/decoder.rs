use std::collections::BTreeMap;

use crate::foundation::error::RollResult;
use crate::midi::event::{EventPayload, EventStream, MIDI_MAX, NoteEvent, NoteKind};
use crate::timeline::model::{LaneKey, NoteInterval, TickTimeline, Timeline};
use crate::timeline::tempo::{TempoContext, micros_per_quarter_to_bpm};

/// A recoverable irregularity found while decoding. None of these abort decoding.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Note-off with no unfinished interval of that pitch on the track; ignored.
    UnmatchedNoteOff {
        /// Track index.
        track: usize,
        /// Pitch of the note-off.
        pitch: u8,
        /// Absolute tick.
        tick: u64,
    },
    /// Interval still open at the end of its track; excluded from timing.
    UnfinishedNote {
        /// Track index.
        track: usize,
        /// Pitch.
        pitch: u8,
        /// Start tick of the open interval.
        start_ticks: u64,
    },
    /// Note event with a pitch above 127; skipped.
    InvalidPitch {
        /// Track index.
        track: usize,
        /// Offending pitch.
        pitch: u8,
        /// Absolute tick.
        tick: u64,
    },
    /// Tempo event of zero microseconds per quarter; skipped.
    InvalidTempo {
        /// Track index.
        track: usize,
        /// Absolute tick.
        tick: u64,
    },
    /// Tempo event that overwrote an earlier one. Only the last tempo is used for timing.
    TempoSuperseded {
        /// Track index.
        track: usize,
        /// Absolute tick.
        tick: u64,
        /// New tempo.
        bpm: f64,
    },
}

/// Anomalies collected during one decode, in encounter order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct DecodeDiagnostics {
    /// Every anomaly found.
    pub anomalies: Vec<Anomaly>,
}

impl DecodeDiagnostics {
    /// Return `true` when nothing irregular was found.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Number of ignored note-offs.
    pub fn unmatched_note_offs(&self) -> usize {
        self.count(|a| matches!(a, Anomaly::UnmatchedNoteOff { .. }))
    }

    /// Number of intervals left open at end of stream.
    pub fn unfinished_notes(&self) -> usize {
        self.count(|a| matches!(a, Anomaly::UnfinishedNote { .. }))
    }

    /// Number of tempo events that replaced an earlier tempo.
    pub fn superseded_tempos(&self) -> usize {
        self.count(|a| matches!(a, Anomaly::TempoSuperseded { .. }))
    }

    fn count(&self, pred: impl Fn(&Anomaly) -> bool) -> usize {
        self.anomalies.iter().filter(|a| pred(a)).count()
    }
}

/// Output of [`decode`]: untimed intervals, the file-global tempo and diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    /// Intervals in tick space (unfinished ones included).
    pub timeline: TickTimeline,
    /// Resolution and the last tempo observed.
    pub tempo: TempoContext,
    /// Everything that was skipped or left open.
    pub diagnostics: DecodeDiagnostics,
}

impl Decoded {
    /// Apply timing once, over the whole file, and return the timed timeline.
    pub fn into_timeline(self) -> (Timeline, DecodeDiagnostics) {
        (self.timeline.into_timed(self.tempo), self.diagnostics)
    }
}

#[derive(Default)]
struct LaneBuilder {
    notes: Vec<NoteInterval>,
    /// Indices into `notes` of intervals still waiting for a note-off; the top is the most
    /// recently opened.
    open: Vec<usize>,
}

/// Pair note-ons with note-offs into per-(track, pitch) intervals.
///
/// Each track keeps its own absolute tick counter. A note-off (or velocity-0 note-on) closes the
/// most recently opened unfinished interval of its pitch on the same track (LIFO). Tempo events
/// overwrite one file-global tempo; no interval is timed here.
#[tracing::instrument(skip(stream), fields(tracks = stream.tracks.len(), resolution = stream.resolution))]
pub fn decode(stream: &EventStream) -> RollResult<Decoded> {
    let mut tempo = TempoContext::new(stream.resolution)?;
    let mut diagnostics = DecodeDiagnostics::default();
    let mut lanes = BTreeMap::<LaneKey, LaneBuilder>::new();

    for (track, events) in stream.tracks.iter().enumerate() {
        let mut tick = 0u64;
        for ev in events {
            tick += u64::from(ev.delta);

            if let EventPayload::Tempo { micros_per_quarter } = ev.payload {
                if micros_per_quarter == 0 {
                    diagnostics
                        .anomalies
                        .push(Anomaly::InvalidTempo { track, tick });
                    continue;
                }
                let bpm = micros_per_quarter_to_bpm(micros_per_quarter);
                if tempo.tempo_events > 0 {
                    diagnostics
                        .anomalies
                        .push(Anomaly::TempoSuperseded { track, tick, bpm });
                }
                tempo.observe(bpm);
                continue;
            }

            let Some(note) = NoteEvent::from_payload(track, tick, &ev.payload) else {
                continue;
            };
            if note.pitch > MIDI_MAX {
                diagnostics.anomalies.push(Anomaly::InvalidPitch {
                    track,
                    pitch: note.pitch,
                    tick,
                });
                continue;
            }
            apply_note(&mut lanes, &mut diagnostics, note);
        }
    }

    let mut map = BTreeMap::new();
    for (key, lane) in lanes {
        for &i in &lane.open {
            diagnostics.anomalies.push(Anomaly::UnfinishedNote {
                track: key.track,
                pitch: key.pitch,
                start_ticks: lane.notes[i].start_ticks,
            });
        }
        map.insert(key, lane.notes);
    }
    let timeline = TickTimeline::from_map(map);

    tracing::debug!(
        lanes = timeline.lanes().len(),
        notes = timeline.note_count(),
        tempo_bpm = tempo.tempo_bpm,
        "decoded event stream"
    );
    if !diagnostics.is_clean() {
        tracing::warn!(
            unmatched_note_offs = diagnostics.unmatched_note_offs(),
            unfinished_notes = diagnostics.unfinished_notes(),
            superseded_tempos = diagnostics.superseded_tempos(),
            total = diagnostics.anomalies.len(),
            "decode anomalies (skipped)"
        );
    }

    Ok(Decoded {
        timeline,
        tempo,
        diagnostics,
    })
}

fn apply_note(
    lanes: &mut BTreeMap<LaneKey, LaneBuilder>,
    diagnostics: &mut DecodeDiagnostics,
    note: NoteEvent,
) {
    let key = LaneKey {
        track: note.track,
        pitch: note.pitch,
    };
    match note.kind {
        NoteKind::On => {
            let lane = lanes.entry(key).or_default();
            lane.open.push(lane.notes.len());
            lane.notes.push(NoteInterval::open(
                note.track,
                note.pitch,
                note.velocity,
                note.tick,
            ));
        }
        NoteKind::Off => {
            if let Some(lane) = lanes.get_mut(&key)
                && let Some(i) = lane.open.pop()
            {
                lane.notes[i].close(note.tick);
            } else {
                diagnostics.anomalies.push(Anomaly::UnmatchedNoteOff {
                    track: note.track,
                    pitch: note.pitch,
                    tick: note.tick,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/midi/decoder.rs"]
mod tests;
