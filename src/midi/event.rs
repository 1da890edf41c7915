/// Highest valid MIDI pitch / velocity value.
pub const MIDI_MAX: u8 = 127;

/// Payload of one raw track event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPayload {
    /// Note-On. Velocity 0 is treated as a note-off.
    NoteOn {
        /// Pitch 0–127.
        pitch: u8,
        /// Velocity 0–127.
        velocity: u8,
    },
    /// Explicit Note-Off.
    NoteOff {
        /// Pitch 0–127.
        pitch: u8,
        /// Release velocity 0–127 (unused).
        velocity: u8,
    },
    /// Tempo change, in microseconds per quarter note.
    Tempo {
        /// Microseconds per quarter note.
        micros_per_quarter: u32,
    },
    /// Anything else. Its delta still advances the track clock.
    Other,
}

/// One event of a track: a delta in ticks relative to the previous event, plus a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Ticks since the previous event on the same track.
    pub delta: u32,
    /// What happened.
    pub payload: EventPayload,
}

impl RawEvent {
    /// Note-On event.
    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self {
            delta,
            payload: EventPayload::NoteOn { pitch, velocity },
        }
    }

    /// Note-Off event.
    pub fn note_off(delta: u32, pitch: u8) -> Self {
        Self {
            delta,
            payload: EventPayload::NoteOff { pitch, velocity: 0 },
        }
    }

    /// Tempo event given in beats per minute.
    pub fn tempo_bpm(delta: u32, bpm: f64) -> Self {
        Self {
            delta,
            payload: EventPayload::Tempo {
                micros_per_quarter: (60_000_000.0 / bpm).round() as u32,
            },
        }
    }

    /// Ignored event.
    pub fn other(delta: u32) -> Self {
        Self {
            delta,
            payload: EventPayload::Other,
        }
    }
}

/// A whole file's worth of events: header resolution plus one ordered event list per track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventStream {
    /// Ticks per quarter note.
    pub resolution: u16,
    /// Per-track events in file order.
    pub tracks: Vec<Vec<RawEvent>>,
}

impl EventStream {
    /// Create an empty stream with the given resolution.
    pub fn new(resolution: u16) -> Self {
        Self {
            resolution,
            tracks: Vec::new(),
        }
    }

    /// Append a track and return `self` for chaining.
    pub fn with_track(mut self, events: Vec<RawEvent>) -> Self {
        self.tracks.push(events);
        self
    }
}

/// Direction of a normalized note event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    /// Note starts sounding.
    On,
    /// Note stops sounding.
    Off,
}

/// A note event with absolute timing, produced while decoding and consumed immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    /// Source track.
    pub track: usize,
    /// Pitch.
    pub pitch: u8,
    /// Velocity (0 for offs).
    pub velocity: u8,
    /// On or off.
    pub kind: NoteKind,
    /// Absolute tick position on the track.
    pub tick: u64,
}

impl NoteEvent {
    /// Normalize a raw payload at `tick` into a note event.
    ///
    /// Note-On with velocity 0 becomes [`NoteKind::Off`]. Non-note payloads return `None`.
    pub fn from_payload(track: usize, tick: u64, payload: &EventPayload) -> Option<Self> {
        let (pitch, velocity, kind) = match *payload {
            EventPayload::NoteOn { pitch, velocity } if velocity > 0 => {
                (pitch, velocity, NoteKind::On)
            }
            EventPayload::NoteOn { pitch, .. } | EventPayload::NoteOff { pitch, .. } => {
                (pitch, 0, NoteKind::Off)
            }
            EventPayload::Tempo { .. } | EventPayload::Other => return None,
        };
        Some(Self {
            track,
            pitch,
            velocity,
            kind,
            tick,
        })
    }
}
