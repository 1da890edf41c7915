use std::path::Path;

use anyhow::Context as _;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::foundation::error::{RollError, RollResult};
use crate::midi::event::{EventPayload, EventStream, RawEvent};

impl EventStream {
    /// Parse a Standard MIDI File.
    ///
    /// Timing must be metrical. Channels are dropped: notes are grouped per track and pitch.
    pub fn from_smf_bytes(bytes: &[u8]) -> RollResult<Self> {
        let smf = Smf::parse(bytes).map_err(|e| RollError::decode(format!("parse SMF: {e}")))?;
        let resolution = match smf.header.timing {
            Timing::Metrical(ticks) => ticks.as_int(),
            Timing::Timecode(fps, sub) => {
                return Err(RollError::decode(format!(
                    "SMPTE timecode timing ({fps:?}, {sub} subframes) is not supported"
                )));
            }
        };
        if resolution == 0 {
            return Err(RollError::decode("SMF header declares 0 ticks per quarter"));
        }

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|ev| RawEvent {
                        delta: ev.delta.as_int(),
                        payload: payload_of(&ev.kind),
                    })
                    .collect()
            })
            .collect();
        Ok(Self { resolution, tracks })
    }

    /// Read and parse a Standard MIDI File from disk.
    pub fn from_path(path: impl AsRef<Path>) -> RollResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read MIDI file '{}'", path.display()))?;
        Self::from_smf_bytes(&bytes)
    }
}

fn payload_of(kind: &TrackEventKind<'_>) -> EventPayload {
    match *kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } => EventPayload::NoteOn {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => EventPayload::NoteOff {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            _ => EventPayload::Other,
        },
        TrackEventKind::Meta(MetaMessage::Tempo(us)) => EventPayload::Tempo {
            micros_per_quarter: us.as_int(),
        },
        _ => EventPayload::Other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/midi/smf.rs"]
mod tests;
