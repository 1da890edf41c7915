use super::*;
use midly::num::{u4, u7, u15, u24, u28};
use midly::{Format, Header, TrackEvent};

fn midi(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(3),
            message,
        },
    }
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn encode(smf: &Smf<'_>) -> Vec<u8> {
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

#[test]
fn smf_events_map_to_raw_events() {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
    smf.tracks.push(vec![
        meta(0, MetaMessage::Tempo(u24::new(600_000))),
        meta(0, MetaMessage::EndOfTrack),
    ]);
    smf.tracks.push(vec![
        midi(
            0,
            MidiMessage::NoteOn {
                key: u7::new(60),
                vel: u7::new(100),
            },
        ),
        midi(
            10,
            MidiMessage::Controller {
                controller: u7::new(7),
                value: u7::new(90),
            },
        ),
        midi(
            470,
            MidiMessage::NoteOff {
                key: u7::new(60),
                vel: u7::new(64),
            },
        ),
        midi(
            0,
            MidiMessage::NoteOn {
                key: u7::new(62),
                vel: u7::new(0),
            },
        ),
        meta(0, MetaMessage::EndOfTrack),
    ]);

    let stream = EventStream::from_smf_bytes(&encode(&smf)).unwrap();
    assert_eq!(stream.resolution, 480);
    assert_eq!(stream.tracks.len(), 2);
    assert_eq!(
        stream.tracks[0][0].payload,
        EventPayload::Tempo {
            micros_per_quarter: 600_000
        }
    );
    assert_eq!(stream.tracks[0][1].payload, EventPayload::Other);

    let t1 = &stream.tracks[1];
    assert_eq!(t1[0], RawEvent::note_on(0, 60, 100));
    assert_eq!(t1[1].payload, EventPayload::Other);
    assert_eq!(t1[1].delta, 10);
    assert_eq!(
        t1[2].payload,
        EventPayload::NoteOff {
            pitch: 60,
            velocity: 64
        }
    );
    assert_eq!(t1[2].delta, 470);
    assert_eq!(
        t1[3].payload,
        EventPayload::NoteOn {
            pitch: 62,
            velocity: 0
        }
    );
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let err = EventStream::from_smf_bytes(b"not a midi file").unwrap_err();
    assert!(matches!(err, RollError::Decode(_)));
}

#[test]
fn timecode_timing_is_rejected() {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Timecode(midly::Fps::Fps25, 40),
    ));
    smf.tracks.push(vec![meta(0, MetaMessage::EndOfTrack)]);
    let err = EventStream::from_smf_bytes(&encode(&smf)).unwrap_err();
    assert!(err.to_string().contains("SMPTE"));
}

#[test]
fn missing_file_keeps_path_context() {
    let err = EventStream::from_path("target/definitely/missing.mid").unwrap_err();
    assert!(err.to_string().contains("missing.mid"));
}
