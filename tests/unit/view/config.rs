use super::*;
use crate::midi::decoder::decode;
use crate::midi::event::{EventStream, RawEvent};
use crate::foundation::core::FrameIndex;
use crate::view::model::{AutoOr, CanvasDef, NoteTrimDef};

fn two_note_timeline() -> Timeline {
    // 60: 0.0..0.5 s, 64: 0.5..1.5 s at 480 ticks/quarter, 120 BPM.
    let stream = EventStream::new(480).with_track(vec![
        RawEvent::note_on(0, 60, 100),
        RawEvent::note_off(480, 60),
        RawEvent::note_on(0, 64, 100),
        RawEvent::note_off(960, 64),
    ]);
    decode(&stream).unwrap().into_timeline().0
}

fn config_err(def: ViewConfigDef) -> String {
    match ViewConfig::from_def(&def) {
        Err(RollError::Config(msg)) => msg,
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn defaults_validate() {
    let view = ViewConfig::from_def(&ViewConfigDef::default()).unwrap();
    assert_eq!(view.fps(), Fps::new(30, 1).unwrap());
    assert_eq!(view.canvas(), Canvas { width: 1280, height: 720 });
    assert_eq!(view.extents().span(), 4.0);
}

#[test]
fn auto_bounds_resolve_from_timeline() {
    let def = ViewConfigDef {
        end_padding: 0.5,
        ..ViewConfigDef::default()
    };
    let resolved = ViewConfig::from_def(&def)
        .unwrap()
        .resolve(&two_note_timeline())
        .unwrap();
    assert_eq!(resolved.end_time, 2.0);
    assert_eq!((resolved.pitch_min, resolved.pitch_max), (60, 64));
    assert_eq!(resolved.clock.frame_count(), 60);
}

#[test]
fn explicit_bounds_override_timeline() {
    let def = ViewConfigDef {
        end_time: AutoOr::Value(10.0),
        pitch_min: AutoOr::Value(21),
        pitch_max: AutoOr::Value(108),
        frame_rate: FrameRateDef::Decimal(24.0),
        ..ViewConfigDef::default()
    };
    let resolved = ViewConfig::from_def(&def)
        .unwrap()
        .resolve(&two_note_timeline())
        .unwrap();
    assert_eq!(resolved.end_time, 10.0);
    assert_eq!((resolved.pitch_min, resolved.pitch_max), (21, 108));
    assert_eq!(resolved.clock.frame_count(), 240);
}

#[test]
fn auto_bounds_on_empty_timeline_fail() {
    let empty = decode(&EventStream::new(480)).unwrap().into_timeline().0;
    let view = ViewConfig::from_def(&ViewConfigDef::default()).unwrap();
    assert!(matches!(view.resolve(&empty), Err(RollError::Config(_))));

    let explicit = ViewConfig::from_def(&ViewConfigDef {
        end_time: AutoOr::Value(1.0),
        pitch_min: AutoOr::Value(40),
        pitch_max: AutoOr::Value(80),
        ..ViewConfigDef::default()
    })
    .unwrap();
    assert_eq!(explicit.resolve(&empty).unwrap().clock.frame_count(), 30);
}

#[test]
fn explicit_min_above_observed_max_fails_at_resolve() {
    let view = ViewConfig::from_def(&ViewConfigDef {
        pitch_min: AutoOr::Value(100),
        ..ViewConfigDef::default()
    })
    .unwrap();
    assert!(matches!(
        view.resolve(&two_note_timeline()),
        Err(RollError::Config(_))
    ));
}

#[test]
fn window_must_have_positive_width() {
    let msg = config_err(ViewConfigDef {
        time_before_current: 1.0,
        time_after_current: -1.0,
        ..ViewConfigDef::default()
    });
    assert!(msg.contains("positive width"));
}

#[test]
fn invalid_values_fail_fast() {
    config_err(ViewConfigDef {
        frame_rate: FrameRateDef::Decimal(0.0),
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        end_time: AutoOr::Value(0.0),
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        start_time: -1.0,
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        pitch_max: AutoOr::Value(128),
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        pitch_min: AutoOr::Value(70),
        pitch_max: AutoOr::Value(60),
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        canvas: CanvasDef {
            width: -640,
            height: 480,
        },
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        canvas: CanvasDef {
            width: 0,
            height: 480,
        },
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        margin_y: 240,
        canvas: CanvasDef {
            width: 640,
            height: 480,
        },
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        note_trim: NoteTrimDef { x: -1.0, y: 0.0 },
        ..ViewConfigDef::default()
    });
    config_err(ViewConfigDef {
        end_padding: f64::NAN,
        ..ViewConfigDef::default()
    });
}

#[test]
fn json_errors_are_config_errors() {
    let err = ViewConfig::from_reader(r#"{ "end_time": "later" }"#.as_bytes()).unwrap_err();
    assert!(matches!(err, RollError::Config(_)));
    let err = ViewConfig::from_path("target/no/such/view.json").unwrap_err();
    assert!(matches!(err, RollError::Config(_)));

    let ok = ViewConfig::from_reader(
        r##"{ "frame_rate": 60, "canvas": { "width": 320, "height": 240 }, "color_active": "#ffffff" }"##
            .as_bytes(),
    )
    .unwrap();
    assert_eq!(ok.fps(), Fps::new(60, 1).unwrap());
    assert_eq!(ok.palette().active, Rgb8::new(255, 255, 255));
}

#[test]
fn fractional_frame_rate_drives_frame_count() {
    let view = ViewConfig::from_reader(r#"{ "frame_rate": 10.0004, "end_time": 100.0 }"#.as_bytes())
        .unwrap();
    let resolved = view.resolve(&two_note_timeline()).unwrap();
    assert_eq!(resolved.clock.frame_count(), 1001);

    let slow = ViewConfig::from_reader(r#"{ "frame_rate": 0.0004, "end_time": 5000.0 }"#.as_bytes())
        .unwrap();
    let resolved = slow.resolve(&two_note_timeline()).unwrap();
    assert_eq!(resolved.clock.frame_count(), 2);
    assert_eq!(resolved.clock.time_of(FrameIndex(1)), 2500.0);
}
