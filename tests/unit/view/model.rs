use super::*;
use serde_json::json;

#[test]
fn empty_object_is_all_defaults() {
    let def: ViewConfigDef = serde_json::from_value(json!({})).unwrap();
    assert_eq!(def, ViewConfigDef::default());
}

#[test]
fn auto_or_number_forms() {
    let def: ViewConfigDef = serde_json::from_value(json!({
        "end_time": 12.5,
        "pitch_min": "auto",
        "pitch_max": 84,
    }))
    .unwrap();
    assert_eq!(def.end_time, AutoOr::Value(12.5));
    assert_eq!(def.pitch_min, AutoOr::Auto);
    assert_eq!(def.pitch_max.value(), Some(84));

    let def: ViewConfigDef = serde_json::from_value(json!({ "end_time": "AUTO" })).unwrap();
    assert_eq!(def.end_time, AutoOr::Auto);
}

#[test]
fn non_numeric_end_time_is_rejected() {
    let err = serde_json::from_value::<ViewConfigDef>(json!({ "end_time": "soon" })).unwrap_err();
    assert!(err.to_string().contains("soon"));
}

#[test]
fn colors_accept_hex_array_and_object() {
    let def: ViewConfigDef = serde_json::from_value(json!({
        "color_active": "#FF8000",
        "color_silent": [1, 2, 3],
        "color_background": { "r": 9, "g": 8, "b": 7 },
    }))
    .unwrap();
    assert_eq!(def.color_active, Rgb8::new(255, 128, 0));
    assert_eq!(def.color_silent, Rgb8::new(1, 2, 3));
    assert_eq!(def.color_background, Rgb8::new(9, 8, 7));

    assert!(serde_json::from_value::<ViewConfigDef>(json!({ "color_active": "#12" })).is_err());
    assert!(
        serde_json::from_value::<ViewConfigDef>(json!({ "color_active": [300, 0, 0] })).is_err()
    );
}

#[test]
fn frame_rate_forms() {
    let def: ViewConfigDef = serde_json::from_value(json!({ "frame_rate": 24 })).unwrap();
    assert_eq!(def.frame_rate, FrameRateDef::Decimal(24.0));
    let def: ViewConfigDef =
        serde_json::from_value(json!({ "frame_rate": { "num": 30000, "den": 1001 } })).unwrap();
    assert_eq!(
        def.frame_rate,
        FrameRateDef::Rational {
            num: 30000,
            den: 1001
        }
    );
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(serde_json::from_value::<ViewConfigDef>(json!({ "fps": 30 })).is_err());
}

#[test]
fn serialization_round_trips() {
    let mut def = ViewConfigDef::default();
    def.end_time = AutoOr::Value(5.0);
    let text = serde_json::to_string(&def).unwrap();
    assert!(text.contains("\"pitch_min\":\"auto\""));
    let back: ViewConfigDef = serde_json::from_str(&text).unwrap();
    assert_eq!(back, def);
}
