use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::core::Rgb8;

/// A value that is either derived automatically (`"auto"`) or given explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AutoOr<T> {
    /// Derive from the timeline.
    #[default]
    Auto,
    /// Use this value.
    Value(T),
}

impl<T: Copy> AutoOr<T> {
    /// The explicit value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Auto => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<T: Serialize> Serialize for AutoOr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for AutoOr<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Str(String),
            Value(T),
        }

        match Repr::<T>::deserialize(deserializer)? {
            Repr::Str(s) if s.trim().eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            Repr::Str(s) => Err(serde::de::Error::custom(format!(
                "expected \"auto\" or a number, got \"{s}\""
            ))),
            Repr::Value(v) => Ok(Self::Value(v)),
        }
    }
}

/// Frame rate as a decimal number (`30`, `29.97`) or a rational (`{ "num": 30000, "den": 1001 }`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameRateDef {
    /// Frames per second.
    Decimal(f64),
    /// Exact rational rate.
    Rational {
        /// Numerator.
        num: u32,
        /// Denominator.
        den: u32,
    },
}

impl Default for FrameRateDef {
    fn default() -> Self {
        Self::Decimal(30.0)
    }
}

/// Canvas size as written in the config. Signed so that negative sizes are reported as
/// configuration errors rather than parse errors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasDef {
    /// Width in pixels.
    pub width: i64,
    /// Height in pixels.
    pub height: i64,
}

impl Default for CanvasDef {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Pixels removed from each note rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoteTrimDef {
    /// Removed from the width.
    pub x: f64,
    /// Removed from the row height.
    pub y: f64,
}

impl Default for NoteTrimDef {
    fn default() -> Self {
        Self { x: 2.0, y: 2.0 }
    }
}

/// JSON-facing view configuration. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfigDef {
    /// Output frame rate.
    pub frame_rate: FrameRateDef,
    /// Time of the first frame, in seconds.
    pub start_time: f64,
    /// Time where rendering stops; `"auto"` is the last note end plus `end_padding`.
    pub end_time: AutoOr<f64>,
    /// Seconds appended after the last note when `end_time` is auto.
    pub end_padding: f64,
    /// Seconds visible before the current time.
    pub time_before_current: f64,
    /// Seconds visible after the current time.
    pub time_after_current: f64,
    /// Lowest displayed pitch; `"auto"` uses the lowest pitch in the timeline.
    pub pitch_min: AutoOr<i64>,
    /// Highest displayed pitch; `"auto"` uses the highest pitch in the timeline.
    pub pitch_max: AutoOr<i64>,
    /// Output size.
    pub canvas: CanvasDef,
    /// Vertical margin above and below the note rows, in pixels.
    pub margin_y: i64,
    /// Fill for notes sounding at the current time.
    #[serde(deserialize_with = "deserialize_rgb")]
    pub color_active: Rgb8,
    /// Fill for visible notes not sounding.
    #[serde(deserialize_with = "deserialize_rgb")]
    pub color_silent: Rgb8,
    /// Background fill.
    #[serde(deserialize_with = "deserialize_rgb")]
    pub color_background: Rgb8,
    /// Note rectangle trims.
    pub note_trim: NoteTrimDef,
}

impl Default for ViewConfigDef {
    fn default() -> Self {
        Self {
            frame_rate: FrameRateDef::default(),
            start_time: 0.0,
            end_time: AutoOr::Auto,
            end_padding: 1.0,
            time_before_current: 1.0,
            time_after_current: 3.0,
            pitch_min: AutoOr::Auto,
            pitch_max: AutoOr::Auto,
            canvas: CanvasDef::default(),
            margin_y: 10,
            color_active: Rgb8::new(255, 160, 40),
            color_silent: Rgb8::new(70, 110, 200),
            color_background: Rgb8::new(16, 16, 24),
            note_trim: NoteTrimDef::default(),
        }
    }
}

/// Colors are `[r, g, b]`, `"#rrggbb"` or `{ "r": .., "g": .., "b": .. }`.
fn deserialize_rgb<'de, D>(deserializer: D) -> Result<Rgb8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Hex(String),
        Arr([u8; 3]),
        Obj { r: u8, g: u8, b: u8 },
    }

    match Repr::deserialize(deserializer)? {
        Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
        Repr::Arr([r, g, b]) | Repr::Obj { r, g, b } => Ok(Rgb8::new(r, g, b)),
    }
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if s.len() != 6 || !s.is_ascii() {
        return Err("hex color must be #RRGGBB (case-insensitive)".to_owned());
    }
    Ok(Rgb8::new(
        hex_byte(&s[0..2])?,
        hex_byte(&s[2..4])?,
        hex_byte(&s[4..6])?,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/view/model.rs"]
mod tests;
