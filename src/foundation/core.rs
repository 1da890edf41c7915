use crate::foundation::error::{RollError, RollResult};

/// Absolute 0-based frame index within one render.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> RollResult<Self> {
        if start.0 > end.0 {
            return Err(RollError::render("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> RollResult<Self> {
        if den == 0 {
            return Err(RollError::config("frame rate denominator must be > 0"));
        }
        if num == 0 {
            return Err(RollError::config("frame rate numerator must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a decimal frame rate (e.g. `30` or `29.97`) to a rational.
    ///
    /// Uses the continued-fraction convergents of `fps` and stops at the first one within
    /// 1e-12 (relative) of the input, or the last one whose parts fit in `u32`.
    pub fn from_f64(fps: f64) -> RollResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RollError::config(format!(
                "frame rate must be a positive number, got {fps}"
            )));
        }
        let limit = u64::from(u32::MAX);
        // (h_{n-2}, h_{n-1}) and (k_{n-2}, k_{n-1}).
        let (mut h0, mut h1) = (0u64, 1u64);
        let (mut k0, mut k1) = (1u64, 0u64);
        let mut x = fps;
        loop {
            let a = x.floor();
            if a > limit as f64 {
                break;
            }
            let a = a as u64;
            let h2 = a.checked_mul(h1).and_then(|v| v.checked_add(h0));
            let k2 = a.checked_mul(k1).and_then(|v| v.checked_add(k0));
            match (h2, k2) {
                (Some(h2), Some(k2)) if h2 <= limit && k2 <= limit => {
                    (h0, h1) = (h1, h2);
                    (k0, k1) = (k1, k2);
                }
                _ => break,
            }
            let frac = x - a as f64;
            let approx = h1 as f64 / k1 as f64;
            if frac <= 1e-12 || (approx - fps).abs() <= fps * 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }
        match (u32::try_from(h1), u32::try_from(k1)) {
            (Ok(num), Ok(den)) if num > 0 && den > 0 => Self::new(num, den),
            _ => Err(RollError::config(format!("frame rate {fps} is out of range"))),
        }
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Offset of frame `frames` from the start of the render, in seconds.
    ///
    /// Computed from the index, so long renders do not accumulate step error.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64 * f64::from(self.den)) / f64::from(self.num)
    }

    /// Number of frames needed to cover `secs`, i.e. `ceil(secs * fps)`.
    ///
    /// Products within 1e-9 above an integer are treated as that integer. Any positive
    /// duration needs at least one frame.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        if secs.is_nan() || secs <= 0.0 {
            return 0;
        }
        let exact = secs * f64::from(self.num) / f64::from(self.den);
        ((exact - 1e-9).ceil() as u64).max(1)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Size of one RGBA8 frame in bytes.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Opaque RGB8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Construct a color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pixel bytes in RGBA8 order with full alpha.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
