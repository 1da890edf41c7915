use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::{Canvas, Fps, Rgb8};
use crate::foundation::error::{RollError, RollResult};
use crate::timeline::model::Timeline;
use crate::timeline::window::{FrameClock, WindowExtents};
use crate::view::model::{FrameRateDef, ViewConfigDef};

/// Fill colors of one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Palette {
    /// Notes sounding at the current time.
    pub active: Rgb8,
    /// Visible notes not sounding.
    pub silent: Rgb8,
    /// Everything else.
    pub background: Rgb8,
}

/// Pixels removed from each note rectangle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct NoteTrim {
    /// Removed from the width.
    pub x: f64,
    /// Removed from the row height.
    pub y: f64,
}

/// Validated view configuration, immutable for the duration of a render.
///
/// Only obtainable through [`ViewConfig::from_def`] (or the JSON loaders built on it), so every
/// range is checked before any frame is produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    fps: Fps,
    start_time: f64,
    end_time: Option<f64>,
    end_padding: f64,
    extents: WindowExtents,
    pitch_min: Option<u8>,
    pitch_max: Option<u8>,
    canvas: Canvas,
    margin_y: u32,
    palette: Palette,
    trim: NoteTrim,
}

impl ViewConfig {
    /// Validate a definition.
    ///
    /// `ViewConfig::from_def(&ViewConfigDef::default())` gives the default view.
    pub fn from_def(def: &ViewConfigDef) -> RollResult<Self> {
        let fps = match def.frame_rate {
            FrameRateDef::Decimal(v) => Fps::from_f64(v)?,
            FrameRateDef::Rational { num, den } => Fps::new(num, den)?,
        };

        if !def.start_time.is_finite() || def.start_time < 0.0 {
            return Err(RollError::config(format!(
                "start_time must be a finite number >= 0, got {}",
                def.start_time
            )));
        }
        let end_time = def.end_time.value();
        if let Some(end) = end_time
            && (!end.is_finite() || end <= def.start_time)
        {
            return Err(RollError::config(format!(
                "end_time ({end}) must be finite and greater than start_time ({})",
                def.start_time
            )));
        }
        if !def.end_padding.is_finite() || def.end_padding < 0.0 {
            return Err(RollError::config(format!(
                "end_padding must be a finite number >= 0, got {}",
                def.end_padding
            )));
        }

        let extents = WindowExtents::new(def.time_before_current, def.time_after_current)?;

        let pitch_min = def.pitch_min.value().map(|p| pitch("pitch_min", p)).transpose()?;
        let pitch_max = def.pitch_max.value().map(|p| pitch("pitch_max", p)).transpose()?;
        if let (Some(lo), Some(hi)) = (pitch_min, pitch_max)
            && lo > hi
        {
            return Err(RollError::config(format!(
                "pitch_min ({lo}) must not exceed pitch_max ({hi})"
            )));
        }

        let canvas = Canvas {
            width: pixels("canvas.width", def.canvas.width)?,
            height: pixels("canvas.height", def.canvas.height)?,
        };
        if canvas.width == 0 || canvas.height == 0 {
            return Err(RollError::config(format!(
                "canvas must be at least 1x1, got {}x{}",
                canvas.width, canvas.height
            )));
        }
        let margin_y = pixels("margin_y", def.margin_y)?;
        if u64::from(margin_y) * 2 >= u64::from(canvas.height) {
            return Err(RollError::config(format!(
                "margin_y ({margin_y}) leaves no room for notes on a canvas {} px high",
                canvas.height
            )));
        }

        let trim = NoteTrim {
            x: def.note_trim.x,
            y: def.note_trim.y,
        };
        if !trim.x.is_finite() || !trim.y.is_finite() || trim.x < 0.0 || trim.y < 0.0 {
            return Err(RollError::config("note_trim x/y must be finite numbers >= 0"));
        }

        Ok(Self {
            fps,
            start_time: def.start_time,
            end_time,
            end_padding: def.end_padding,
            extents,
            pitch_min,
            pitch_max,
            canvas,
            margin_y,
            palette: Palette {
                active: def.color_active,
                silent: def.color_silent,
                background: def.color_background,
            },
            trim,
        })
    }

    /// Parse and validate a JSON view config.
    pub fn from_reader<R: std::io::Read>(r: R) -> RollResult<Self> {
        let def: ViewConfigDef = serde_json::from_reader(r)
            .map_err(|e| RollError::config(format!("parse view config JSON: {e}")))?;
        Self::from_def(&def)
    }

    /// Parse and validate a JSON view config file.
    pub fn from_path(path: impl AsRef<Path>) -> RollResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RollError::config(format!("open view config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Visible window extents.
    pub fn extents(&self) -> WindowExtents {
        self.extents
    }

    /// Fill colors.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Resolve automatic bounds against `timeline`.
    pub fn resolve(&self, timeline: &Timeline) -> RollResult<ResolvedView> {
        let end_time = match self.end_time {
            Some(end) => end,
            None => {
                let last = timeline.max_end_time().ok_or_else(|| {
                    RollError::config("end_time is \"auto\" but the timeline has no notes")
                })?;
                last + self.end_padding
            }
        };

        let observed = timeline.pitch_range();
        let pitch_min = match (self.pitch_min, observed) {
            (Some(p), _) => p,
            (None, Some((lo, _))) => lo,
            (None, None) => {
                return Err(RollError::config(
                    "pitch_min is \"auto\" but the timeline has no notes",
                ));
            }
        };
        let pitch_max = match (self.pitch_max, observed) {
            (Some(p), _) => p,
            (None, Some((_, hi))) => hi,
            (None, None) => {
                return Err(RollError::config(
                    "pitch_max is \"auto\" but the timeline has no notes",
                ));
            }
        };
        if pitch_min > pitch_max {
            return Err(RollError::config(format!(
                "resolved pitch_min ({pitch_min}) exceeds pitch_max ({pitch_max})"
            )));
        }

        let clock = FrameClock::new(self.start_time, end_time, self.fps)?;
        tracing::debug!(
            start_time = self.start_time,
            end_time,
            pitch_min,
            pitch_max,
            frames = clock.frame_count(),
            "resolved view"
        );

        Ok(ResolvedView {
            clock,
            start_time: self.start_time,
            end_time,
            extents: self.extents,
            pitch_min,
            pitch_max,
            canvas: self.canvas,
            margin_y: self.margin_y,
            palette: self.palette,
            trim: self.trim,
        })
    }
}

fn pitch(name: &str, value: i64) -> RollResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= crate::midi::event::MIDI_MAX)
        .ok_or_else(|| RollError::config(format!("{name} must be within 0..=127, got {value}")))
}

fn pixels(name: &str, value: i64) -> RollResult<u32> {
    u32::try_from(value).map_err(|_| {
        RollError::config(format!(
            "{name} must be a non-negative pixel count, got {value}"
        ))
    })
}

/// A [`ViewConfig`] with every automatic bound fixed for one timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedView {
    /// Frame schedule.
    pub clock: FrameClock,
    /// First frame time.
    pub start_time: f64,
    /// Render stops before this time.
    pub end_time: f64,
    /// Visible window extents.
    pub extents: WindowExtents,
    /// Lowest displayed pitch.
    pub pitch_min: u8,
    /// Highest displayed pitch.
    pub pitch_max: u8,
    /// Output size.
    pub canvas: Canvas,
    /// Vertical margin in pixels.
    pub margin_y: u32,
    /// Fill colors.
    pub palette: Palette,
    /// Note rectangle trims.
    pub trim: NoteTrim,
}

#[cfg(test)]
#[path = "../../tests/unit/view/config.rs"]
mod tests;
