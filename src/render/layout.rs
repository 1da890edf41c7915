use kurbo::Rect;

use crate::foundation::core::Canvas;
use crate::timeline::model::NoteInterval;
use crate::view::config::ResolvedView;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`, already clipped to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left column (inclusive).
    pub x0: u32,
    /// Top row (inclusive).
    pub y0: u32,
    /// Right column (exclusive).
    pub x1: u32,
    /// Bottom row (exclusive).
    pub y1: u32,
}

impl PixelRect {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Piano-roll geometry for one render.
///
/// One row per pitch in `pitch_min..=pitch_max`, low pitches at the bottom; time runs left to
/// right with the window's left edge at x = 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RollLayout {
    canvas: Canvas,
    margin_y: f64,
    pitch_min: u8,
    pitch_max: u8,
    row_height: f64,
    pixels_per_second: f64,
    note_height: f64,
    note_y_offset: f64,
    trim_x: f64,
}

impl RollLayout {
    /// Layout for a resolved view.
    pub fn new(view: &ResolvedView) -> Self {
        let rows = f64::from(view.pitch_max - view.pitch_min) + 1.0;
        let margin_y = f64::from(view.margin_y);
        let row_height = (f64::from(view.canvas.height) - 2.0 * margin_y) / rows;
        let note_height = (row_height - view.trim.y).max(1.0).round();
        Self {
            canvas: view.canvas,
            margin_y,
            pitch_min: view.pitch_min,
            pitch_max: view.pitch_max,
            row_height,
            pixels_per_second: f64::from(view.canvas.width) / view.extents.span(),
            note_height,
            note_y_offset: 0.5 * (row_height - note_height),
            trim_x: view.trim.x,
        }
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Height of one pitch row in pixels.
    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Horizontal scale.
    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    /// Rectangle of `note` for a window starting at `window_left`.
    ///
    /// Positions are rounded to whole pixels, widths are at least one pixel, and the result is
    /// clipped to the canvas. Notes outside the pitch range or entirely off-canvas give `None`.
    pub fn note_rect(&self, note: &NoteInterval, window_left: f64) -> Option<PixelRect> {
        if note.pitch < self.pitch_min || note.pitch > self.pitch_max {
            return None;
        }
        let row = f64::from(note.pitch - self.pitch_min);
        let height = f64::from(self.canvas.height);

        let y = (height - self.margin_y - (row + 1.0) * self.row_height + self.note_y_offset)
            .round();
        let x = ((note.start_time - window_left) * self.pixels_per_second).round();
        let w = ((note.end_time - note.start_time) * self.pixels_per_second - self.trim_x)
            .round()
            .max(1.0);

        let bounds = Rect::new(0.0, 0.0, f64::from(self.canvas.width), height);
        let clipped = Rect::new(x, y, x + w, y + self.note_height).intersect(bounds);
        if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
            return None;
        }
        Some(PixelRect {
            x0: clipped.x0 as u32,
            y0: clipped.y0 as u32,
            x1: clipped.x1 as u32,
            y1: clipped.y1 as u32,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
