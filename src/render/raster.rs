use crate::foundation::core::Rgb8;
use crate::render::frame::FrameRGBA;
use crate::render::layout::{PixelRect, RollLayout};
use crate::timeline::window::VisibleSet;
use crate::view::config::{Palette, ResolvedView};

/// Turns a [`VisibleSet`] into pixels.
///
/// Output depends only on the set and the view, so frames can be rasterized in any order and on
/// any thread.
#[derive(Clone, Copy, Debug)]
pub struct FrameRasterizer {
    layout: RollLayout,
    palette: Palette,
}

impl FrameRasterizer {
    /// Rasterizer for a resolved view.
    pub fn new(view: &ResolvedView) -> Self {
        Self {
            layout: RollLayout::new(view),
            palette: view.palette,
        }
    }

    /// Geometry in use.
    pub fn layout(&self) -> &RollLayout {
        &self.layout
    }

    /// Render one frame into a new buffer.
    pub fn rasterize(&self, set: &VisibleSet<'_>) -> FrameRGBA {
        self.rasterize_counted(set).0
    }

    /// Render one frame into a new buffer and count the notes drawn.
    pub fn rasterize_counted(&self, set: &VisibleSet<'_>) -> (FrameRGBA, usize) {
        let mut frame = FrameRGBA::filled(self.layout.canvas(), self.palette.background);
        let drawn = self.draw_notes(set, &mut frame);
        (frame, drawn)
    }

    /// Render one frame into `frame`, reusing its allocation. Returns the number of notes drawn.
    pub fn rasterize_into(&self, set: &VisibleSet<'_>, frame: &mut FrameRGBA) -> usize {
        let canvas = self.layout.canvas();
        if frame.width != canvas.width || frame.height != canvas.height {
            *frame = FrameRGBA::filled(canvas, self.palette.background);
        } else {
            frame.fill(self.palette.background);
        }
        self.draw_notes(set, frame)
    }

    fn draw_notes(&self, set: &VisibleSet<'_>, frame: &mut FrameRGBA) -> usize {
        let mut drawn = 0;
        for note in &set.notes {
            let Some(rect) = self.layout.note_rect(note, set.window.left) else {
                continue;
            };
            let color = if note.is_active_at(set.time) {
                self.palette.active
            } else {
                self.palette.silent
            };
            fill_rect(frame, rect, color);
            drawn += 1;
        }
        drawn
    }
}

fn fill_rect(frame: &mut FrameRGBA, rect: PixelRect, color: Rgb8) {
    let px = color.to_rgba();
    let stride = frame.width as usize * 4;
    let (x0, x1) = (rect.x0 as usize * 4, rect.x1 as usize * 4);
    for y in rect.y0..rect.y1 {
        let row = y as usize * stride;
        if let Some(span) = frame.data.get_mut(row + x0..row + x1) {
            for chunk in span.chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
