use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{RollError, RollResult};
use crate::timeline::model::{NoteInterval, Timeline};

/// How far the visible window reaches before and after the current frame time, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct WindowExtents {
    before: f64,
    after: f64,
}

impl WindowExtents {
    /// Validated extents. Either side may be negative, but the window must have positive width.
    pub fn new(before: f64, after: f64) -> RollResult<Self> {
        if !before.is_finite() || !after.is_finite() {
            return Err(RollError::config(
                "time_before_current and time_after_current must be finite",
            ));
        }
        if before + after <= 0.0 {
            return Err(RollError::config(format!(
                "visible window must have positive width \
                 (time_before_current + time_after_current = {})",
                before + after
            )));
        }
        Ok(Self { before, after })
    }

    /// Seconds shown before the current time.
    pub fn before(self) -> f64 {
        self.before
    }

    /// Seconds shown after the current time.
    pub fn after(self) -> f64 {
        self.after
    }

    /// Total window width in seconds.
    pub fn span(self) -> f64 {
        self.before + self.after
    }

    /// Window for frame time `t`.
    pub fn around(self, t: f64) -> TimeWindow {
        TimeWindow {
            left: t - self.before,
            right: t + self.after,
        }
    }
}

/// The `[left, right)` time range on screen for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TimeWindow {
    /// Earliest time on screen.
    pub left: f64,
    /// First time past the right edge.
    pub right: f64,
}

impl TimeWindow {
    /// Return `true` when `note` intersects this window.
    pub fn shows(&self, note: &NoteInterval) -> bool {
        note.start_time < self.right && note.end_time >= self.left
    }
}

/// Notes visible at one frame time, in lane order then start order.
#[derive(Clone, Debug)]
pub struct VisibleSet<'a> {
    /// Frame time.
    pub time: f64,
    /// Window the set was collected for.
    pub window: TimeWindow,
    /// Visible notes.
    pub notes: Vec<&'a NoteInterval>,
}

impl<'a> VisibleSet<'a> {
    /// Visible notes sounding at the frame time.
    pub fn active(&self) -> impl Iterator<Item = &'a NoteInterval> + '_ {
        let t = self.time;
        self.notes.iter().copied().filter(move |n| n.is_active_at(t))
    }

    /// Number of visible notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Return `true` when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Incremental visibility sweep over a timed [`Timeline`].
///
/// Each lane has a cursor at the first interval that may still be visible. For a
/// non-decreasing sequence of frame times, [`WindowSweep::advance`] moves cursors past intervals
/// that ended before the window, then collects from the cursor until the first interval starting
/// at or after the right edge. Per-frame work is proportional to what enters and leaves the
/// window, not to timeline size.
#[derive(Debug)]
pub struct WindowSweep<'a> {
    timeline: &'a Timeline,
    extents: WindowExtents,
    cursors: Vec<usize>,
    last_time: Option<f64>,
}

impl<'a> WindowSweep<'a> {
    /// Start a sweep with every cursor at the beginning of its lane.
    pub fn new(timeline: &'a Timeline, extents: WindowExtents) -> Self {
        Self {
            timeline,
            extents,
            cursors: vec![0; timeline.lanes().len()],
            last_time: None,
        }
    }

    /// Rewind every cursor for a fresh render.
    pub fn reset(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = 0);
        self.last_time = None;
    }

    /// Current cursor per lane, in [`Timeline::lanes`] order.
    pub fn cursors(&self) -> &[usize] {
        &self.cursors
    }

    /// Window extents of this sweep.
    pub fn extents(&self) -> WindowExtents {
        self.extents
    }

    /// Advance to frame time `t` and return the visible set.
    pub fn advance(&mut self, t: f64) -> RollResult<VisibleSet<'a>> {
        let mut notes = Vec::new();
        let window = self.advance_into(t, &mut notes)?;
        Ok(VisibleSet {
            time: t,
            window,
            notes,
        })
    }

    /// Like [`WindowSweep::advance`], reusing `out` (cleared first).
    ///
    /// Times must not decrease between calls: pruned intervals are never revisited.
    pub fn advance_into(
        &mut self,
        t: f64,
        out: &mut Vec<&'a NoteInterval>,
    ) -> RollResult<TimeWindow> {
        out.clear();
        if !t.is_finite() {
            return Err(RollError::render(format!("frame time must be finite, got {t}")));
        }
        if let Some(last) = self.last_time
            && t < last
        {
            return Err(RollError::render(format!(
                "frame clock went backwards ({t} after {last}); reset the sweep first"
            )));
        }
        let window = self.extents.around(t);
        if window.left >= window.right {
            return Err(RollError::render(format!(
                "empty visible window [{}, {})",
                window.left, window.right
            )));
        }
        self.last_time = Some(t);

        for (lane, cursor) in self.timeline.lanes().iter().zip(self.cursors.iter_mut()) {
            let notes = lane.notes();

            // Prune: ends are non-decreasing along the cursor's run, so nothing skipped here can
            // come back into a later window.
            while *cursor < notes.len() && notes[*cursor].end_time < window.left {
                *cursor += 1;
            }

            // Collect: starts ascend, so the first note past the right edge ends the scan.
            for note in &notes[*cursor..] {
                if note.start_time >= window.right {
                    break;
                }
                // A note nested inside a longer earlier one can end before the window while the
                // cursor is still held back by its predecessor.
                if note.end_time >= window.left {
                    out.push(note);
                }
            }
        }

        Ok(window)
    }
}

/// Frame schedule of one render: `ceil((end - start) * fps)` frames from `start`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    start: f64,
    fps: Fps,
    frames: u64,
}

impl FrameClock {
    /// Build the schedule for `[start, end)`.
    pub fn new(start: f64, end: f64, fps: Fps) -> RollResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(RollError::config("start_time and end_time must be finite"));
        }
        if end <= start {
            return Err(RollError::config(format!(
                "end_time ({end}) must be greater than start_time ({start})"
            )));
        }
        Ok(Self {
            start,
            fps,
            frames: fps.secs_to_frames_ceil(end - start),
        })
    }

    /// Number of frames.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// All frames as a range.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.frames),
        }
    }

    /// Time of frame `idx` in seconds.
    pub fn time_of(&self, idx: FrameIndex) -> f64 {
        self.start + self.fps.frames_to_secs(idx.0)
    }

    /// Every frame index with its time, in order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameIndex, f64)> + '_ {
        (0..self.frames).map(|i| (FrameIndex(i), self.time_of(FrameIndex(i))))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/window.rs"]
mod tests;
