use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RollError, RollResult};
use crate::render::frame::FrameRGBA;

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order, between one `begin` and
/// one `end`. When a render fails or is cancelled, `abort` is called instead of `end` and the
/// sink must not leave a finished-looking artifact behind.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> RollResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RollResult<()>;
    /// Finalize the output after the last frame.
    fn end(&mut self) -> RollResult<()>;
    /// Discard partial output after a failed or cancelled render.
    fn abort(&mut self) {}
}

/// Checks shared by sinks: started, in order, correctly sized.
#[derive(Debug, Default)]
pub(crate) struct FrameOrder {
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FrameOrder {
    pub(crate) fn start(&mut self, cfg: SinkConfig) {
        self.cfg = Some(cfg);
        self.last_idx = None;
    }

    pub(crate) fn finish(&mut self) -> Option<SinkConfig> {
        self.last_idx = None;
        self.cfg.take()
    }

    pub(crate) fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub(crate) fn check(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RollResult<SinkConfig> {
        let cfg = self
            .cfg
            .ok_or_else(|| RollError::encoding("sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(RollError::encoding(format!(
                "out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RollError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
            return Err(RollError::encoding(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.last_idx = Some(idx);
        Ok(cfg)
    }
}

/// In-memory sink for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    order: FrameOrder,
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Take the captured frames out of the sink.
    pub fn into_frames(self) -> Vec<(FrameIndex, FrameRGBA)> {
        self.frames
    }

    /// `true` once `end` has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` once `abort` has been called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RollResult<()> {
        self.order.start(cfg);
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RollResult<()> {
        self.order.check(idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> RollResult<()> {
        self.order
            .finish()
            .ok_or_else(|| RollError::encoding("sink not started"))?;
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.order.finish();
        self.frames.clear();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
