use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{RollError, RollResult};
use crate::render::frame::FrameRGBA;
use crate::render::raster::FrameRasterizer;
use crate::timeline::model::{NoteInterval, Timeline};
use crate::timeline::window::{TimeWindow, VisibleSet, WindowSweep};
use crate::view::config::{ResolvedView, ViewConfig};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;
const ENCODER_GONE: &str = "encoder thread is not accepting frames";

/// Options controlling [`RenderSession::render`].
#[derive(Clone, Debug)]
pub struct RenderSessionOpts {
    /// Rasterize frames on a dedicated rayon pool. The sweep itself stays sequential.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames swept per chunk before the chunk is rasterized.
    pub chunk_size: usize,
    /// Bounded channel capacity between render workers and the encoder thread.
    pub channel_capacity: usize,
}

impl Default for RenderSessionOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 64,
            channel_capacity: 4,
        }
    }
}

/// Render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Frames in the render.
    pub frames_total: u64,
    /// Frames rasterized and handed to the sink.
    pub frames_rendered: u64,
    /// Note rectangles drawn across all frames.
    pub notes_drawn: u64,
    /// Largest visible set seen in any frame.
    pub max_visible: usize,
}

impl RenderStats {
    fn add_frame(&mut self, visible: usize, drawn: usize) {
        self.frames_rendered += 1;
        self.notes_drawn += drawn as u64;
        self.max_visible = self.max_visible.max(visible);
    }
}

/// Cooperative cancellation flag, checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> RollResult<()> {
        if self.is_cancelled() {
            Err(RollError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Visible notes of one frame, as produced by the sweep.
#[derive(Clone, Debug)]
pub struct FrameVisibility<'a> {
    /// Frame index.
    pub index: FrameIndex,
    /// Frame time in seconds.
    pub time: f64,
    /// Window on screen.
    pub window: TimeWindow,
    /// Notes intersecting the window.
    pub notes: Vec<&'a NoteInterval>,
}

/// Renders one timeline under one view.
///
/// Construction resolves automatic bounds and validates the view, so configuration errors surface
/// before any frame is produced.
pub struct RenderSession<'a> {
    timeline: &'a Timeline,
    view: ResolvedView,
    raster: FrameRasterizer,
    opts: RenderSessionOpts,
}

impl<'a> RenderSession<'a> {
    /// Resolve `config` against `timeline` and prepare the rasterizer.
    pub fn new(
        timeline: &'a Timeline,
        config: &ViewConfig,
        opts: RenderSessionOpts,
    ) -> RollResult<Self> {
        let view = config.resolve(timeline)?;
        if view.clock.frame_count() == 0 {
            return Err(RollError::config(format!(
                "time range [{}, {}) contains no frames",
                view.start_time, view.end_time
            )));
        }
        if let Some(0) = opts.threads {
            return Err(RollError::config("'threads' must be >= 1 when set"));
        }
        Ok(Self {
            timeline,
            raster: FrameRasterizer::new(&view),
            view,
            opts,
        })
    }

    /// Resolved view in use.
    pub fn view(&self) -> &ResolvedView {
        &self.view
    }

    /// Number of frames a full render produces.
    pub fn frame_count(&self) -> u64 {
        self.view.clock.frame_count()
    }

    /// Time of frame `idx` in seconds.
    pub fn frame_time(&self, idx: FrameIndex) -> f64 {
        self.view.clock.time_of(idx)
    }

    /// Configuration handed to sinks.
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.view.canvas.width,
            height: self.view.canvas.height,
            fps: self.view.clock.fps(),
        }
    }

    fn sweep(&self) -> WindowSweep<'a> {
        WindowSweep::new(self.timeline, self.view.extents)
    }

    /// Run one full sweep and return every frame's visible notes.
    pub fn visible_frames(&self) -> RollResult<Vec<FrameVisibility<'a>>> {
        let mut sweep = self.sweep();
        self.view
            .clock
            .iter()
            .map(|(index, time)| {
                let set = sweep.advance(time)?;
                Ok(FrameVisibility {
                    index,
                    time,
                    window: set.window,
                    notes: set.notes,
                })
            })
            .collect()
    }

    /// Render a single frame.
    pub fn render_frame(&self, idx: FrameIndex) -> RollResult<FrameRGBA> {
        if idx.0 >= self.frame_count() {
            return Err(RollError::render(format!(
                "frame {} is out of range (render has {} frames)",
                idx.0,
                self.frame_count()
            )));
        }
        let set = self.sweep().advance(self.frame_time(idx))?;
        Ok(self.raster.rasterize(&set))
    }

    /// Render every frame into `sink`.
    ///
    /// The sink receives frames in strictly increasing index order. When `parallel` is enabled,
    /// each chunk is swept sequentially and then rasterized on the pool; out-of-order completion
    /// is reordered at the sink boundary. On error or cancellation the sink is aborted.
    #[tracing::instrument(skip_all, fields(frames = self.frame_count(), parallel = self.opts.parallel))]
    pub fn render(
        &self,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
    ) -> RollResult<RenderStats> {
        let cfg = self.sink_config();
        let total = self.frame_count();

        let cap = self.opts.channel_capacity.max(1);
        let bytes_per_frame = u64::from(cfg.width)
            .saturating_mul(u64::from(cfg.height))
            .saturating_mul(4)
            .max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);
        let chunk_size = normalized_chunk_size(self.opts.chunk_size)
            .min(max_chunk_by_mem)
            .min(total);

        let pool = if self.opts.parallel {
            Some(build_thread_pool(self.opts.threads)?)
        } else {
            None
        };

        tracing::info!(
            frames = total,
            width = cfg.width,
            height = cfg.height,
            chunk_size,
            "render started"
        );
        let started = std::time::Instant::now();
        let res = std::thread::scope(|scope| -> RollResult<RenderStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let sink_ref: &mut dyn FrameSink = &mut *sink;

            // Encoder thread: in-order delivery to the sink regardless of completion order.
            let enc = scope.spawn(move || -> RollResult<()> {
                sink_ref.begin(cfg)?;

                let mut next = 0u64;
                let mut pending = HashMap::<u64, FrameRGBA>::new();
                while next < total {
                    if let Some(frame) = pending.remove(&next) {
                        sink_ref.push_frame(FrameIndex(next), &frame)?;
                        next += 1;
                        continue;
                    }
                    let msg = rx.recv().map_err(|_| {
                        RollError::encoding("encoder channel disconnected before the last frame")
                    })?;
                    pending.insert(msg.idx.0, msg.frame);
                }

                sink_ref.end()
            });

            let mut stats = RenderStats {
                frames_total: total,
                ..RenderStats::default()
            };
            let produce_res = match pool.as_ref() {
                Some(pool) => self.produce_parallel(pool, chunk_size, &tx, cancel, &mut stats),
                None => self.produce_sequential(&tx, cancel, &mut stats),
            };

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| RollError::encoding("encoder thread panicked"))?;

            match (produce_res, enc_res) {
                (Ok(()), Ok(())) => Ok(stats),
                (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
                (Err(p), Err(e)) => {
                    if matches!(&p, RollError::Encoding(m) if m == ENCODER_GONE) {
                        Err(e)
                    } else {
                        Err(p)
                    }
                }
            }
        });

        match res {
            Ok(stats) => {
                tracing::info!(
                    frames = stats.frames_rendered,
                    notes_drawn = stats.notes_drawn,
                    max_visible = stats.max_visible,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "render finished"
                );
                Ok(stats)
            }
            Err(e) => {
                if e.is_cancelled() {
                    tracing::warn!("render cancelled; discarding partial output");
                } else {
                    tracing::error!(error = %e, "render failed; discarding partial output");
                }
                sink.abort();
                Err(e)
            }
        }
    }

    fn draw(&self, set: &VisibleSet<'_>) -> (FrameRGBA, usize) {
        self.raster.rasterize_counted(set)
    }

    fn produce_sequential(
        &self,
        tx: &mpsc::SyncSender<FrameMsg>,
        cancel: &CancelToken,
        stats: &mut RenderStats,
    ) -> RollResult<()> {
        let mut sweep = self.sweep();
        for (idx, time) in self.view.clock.iter() {
            cancel.check()?;
            let set = sweep.advance(time)?;
            let (frame, drawn) = self.draw(&set);
            stats.add_frame(set.len(), drawn);
            send(tx, FrameMsg { idx, frame })?;
        }
        Ok(())
    }

    fn produce_parallel(
        &self,
        pool: &rayon::ThreadPool,
        chunk_size: u64,
        tx: &mpsc::SyncSender<FrameMsg>,
        cancel: &CancelToken,
        stats: &mut RenderStats,
    ) -> RollResult<()> {
        let total = self.frame_count();
        let mut sweep = self.sweep();
        let mut chunk_start = 0u64;
        while chunk_start < total {
            let chunk_end = (chunk_start + chunk_size).min(total);
            cancel.check()?;

            let sets = (chunk_start..chunk_end)
                .map(|i| {
                    let idx = FrameIndex(i);
                    sweep.advance(self.frame_time(idx)).map(|set| (idx, set))
                })
                .collect::<RollResult<Vec<_>>>()?;

            let counts = pool.install(|| {
                sets.par_iter()
                    .map_with(tx.clone(), |tx, (idx, set)| -> RollResult<(usize, usize)> {
                        cancel.check()?;
                        let (frame, drawn) = self.draw(set);
                        send(tx, FrameMsg { idx: *idx, frame })?;
                        Ok((set.len(), drawn))
                    })
                    .collect::<RollResult<Vec<_>>>()
            })?;
            for (visible, drawn) in counts {
                stats.add_frame(visible, drawn);
            }

            tracing::debug!(chunk_start, chunk_end, "chunk rasterized");
            chunk_start = chunk_end;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: FrameRGBA,
}

fn send(tx: &mpsc::SyncSender<FrameMsg>, msg: FrameMsg) -> RollResult<()> {
    tx.send(msg).map_err(|_| RollError::encoding(ENCODER_GONE))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

fn build_thread_pool(threads: Option<usize>) -> RollResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RollError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
