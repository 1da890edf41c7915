//! pianoroll renders MIDI note timelines as scrolling piano-roll videos.
//!
//! The pipeline is:
//!
//! - Read an [`EventStream`] (from a Standard MIDI File or built in code)
//! - [`decode`] it into note intervals plus [`DecodeDiagnostics`], then apply timing to get a
//!   [`Timeline`]
//! - Validate a [`ViewConfig`] and create a [`RenderSession`]
//! - Render single frames or stream every frame into a [`FrameSink`] ([`FfmpegSink`] for MP4,
//!   [`PngSequenceSink`] for images, [`InMemorySink`] for tests)
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Encoding sinks.
pub mod encode;
/// Event input and note decoding.
pub mod midi;
/// Frame buffers, layout and rasterization.
pub mod render;
/// Session-oriented rendering API.
pub mod session;
/// Note intervals, timing and the visibility sweep.
pub mod timeline;
/// View configuration.
pub mod view;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgb8};
pub use crate::foundation::error::{RollError, RollResult};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png::{PngSequenceSink, save_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::midi::decoder::{Anomaly, DecodeDiagnostics, Decoded, decode};
pub use crate::midi::event::{EventPayload, EventStream, RawEvent};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::raster::FrameRasterizer;
pub use crate::session::render_session::{
    CancelToken, FrameVisibility, RenderSession, RenderSessionOpts, RenderStats,
};
pub use crate::timeline::model::{LaneKey, NoteInterval, TickTimeline, Timeline};
pub use crate::timeline::tempo::TempoContext;
pub use crate::timeline::window::{TimeWindow, VisibleSet, WindowExtents, WindowSweep};
pub use crate::view::config::{ResolvedView, ViewConfig};
pub use crate::view::model::ViewConfigDef;
